use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub mod config;
pub mod error;
pub mod group;

pub use config::LayoutConfig;
pub use error::{CatalogError, ConfigError};
pub use group::{Group, GroupCatalog, UNGROUPED, normalize_group_name};

/// Name a rule computes a value for. Unique within one ruleset.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(pub String);

impl RuleId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RuleId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Free-form metadata attached to a rule by the ruleset store.
///
/// Only `group` and the effective-date window are interpreted here; any other
/// keys are carried through untouched in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_from: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_to: Option<NaiveDate>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A named calculation rule as delivered by the ruleset store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub target: String,
    #[serde(default)]
    pub expression: String,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub metadata: RuleMetadata,
}

impl Rule {
    pub fn new(target: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            expression: expression.into(),
            depends_on: Vec::new(),
            metadata: RuleMetadata::default(),
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.metadata.group = Some(group.into());
        self
    }

    pub fn with_depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_effective_window(
        mut self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Self {
        self.metadata.effective_from = from;
        self.metadata.effective_to = to;
        self
    }

    /// Raw group tag, exactly as stored.
    pub fn group(&self) -> Option<&str> {
        self.metadata.group.as_deref()
    }

    pub fn id(&self) -> RuleId {
        RuleId(self.target.clone())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ruleset {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl Ruleset {
    pub fn from_json_str(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn rule(&self, target: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.target == target)
    }
}
