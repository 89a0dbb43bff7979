use crate::error::CatalogError;
use serde::{Deserialize, Serialize};

/// Bucket name for rules with an empty or missing group tag.
pub const UNGROUPED: &str = "ungrouped";

/// Lower-cases and trims a raw group tag. Blank tags map to [`UNGROUPED`].
pub fn normalize_group_name(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_lowercase(),
        _ => UNGROUPED.to_string(),
    }
}

/// One entry of the group catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub group_name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub display_order: i64,
}

impl Group {
    pub fn new(
        group_name: impl Into<String>,
        display_name: impl Into<String>,
        color: impl Into<String>,
        display_order: i64,
    ) -> Self {
        Self {
            group_name: group_name.into(),
            display_name: display_name.into(),
            color: color.into(),
            display_order,
        }
    }

    pub fn normalized_name(&self) -> String {
        normalize_group_name(Some(&self.group_name))
    }

    /// Label shown next to the layer, falling back to the raw name.
    pub fn label(&self) -> &str {
        if self.display_name.trim().is_empty() {
            &self.group_name
        } else {
            &self.display_name
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupCatalog {
    pub groups: Vec<Group>,
}

impl GroupCatalog {
    pub fn new(groups: Vec<Group>) -> Self {
        Self { groups }
    }

    /// Fixed catalog used when the catalog collaborator cannot be reached.
    pub fn fallback() -> Self {
        Self::new(vec![
            Group::new("base", "Base Pay", "blue", 1),
            Group::new("allowance", "Allowances", "green", 2),
            Group::new("bonus", "Bonuses", "orange", 3),
            Group::new("deduction", "Deductions", "red", 4),
            Group::new("total", "Totals", "purple", 5),
        ])
    }

    /// Turn a collaborator response into a usable catalog.
    ///
    /// Entries without a group name are dropped. If the fetch failed or
    /// nothing usable remains, the fallback catalog is returned together with
    /// the reason.
    pub fn resolve<E: std::fmt::Display>(
        fetched: Result<Vec<Group>, E>,
    ) -> (Self, Option<CatalogError>) {
        match fetched {
            Err(err) => {
                let reason = CatalogError::Unavailable(err.to_string());
                tracing::warn!("{reason}; using fallback group catalog");
                (Self::fallback(), Some(reason))
            }
            Ok(groups) => {
                let usable: Vec<Group> = groups
                    .into_iter()
                    .filter(|group| !group.group_name.trim().is_empty())
                    .collect();
                if usable.is_empty() {
                    tracing::warn!("group catalog is empty; using fallback group catalog");
                    (Self::fallback(), Some(CatalogError::Empty))
                } else {
                    (Self::new(usable), None)
                }
            }
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Case-insensitive lookup by group name. The first matching entry wins.
    pub fn find(&self, name: &str) -> Option<&Group> {
        let wanted = normalize_group_name(Some(name));
        self.groups
            .iter()
            .find(|group| group.normalized_name() == wanted)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }
}
