//! Collaborators the controller reads from: the ruleset store and the group
//! catalog. Both are reached only through their data contracts.

use anyhow::{Context, Result, anyhow, bail};
use parking_lot::{Mutex, RwLock};
use rulegraph_core::{Group, GroupCatalog, Ruleset};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

pub trait RulesetSource: Send + Sync {
    fn fetch_ruleset(&self, ruleset_id: &str) -> Result<Ruleset>;
}

pub trait GroupCatalogSource: Send + Sync {
    fn fetch_groups(&self) -> Result<Vec<Group>>;
}

/// Rulesets stored as `<root>/<id>.json`.
pub struct JsonRulesetDirectory {
    root: PathBuf,
}

impl JsonRulesetDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, ruleset_id: &str) -> Result<PathBuf> {
        let id = ruleset_id.trim();
        if id.is_empty() || id.contains(['/', '\\']) || id == "." || id == ".." {
            bail!("Invalid ruleset id: {ruleset_id:?}");
        }
        Ok(self.root.join(format!("{id}.json")))
    }
}

impl RulesetSource for JsonRulesetDirectory {
    fn fetch_ruleset(&self, ruleset_id: &str) -> Result<Ruleset> {
        let path = self.path_for(ruleset_id)?;
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read ruleset {}", path.display()))?;
        let mut ruleset = Ruleset::from_json_str(&content)
            .with_context(|| format!("Failed to parse ruleset {}", path.display()))?;
        if ruleset.id.is_empty() {
            ruleset.id = ruleset_id.to_string();
        }
        Ok(ruleset)
    }
}

/// Group catalog stored as a JSON array.
pub struct JsonGroupCatalogFile {
    path: PathBuf,
}

impl JsonGroupCatalogFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl GroupCatalogSource for JsonGroupCatalogFile {
    fn fetch_groups(&self) -> Result<Vec<Group>> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read group catalog {}", self.path.display()))?;
        let catalog = GroupCatalog::from_json_str(&content)
            .with_context(|| format!("Failed to parse group catalog {}", self.path.display()))?;
        Ok(catalog.groups)
    }
}

#[derive(Default)]
pub struct InMemoryRulesets {
    rulesets: RwLock<HashMap<String, Ruleset>>,
}

impl InMemoryRulesets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, ruleset: Ruleset) {
        self.rulesets.write().insert(ruleset.id.clone(), ruleset);
    }
}

impl RulesetSource for InMemoryRulesets {
    fn fetch_ruleset(&self, ruleset_id: &str) -> Result<Ruleset> {
        self.rulesets
            .read()
            .get(ruleset_id)
            .cloned()
            .ok_or_else(|| anyhow!("Ruleset not found: {ruleset_id}"))
    }
}

/// Catalog whose response can be swapped, including for a failure.
pub struct StaticGroupCatalog {
    response: Mutex<Result<Vec<Group>, String>>,
}

impl StaticGroupCatalog {
    pub fn new(groups: Vec<Group>) -> Self {
        Self {
            response: Mutex::new(Ok(groups)),
        }
    }

    pub fn set_groups(&self, groups: Vec<Group>) {
        *self.response.lock() = Ok(groups);
    }

    pub fn set_unreachable(&self, reason: impl Into<String>) {
        *self.response.lock() = Err(reason.into());
    }
}

impl GroupCatalogSource for StaticGroupCatalog {
    fn fetch_groups(&self) -> Result<Vec<Group>> {
        self.response.lock().clone().map_err(|reason| anyhow!(reason))
    }
}
