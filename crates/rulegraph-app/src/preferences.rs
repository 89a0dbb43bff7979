use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub last_ruleset: Option<String>,
}

/// Remembers the last selected ruleset across sessions.
pub trait PreferenceStore: Send + Sync {
    fn last_ruleset(&self) -> Result<Option<String>>;
    fn set_last_ruleset(&self, ruleset_id: &str) -> Result<()>;
}

pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<Preferences> {
        if !self.path.exists() {
            return Ok(Preferences::default());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read preferences {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse preferences {}", self.path.display()))
    }

    pub fn save(&self, prefs: &Preferences) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(prefs)?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write preferences {}", self.path.display()))
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn last_ruleset(&self) -> Result<Option<String>> {
        Ok(self.load()?.last_ruleset)
    }

    fn set_last_ruleset(&self, ruleset_id: &str) -> Result<()> {
        let mut prefs = self.load().unwrap_or_default();
        prefs.last_ruleset = Some(ruleset_id.to_string());
        self.save(&prefs)
    }
}

#[derive(Default)]
pub struct MemoryPreferenceStore {
    prefs: Mutex<Preferences>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_last_ruleset(ruleset_id: &str) -> Self {
        Self {
            prefs: Mutex::new(Preferences {
                last_ruleset: Some(ruleset_id.to_string()),
            }),
        }
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn last_ruleset(&self) -> Result<Option<String>> {
        Ok(self.prefs.lock().last_ruleset.clone())
    }

    fn set_last_ruleset(&self, ruleset_id: &str) -> Result<()> {
        self.prefs.lock().last_ruleset = Some(ruleset_id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_means_no_preference() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = FilePreferenceStore::new(dir.path().join("prefs.json"));
        assert_eq!(store.last_ruleset()?, None);
        Ok(())
    }

    #[test]
    fn test_file_store_round_trip() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("prefs.json");
        FilePreferenceStore::new(&path).set_last_ruleset("rs-42")?;

        let reopened = FilePreferenceStore::new(&path);
        assert_eq!(reopened.last_ruleset()?, Some("rs-42".to_string()));
        assert!(fs::read_to_string(&path)?.contains("lastRuleset"));
        Ok(())
    }

    #[test]
    fn test_corrupt_file_is_reported() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("prefs.json");
        fs::write(&path, "{not json")?;
        let store = FilePreferenceStore::new(&path);
        assert!(store.last_ruleset().is_err());

        // Saving replaces the unreadable file.
        store.set_last_ruleset("rs-1")?;
        assert_eq!(store.last_ruleset()?, Some("rs-1".to_string()));
        Ok(())
    }

    #[test]
    fn test_memory_store() -> Result<()> {
        let store = MemoryPreferenceStore::new();
        assert_eq!(store.last_ruleset()?, None);
        store.set_last_ruleset("rs-7")?;
        assert_eq!(store.last_ruleset()?, Some("rs-7".to_string()));
        Ok(())
    }
}
