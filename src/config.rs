use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::history::store::DEFAULT_MAX_ITEMS;

/// A folder fed into the history view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FolderConfig {
    pub id: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub deduplicate: bool,
    pub max_items: usize,
    pub folders: Vec<FolderConfig>,
    pub exclude_patterns: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            deduplicate: true,
            max_items: DEFAULT_MAX_ITEMS,
            folders: Vec::new(),
            exclude_patterns: Vec::new(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.deduplicate);
        assert_eq!(config.max_items, 30);
        assert!(config.folders.is_empty());
    }

    #[test]
    fn test_load_full_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("synctrail.yaml");
        fs::write(
            &path,
            r#"
deduplicate: false
max_items: 12
folders:
  - id: documents
    path: /home/alice/Documents
  - id: photos
    path: /home/alice/Photos
exclude_patterns:
  - "*.tmp"
  - ".DS_Store"
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert!(!config.deduplicate);
        assert_eq!(config.max_items, 12);
        assert_eq!(config.folders.len(), 2);
        assert_eq!(config.folders[0].id, "documents");
        assert_eq!(config.exclude_patterns, vec!["*.tmp", ".DS_Store"]);
    }

    #[test]
    fn test_load_partial_config_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("synctrail.yaml");
        fs::write(&path, "max_items: 5\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.max_items, 5);
        assert!(config.deduplicate);
        assert!(config.exclude_patterns.is_empty());
    }

    #[test]
    fn test_load_missing_file_errors() {
        assert!(Config::load(Path::new("/no/such/config.yaml")).is_err());
    }
}
