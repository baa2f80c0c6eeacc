// FileManage Configuration Module
// Persistent connection and listing settings

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::i18n::Locale;

const APP_DIR: &str = "filemanage";
const CONFIG_FILENAME: &str = "config.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No config directory available")]
    NoConfigDir,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Connection and listing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileManageConfig {
    /// S3-compatible endpoint (None or empty for AWS S3)
    pub endpoint: Option<String>,
    /// AWS region
    pub region: String,
    /// Bucket holding the managed files
    pub bucket: String,
    /// Access key ID; the secret lives in the credential store
    pub access_key_id: String,
    /// Key prefix to restrict the listing to
    pub prefix: Option<String>,
    /// Force path-style (true) or virtual-hosted (false) addressing.
    /// Defaults to path style for custom endpoints.
    pub path_style: Option<bool>,
    /// Objects requested per page (S3 caps this at 1000)
    pub page_size: u32,
    /// Stop a scan after this many pages
    pub max_pages: Option<u32>,
    /// Language for user-facing messages
    pub locale: Locale,
}

impl Default for FileManageConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            region: "us-east-1".to_string(),
            bucket: String::new(),
            access_key_id: String::new(),
            prefix: None,
            path_style: None,
            page_size: 1000,
            max_pages: None,
            locale: Locale::default(),
        }
    }
}

/// Directory holding config and credentials
pub fn app_config_dir() -> Result<PathBuf, ConfigError> {
    let base = dirs::config_dir()
        .or_else(dirs::home_dir)
        .ok_or(ConfigError::NoConfigDir)?;
    Ok(base.join(APP_DIR))
}

/// Default path of the config file
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    Ok(app_config_dir()?.join(CONFIG_FILENAME))
}

/// Load configuration from `path`, falling back to defaults
pub fn load_config(path: &Path) -> FileManageConfig {
    if path.exists() {
        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to parse config {:?}: {}", path, e);
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config {:?}: {}", path, e);
            }
        }
    }

    FileManageConfig::default()
}

/// Save configuration to `path`
pub fn save_config(path: &Path, config: &FileManageConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(config)?;
    fs::write(path, content)?;

    tracing::info!("Config saved to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FileManageConfig::default();
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.page_size, 1000);
        assert!(config.bucket.is_empty());
        assert_eq!(config.locale, Locale::En);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.json"));
        assert_eq!(config, FileManageConfig::default());
    }

    #[test]
    fn test_corrupt_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_config(&path), FileManageConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = FileManageConfig {
            bucket: "uploads".to_string(),
            endpoint: Some("http://localhost:9000".to_string()),
            max_pages: Some(5),
            locale: Locale::Zh,
            ..FileManageConfig::default()
        };

        save_config(&path, &config).unwrap();
        assert_eq!(load_config(&path), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"bucket": "clip"}"#).unwrap();

        let config = load_config(&path);
        assert_eq!(config.bucket, "clip");
        assert_eq!(config.page_size, 1000);
        assert_eq!(config.region, "us-east-1");
    }
}
