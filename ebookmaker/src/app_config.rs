//! Application configuration from ebookmaker.toml

use crate::generation::{GeminiConfig, RetryPolicy};
use crate::surface::{SyncPolicy, DEFAULT_BULK_REPLACE_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "ebookmaker.toml";

/// Main application configuration from ebookmaker.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Generation service settings
    pub generation: GenerationSettings,

    /// Editing surface settings
    pub editor: EditorSettings,

    /// Where state is persisted
    pub storage: StorageSettings,
}

/// Generation service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// API base URL
    pub endpoint: String,

    /// Model name
    pub model: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Retries after a transient failure
    pub max_retries: u32,

    /// Delay before the first retry in milliseconds (doubles per retry)
    pub initial_backoff_ms: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        let gemini = GeminiConfig::default();
        let retry = RetryPolicy::default();
        Self {
            endpoint: gemini.endpoint,
            model: gemini.model,
            timeout_secs: gemini.timeout_secs,
            max_retries: retry.max_retries,
            initial_backoff_ms: retry.initial_backoff.as_millis() as u64,
        }
    }
}

impl GenerationSettings {
    /// Client connection settings
    pub fn gemini(&self) -> GeminiConfig {
        GeminiConfig {
            endpoint: self.endpoint.clone(),
            model: self.model.clone(),
            timeout_secs: self.timeout_secs,
        }
    }

    /// Retry policy
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            ..RetryPolicy::default()
        }
    }
}

/// Editing surface settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Length delta above which a focused surface accepts a canonical overwrite
    pub bulk_replace_threshold: usize,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            bulk_replace_threshold: DEFAULT_BULK_REPLACE_THRESHOLD,
        }
    }
}

impl EditorSettings {
    pub fn sync_policy(&self) -> SyncPolicy {
        SyncPolicy {
            bulk_replace_threshold: self.bulk_replace_threshold,
        }
    }
}

/// Persistence settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory holding the state and credential files
    pub data_dir: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".ebookmaker"),
        }
    }
}

impl AppConfig {
    /// Load configuration from an ebookmaker.toml file
    ///
    /// # Parameters
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(AppConfig)` - Successfully loaded configuration
    /// * `Err(AppConfigError)` - Error reading or parsing the configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AppConfigError> {
        let content = fs::read_to_string(&path).map_err(AppConfigError::IoError)?;

        let config: AppConfig = toml::from_str(&content).map_err(AppConfigError::ParseError)?;

        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is missing
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, AppConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            log::info!(
                "No configuration at {}, using defaults",
                path.as_ref().display()
            );
            Ok(Self::default())
        }
    }

    /// Save configuration to an ebookmaker.toml file
    ///
    /// # Parameters
    /// * `path` - Path where the configuration file will be written
    ///
    /// # Returns
    /// * `Ok(())` - Successfully saved configuration
    /// * `Err(AppConfigError)` - Error serializing or writing the configuration file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), AppConfigError> {
        let content = toml::to_string_pretty(self).map_err(AppConfigError::SerializeError)?;

        fs::write(&path, content).map_err(AppConfigError::IoError)?;

        Ok(())
    }
}

/// Errors that can occur when loading or saving the application configuration
#[derive(Debug)]
#[allow(clippy::enum_variant_names)]
pub enum AppConfigError {
    /// IO error when reading or writing file
    IoError(std::io::Error),

    /// Error parsing TOML
    ParseError(toml::de::Error),

    /// Error serializing to TOML
    SerializeError(toml::ser::Error),
}

impl std::fmt::Display for AppConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppConfigError::IoError(e) => write!(f, "IO error: {}", e),
            AppConfigError::ParseError(e) => write!(f, "TOML parse error: {}", e),
            AppConfigError::SerializeError(e) => write!(f, "TOML serialize error: {}", e),
        }
    }
}

impl std::error::Error for AppConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_roundtrip() {
        let mut config = AppConfig::default();
        config.generation.model = "gemini-test".to_string();
        config.editor.bulk_replace_threshold = 80;

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed, config);
        assert_eq!(parsed.editor.sync_policy().bulk_replace_threshold, 80);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let parsed: AppConfig = toml::from_str(
            r#"
[generation]
max_retries = 5

[storage]
data_dir = "/tmp/ebook"
"#,
        )
        .unwrap();

        assert_eq!(parsed.generation.max_retries, 5);
        assert_eq!(parsed.generation.initial_backoff_ms, 1000);
        assert_eq!(parsed.generation.model, "gemini-3-flash-preview");
        assert_eq!(parsed.editor.bulk_replace_threshold, 50);
        assert_eq!(parsed.storage.data_dir, PathBuf::from("/tmp/ebook"));

        let policy = parsed.generation.retry_policy();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.initial_backoff, Duration::from_millis(1000));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default(dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config, AppConfig::default());

        let path = dir.path().join(CONFIG_FILE_NAME);
        config.save(&path).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let err = toml::from_str::<AppConfig>("[editor]\nbulk_replace_threshold = \"x\"").unwrap_err();
        let err = AppConfigError::ParseError(err);
        assert!(err.to_string().starts_with("TOML parse error"));
    }
}
