use std::path::PathBuf;
use std::time::Duration;

use agua_core::{SyncOptions, WriteMode};
use serde::{Deserialize, Serialize};

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Server URL (e.g., "http://localhost:8080")
    pub server_url: Option<String>,
    /// Shared bearer token
    #[serde(serialize_with = "mask_token")]
    pub token: Option<String>,
    /// Pull before read commands and after write commands
    pub auto_sync: bool,
    /// How writes reach the server
    pub write_mode: WriteMode,
    /// Retries after a version conflict
    pub max_retries: u32,
    /// Per-request timeout
    pub request_timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        let options = SyncOptions::default();
        Self {
            server_url: None,
            token: None,
            auto_sync: false,
            write_mode: options.write_mode,
            max_retries: options.max_retries,
            request_timeout_secs: 10,
        }
    }
}

impl SyncConfig {
    /// Returns true if a server is configured
    pub fn is_configured(&self) -> bool {
        self.server_url.is_some()
    }

    pub fn options(&self) -> SyncOptions {
        SyncOptions {
            write_mode: self.write_mode,
            max_retries: self.max_retries,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Never print the token itself.
fn mask_token<S>(token: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match token {
        Some(_) => serializer.serialize_some("********"),
        None => serializer.serialize_none(),
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Directory holding the local cache
    pub data_dir: ConfigValue<PathBuf>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    /// Sync configuration
    pub sync: SyncConfig,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    sync: Option<SyncConfig>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut data_dir = ConfigValue::new(Self::default_data_dir(), ConfigSource::Default);
        let mut config_file = None;
        let mut sync = SyncConfig::default();

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(dir) = file_config.data_dir {
                // Resolve relative paths against config file's directory
                let resolved = if dir.is_relative() {
                    path.parent().map(|p| p.join(&dir)).unwrap_or(dir)
                } else {
                    dir
                };
                data_dir = ConfigValue::new(resolved, ConfigSource::File);
            }
            if let Some(sync_config) = file_config.sync {
                sync = sync_config;
            }
        }

        // Apply environment variable overrides
        if let Ok(dir) = std::env::var("AGUA_DATA_DIR") {
            data_dir = ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Ok(url) = std::env::var("AGUA_SYNC_URL") {
            sync.server_url = Some(url);
        }
        if let Ok(token) = std::env::var("AGUA_SYNC_TOKEN") {
            sync.token = Some(token);
        }

        Ok(Self {
            data_dir,
            config_file,
            sync,
        })
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/agua/
    /// - macOS: ~/Library/Application Support/agua/
    /// - Windows: %APPDATA%/agua/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("agua")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/agua/
    /// - macOS: ~/Library/Application Support/agua/
    /// - Windows: %APPDATA%/agua/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("agua")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }

    /// Starter config file written by `agua config init`.
    pub fn template() -> String {
        let defaults = SyncConfig::default();
        format!(
            "# Agua configuration\n\
             # data_dir: {data_dir}\n\
             \n\
             sync:\n\
             \x20 # server_url: \"http://localhost:8080\"\n\
             \x20 # token: \"shared-secret\"\n\
             \x20 auto_sync: {auto_sync}\n\
             \x20 write_mode: {write_mode}\n\
             \x20 max_retries: {max_retries}\n\
             \x20 request_timeout_secs: {timeout}\n",
            data_dir = Self::default_data_dir().display(),
            auto_sync = defaults.auto_sync,
            write_mode = defaults.write_mode,
            max_retries = defaults.max_retries,
            timeout = defaults.request_timeout_secs,
        )
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.yaml");

        let config = Config::load(Some(config_path)).unwrap();
        assert!(config.data_dir.value.ends_with("agua"));
        assert_eq!(config.data_dir.source, ConfigSource::Default);
        assert!(config.config_file.is_none());
        assert_eq!(config.sync.write_mode, WriteMode::Conditional);
        assert_eq!(config.sync.max_retries, 3);
        assert!(!config.sync.auto_sync);
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "data_dir: /var/lib/agua").unwrap();
        writeln!(file, "sync:").unwrap();
        writeln!(file, "  server_url: http://sync.local:8080").unwrap();
        writeln!(file, "  auto_sync: true").unwrap();
        writeln!(file, "  write_mode: overwrite").unwrap();

        let config = Config::load(Some(config_path.clone())).unwrap();
        assert_eq!(config.data_dir.value, PathBuf::from("/var/lib/agua"));
        assert_eq!(config.data_dir.source, ConfigSource::File);
        assert_eq!(config.config_file, Some(config_path));
        assert_eq!(
            config.sync.server_url.as_deref(),
            Some("http://sync.local:8080")
        );
        assert!(config.sync.auto_sync);
        assert_eq!(config.sync.options().write_mode, WriteMode::Overwrite);
        // Unset keys keep their defaults
        assert_eq!(config.sync.max_retries, 3);
        assert_eq!(config.sync.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_relative_data_dir_resolves_against_config_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "data_dir: cache\n").unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.data_dir.value, temp_dir.path().join("cache"));
    }

    #[test]
    #[ignore] // Run with --ignored; env vars can pollute parallel tests
    fn test_env_var_overrides_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "data_dir: /from/file\n").unwrap();

        std::env::set_var("AGUA_DATA_DIR", "/from/env");

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.data_dir.value, PathBuf::from("/from/env"));
        assert_eq!(config.data_dir.source, ConfigSource::Environment);

        // Clean up
        std::env::remove_var("AGUA_DATA_DIR");
    }

    #[test]
    fn test_invalid_yaml_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = Config::load(Some(config_path));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_token_is_masked_when_serialized() {
        let sync = SyncConfig {
            token: Some("shared-secret".to_string()),
            ..SyncConfig::default()
        };
        let json = serde_json::to_string(&sync).unwrap();
        assert!(!json.contains("shared-secret"));
        assert!(json.contains("********"));
    }

    #[test]
    fn test_template_parses() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, Config::template()).unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.data_dir.source, ConfigSource::Default);
        assert_eq!(config.sync.write_mode, WriteMode::Conditional);
        assert!(config.sync.server_url.is_none());
    }
}
