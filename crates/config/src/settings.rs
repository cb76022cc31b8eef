// Service settings
// Loaded from ~/.config/repd/settings.toml

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use repd_io::RegistryFormat;
use repd_recon::{MatchConfig, DEFAULT_SOURCE};

const APP_DIR: &str = "repd";
const SETTINGS_FILE: &str = "settings.toml";
const DEFAULT_REGISTRY_FILE: &str = "repd.db";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Where the registry lives and how to read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistrySettings {
    /// Registry file. Defaults to `<data dir>/repd/repd.db`.
    pub path: Option<PathBuf>,
    /// Inferred from the file extension when unset.
    pub format: Option<RegistryFormat>,
    /// Cache key the registry is stored under.
    pub source_key: String,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            path: None,
            format: None,
            source_key: DEFAULT_SOURCE.into(),
        }
    }
}

impl RegistrySettings {
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join(DEFAULT_REGISTRY_FILE)
    }

    pub fn effective_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(Self::default_path)
    }

    pub fn effective_format(&self) -> RegistryFormat {
        self.format
            .unwrap_or_else(|| RegistryFormat::from_path(&self.effective_path()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { level: "info".into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub registry: RegistrySettings,
    /// `[matching]` table. Its source key comes from `[registry]`.
    pub matching: MatchConfig,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join(SETTINGS_FILE)
    }

    /// Load from the platform config dir. A missing file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load from `path`. A missing file yields defaults; a malformed one is an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let settings: Settings = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.match_config()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Invalid("logging.level must not be empty".into()));
        }
        Ok(())
    }

    /// Engine tunables with the registry source key applied.
    pub fn match_config(&self) -> MatchConfig {
        self.matching.clone().with_source(self.registry.source_key.clone())
    }

    /// Get the config file path for display
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("settings.toml")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.match_config(), MatchConfig::default());
    }

    #[test]
    fn full_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(
            &path,
            r#"
[registry]
path = "/srv/repd/repd-q2.csv"
source_key = "repd-q2"

[matching]
default_limit = 5
min_candidates = 20

[logging]
level = "repd_recon=debug"
"#,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.registry.effective_path(), PathBuf::from("/srv/repd/repd-q2.csv"));
        assert_eq!(settings.registry.effective_format(), RegistryFormat::Csv);

        let config = settings.match_config();
        assert_eq!(config.source, "repd-q2");
        assert_eq!(config.default_limit, 5);
        assert_eq!(config.min_candidates, 20);
        assert!(config.parallel);
        assert_eq!(settings.logging.level, "repd_recon=debug");
    }

    #[test]
    fn explicit_format_wins() {
        let settings: Settings = toml::from_str(
            r#"
[registry]
path = "registry.dat"
format = "csv"
"#,
        )
        .unwrap();
        assert_eq!(settings.registry.effective_format(), RegistryFormat::Csv);
    }

    #[test]
    fn default_registry_is_sqlite() {
        let settings = Settings::default();
        assert!(settings.registry.effective_path().ends_with("repd/repd.db"));
        assert_eq!(settings.registry.effective_format(), RegistryFormat::Sqlite);
    }

    #[test]
    fn malformed_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "[matching\ndefault_limit = 5").unwrap();
        assert!(matches!(Settings::load_from(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn matching_source_key_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "[matching]\nsource = \"tec\"\n").unwrap();
        assert!(matches!(Settings::load_from(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn unknown_key_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "[matching]\nname_weight = 0.9\n").unwrap();
        assert!(Settings::load_from(&path).is_err());
    }

    #[test]
    fn out_of_range_values_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");

        fs::write(&path, "[matching]\ndefault_limit = 0\n").unwrap();
        assert!(matches!(Settings::load_from(&path), Err(ConfigError::Invalid(_))));

        fs::write(&path, "[registry]\nsource_key = \"  \"\n").unwrap();
        assert!(matches!(Settings::load_from(&path), Err(ConfigError::Invalid(_))));
    }
}
