use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

use super::engine_config::{EngineConfig, PartialEngineConfig};

/// Persistence boundary for the engine configuration edited in the rule builder.
pub trait ConfigStore: Send + Sync {
    fn load(&self) -> Result<EngineConfig, ConfigStoreError>;
    fn save(&self, config: &EngineConfig) -> Result<(), ConfigStoreError>;
}

/// Error enumeration for configuration store failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigStoreError {
    #[error("unable to access engine config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("engine config at {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unable to encode engine config: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("config store unavailable: {0}")]
    Unavailable(String),
}

/// JSON file on disk. A missing file means "use the defaults".
#[derive(Debug, Clone)]
pub struct JsonFileConfigStore {
    path: PathBuf,
}

impl JsonFileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for JsonFileConfigStore {
    fn load(&self) -> Result<EngineConfig, ConfigStoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no stored engine config; using defaults");
                return Ok(EngineConfig::default());
            }
            Err(source) => {
                return Err(ConfigStoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let partial: PartialEngineConfig =
            serde_json::from_str(&raw).map_err(|source| ConfigStoreError::Parse {
                path: self.path.clone(),
                source,
            })?;
        Ok(EngineConfig::from_partial(partial))
    }

    fn save(&self, config: &EngineConfig) -> Result<(), ConfigStoreError> {
        let encoded = serde_json::to_string_pretty(config).map_err(ConfigStoreError::Encode)?;
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ConfigStoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&self.path, encoded).map_err(|source| ConfigStoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cra::engine_config::{ConditionType, OverrideRule};

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = JsonFileConfigStore::new(dir.path().join("engine.json"));
        assert_eq!(store.load().expect("defaults"), EngineConfig::default());
    }

    #[test]
    fn partial_file_is_merged_with_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("engine.json");
        fs::write(&path, r#"{ "weights": { "deliv": 0.5 }, "prohibitedCountries": ["ir"] }"#)
            .expect("write config");

        let config = JsonFileConfigStore::new(&path).load().expect("loads");
        assert_eq!(config.weights.deliv, 0.5);
        assert_eq!(config.weights.geo, 0.30);
        assert_eq!(config.prohibited_countries, vec!["IR"]);
    }

    #[test]
    fn garbled_file_is_a_parse_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("engine.json");
        fs::write(&path, "{ weights: ").expect("write config");

        let err = JsonFileConfigStore::new(&path)
            .load()
            .expect_err("invalid json");
        assert!(matches!(err, ConfigStoreError::Parse { .. }));
    }

    #[test]
    fn save_then_load_preserves_config() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = JsonFileConfigStore::new(dir.path().join("nested").join("engine.json"));
        let mut config = EngineConfig::default().with_prohibited_countries(["KP"]);
        config.override_rules.push(OverrideRule::new(
            "custom",
            "Custom",
            ConditionType::Unknown("cash_intensive".to_string()),
            4,
            20,
        ));

        store.save(&config).expect("saves");
        assert_eq!(store.load().expect("loads"), config);
    }
}
