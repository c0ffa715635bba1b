use fincra_core::cra::{
    ConfigStore, ConfigStoreError, EngineConfig, JsonFileConfigStore, ScorecardSet,
    ScorecardSource, ScorecardStore,
};
use fincra_core::error::AppError;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local configuration used when no config file is configured.
#[derive(Default, Clone)]
pub(crate) struct InMemoryConfigStore {
    config: Arc<Mutex<Option<EngineConfig>>>,
}

impl ConfigStore for InMemoryConfigStore {
    fn load(&self) -> Result<EngineConfig, ConfigStoreError> {
        let guard = self
            .config
            .lock()
            .map_err(|_| ConfigStoreError::Unavailable("config mutex poisoned".to_string()))?;
        Ok(guard.clone().unwrap_or_default())
    }

    fn save(&self, config: &EngineConfig) -> Result<(), ConfigStoreError> {
        let mut guard = self
            .config
            .lock()
            .map_err(|_| ConfigStoreError::Unavailable("config mutex poisoned".to_string()))?;
        *guard = Some(config.clone());
        Ok(())
    }
}

/// Config file when given, defaults otherwise.
pub(crate) fn load_engine_config(path: Option<&Path>) -> Result<EngineConfig, AppError> {
    match path {
        Some(path) => Ok(JsonFileConfigStore::new(path).load()?),
        None => Ok(EngineConfig::default()),
    }
}

/// Explicit directory when given, `CRA_SCORECARDS_DIR` otherwise.
pub(crate) fn load_scorecards(dir: Option<PathBuf>) -> Arc<ScorecardSet> {
    let source = dir
        .map(ScorecardSource::Directory)
        .unwrap_or_else(ScorecardSource::from_env);
    ScorecardStore::new(source).get()
}
