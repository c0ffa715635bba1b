use std::sync::Arc;

use serde_json::Value;

use super::batch::{self, BatchError, BatchReport};
use super::domain::{CraInput, CraOutput};
use super::engine_config::{EngineConfig, PartialEngineConfig};
use super::scorecards::ScorecardStore;
use super::store::{ConfigStore, ConfigStoreError};
use super::summary::RuleSetSummary;

/// Service composing the configuration store and the scorecard cache.
pub struct CraService<S> {
    store: Arc<S>,
    scorecards: Arc<ScorecardStore>,
}

impl<S> CraService<S>
where
    S: ConfigStore + 'static,
{
    pub fn new(store: Arc<S>, scorecards: Arc<ScorecardStore>) -> Self {
        Self { store, scorecards }
    }

    pub fn scorecards(&self) -> &ScorecardStore {
        &self.scorecards
    }

    /// Configuration currently saved in the store.
    pub fn active_config(&self) -> Result<EngineConfig, CraServiceError> {
        Ok(self.store.load()?)
    }

    /// A request-level config replaces the stored one for that call only.
    pub fn resolve_config(
        &self,
        requested: Option<PartialEngineConfig>,
    ) -> Result<EngineConfig, CraServiceError> {
        match requested {
            Some(partial) => Ok(EngineConfig::from_partial(partial)),
            None => self.active_config(),
        }
    }

    /// Score a single record.
    pub fn calculate(
        &self,
        input: &CraInput,
        config: Option<PartialEngineConfig>,
    ) -> Result<CraOutput, CraServiceError> {
        let config = self.resolve_config(config)?;
        let scorecards = self.scorecards.get();
        Ok(super::calculate_cra_with(input, &config, &scorecards))
    }

    /// Score a batch of raw records. Any non-object record rejects the whole batch.
    pub fn simulate(
        &self,
        records: Vec<Value>,
        config: Option<PartialEngineConfig>,
    ) -> Result<BatchReport, CraServiceError> {
        let records = batch::records_from_values(records)?;
        let config = self.resolve_config(config)?;
        let scorecards = self.scorecards.get();
        Ok(batch::simulate_batch(&records, &config, &scorecards))
    }

    /// Normalize and persist a new configuration, returning the stored value.
    pub fn update_config(
        &self,
        partial: PartialEngineConfig,
    ) -> Result<EngineConfig, CraServiceError> {
        let config = EngineConfig::from_partial(partial);
        self.store.save(&config)?;
        Ok(config)
    }

    pub fn ruleset(&self) -> Result<RuleSetSummary, CraServiceError> {
        let config = self.active_config()?;
        Ok(RuleSetSummary::from_config(&config))
    }
}

/// Error raised by the CRA service.
#[derive(Debug, thiserror::Error)]
pub enum CraServiceError {
    #[error(transparent)]
    Store(#[from] ConfigStoreError),
    #[error(transparent)]
    Batch(#[from] BatchError),
}
