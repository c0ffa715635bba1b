//! Compliance Risk Assessment engine.
//!
//! `calculate_cra` turns one record plus a configuration snapshot into a 1–5 score, a band
//! and a findings list. Scoring is pure apart from the one-time scorecard load, so records
//! can be scored from any number of threads without coordination.

pub mod bands;
pub mod batch;
pub mod components;
pub mod domain;
pub mod engine_config;
pub mod findings;
mod lenient;
pub mod overrides;
pub mod router;
pub mod scorecards;
pub mod service;
pub mod store;
pub mod summary;
pub mod weights;

#[cfg(test)]
mod tests;

use std::sync::Arc;

pub use batch::{simulate_batch, BatchError, BatchReport, BatchSummary};
pub use domain::{
    CraInput, CraOutput, DeliveryData, InputError, Pillar, PillarScores, ProductData,
};
pub use engine_config::{
    ComponentDefaults, ConditionType, ConfigWarning, EngineConfig, OverrideRule,
    PartialEngineConfig, PillarWeights, RiskBand,
};
pub use overrides::{AppliedOverride, OverrideSource, GEOGRAPHY_PROHIBITED};
pub use router::cra_router;
pub use scorecards::{Scorecard, ScorecardSet, ScorecardSource, ScorecardStore};
pub use service::{CraService, CraServiceError};
pub use store::{ConfigStore, ConfigStoreError, JsonFileConfigStore};
pub use summary::RuleSetSummary;

use domain::{UNKNOWN_ENTITY_NAME, UNKNOWN_RECORD_ID};

/// Scores records against a fixed set of scorecard tables.
#[derive(Debug, Clone)]
pub struct CraEngine {
    scorecards: Arc<ScorecardSet>,
}

impl CraEngine {
    pub fn new(scorecards: Arc<ScorecardSet>) -> Self {
        Self { scorecards }
    }

    /// Engine over the process-wide scorecard store.
    pub fn from_global() -> Self {
        Self::new(scorecards::global().get())
    }

    pub fn scorecards(&self) -> &ScorecardSet {
        &self.scorecards
    }

    pub fn assess(&self, input: &CraInput, config: &EngineConfig) -> CraOutput {
        calculate_cra_with(input, config, &self.scorecards)
    }
}

/// Score one record using the process-wide scorecard store.
pub fn calculate_cra(input: &CraInput, config: &EngineConfig) -> CraOutput {
    CraEngine::from_global().assess(input, config)
}

/// Score one record against explicit scorecards.
pub fn calculate_cra_with(
    input: &CraInput,
    config: &EngineConfig,
    scorecards: &ScorecardSet,
) -> CraOutput {
    let component_scores =
        components::score_components(input, &config.component_defaults, scorecards);
    let pre_override_score = weights::pre_override_score(&config.weights, &component_scores);

    let decision = overrides::evaluate_overrides(input, config, pre_override_score);
    let findings = findings::collect_findings(input, config, decision.applied.as_ref());
    let risk_band = bands::band_for(decision.final_score, &config.risk_bands);

    CraOutput {
        record_id: input
            .record_id
            .clone()
            .unwrap_or_else(|| UNKNOWN_RECORD_ID.to_string()),
        entity_name: input
            .entity_name
            .clone()
            .unwrap_or_else(|| UNKNOWN_ENTITY_NAME.to_string()),
        final_score: decision.final_score,
        risk_band,
        pre_override_score,
        override_applied: decision.applied.map(|applied| applied.name),
        findings,
        component_scores,
    }
}
