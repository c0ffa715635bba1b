use serde::Serialize;

use super::engine_config::{ConditionType, EngineConfig, RiskBand};

const INTRO: &str = "Your risk score (1–5) is computed from five factors (Geography, Industry, Entity, Product, Delivery) using your chosen weights. Overrides are applied in priority order; the first match sets the score. The score is then mapped to a risk band.";

const GEOGRAPHY_FIRST: &str = "We first check if the entity is in a prohibited country; if yes, score = 5 and we stop. Otherwise we apply the override rules below in order (first match wins).";

/// Plain-language description of a configuration, for reviewers and the rule editor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleSetSummary {
    pub intro: String,
    pub weights: String,
    pub geography_first: String,
    pub overrides: Vec<OverrideSummary>,
    pub risk_bands: String,
    pub prohibited_countries: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverrideSummary {
    pub priority: i64,
    pub name: String,
    pub condition_label: String,
    pub result_score: i64,
    /// Rule can never fire because the absolute geography check runs first.
    pub shadowed: bool,
}

impl RuleSetSummary {
    pub fn from_config(config: &EngineConfig) -> Self {
        let weights = &config.weights;
        let defaults = &config.component_defaults;
        let weights_text = format!(
            "Geography {}%, Industry {}%, Entity {}%, Product {}%, Delivery {}%. Default score per factor when not found: Geography {}, Industry {}, Entity {}, Product {}, Delivery {}.",
            percent(weights.geo),
            percent(weights.ind),
            percent(weights.ent),
            percent(weights.prod),
            percent(weights.deliv),
            defaults.geo,
            defaults.ind,
            defaults.ent,
            defaults.prod,
            defaults.deliv,
        );

        let overrides = config
            .rules_by_priority()
            .into_iter()
            .map(|rule| OverrideSummary {
                priority: rule.priority,
                name: rule.name.clone(),
                condition_label: rule.condition_type.label(),
                result_score: rule.result_score,
                shadowed: rule.condition_type == ConditionType::GeographyProhibited,
            })
            .collect();

        let prohibited_countries = if config.prohibited_countries.is_empty() {
            "None".to_string()
        } else {
            config.prohibited_countries.join(", ")
        };

        Self {
            intro: INTRO.to_string(),
            weights: weights_text,
            geography_first: GEOGRAPHY_FIRST.to_string(),
            overrides,
            risk_bands: describe_bands(&config.risk_bands),
            prohibited_countries,
        }
    }
}

fn percent(weight: f64) -> i64 {
    (weight * 100.0).round() as i64
}

fn describe_bands(bands: &[RiskBand]) -> String {
    if bands.is_empty() {
        return "No risk bands configured.".to_string();
    }

    let mut sorted: Vec<&RiskBand> = bands.iter().collect();
    sorted.sort_by(|a, b| a.min.total_cmp(&b.min));
    sorted
        .iter()
        .map(|band| format!("{} ({}–{})", band.name, band.min, band.max))
        .collect::<Vec<_>>()
        .join(", ")
}
