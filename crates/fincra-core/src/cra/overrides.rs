//! Override evaluation.
//!
//! Two phases, always in this order:
//! 1. the absolute prohibited-geography check, which is not part of the configurable list;
//! 2. the configured rules, ascending by priority, first match wins.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use super::domain::CraInput;
use super::engine_config::{ConditionType, EngineConfig, OverrideRule, MAX_SCORE};

/// Name recorded when the absolute geography check fires.
pub const GEOGRAPHY_PROHIBITED: &str = "Geography - Prohibited";

const SANCTION_LIKELIHOOD_THRESHOLD: f64 = 99.0;

const ADULT_ENTERTAINMENT_SIC: [i64; 8] = [1312, 1370, 1373, 64705, 9001, 9002, 9003, 9004];

const CBD_CANNABIS_SIC: [i64; 11] = [
    1190, 1200, 1210, 1220, 1230, 1240, 1250, 1260, 1270, 1280, 1290,
];

static CBD_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)cannabis|cbd|cannabidiol|marijuana|hemp").expect("valid keyword pattern")
});

/// Which phase produced an override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OverrideSource {
    ProhibitedGeography,
    Rule { id: String, priority: i64 },
}

/// Override that replaced the weighted score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedOverride {
    pub name: String,
    pub score: u8,
    pub source: OverrideSource,
}

/// Outcome of the override stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideDecision {
    pub final_score: u8,
    pub applied: Option<AppliedOverride>,
}

pub fn evaluate_overrides(
    input: &CraInput,
    config: &EngineConfig,
    pre_override_score: u8,
) -> OverrideDecision {
    if geography_prohibited(input, config) {
        debug!(override_name = GEOGRAPHY_PROHIBITED, "absolute geography override applied");
        return OverrideDecision {
            final_score: MAX_SCORE,
            applied: Some(AppliedOverride {
                name: GEOGRAPHY_PROHIBITED.to_string(),
                score: MAX_SCORE,
                source: OverrideSource::ProhibitedGeography,
            }),
        };
    }

    match first_matching_rule(input, config) {
        Some(rule) => {
            let score = rule.bounded_score();
            debug!(
                rule_id = %rule.id,
                priority = rule.priority,
                score,
                "override rule applied"
            );
            OverrideDecision {
                final_score: score,
                applied: Some(AppliedOverride {
                    name: rule.name.clone(),
                    score,
                    source: OverrideSource::Rule {
                        id: rule.id.clone(),
                        priority: rule.priority,
                    },
                }),
            }
        }
        None => OverrideDecision {
            final_score: pre_override_score,
            applied: None,
        },
    }
}

pub fn first_matching_rule<'a>(
    input: &CraInput,
    config: &'a EngineConfig,
) -> Option<&'a OverrideRule> {
    config
        .rules_by_priority()
        .into_iter()
        .find(|rule| condition_holds(&rule.condition_type, input, config))
}

/// Explicit flag, or the resolved country is on the prohibited list.
pub fn geography_prohibited(input: &CraInput, config: &EngineConfig) -> bool {
    if input.geography_prohibited == Some(true) {
        return true;
    }
    input
        .resolved_country()
        .is_some_and(|country| config.is_prohibited(&country))
}

pub fn condition_holds(condition: &ConditionType, input: &CraInput, config: &EngineConfig) -> bool {
    match condition {
        ConditionType::GeographyProhibited => geography_prohibited(input, config),
        ConditionType::Sanctions => {
            input.sanction_match == Some(true)
                || input
                    .sanction_likelihood
                    .is_some_and(|likelihood| likelihood >= SANCTION_LIKELIHOOD_THRESHOLD)
        }
        ConditionType::PepAm => {
            input.pep_count() > 0
                || input.has_pep == Some(true)
                || input.has_adverse_media == Some(true)
        }
        ConditionType::ShellCompany => [
            input.has_employees,
            input.has_premises,
            input.has_cais,
            input.has_pp,
        ]
        .iter()
        .all(|flag| *flag == Some(false)),
        ConditionType::IndustryCbd => {
            input
                .sic_codes
                .iter()
                .any(|sic| CBD_CANNABIS_SIC.contains(sic))
                || input
                    .industry_description
                    .as_deref()
                    .is_some_and(|description| CBD_KEYWORDS.is_match(description))
        }
        ConditionType::IndustryCrypto => input
            .industry_description
            .as_deref()
            .is_some_and(|description| description.to_lowercase().contains("crypto")),
        ConditionType::BearerShares => input.bearer_shares == Some(true),
        ConditionType::AdultEntertainment => input
            .sic_codes
            .iter()
            .any(|sic| ADULT_ENTERTAINMENT_SIC.contains(sic)),
        ConditionType::Unknown(_) => false,
    }
}
