use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::bands;
use super::domain::Pillar;

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 5;

/// Relative importance of each pillar. Values need not sum to one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PillarWeights {
    pub geo: f64,
    pub ind: f64,
    pub ent: f64,
    pub prod: f64,
    pub deliv: f64,
}

impl PillarWeights {
    pub fn get(&self, pillar: Pillar) -> f64 {
        match pillar {
            Pillar::Geography => self.geo,
            Pillar::Industry => self.ind,
            Pillar::Entity => self.ent,
            Pillar::Product => self.prod,
            Pillar::Delivery => self.deliv,
        }
    }

    pub fn total(&self) -> f64 {
        Pillar::ALL.iter().map(|pillar| self.get(*pillar)).sum()
    }
}

impl Default for PillarWeights {
    fn default() -> Self {
        Self {
            geo: 0.30,
            ind: 0.15,
            ent: 0.20,
            prod: 0.30,
            deliv: 0.05,
        }
    }
}

/// Score used for a pillar when its scorecard has no answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDefaults {
    pub geo: u8,
    pub ind: u8,
    pub ent: u8,
    pub prod: u8,
    pub deliv: u8,
}

impl ComponentDefaults {
    pub fn get(&self, pillar: Pillar) -> u8 {
        match pillar {
            Pillar::Geography => self.geo,
            Pillar::Industry => self.ind,
            Pillar::Entity => self.ent,
            Pillar::Product => self.prod,
            Pillar::Delivery => self.deliv,
        }
    }

    pub fn uniform(score: u8) -> Self {
        let score = clamp_score_int(i64::from(score));
        Self {
            geo: score,
            ind: score,
            ent: score,
            prod: score,
            deliv: score,
        }
    }
}

impl Default for ComponentDefaults {
    fn default() -> Self {
        Self::uniform(3)
    }
}

/// Predicate family an override rule checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConditionType {
    GeographyProhibited,
    Sanctions,
    PepAm,
    ShellCompany,
    IndustryCbd,
    IndustryCrypto,
    BearerShares,
    AdultEntertainment,
    /// Kept verbatim so configs round-trip; never matches.
    Unknown(String),
}

impl ConditionType {
    pub fn as_str(&self) -> &str {
        match self {
            ConditionType::GeographyProhibited => "geography_prohibited",
            ConditionType::Sanctions => "sanctions",
            ConditionType::PepAm => "pep_am",
            ConditionType::ShellCompany => "shell_company",
            ConditionType::IndustryCbd => "industry_cbd",
            ConditionType::IndustryCrypto => "industry_crypto",
            ConditionType::BearerShares => "bearer_shares",
            ConditionType::AdultEntertainment => "adult_entertainment",
            ConditionType::Unknown(raw) => raw,
        }
    }

    pub fn label(&self) -> String {
        let label = match self {
            ConditionType::GeographyProhibited => "Geography prohibited",
            ConditionType::Sanctions => "Sanctions match",
            ConditionType::PepAm => "PEP or adverse media",
            ConditionType::ShellCompany => "Shell company indicators",
            ConditionType::IndustryCbd => "CBD/cannabis industry",
            ConditionType::IndustryCrypto => "Crypto industry",
            ConditionType::BearerShares => "Bearer shares",
            ConditionType::AdultEntertainment => "Adult entertainment industry",
            ConditionType::Unknown(raw) => return raw.replace('_', " "),
        };
        label.to_string()
    }
}

impl From<String> for ConditionType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "geography_prohibited" => ConditionType::GeographyProhibited,
            "sanctions" => ConditionType::Sanctions,
            "pep_am" => ConditionType::PepAm,
            "shell_company" => ConditionType::ShellCompany,
            "industry_cbd" => ConditionType::IndustryCbd,
            "industry_crypto" => ConditionType::IndustryCrypto,
            "bearer_shares" => ConditionType::BearerShares,
            "adult_entertainment" => ConditionType::AdultEntertainment,
            _ => ConditionType::Unknown(value),
        }
    }
}

impl From<ConditionType> for String {
    fn from(value: ConditionType) -> Self {
        match value {
            ConditionType::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Condition that forces the final score when it holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideRule {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub condition_type: ConditionType,
    pub result_score: i64,
    /// Lower values are evaluated first.
    pub priority: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

impl OverrideRule {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        condition_type: ConditionType,
        result_score: i64,
        priority: i64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            condition_type,
            result_score,
            priority,
            config: None,
        }
    }

    /// Rule score bounded to the score domain.
    pub fn bounded_score(&self) -> u8 {
        clamp_score_int(self.result_score)
    }
}

/// Named, inclusive score range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskBand {
    pub name: String,
    pub min: f64,
    pub max: f64,
}

impl RiskBand {
    pub fn new(name: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            min,
            max,
        }
    }

    pub fn contains(&self, score: u8) -> bool {
        let score = f64::from(score);
        score >= self.min && score <= self.max
    }
}

/// Complete, normalized configuration snapshot consumed by the engine.
///
/// Deserializing always goes through [`PartialEngineConfig`], so any value of this type has
/// been merged with the defaults and sanitized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "PartialEngineConfig")]
pub struct EngineConfig {
    pub weights: PillarWeights,
    pub component_defaults: ComponentDefaults,
    pub override_rules: Vec<OverrideRule>,
    pub risk_bands: Vec<RiskBand>,
    pub prohibited_countries: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weights: PillarWeights::default(),
            component_defaults: ComponentDefaults::default(),
            override_rules: default_override_rules(),
            risk_bands: default_risk_bands(),
            prohibited_countries: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Merge a partially specified config with the defaults and sanitize it.
    pub fn from_partial(partial: PartialEngineConfig) -> Self {
        let defaults = EngineConfig::default();

        let weights = partial
            .weights
            .map(|weights| weights.merge(defaults.weights))
            .unwrap_or(defaults.weights);
        let component_defaults = partial
            .component_defaults
            .map(|component| component.merge(defaults.component_defaults))
            .unwrap_or(defaults.component_defaults);
        let override_rules = partial.override_rules.unwrap_or(defaults.override_rules);
        let risk_bands = match partial.risk_bands {
            Some(bands) if !bands.is_empty() => bands,
            _ => defaults.risk_bands,
        };
        let prohibited_countries =
            normalize_countries(partial.prohibited_countries.unwrap_or_default());

        let config = Self {
            weights,
            component_defaults,
            override_rules,
            risk_bands,
            prohibited_countries,
        };
        config.log_warnings();
        config
    }

    pub fn with_prohibited_countries<I, S>(mut self, countries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prohibited_countries =
            normalize_countries(countries.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_prohibited(&self, country: &str) -> bool {
        self.prohibited_countries
            .iter()
            .any(|code| code.eq_ignore_ascii_case(country))
    }

    /// Override rules in evaluation order. Ties keep their configured order.
    pub fn rules_by_priority(&self) -> Vec<&OverrideRule> {
        let mut rules: Vec<&OverrideRule> = self.override_rules.iter().collect();
        rules.sort_by_key(|rule| rule.priority);
        rules
    }

    /// Settings that are legal but probably not what the editor intended.
    pub fn warnings(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.weights.total() <= 0.0 {
            warnings.push(ConfigWarning::ZeroWeightTotal);
        }

        warnings.extend(bands::coverage_warnings(&self.risk_bands));

        for rule in &self.override_rules {
            if rule.condition_type == ConditionType::GeographyProhibited {
                warnings.push(ConfigWarning::ShadowedGeographyRule {
                    rule: rule.name.clone(),
                });
            }
            if let ConditionType::Unknown(raw) = &rule.condition_type {
                warnings.push(ConfigWarning::UnknownCondition {
                    rule: rule.name.clone(),
                    condition: raw.clone(),
                });
            }
        }

        warnings
    }

    fn log_warnings(&self) {
        for warning in self.warnings() {
            match warning {
                // Present in the stock rule list.
                ConfigWarning::ShadowedGeographyRule { .. } => debug!(%warning, "cra config"),
                _ => warn!(%warning, "cra config"),
            }
        }
    }
}

impl From<PartialEngineConfig> for EngineConfig {
    fn from(value: PartialEngineConfig) -> Self {
        EngineConfig::from_partial(value)
    }
}

/// Wire and persisted form of the configuration; every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialEngineConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<PartialWeights>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_defaults: Option<PartialComponentDefaults>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_rules: Option<Vec<OverrideRule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_bands: Option<Vec<RiskBand>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prohibited_countries: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialWeights {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ind: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prod: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deliv: Option<f64>,
}

impl PartialWeights {
    fn merge(self, base: PillarWeights) -> PillarWeights {
        PillarWeights {
            geo: sanitize_weight(self.geo.unwrap_or(base.geo)),
            ind: sanitize_weight(self.ind.unwrap_or(base.ind)),
            ent: sanitize_weight(self.ent.unwrap_or(base.ent)),
            prod: sanitize_weight(self.prod.unwrap_or(base.prod)),
            deliv: sanitize_weight(self.deliv.unwrap_or(base.deliv)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialComponentDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ind: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ent: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prod: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deliv: Option<i64>,
}

impl PartialComponentDefaults {
    fn merge(self, base: ComponentDefaults) -> ComponentDefaults {
        let pick = |value: Option<i64>, fallback: u8| {
            value.map(clamp_score_int).unwrap_or(fallback)
        };
        ComponentDefaults {
            geo: pick(self.geo, base.geo),
            ind: pick(self.ind, base.ind),
            ent: pick(self.ent, base.ent),
            prod: pick(self.prod, base.prod),
            deliv: pick(self.deliv, base.deliv),
        }
    }
}

impl From<&EngineConfig> for PartialEngineConfig {
    fn from(config: &EngineConfig) -> Self {
        let weights = config.weights;
        let defaults = config.component_defaults;
        Self {
            weights: Some(PartialWeights {
                geo: Some(weights.geo),
                ind: Some(weights.ind),
                ent: Some(weights.ent),
                prod: Some(weights.prod),
                deliv: Some(weights.deliv),
            }),
            component_defaults: Some(PartialComponentDefaults {
                geo: Some(i64::from(defaults.geo)),
                ind: Some(i64::from(defaults.ind)),
                ent: Some(i64::from(defaults.ent)),
                prod: Some(i64::from(defaults.prod)),
                deliv: Some(i64::from(defaults.deliv)),
            }),
            override_rules: Some(config.override_rules.clone()),
            risk_bands: Some(config.risk_bands.clone()),
            prohibited_countries: Some(config.prohibited_countries.clone()),
        }
    }
}

/// Non-fatal configuration smell surfaced in logs and summaries.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigWarning {
    ZeroWeightTotal,
    BandGap { score: u8 },
    BandOverlap { score: u8, bands: Vec<String> },
    ShadowedGeographyRule { rule: String },
    UnknownCondition { rule: String, condition: String },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::ZeroWeightTotal => {
                write!(f, "pillar weights sum to zero; equal weights will be used")
            }
            ConfigWarning::BandGap { score } => {
                write!(f, "no risk band covers score {score}; the highest band will be reported")
            }
            ConfigWarning::BandOverlap { score, bands } => write!(
                f,
                "score {score} falls in several risk bands ({}); the lowest-starting band wins",
                bands.join(", ")
            ),
            ConfigWarning::ShadowedGeographyRule { rule } => write!(
                f,
                "override rule '{rule}' checks prohibited geography, which is always applied before the rule list"
            ),
            ConfigWarning::UnknownCondition { rule, condition } => write!(
                f,
                "override rule '{rule}' uses unknown condition '{condition}' and will never match"
            ),
        }
    }
}

pub fn default_override_rules() -> Vec<OverrideRule> {
    vec![
        OverrideRule::new(
            "ovr-geography",
            "Geography - Prohibited",
            ConditionType::GeographyProhibited,
            5,
            1,
        ),
        OverrideRule::new("ovr-sanctions", "Sanctions Match", ConditionType::Sanctions, 5, 2),
        OverrideRule::new("ovr-pep-am", "PEP / Adverse Media", ConditionType::PepAm, 5, 3),
        OverrideRule::new(
            "ovr-shell",
            "Shell Company Indicators",
            ConditionType::ShellCompany,
            5,
            4,
        ),
        OverrideRule::new(
            "ovr-cbd",
            "CBD / Cannabis Industry",
            ConditionType::IndustryCbd,
            5,
            5,
        ),
        OverrideRule::new(
            "ovr-crypto",
            "Crypto Industry",
            ConditionType::IndustryCrypto,
            4,
            6,
        ),
        OverrideRule::new(
            "ovr-bearer",
            "Bearer Shares",
            ConditionType::BearerShares,
            4,
            7,
        ),
        OverrideRule::new(
            "ovr-adult",
            "Adult Entertainment",
            ConditionType::AdultEntertainment,
            4,
            8,
        ),
    ]
}

pub fn default_risk_bands() -> Vec<RiskBand> {
    vec![
        RiskBand::new("Low Risk", 1.0, 1.0),
        RiskBand::new("Medium-Low Risk", 2.0, 2.0),
        RiskBand::new("Medium Risk", 3.0, 3.0),
        RiskBand::new("High Risk", 4.0, 4.0),
        RiskBand::new("Very High Risk", 5.0, 5.0),
    ]
}

pub(crate) fn clamp_score_int(value: i64) -> u8 {
    value.clamp(i64::from(MIN_SCORE), i64::from(MAX_SCORE)) as u8
}

pub(crate) fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        return f64::from(MIN_SCORE);
    }
    value.clamp(f64::from(MIN_SCORE), f64::from(MAX_SCORE))
}

fn sanitize_weight(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}

fn normalize_countries(countries: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    countries
        .into_iter()
        .map(|code| code.trim().to_ascii_uppercase())
        .filter(|code| !code.is_empty())
        .filter(|code| seen.insert(code.clone()))
        .collect()
}
