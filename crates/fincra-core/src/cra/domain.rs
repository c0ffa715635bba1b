use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::lenient;

/// Record id reported when the input does not carry one.
pub const UNKNOWN_RECORD_ID: &str = "unknown";
/// Entity name reported when the input does not carry one.
pub const UNKNOWN_ENTITY_NAME: &str = "Unknown Entity";

/// One entity or transaction submitted for a compliance risk assessment.
///
/// All known fields are optional. Values of the wrong JSON type are treated as absent and
/// unrecognized keys are kept in `extra`, so callers can pass raw records straight through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CraInput {
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,

    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub domicile: Option<String>,

    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub industry_code: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub industry_description: Option<String>,
    #[serde(default, deserialize_with = "lenient::integer_list", skip_serializing_if = "Vec::is_empty")]
    pub sic_codes: Vec<i64>,

    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,

    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::nested", skip_serializing_if = "Option::is_none")]
    pub product_data: Option<ProductData>,
    #[serde(default, deserialize_with = "lenient::nested", skip_serializing_if = "Option::is_none")]
    pub delivery_data: Option<DeliveryData>,

    #[serde(default, deserialize_with = "lenient::boolean", skip_serializing_if = "Option::is_none")]
    pub sanction_match: Option<bool>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub sanction_likelihood: Option<f64>,
    #[serde(default, deserialize_with = "lenient::integer", skip_serializing_if = "Option::is_none")]
    pub pep_count: Option<i64>,
    #[serde(default, deserialize_with = "lenient::boolean", skip_serializing_if = "Option::is_none")]
    pub has_pep: Option<bool>,
    #[serde(default, deserialize_with = "lenient::boolean", skip_serializing_if = "Option::is_none")]
    pub has_adverse_media: Option<bool>,
    #[serde(default, deserialize_with = "lenient::boolean", skip_serializing_if = "Option::is_none")]
    pub geography_prohibited: Option<bool>,
    #[serde(default, deserialize_with = "lenient::boolean", skip_serializing_if = "Option::is_none")]
    pub bearer_shares: Option<bool>,

    #[serde(default, deserialize_with = "lenient::boolean", skip_serializing_if = "Option::is_none")]
    pub has_employees: Option<bool>,
    #[serde(default, deserialize_with = "lenient::boolean", skip_serializing_if = "Option::is_none")]
    pub has_premises: Option<bool>,
    #[serde(default, deserialize_with = "lenient::boolean", skip_serializing_if = "Option::is_none")]
    pub has_cais: Option<bool>,
    #[serde(default, deserialize_with = "lenient::boolean", skip_serializing_if = "Option::is_none")]
    pub has_pp: Option<bool>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Product block nested in some upstream feeds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductData {
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Delivery channels through which the product reaches the customer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryData {
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub channels: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl CraInput {
    /// Decode a raw JSON value. Only a non-object top level is rejected.
    pub fn from_value(value: Value) -> Result<Self, InputError> {
        if !value.is_object() {
            return Err(InputError::NotAnObject {
                found: json_kind(&value),
            });
        }
        serde_json::from_value(value).map_err(InputError::Malformed)
    }

    /// Upper-cased country code, falling back to the domicile when the code is blank.
    pub fn resolved_country(&self) -> Option<String> {
        first_non_blank([self.country_code.as_deref(), self.domicile.as_deref()])
            .map(|code| code.to_ascii_uppercase())
    }

    pub fn trimmed_entity_type(&self) -> Option<&str> {
        first_non_blank([self.entity_type.as_deref()])
    }

    /// Product key in scorecard form, e.g. `"Trade Finance"` becomes `"trade_finance"`.
    pub fn product_key(&self) -> Option<String> {
        let nested = self
            .product_data
            .as_ref()
            .and_then(|data| data.kind.as_deref());
        first_non_blank([self.product_type.as_deref(), nested]).map(scorecard_key)
    }

    pub fn delivery_channels(&self) -> &[String] {
        self.delivery_data
            .as_ref()
            .map(|data| data.channels.as_slice())
            .unwrap_or(&[])
    }

    pub fn pep_count(&self) -> i64 {
        self.pep_count.unwrap_or(0)
    }
}

/// Lower-case and collapse whitespace runs into underscores.
pub(crate) fn scorecard_key(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

fn first_non_blank<'a, const N: usize>(candidates: [Option<&'a str>; N]) -> Option<&'a str> {
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Raised only when the caller hands the engine something that is not a record at all.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("input must be a JSON object, found {found}")]
    NotAnObject { found: &'static str },
    #[error("input could not be decoded: {0}")]
    Malformed(#[source] serde_json::Error),
}

/// The five scoring dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pillar {
    Geography,
    Industry,
    Entity,
    Product,
    Delivery,
}

impl Pillar {
    pub const ALL: [Pillar; 5] = [
        Pillar::Geography,
        Pillar::Industry,
        Pillar::Entity,
        Pillar::Product,
        Pillar::Delivery,
    ];

    /// Name of the scorecard table backing this pillar.
    pub fn table_name(self) -> &'static str {
        match self {
            Pillar::Geography => "geography",
            Pillar::Industry => "industry",
            Pillar::Entity => "entity",
            Pillar::Product => "product",
            Pillar::Delivery => "delivery",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Pillar::Geography => "Geography",
            Pillar::Industry => "Industry",
            Pillar::Entity => "Entity",
            Pillar::Product => "Product",
            Pillar::Delivery => "Delivery",
        }
    }
}

impl fmt::Display for Pillar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Resolved per-pillar scores, each within [1,5].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PillarScores {
    pub geo: f64,
    pub ind: f64,
    pub ent: f64,
    pub prod: f64,
    pub deliv: f64,
}

impl PillarScores {
    pub fn get(&self, pillar: Pillar) -> f64 {
        match pillar {
            Pillar::Geography => self.geo,
            Pillar::Industry => self.ind,
            Pillar::Entity => self.ent,
            Pillar::Product => self.prod,
            Pillar::Delivery => self.deliv,
        }
    }
}

/// Assessment result handed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CraOutput {
    pub record_id: String,
    pub entity_name: String,
    pub final_score: u8,
    pub risk_band: String,
    pub pre_override_score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_applied: Option<String>,
    pub findings: Vec<String>,
    pub component_scores: PillarScores,
}
