//! Batch simulation: score many records against one configuration snapshot.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use super::domain::{CraInput, CraOutput};
use super::engine_config::EngineConfig;
use super::scorecards::ScorecardSet;

/// Records at or above this final score count as high risk in the summary.
pub const HIGH_RISK_THRESHOLD: u8 = 4;

/// Columns holding `;`-separated lists in CSV uploads.
const CSV_LIST_COLUMNS: [&str; 2] = ["sic_codes", "delivery_data.channels"];

/// Identifier and classification columns. Kept verbatim so codes like `01110` keep their
/// leading zeros and still hit their scorecard keys.
const CSV_TEXT_COLUMNS: [&str; 8] = [
    "record_id",
    "entity_name",
    "industry_code",
    "country_code",
    "domicile",
    "entity_type",
    "product_type",
    "product_data.type",
];

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("batch input must be a JSON array of records")]
    NotAnArray,
    #[error("record {index} is not a JSON object")]
    InvalidRecord { index: usize },
    #[error("batch input is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("batch CSV could not be read: {0}")]
    Csv(#[from] csv::Error),
    #[error("batch input could not be read: {0}")]
    Io(#[from] io::Error),
}

impl BatchError {
    /// Whether the caller supplied unusable data, as opposed to an I/O failure.
    pub fn is_bad_input(&self) -> bool {
        !matches!(self, BatchError::Io(_))
    }
}

/// Aggregate view of a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_records: usize,
    pub high_risk: usize,
    pub average_final_score: f64,
    pub overrides_applied: usize,
    pub by_band: BTreeMap<String, usize>,
}

impl BatchSummary {
    pub fn from_results(results: &[CraOutput]) -> Self {
        let total_records = results.len();
        let high_risk = results
            .iter()
            .filter(|result| result.final_score >= HIGH_RISK_THRESHOLD)
            .count();
        let overrides_applied = results
            .iter()
            .filter(|result| result.override_applied.is_some())
            .count();
        let average_final_score = if total_records == 0 {
            0.0
        } else {
            let total: f64 = results
                .iter()
                .map(|result| f64::from(result.final_score))
                .sum();
            total / total_records as f64
        };

        let mut by_band = BTreeMap::new();
        for result in results {
            *by_band.entry(result.risk_band.clone()).or_insert(0) += 1;
        }

        Self {
            total_records,
            high_risk,
            average_final_score,
            overrides_applied,
            by_band,
        }
    }
}

/// Results in input order plus the aggregate summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub generated_at: DateTime<Utc>,
    pub results: Vec<CraOutput>,
    pub summary: BatchSummary,
}

/// Score every record in parallel. Records are independent; output order matches input.
pub fn simulate_batch(
    records: &[CraInput],
    config: &EngineConfig,
    scorecards: &ScorecardSet,
) -> BatchReport {
    let results: Vec<CraOutput> = records
        .par_iter()
        .map(|record| super::calculate_cra_with(record, config, scorecards))
        .collect();
    let summary = BatchSummary::from_results(&results);

    info!(
        total = summary.total_records,
        high_risk = summary.high_risk,
        overrides = summary.overrides_applied,
        "batch simulation complete"
    );

    BatchReport {
        generated_at: Utc::now(),
        results,
        summary,
    }
}

/// Decode raw records, rejecting the batch if any element is not an object.
pub fn records_from_values(values: Vec<Value>) -> Result<Vec<CraInput>, BatchError> {
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            CraInput::from_value(value).map_err(|_| BatchError::InvalidRecord { index })
        })
        .collect()
}

pub fn records_from_json_reader<R: Read>(reader: R) -> Result<Vec<CraInput>, BatchError> {
    let value: Value = serde_json::from_reader(reader)?;
    match value {
        Value::Array(values) => records_from_values(values),
        _ => Err(BatchError::NotAnArray),
    }
}

/// CSV with a header row. Dotted headers build nested objects.
pub fn records_from_csv_reader<R: Read>(reader: R) -> Result<Vec<CraInput>, BatchError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let mut records = Vec::new();
    for (index, row) in csv_reader.records().enumerate() {
        let row = row?;
        let mut object = Map::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            if cell.is_empty() {
                continue;
            }
            let value = if CSV_LIST_COLUMNS.contains(&header) {
                list_cell(cell)
            } else if CSV_TEXT_COLUMNS.contains(&header) {
                Value::String(cell.to_string())
            } else {
                typed_cell(cell)
            };
            insert_path(&mut object, header, value);
        }
        let record = CraInput::from_value(Value::Object(object))
            .map_err(|_| BatchError::InvalidRecord { index })?;
        records.push(record);
    }

    Ok(records)
}

/// `.csv` files are read as CSV, everything else as a JSON array.
pub fn load_records(path: &Path) -> Result<Vec<CraInput>, BatchError> {
    let reader = BufReader::new(File::open(path)?);
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    if is_csv {
        records_from_csv_reader(reader)
    } else {
        records_from_json_reader(reader)
    }
}

fn typed_cell(cell: &str) -> Value {
    match cell.to_ascii_lowercase().as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(int) = cell.parse::<i64>() {
        return Value::from(int);
    }
    if let Ok(float) = cell.parse::<f64>() {
        if float.is_finite() {
            return Value::from(float);
        }
    }
    Value::String(cell.to_string())
}

fn list_cell(cell: &str) -> Value {
    Value::Array(
        cell.split(';')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| Value::String(item.to_string()))
            .collect(),
    )
}

fn insert_path(object: &mut Map<String, Value>, header: &str, value: Value) {
    match header.split_once('.') {
        Some((head, rest)) => {
            let child = object
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(child) = child {
                insert_path(child, rest, value);
            }
        }
        None => {
            object.insert(header.to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn csv_rows_become_typed_records() {
        let csv = "record_id,entity_name,country_code,pep_count,sanction_match,sic_codes,delivery_data.channels,product_data.type,notes\n\
R-1,Acme Ltd,GB,0,false,6419;1190,Online; Face to Face,Trade Finance,\n\
R-2,Blue Sky LLC,AE,2,TRUE,,,,escalated\n";

        let records = records_from_csv_reader(csv.as_bytes()).expect("csv parses");

        assert_eq!(records.len(), 2);
        let first = &records[0];
        assert_eq!(first.record_id.as_deref(), Some("R-1"));
        assert_eq!(first.pep_count, Some(0));
        assert_eq!(first.sanction_match, Some(false));
        assert_eq!(first.sic_codes, vec![6419, 1190]);
        assert_eq!(first.delivery_channels(), ["Online", "Face to Face"]);
        assert_eq!(first.product_key().as_deref(), Some("trade_finance"));

        let second = &records[1];
        assert_eq!(second.sanction_match, Some(true));
        assert_eq!(second.pep_count, Some(2));
        assert_eq!(second.extra.get("notes"), Some(&json!("escalated")));
    }

    #[test]
    fn csv_code_columns_keep_leading_zeros() {
        let csv = "record_id,industry_code,country_code,pep_count
007,01110,GB,03
";

        let records = records_from_csv_reader(csv.as_bytes()).expect("csv parses");

        let record = &records[0];
        assert_eq!(record.record_id.as_deref(), Some("007"));
        assert_eq!(record.industry_code.as_deref(), Some("01110"));
        assert_eq!(record.pep_count, Some(3));

        let scorecards = ScorecardSet::default().with(
            crate::cra::Pillar::Industry,
            crate::cra::scorecards::Scorecard::from_entries([("01110", 5.0)]),
        );
        let report = simulate_batch(&records, &EngineConfig::default(), &scorecards);
        assert_eq!(report.results[0].component_scores.ind, 5.0);
        assert_eq!(report.results[0].record_id, "007");
    }

    #[test]
    fn json_batch_must_be_an_array_of_objects() {
        let err = records_from_json_reader(r#"{"record_id": "x"}"#.as_bytes())
            .expect_err("object is not a batch");
        assert!(matches!(err, BatchError::NotAnArray));

        let err = records_from_json_reader(r#"[{"record_id": "x"}, 7]"#.as_bytes())
            .expect_err("number is not a record");
        assert!(matches!(err, BatchError::InvalidRecord { index: 1 }));
        assert!(err.is_bad_input());
    }

    #[test]
    fn summary_counts_bands_and_high_risk() {
        let config = EngineConfig::default().with_prohibited_countries(["IR"]);
        let records = vec![
            CraInput {
                record_id: Some("a".to_string()),
                country_code: Some("GB".to_string()),
                ..CraInput::default()
            },
            CraInput {
                record_id: Some("b".to_string()),
                country_code: Some("IR".to_string()),
                ..CraInput::default()
            },
            CraInput {
                record_id: Some("c".to_string()),
                pep_count: Some(1),
                ..CraInput::default()
            },
        ];

        let report = simulate_batch(&records, &config, &ScorecardSet::default());

        let ids: Vec<&str> = report
            .results
            .iter()
            .map(|result| result.record_id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(report.summary.total_records, 3);
        assert_eq!(report.summary.high_risk, 2);
        assert_eq!(report.summary.overrides_applied, 2);
        assert!((report.summary.average_final_score - 13.0 / 3.0).abs() < 1e-9);
        assert_eq!(report.summary.by_band.get("Very High Risk"), Some(&2));
        assert_eq!(report.summary.by_band.get("Medium Risk"), Some(&1));
    }

    #[test]
    fn empty_batch_has_zero_average() {
        let report = simulate_batch(&[], &EngineConfig::default(), &ScorecardSet::default());
        assert_eq!(report.summary.total_records, 0);
        assert_eq!(report.summary.average_final_score, 0.0);
        assert!(report.results.is_empty());
    }
}
