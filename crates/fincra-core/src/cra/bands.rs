use tracing::warn;

use super::engine_config::{ConfigWarning, RiskBand, MAX_SCORE, MIN_SCORE};

/// Reported when no bands are configured at all.
pub const UNKNOWN_BAND: &str = "Unknown";

fn sorted(bands: &[RiskBand]) -> Vec<&RiskBand> {
    let mut sorted: Vec<&RiskBand> = bands.iter().collect();
    sorted.sort_by(|a, b| a.min.total_cmp(&b.min));
    sorted
}

/// Name of the first band (ascending by `min`) containing `score`.
///
/// A score outside every band maps to the last band in sorted order.
pub fn band_for(score: u8, bands: &[RiskBand]) -> String {
    let sorted = sorted(bands);

    if let Some(band) = sorted.iter().find(|band| band.contains(score)) {
        return band.name.clone();
    }

    match sorted.last() {
        Some(band) => {
            warn!(score, band = %band.name, "no risk band contains score; using highest band");
            band.name.clone()
        }
        None => UNKNOWN_BAND.to_string(),
    }
}

/// Gaps and overlaps of the bands over the integer score domain.
pub(crate) fn coverage_warnings(bands: &[RiskBand]) -> Vec<ConfigWarning> {
    let sorted = sorted(bands);
    let mut warnings = Vec::new();

    for score in MIN_SCORE..=MAX_SCORE {
        let covering: Vec<String> = sorted
            .iter()
            .filter(|band| band.contains(score))
            .map(|band| band.name.clone())
            .collect();

        match covering.len() {
            0 => warnings.push(ConfigWarning::BandGap { score }),
            1 => {}
            _ => warnings.push(ConfigWarning::BandOverlap {
                score,
                bands: covering,
            }),
        }
    }

    warnings
}
