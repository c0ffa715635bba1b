use super::domain::CraInput;
use super::engine_config::EngineConfig;
use super::overrides::AppliedOverride;

/// Jurisdiction the engine treats as domestic.
pub const DOMESTIC_JURISDICTION: &str = "GB";

/// Human-readable audit trail. Order: override, sanctions, PEP, prohibited country,
/// non-domestic jurisdiction. Findings never feed back into scoring.
pub fn collect_findings(
    input: &CraInput,
    config: &EngineConfig,
    applied: Option<&AppliedOverride>,
) -> Vec<String> {
    let mut findings = Vec::new();

    if let Some(applied) = applied {
        findings.push(format!("Override: {} → score {}", applied.name, applied.score));
    }

    if input.sanction_match == Some(true) {
        findings.push("Direct Sanctions List match".to_string());
    }

    let pep_count = input.pep_count();
    if pep_count > 0 {
        findings.push(format!("{pep_count} PEP associations found"));
    }

    if let Some(country) = input.resolved_country() {
        if config.is_prohibited(&country) {
            findings.push("Geography - Prohibited country".to_string());
        }
        if country != DOMESTIC_JURISDICTION {
            findings.push("Non-UK jurisdiction".to_string());
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cra::overrides::OverrideSource;

    #[test]
    fn findings_follow_fixed_order() {
        let config = EngineConfig::default().with_prohibited_countries(["IR"]);
        let input = CraInput {
            country_code: Some("IR".to_string()),
            sanction_match: Some(true),
            pep_count: Some(2),
            ..CraInput::default()
        };
        let applied = AppliedOverride {
            name: "Geography - Prohibited".to_string(),
            score: 5,
            source: OverrideSource::ProhibitedGeography,
        };

        assert_eq!(
            collect_findings(&input, &config, Some(&applied)),
            vec![
                "Override: Geography - Prohibited → score 5",
                "Direct Sanctions List match",
                "2 PEP associations found",
                "Geography - Prohibited country",
                "Non-UK jurisdiction",
            ]
        );
    }

    #[test]
    fn domestic_record_without_flags_has_no_findings() {
        let input = CraInput {
            country_code: Some("gb".to_string()),
            pep_count: Some(0),
            sanction_match: Some(false),
            ..CraInput::default()
        };
        assert!(collect_findings(&input, &EngineConfig::default(), None).is_empty());
    }

    #[test]
    fn missing_country_adds_no_jurisdiction_finding() {
        let input = CraInput::default();
        assert!(collect_findings(&input, &EngineConfig::default(), None).is_empty());
    }
}
