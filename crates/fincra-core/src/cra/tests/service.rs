use super::common::*;
use serde_json::json;
use std::sync::Arc;

use crate::cra::engine_config::{ConditionType, PartialEngineConfig};
use crate::cra::scorecards::ScorecardStore;
use crate::cra::{BatchError, CraInput, CraService, CraServiceError, GEOGRAPHY_PROHIBITED};

fn partial(value: serde_json::Value) -> PartialEngineConfig {
    serde_json::from_value(value).expect("partial config decodes")
}

#[test]
fn calculate_uses_the_stored_config_when_none_is_supplied() {
    let (service, store) = build_service();
    service
        .update_config(partial(json!({ "prohibitedCountries": [" gb "] })))
        .expect("config saves");
    assert_eq!(
        store.saved().expect("stored").prohibited_countries,
        vec!["GB"]
    );

    let record = CraInput::from_value(harbour_trade_input()).expect("decodes");
    let output = service.calculate(&record, None).expect("scores");

    assert_eq!(output.override_applied.as_deref(), Some(GEOGRAPHY_PROHIBITED));
}

#[test]
fn request_config_takes_precedence_over_the_stored_one() {
    let (service, _) = build_service();
    service
        .update_config(partial(json!({ "prohibitedCountries": ["GB"] })))
        .expect("config saves");

    let record = CraInput::from_value(harbour_trade_input()).expect("decodes");
    let output = service
        .calculate(&record, Some(PartialEngineConfig::default()))
        .expect("scores");

    assert!(output.override_applied.is_none());
    assert_eq!(output.final_score, 4);
}

#[test]
fn simulate_rejects_non_object_records_before_scoring() {
    let (service, _) = build_service();

    match service.simulate(vec![harbour_trade_input(), json!("CRA-2")], None) {
        Err(CraServiceError::Batch(BatchError::InvalidRecord { index: 1 })) => {}
        other => panic!("expected invalid record error, got {other:?}"),
    }
}

#[test]
fn simulate_preserves_record_order() {
    let (service, _) = build_service();
    let records = (0..40)
        .map(|n| json!({ "record_id": format!("CRA-{n:03}"), "pep_count": n % 3 }))
        .collect();

    let report = service.simulate(records, None).expect("batch scores");

    assert_eq!(report.results.len(), 40);
    for (n, result) in report.results.iter().enumerate() {
        assert_eq!(result.record_id, format!("CRA-{n:03}"));
    }
    assert_eq!(report.summary.overrides_applied, 26);
}

#[test]
fn store_failures_surface_as_store_errors() {
    let service = CraService::new(
        Arc::new(UnavailableConfigStore),
        Arc::new(ScorecardStore::inline(scorecards())),
    );

    assert!(matches!(
        service.ruleset(),
        Err(CraServiceError::Store(_))
    ));
    assert!(matches!(
        service.update_config(PartialEngineConfig::default()),
        Err(CraServiceError::Store(_))
    ));
}

#[test]
fn ruleset_describes_the_active_config() {
    let (service, _) = build_service();
    service
        .update_config(partial(json!({
            "overrideRules": [
                { "id": "r1", "name": "Crypto", "conditionType": "industry_crypto", "resultScore": 4, "priority": 1 }
            ],
            "prohibitedCountries": ["KP", "IR"]
        })))
        .expect("config saves");

    let summary = service.ruleset().expect("summary builds");

    assert_eq!(summary.overrides.len(), 1);
    assert_eq!(
        summary.overrides[0].condition_label,
        ConditionType::IndustryCrypto.label()
    );
    assert_eq!(summary.prohibited_countries, "KP, IR");
}
