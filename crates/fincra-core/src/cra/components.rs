use super::domain::{scorecard_key, CraInput, Pillar, PillarScores};
use super::engine_config::{clamp_score, ComponentDefaults};
use super::scorecards::{Scorecard, ScorecardSet};

/// Resolve all five pillar scores for one record.
pub fn score_components(
    input: &CraInput,
    defaults: &ComponentDefaults,
    scorecards: &ScorecardSet,
) -> PillarScores {
    PillarScores {
        geo: score_pillar(Pillar::Geography, input, defaults, scorecards),
        ind: score_pillar(Pillar::Industry, input, defaults, scorecards),
        ent: score_pillar(Pillar::Entity, input, defaults, scorecards),
        prod: score_pillar(Pillar::Product, input, defaults, scorecards),
        deliv: score_pillar(Pillar::Delivery, input, defaults, scorecards),
    }
}

pub fn score_pillar(
    pillar: Pillar,
    input: &CraInput,
    defaults: &ComponentDefaults,
    scorecards: &ScorecardSet,
) -> f64 {
    let default = f64::from(defaults.get(pillar));
    let card = scorecards.get(pillar);

    match pillar {
        Pillar::Geography => match input.resolved_country() {
            Some(country) => resolve(card, &country, default),
            None => default,
        },
        Pillar::Industry => industry_score(input, card, default),
        Pillar::Entity => match input.trimmed_entity_type() {
            Some(entity_type) => resolve(card, entity_type, default),
            None => default,
        },
        Pillar::Product => match input.product_key() {
            Some(product) => resolve(card, &product, default),
            None => default,
        },
        Pillar::Delivery => delivery_score(input, card, default),
    }
}

/// Exact entry, then the table's `"default"` entry, then the configured default.
fn resolve(card: &Scorecard, key: &str, default: f64) -> f64 {
    card.get(key)
        .or_else(|| card.fallback())
        .map(clamp_score)
        .unwrap_or(default)
}

/// The industry code wins over the first SIC code; the table default applies even when the
/// record carries neither.
fn industry_score(input: &CraInput, card: &Scorecard, default: f64) -> f64 {
    let code = input
        .industry_code
        .as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty());
    if let Some(score) = code.and_then(|code| card.get(code)) {
        return clamp_score(score);
    }

    if let Some(score) = input
        .sic_codes
        .first()
        .and_then(|sic| card.get(&sic.to_string()))
    {
        return clamp_score(score);
    }

    card.fallback().map(clamp_score).unwrap_or(default)
}

/// The most restrictive channel governs; the configured default is the floor.
fn delivery_score(input: &CraInput, card: &Scorecard, default: f64) -> f64 {
    let channels = input.delivery_channels();
    if channels.is_empty() {
        return default;
    }
    channels
        .iter()
        .map(|channel| resolve(card, &scorecard_key(channel), default))
        .fold(default, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cra::domain::{DeliveryData, ProductData};

    fn cards() -> ScorecardSet {
        ScorecardSet::default()
            .with(
                Pillar::Geography,
                Scorecard::from_entries([("GB", 1.0), ("AE", 4.0)]),
            )
            .with(
                Pillar::Industry,
                Scorecard::from_entries([("6419", 2.0), ("1190", 5.0), ("default", 3.0)]),
            )
            .with(
                Pillar::Entity,
                Scorecard::from_entries([("Trust", 4.0), ("default", 2.0)]),
            )
            .with(
                Pillar::Product,
                Scorecard::from_entries([("trade_finance", 4.0)]),
            )
            .with(
                Pillar::Delivery,
                Scorecard::from_entries([("face_to_face", 1.0), ("online", 3.0), ("introducer", 4.0)]),
            )
    }

    fn defaults() -> ComponentDefaults {
        ComponentDefaults::uniform(3)
    }

    #[test]
    fn geography_uses_domicile_when_country_code_missing() {
        let input = CraInput {
            domicile: Some(" ae ".to_string()),
            ..CraInput::default()
        };
        assert_eq!(
            score_pillar(Pillar::Geography, &input, &defaults(), &cards()),
            4.0
        );
    }

    #[test]
    fn geography_miss_without_table_default_uses_configured_default() {
        let input = CraInput {
            country_code: Some("FR".to_string()),
            ..CraInput::default()
        };
        let defaults = ComponentDefaults {
            geo: 2,
            ..defaults()
        };
        assert_eq!(
            score_pillar(Pillar::Geography, &input, &defaults, &cards()),
            2.0
        );
    }

    #[test]
    fn industry_prefers_code_then_first_sic_then_table_default() {
        let scorecards = cards();
        let by_code = CraInput {
            industry_code: Some("6419".to_string()),
            sic_codes: vec![1190],
            ..CraInput::default()
        };
        assert_eq!(score_pillar(Pillar::Industry, &by_code, &defaults(), &scorecards), 2.0);

        let by_sic = CraInput {
            industry_code: Some("9999".to_string()),
            sic_codes: vec![1190, 6419],
            ..CraInput::default()
        };
        assert_eq!(score_pillar(Pillar::Industry, &by_sic, &defaults(), &scorecards), 5.0);

        let neither = CraInput::default();
        assert_eq!(score_pillar(Pillar::Industry, &neither, &defaults(), &scorecards), 3.0);
    }

    #[test]
    fn entity_miss_uses_table_default() {
        let input = CraInput {
            entity_type: Some("Partnership".to_string()),
            ..CraInput::default()
        };
        assert_eq!(score_pillar(Pillar::Entity, &input, &defaults(), &cards()), 2.0);
    }

    #[test]
    fn product_key_is_normalized_and_falls_back_to_nested_type() {
        let input = CraInput {
            product_data: Some(ProductData {
                kind: Some("Trade  Finance".to_string()),
                ..ProductData::default()
            }),
            ..CraInput::default()
        };
        assert_eq!(score_pillar(Pillar::Product, &input, &defaults(), &cards()), 4.0);
    }

    #[test]
    fn delivery_takes_most_restrictive_channel() {
        let input = CraInput {
            delivery_data: Some(DeliveryData {
                channels: vec!["Face to Face".to_string(), "Introducer".to_string()],
                ..DeliveryData::default()
            }),
            ..CraInput::default()
        };
        assert_eq!(score_pillar(Pillar::Delivery, &input, &defaults(), &cards()), 4.0);
    }

    #[test]
    fn low_scoring_channels_never_pull_delivery_below_default() {
        let input = CraInput {
            delivery_data: Some(DeliveryData {
                channels: vec!["face to face".to_string()],
                ..DeliveryData::default()
            }),
            ..CraInput::default()
        };
        assert_eq!(score_pillar(Pillar::Delivery, &input, &defaults(), &cards()), 3.0);
    }

    #[test]
    fn empty_channel_list_uses_default() {
        let input = CraInput {
            delivery_data: Some(DeliveryData::default()),
            ..CraInput::default()
        };
        assert_eq!(score_pillar(Pillar::Delivery, &input, &defaults(), &cards()), 3.0);
    }

    #[test]
    fn empty_scorecards_yield_configured_defaults() {
        let defaults = ComponentDefaults {
            geo: 1,
            ind: 2,
            ent: 3,
            prod: 4,
            deliv: 5,
        };
        let input = CraInput {
            country_code: Some("GB".to_string()),
            entity_type: Some("Trust".to_string()),
            ..CraInput::default()
        };
        let scores = score_components(&input, &defaults, &ScorecardSet::default());
        assert_eq!(
            scores,
            PillarScores {
                geo: 1.0,
                ind: 2.0,
                ent: 3.0,
                prod: 4.0,
                deliv: 5.0,
            }
        );
    }
}
