use serde::Serialize;

use super::domain::{Pillar, PillarScores};
use super::engine_config::{clamp_score_int, PillarWeights};

const EQUAL_SHARE: f64 = 1.0 / 5.0;

/// Pillar weights scaled to sum to one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalizedWeights {
    pub geo: f64,
    pub ind: f64,
    pub ent: f64,
    pub prod: f64,
    pub deliv: f64,
}

impl NormalizedWeights {
    /// A zero total falls back to equal weights.
    pub fn from_weights(weights: &PillarWeights) -> Self {
        let total = weights.total();
        if total <= 0.0 || !total.is_finite() {
            return Self::equal();
        }

        Self {
            geo: weights.geo / total,
            ind: weights.ind / total,
            ent: weights.ent / total,
            prod: weights.prod / total,
            deliv: weights.deliv / total,
        }
    }

    pub fn equal() -> Self {
        Self {
            geo: EQUAL_SHARE,
            ind: EQUAL_SHARE,
            ent: EQUAL_SHARE,
            prod: EQUAL_SHARE,
            deliv: EQUAL_SHARE,
        }
    }

    pub fn get(&self, pillar: Pillar) -> f64 {
        match pillar {
            Pillar::Geography => self.geo,
            Pillar::Industry => self.ind,
            Pillar::Entity => self.ent,
            Pillar::Product => self.prod,
            Pillar::Delivery => self.deliv,
        }
    }

    /// Unrounded weighted mean of the pillar scores.
    pub fn weighted_mean(&self, scores: &PillarScores) -> f64 {
        Pillar::ALL
            .iter()
            .map(|pillar| self.get(*pillar) * scores.get(*pillar))
            .sum()
    }
}

/// Rounded (half-up) and clamped composite score consumed by the override stage.
pub fn pre_override_score(weights: &PillarWeights, scores: &PillarScores) -> u8 {
    let mean = NormalizedWeights::from_weights(weights).weighted_mean(scores);
    clamp_score_int(round_half_up(mean))
}

fn round_half_up(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    (value + 0.5).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(geo: f64, ind: f64, ent: f64, prod: f64, deliv: f64) -> PillarScores {
        PillarScores {
            geo,
            ind,
            ent,
            prod,
            deliv,
        }
    }

    #[test]
    fn normalized_weights_sum_to_one() {
        let weights = PillarWeights {
            geo: 3.0,
            ind: 1.5,
            ent: 2.0,
            prod: 3.0,
            deliv: 0.5,
        };
        let normalized = NormalizedWeights::from_weights(&weights);
        let total: f64 = Pillar::ALL.iter().map(|p| normalized.get(*p)).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!((normalized.geo - 0.3).abs() < 1e-9);
    }

    #[test]
    fn zero_total_uses_equal_weights() {
        let weights = PillarWeights {
            geo: 0.0,
            ind: 0.0,
            ent: 0.0,
            prod: 0.0,
            deliv: 0.0,
        };
        assert_eq!(NormalizedWeights::from_weights(&weights), NormalizedWeights::equal());
        assert_eq!(pre_override_score(&weights, &scores(1.0, 2.0, 3.0, 4.0, 5.0)), 3);
    }

    #[test]
    fn weighted_mean_rounds_half_up() {
        let weights = PillarWeights::default();
        let pillar_scores = scores(4.0, 2.0, 3.0, 5.0, 1.0);
        let mean = NormalizedWeights::from_weights(&weights).weighted_mean(&pillar_scores);
        assert!((mean - 3.65).abs() < 1e-9);
        assert_eq!(pre_override_score(&weights, &pillar_scores), 4);

        let even = PillarWeights {
            geo: 1.0,
            ind: 1.0,
            ent: 0.0,
            prod: 0.0,
            deliv: 0.0,
        };
        assert_eq!(pre_override_score(&even, &scores(2.0, 3.0, 5.0, 5.0, 5.0)), 3);
        assert_eq!(pre_override_score(&even, &scores(1.0, 2.0, 5.0, 5.0, 5.0)), 2);
    }

    #[test]
    fn result_stays_within_score_domain() {
        let weights = PillarWeights::default();
        assert_eq!(pre_override_score(&weights, &scores(1.0, 1.0, 1.0, 1.0, 1.0)), 1);
        assert_eq!(pre_override_score(&weights, &scores(5.0, 5.0, 5.0, 5.0, 5.0)), 5);
    }
}
