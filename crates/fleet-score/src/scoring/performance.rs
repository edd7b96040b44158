use serde::{Deserialize, Serialize};

use super::policy::PerformanceWeights;

/// The five normalized sub-scores produced by the metric aggregator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubScores {
    pub punctuality: u32,
    pub reliability: u32,
    /// Not clamped: more checklists than completed services reads above 100.
    pub checklist: u32,
    pub documentation: u32,
    pub volume: u32,
}

impl PerformanceWeights {
    /// `round(Σ weight_i * score_i)` over the five sub-scores.
    pub fn composite(&self, scores: &SubScores) -> u32 {
        let weighted = self.punctuality * f64::from(scores.punctuality)
            + self.reliability * f64::from(scores.reliability)
            + self.checklist * f64::from(scores.checklist)
            + self.documentation * f64::from(scores.documentation)
            + self.volume * f64::from(scores.volume);
        round_score(weighted)
    }
}

/// Rounds half away from zero and floors at zero.
pub(crate) fn round_score(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    value.round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(score: u32) -> SubScores {
        SubScores {
            punctuality: score,
            reliability: score,
            checklist: score,
            documentation: score,
            volume: score,
        }
    }

    #[test]
    fn boundary_vectors_map_to_boundaries() {
        let weights = PerformanceWeights::default();
        assert_eq!(weights.composite(&uniform(0)), 0);
        assert_eq!(weights.composite(&uniform(100)), 100);
    }

    #[test]
    fn composite_matches_rounded_weighted_sum() {
        let weights = PerformanceWeights::default();
        let scores = SubScores {
            punctuality: 83,
            reliability: 90,
            checklist: 47,
            documentation: 60,
            volume: 12,
        };
        // 24.9 + 22.5 + 9.4 + 9.0 + 1.2 = 67.0
        assert_eq!(weights.composite(&scores), 67);

        let scores = SubScores {
            punctuality: 75,
            reliability: 100,
            checklist: 0,
            documentation: 0,
            volume: 5,
        };
        // 22.5 + 25.0 + 0.5 = 48.0
        assert_eq!(weights.composite(&scores), 48);
    }

    #[test]
    fn reliability_alone_contributes_its_weight() {
        let weights = PerformanceWeights::default();
        let scores = SubScores {
            reliability: 100,
            ..SubScores::default()
        };
        assert_eq!(weights.composite(&scores), 25);
    }

    #[test]
    fn weights_are_configuration() {
        let weights = PerformanceWeights {
            punctuality: 1.0,
            reliability: 0.0,
            checklist: 0.0,
            documentation: 0.0,
            volume: 0.0,
        };
        assert_eq!(weights.composite(&uniform(42)), 42);
    }

    #[test]
    fn rounding_goes_half_up_for_positive_scores() {
        assert_eq!(round_score(49.5), 50);
        assert_eq!(round_score(49.49), 49);
        assert_eq!(round_score(-3.0), 0);
        assert_eq!(round_score(f64::NAN), 0);
    }
}
