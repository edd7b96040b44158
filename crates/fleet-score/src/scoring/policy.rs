use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

use super::punctuality::{BucketedPunctuality, DecayPunctuality};

/// Complete scoring policy. Every weight, window and threshold the engine
/// applies lives here so it can be changed centrally.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    pub metrics: MetricPolicy,
    pub performance: PerformanceWeights,
    pub rating: RatingPolicy,
    pub fleet: FleetScorePolicy,
    pub benchmark: BenchmarkPolicy,
}

impl ScoringPolicy {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, PolicyError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Partial documents are accepted; omitted sections keep their defaults.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, PolicyError> {
        Ok(serde_json::from_reader(reader)?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("failed to read scoring policy: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid scoring policy document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Inputs to the per-operative metric aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricPolicy {
    pub punctuality: BucketedPunctuality,
    /// Completed services at which the volume score saturates.
    pub volume_saturation: u32,
}

impl Default for MetricPolicy {
    fn default() -> Self {
        Self {
            punctuality: BucketedPunctuality::default(),
            volume_saturation: 100,
        }
    }
}

/// Fixed weight vector for the composite performance score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceWeights {
    pub punctuality: f64,
    pub reliability: f64,
    pub checklist: f64,
    pub documentation: f64,
    pub volume: f64,
}

impl Default for PerformanceWeights {
    fn default() -> Self {
        Self {
            punctuality: 0.30,
            reliability: 0.25,
            checklist: 0.20,
            documentation: 0.15,
            volume: 0.10,
        }
    }
}

/// Weights and windows for the operative rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingPolicy {
    pub weights: RatingWeights,
    /// A completed service within this many days counts as recent activity.
    pub recent_service_days: u32,
    pub revenue_window_days: u32,
    pub versatility_window_days: u32,
    /// Bonus applied when the operative declares no location preference.
    pub indifferent_bonus: u32,
}

impl Default for RatingPolicy {
    fn default() -> Self {
        Self {
            weights: RatingWeights::default(),
            recent_service_days: 7,
            revenue_window_days: 90,
            versatility_window_days: 15,
            indifferent_bonus: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingWeights {
    pub performance: f64,
    pub availability: f64,
    pub revenue: f64,
    pub versatility: f64,
    /// Reserved for client feedback; only applied when that dimension is available.
    pub client_satisfaction: f64,
}

impl Default for RatingWeights {
    fn default() -> Self {
        Self {
            performance: 0.30,
            availability: 0.25,
            revenue: 0.25,
            versatility: 0.20,
            client_satisfaction: 0.20,
        }
    }
}

/// Which monetary column a fleet-wide computation sums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonetaryBasis {
    /// What the operative was paid.
    #[default]
    OperativeCost,
    /// What the client was billed.
    SalePrice,
}

impl MonetaryBasis {
    pub const fn label(self) -> &'static str {
        match self {
            Self::OperativeCost => "Operative cost",
            Self::SalePrice => "Sale price",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetScorePolicy {
    pub window_days: u32,
    /// Completed services that earn the full completion component.
    pub completion_target: f64,
    /// Revenue that earns the full revenue component.
    pub revenue_target: f64,
    pub completion_weight: f64,
    pub revenue_weight: f64,
    pub punctuality_weight: f64,
    pub punctuality: DecayPunctuality,
    pub tiers: TierThresholds,
}

impl Default for FleetScorePolicy {
    fn default() -> Self {
        Self {
            window_days: 30,
            completion_target: 20.0,
            revenue_target: 100_000.0,
            completion_weight: 0.4,
            revenue_weight: 0.3,
            punctuality_weight: 0.3,
            punctuality: DecayPunctuality::default(),
            tiers: TierThresholds::default(),
        }
    }
}

/// Top-X% cut-offs, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    pub gold: u32,
    pub silver: u32,
    pub bronze: u32,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            gold: 10,
            silver: 25,
            bronze: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkPolicy {
    pub window_months: u32,
    /// Peers below this many qualifying services are left out of the pool.
    pub minimum_services: u32,
    pub basis: MonetaryBasis,
}

impl Default for BenchmarkPolicy {
    fn default() -> Self {
        Self {
            window_months: 6,
            minimum_services: 3,
            basis: MonetaryBasis::OperativeCost,
        }
    }
}
