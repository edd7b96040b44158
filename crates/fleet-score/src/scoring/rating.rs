use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::domain::{
    DateRange, ExecutionRecord, Operative, OperativeId, OperativeStatus, ServicePreference,
    ServiceScope,
};
use super::identity::{normalize_name, MatchConfidence};
use super::metrics::{MetricSnapshot, SourceRead, SourceStatus};
use super::performance::round_score;
use super::policy::{MonetaryBasis, RatingPolicy, RatingWeights};

/// A rating dimension either carries a score or is structurally absent from
/// the weighted sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "score", rename_all = "snake_case")]
pub enum Dimension {
    Available(u32),
    Unavailable,
}

impl Dimension {
    pub fn score(self) -> Option<u32> {
        match self {
            Dimension::Available(score) => Some(score),
            Dimension::Unavailable => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingDimensions {
    pub performance: Dimension,
    pub availability: Dimension,
    pub revenue: Dimension,
    pub versatility: Dimension,
    /// Placeholder until a client-feedback source exists.
    pub client_satisfaction: Dimension,
}

impl RatingWeights {
    /// Weighted sum over the dimensions that are available.
    pub fn general_score(&self, dimensions: &RatingDimensions) -> u32 {
        let weighted: f64 = [
            (self.performance, dimensions.performance),
            (self.availability, dimensions.availability),
            (self.revenue, dimensions.revenue),
            (self.versatility, dimensions.versatility),
            (self.client_satisfaction, dimensions.client_satisfaction),
        ]
        .into_iter()
        .filter_map(|(weight, dimension)| dimension.score().map(|score| weight * f64::from(score)))
        .sum();
        round_score(weighted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingLabel {
    Excellent,
    Good,
    Average,
    Poor,
    Critical,
}

impl RatingLabel {
    pub fn from_stars(stars: f64) -> Self {
        if stars >= 4.5 {
            Self::Excellent
        } else if stars >= 3.5 {
            Self::Good
        } else if stars >= 2.5 {
            Self::Average
        } else if stars >= 1.5 {
            Self::Poor
        } else {
            Self::Critical
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Average => "Average",
            Self::Poor => "Poor",
            Self::Critical => "Critical",
        }
    }
}

/// Integer star band for a general score.
pub fn star_band(score: u32) -> u32 {
    if score >= 81 {
        5
    } else if score >= 61 {
        4
    } else if score >= 41 {
        3
    } else if score >= 21 {
        2
    } else {
        1
    }
}

/// Band refined by the position inside its 20-point step, one decimal,
/// clamped to [1, 5].
pub fn star_rating(score: u32) -> f64 {
    let refined = f64::from(star_band(score)) + f64::from(score % 20) / 20.0;
    let clamped = refined.clamp(1.0, 5.0);
    (clamped * 10.0).round() / 10.0
}

/// Fleet revenue distribution over the revenue window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RevenuePercentiles {
    pub p50: f64,
    pub p90: f64,
}

impl RevenuePercentiles {
    /// Nearest-rank percentiles over per-operative positive revenue.
    pub fn from_fleet<'a, I>(executions: I, basis: MonetaryBasis) -> Option<Self>
    where
        I: IntoIterator<Item = &'a ExecutionRecord>,
    {
        let mut per_operative: BTreeMap<String, f64> = BTreeMap::new();
        for record in executions.into_iter().filter(|record| record.is_completed()) {
            *per_operative
                .entry(normalize_name(&record.operative_name))
                .or_default() += monetary_value(record, basis);
        }

        let mut totals: Vec<f64> = per_operative
            .into_values()
            .filter(|total| *total > 0.0)
            .collect();
        if totals.is_empty() {
            return None;
        }
        totals.sort_by(f64::total_cmp);

        Some(Self {
            p50: nearest_rank(&totals, 0.5),
            p90: nearest_rank(&totals, 0.9),
        })
    }
}

fn nearest_rank(sorted: &[f64], percentile: f64) -> f64 {
    let index = ((sorted.len() as f64) * percentile).floor() as usize;
    sorted[index.min(sorted.len() - 1)]
}

pub(crate) fn monetary_value(record: &ExecutionRecord, basis: MonetaryBasis) -> f64 {
    match basis {
        MonetaryBasis::OperativeCost => record.operative_cost,
        MonetaryBasis::SalePrice => record.sale_price,
    }
}

pub(crate) fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Stepped availability: each relaxed condition drops one step, floor 20.
pub fn availability_score(
    operative: &Operative,
    last_service: Option<NaiveDate>,
    as_of: NaiveDate,
    recent_service_days: u32,
) -> u32 {
    let active = operative.status == OperativeStatus::Active;
    let recent = last_service
        .map(|date| (as_of - date).num_days() <= i64::from(recent_service_days))
        .unwrap_or(false);

    match (operative.available, active, recent) {
        (true, true, true) => 100,
        (true, true, false) | (true, false, true) | (false, true, true) => 80,
        (false, true, false) => 60,
        (true, false, false) | (false, false, true) => 40,
        (false, false, false) => 20,
    }
}

/// Revenue against the fleet P50/P90 band.
pub fn revenue_score(revenue: f64, percentiles: Option<RevenuePercentiles>) -> u32 {
    let Some(RevenuePercentiles { p50, p90 }) = percentiles else {
        return 50;
    };
    if p50 <= 0.0 {
        return 50;
    }

    let score = if revenue >= p90 {
        100.0
    } else if revenue >= p50 {
        // p90 > revenue >= p50, so the span is positive.
        60.0 + (revenue - p50) / (p90 - p50) * 40.0
    } else {
        (revenue / p50 * 60.0).max(10.0)
    };
    round_score(score)
}

/// Balance between local and out-of-town work.
pub fn versatility_score(
    local: u32,
    out_of_town: u32,
    preference: ServicePreference,
    indifferent_bonus: u32,
) -> u32 {
    let base = if local == 0 && out_of_town == 0 {
        40.0
    } else {
        let smaller = f64::from(local.min(out_of_town));
        let larger = f64::from(local.max(out_of_town));
        40.0 + smaller / larger * 60.0
    };

    let bonus = if preference == ServicePreference::Indifferent {
        f64::from(indifferent_bonus)
    } else {
        0.0
    };
    round_score((base + bonus).min(100.0))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingSnapshot {
    pub operative_id: OperativeId,
    pub as_of: NaiveDate,
    pub dimensions: RatingDimensions,
    pub weights: RatingWeights,
    pub general_score: u32,
    pub stars: f64,
    pub label: RatingLabel,
    pub revenue_90d: f64,
    pub fleet_revenue: Option<RevenuePercentiles>,
    /// Outcome of the fleet-wide revenue read. A failed read and a fleet with
    /// no positive revenue both leave `fleet_revenue` empty.
    pub fleet_source: SourceStatus,
    pub local_services: u32,
    pub out_of_town_services: u32,
    pub last_service_on: Option<NaiveDate>,
    pub metrics: MetricSnapshot,
    pub execution_match: MatchConfidence,
}

/// Inputs beyond the metric snapshot that the calculator needs.
pub struct RatingInputs<'a> {
    pub operative: &'a Operative,
    pub metrics: MetricSnapshot,
    /// All of this operative's executions, unbounded.
    pub executions: &'a [ExecutionRecord],
    /// Fleet-wide read over the revenue window.
    pub fleet_executions: &'a SourceRead<ExecutionRecord>,
}

#[derive(Debug, Clone)]
pub struct RatingCalculator {
    policy: RatingPolicy,
    basis: MonetaryBasis,
}

impl RatingCalculator {
    pub fn new(policy: RatingPolicy) -> Self {
        Self {
            policy,
            basis: MonetaryBasis::OperativeCost,
        }
    }

    pub fn rate(&self, inputs: RatingInputs<'_>, as_of: NaiveDate) -> RatingSnapshot {
        let RatingInputs {
            operative,
            metrics,
            executions,
            fleet_executions,
        } = inputs;

        let completed: Vec<&ExecutionRecord> = executions
            .iter()
            .filter(|record| record.is_completed() && record.service_date <= as_of)
            .collect();
        let last_service_on = completed.iter().map(|record| record.service_date).max();

        let revenue_window = DateRange::trailing_days(as_of, self.policy.revenue_window_days);
        let revenue_90d: f64 = completed
            .iter()
            .filter(|record| revenue_window.contains(record.service_date))
            .map(|record| monetary_value(record, self.basis))
            .sum();
        let fleet_source = SourceStatus::of(fleet_executions);
        let fleet_revenue = RevenuePercentiles::from_fleet(
            fleet_executions
                .as_deref()
                .unwrap_or(&[])
                .iter()
                .filter(|record| revenue_window.contains(record.service_date)),
            self.basis,
        );

        let versatility_window =
            DateRange::trailing_days(as_of, self.policy.versatility_window_days);
        let (local_services, out_of_town_services) = completed
            .iter()
            .filter(|record| versatility_window.contains(record.service_date))
            .fold((0u32, 0u32), |(local, away), record| match record.scope {
                Some(ServiceScope::Local) => (local + 1, away),
                Some(ServiceScope::OutOfTown) => (local, away + 1),
                None => (local, away),
            });

        let dimensions = RatingDimensions {
            performance: Dimension::Available(metrics.performance),
            availability: Dimension::Available(availability_score(
                operative,
                last_service_on,
                as_of,
                self.policy.recent_service_days,
            )),
            revenue: Dimension::Available(revenue_score(revenue_90d, fleet_revenue)),
            versatility: Dimension::Available(versatility_score(
                local_services,
                out_of_town_services,
                operative.preference,
                self.policy.indifferent_bonus,
            )),
            client_satisfaction: Dimension::Unavailable,
        };

        let general_score = self.policy.weights.general_score(&dimensions);
        let stars = star_rating(general_score);
        let execution_match = metrics.execution_match;

        RatingSnapshot {
            operative_id: operative.id.clone(),
            as_of,
            dimensions,
            weights: self.policy.weights,
            general_score,
            stars,
            label: RatingLabel::from_stars(stars),
            revenue_90d: round_cents(revenue_90d),
            fleet_revenue: fleet_revenue.map(|percentiles| RevenuePercentiles {
                p50: round_cents(percentiles.p50),
                p90: round_cents(percentiles.p90),
            }),
            fleet_source,
            local_services,
            out_of_town_services,
            last_service_on,
            metrics,
            execution_match,
        }
    }
}
