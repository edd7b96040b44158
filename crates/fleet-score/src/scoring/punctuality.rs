//! Punctuality policies.
//!
//! The per-operative metrics and the fleet ranking grade lateness differently:
//! the former buckets check-ins and counts on-time arrivals, the latter decays
//! each arrival linearly over a grace period. They are kept as two named
//! policies so neither can silently take over the other's call site.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::domain::ExecutionRecord;

/// Minutes between the scheduled start and the actual check-in. Early or
/// exactly-on-time arrivals yield zero or a negative value.
pub fn minutes_late(scheduled_at: NaiveDateTime, checked_in_at: NaiveDateTime) -> f64 {
    (checked_in_at - scheduled_at).num_seconds() as f64 / 60.0
}

fn record_minutes_late(record: &ExecutionRecord) -> Option<f64> {
    match (record.scheduled_at, record.checked_in_at) {
        (Some(scheduled), Some(checked_in)) => Some(minutes_late(scheduled, checked_in)),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrivalBucket {
    OnTime,
    MinorDelay,
    MajorDelay,
}

/// Counts per bucket over a set of executions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PunctualityTally {
    pub on_time: u32,
    pub minor_delay: u32,
    pub major_delay: u32,
}

impl PunctualityTally {
    pub fn classified(&self) -> u32 {
        self.on_time + self.minor_delay + self.major_delay
    }
}

/// Bucketed policy used by the metric aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketedPunctuality {
    /// Arrivals up to this many minutes late count as a minor delay.
    pub minor_delay_minutes: f64,
}

impl Default for BucketedPunctuality {
    fn default() -> Self {
        Self {
            minor_delay_minutes: 15.0,
        }
    }
}

impl BucketedPunctuality {
    pub fn classify(&self, record: &ExecutionRecord) -> Option<ArrivalBucket> {
        let late = record_minutes_late(record)?;
        let bucket = if late <= 0.0 {
            ArrivalBucket::OnTime
        } else if late <= self.minor_delay_minutes {
            ArrivalBucket::MinorDelay
        } else {
            ArrivalBucket::MajorDelay
        };
        Some(bucket)
    }

    pub fn tally<'a, I>(&self, records: I) -> PunctualityTally
    where
        I: IntoIterator<Item = &'a ExecutionRecord>,
    {
        let mut tally = PunctualityTally::default();
        for bucket in records.into_iter().filter_map(|record| self.classify(record)) {
            match bucket {
                ArrivalBucket::OnTime => tally.on_time += 1,
                ArrivalBucket::MinorDelay => tally.minor_delay += 1,
                ArrivalBucket::MajorDelay => tally.major_delay += 1,
            }
        }
        tally
    }

    /// Share of on-time arrivals. No classified arrivals is a genuine zero.
    pub fn score(&self, tally: &PunctualityTally) -> f64 {
        let classified = tally.classified();
        if classified == 0 {
            return 0.0;
        }
        100.0 * f64::from(tally.on_time) / f64::from(classified)
    }
}

/// Linear-decay policy used by the fleet ranking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayPunctuality {
    /// Lateness at which an arrival's score reaches zero.
    pub grace_minutes: f64,
    /// Average reported when no arrival could be graded.
    pub no_data_score: f64,
}

impl Default for DecayPunctuality {
    fn default() -> Self {
        Self {
            grace_minutes: 30.0,
            no_data_score: 50.0,
        }
    }
}

impl DecayPunctuality {
    pub fn record_score(&self, record: &ExecutionRecord) -> Option<f64> {
        let late = record_minutes_late(record)?;
        let score = if late <= 0.0 {
            100.0
        } else if late <= self.grace_minutes {
            (100.0 - (late / self.grace_minutes) * 100.0).max(0.0)
        } else {
            0.0
        };
        Some(score)
    }

    pub fn average<'a, I>(&self, records: I) -> f64
    where
        I: IntoIterator<Item = &'a ExecutionRecord>,
    {
        let (sum, count) = records
            .into_iter()
            .filter_map(|record| self.record_score(record))
            .fold((0.0, 0u32), |(sum, count), score| (sum + score, count + 1));

        if count == 0 {
            self.no_data_score
        } else {
            sum / f64::from(count)
        }
    }
}
