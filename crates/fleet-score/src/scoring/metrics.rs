//! Per-operative metric aggregation.
//!
//! Each source collection is graded independently. A collection that failed
//! to load only degrades its own category, and the snapshot records which
//! sources were affected so callers can render "unavailable" rather than a
//! misleading zero.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::{
    AssignmentRecord, ChecklistRecord, DocumentRecord, ExecutionRecord, OperativeId, PlanningState,
    RejectionRecord,
};
use super::identity::MatchConfidence;
use super::performance::{round_score, SubScores};
use super::policy::{MetricPolicy, PerformanceWeights};
use super::punctuality::PunctualityTally;
use super::store::StoreError;

/// Outcome of one source read feeding the aggregator.
pub type SourceRead<T> = Result<Vec<T>, StoreError>;

/// The five collections a metric snapshot is built from.
#[derive(Debug, Clone)]
pub struct MetricSources {
    pub assignments: SourceRead<AssignmentRecord>,
    pub executions: SourceRead<ExecutionRecord>,
    pub rejections: SourceRead<RejectionRecord>,
    pub checklists: SourceRead<ChecklistRecord>,
    pub documents: SourceRead<DocumentRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    Loaded { records: usize },
    Empty,
    Failed { reason: String },
}

impl SourceStatus {
    pub(crate) fn of<T>(read: &SourceRead<T>) -> Self {
        match read {
            Ok(records) if records.is_empty() => SourceStatus::Empty,
            Ok(records) => SourceStatus::Loaded {
                records: records.len(),
            },
            Err(error) => SourceStatus::Failed {
                reason: error.to_string(),
            },
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SourceStatus::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceHealth {
    pub assignments: SourceStatus,
    pub executions: SourceStatus,
    pub rejections: SourceStatus,
    pub checklists: SourceStatus,
    pub documents: SourceStatus,
}

impl SourceHealth {
    pub fn degraded(&self) -> Vec<&'static str> {
        [
            ("assignments", &self.assignments),
            ("executions", &self.executions),
            ("rejections", &self.rejections),
            ("checklists", &self.checklists),
            ("documents", &self.documents),
        ]
        .into_iter()
        .filter(|(_, status)| status.is_failed())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn all_failed(&self) -> bool {
        self.degraded().len() == 5
    }
}

/// Raw counts behind the sub-scores, exposed for drill-down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricCounts {
    pub punctuality: PunctualityTally,
    pub total_assignments: u32,
    pub cancellations: u32,
    pub rejections: u32,
    pub completed_executions: u32,
    pub checklists_filed: u32,
    pub documents_uploaded: u32,
    pub documents_verified: u32,
    pub documents_expired: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub operative_id: OperativeId,
    pub as_of: NaiveDate,
    pub scores: SubScores,
    pub performance: u32,
    pub counts: MetricCounts,
    pub sources: SourceHealth,
    /// How cleanly the name-keyed execution read matched this operative.
    pub execution_match: MatchConfidence,
}

/// Stateless aggregator applying the metric policy and performance weights.
#[derive(Debug, Clone)]
pub struct MetricAggregator {
    policy: MetricPolicy,
    weights: PerformanceWeights,
}

impl MetricAggregator {
    pub fn new(policy: MetricPolicy, weights: PerformanceWeights) -> Self {
        Self { policy, weights }
    }

    pub fn aggregate(
        &self,
        operative_id: &OperativeId,
        sources: &MetricSources,
        execution_match: MatchConfidence,
        as_of: NaiveDate,
    ) -> MetricSnapshot {
        let health = SourceHealth {
            assignments: SourceStatus::of(&sources.assignments),
            executions: SourceStatus::of(&sources.executions),
            rejections: SourceStatus::of(&sources.rejections),
            checklists: SourceStatus::of(&sources.checklists),
            documents: SourceStatus::of(&sources.documents),
        };

        let degraded = health.degraded();
        if !degraded.is_empty() {
            warn!(
                operative = %operative_id,
                ?degraded,
                "metric sources failed to load; affected categories fall back to defaults"
            );
        }

        let assignments = records_or_empty(&sources.assignments);
        let executions = records_or_empty(&sources.executions);
        let rejections = records_or_empty(&sources.rejections);
        let checklists = records_or_empty(&sources.checklists);
        let documents = records_or_empty(&sources.documents);

        let punctuality = self.policy.punctuality.tally(executions);
        let completed_executions = count(executions.iter().filter(|record| record.is_completed()));
        let total_assignments = count(assignments.iter());
        let cancellations = count(
            assignments
                .iter()
                .filter(|record| record.state == PlanningState::Cancelled),
        );
        let rejection_count = count(rejections.iter());
        let checklists_filed = count(checklists.iter().filter(|record| record.completed));
        let documents_uploaded = count(documents.iter());
        let documents_verified = count(documents.iter().filter(|record| record.verified));
        let documents_expired = count(documents.iter().filter(|record| record.is_expired(as_of)));

        let counts = MetricCounts {
            punctuality,
            total_assignments,
            cancellations,
            rejections: rejection_count,
            completed_executions,
            checklists_filed,
            documents_uploaded,
            documents_verified,
            documents_expired,
        };

        let scores = SubScores {
            punctuality: round_score(self.policy.punctuality.score(&punctuality)),
            reliability: reliability_score(&counts),
            checklist: ratio_score(checklists_filed, completed_executions),
            documentation: ratio_score(documents_verified, documents_uploaded),
            volume: self.volume_score(completed_executions),
        };
        let performance = self.weights.composite(&scores);

        MetricSnapshot {
            operative_id: operative_id.clone(),
            as_of,
            scores,
            performance,
            counts,
            sources: health,
            execution_match,
        }
    }

    fn volume_score(&self, completed: u32) -> u32 {
        if self.policy.volume_saturation == 0 {
            return 100;
        }
        let raw = 100.0 * f64::from(completed) / f64::from(self.policy.volume_saturation);
        round_score(raw.min(100.0))
    }
}

fn records_or_empty<T>(read: &SourceRead<T>) -> &[T] {
    match read {
        Ok(records) => records.as_slice(),
        Err(_) => &[],
    }
}

fn count<I: Iterator>(iter: I) -> u32 {
    u32::try_from(iter.count()).unwrap_or(u32::MAX)
}

/// No assignments is not unreliability.
fn reliability_score(counts: &MetricCounts) -> u32 {
    if counts.total_assignments == 0 {
        return 100;
    }
    let kept = f64::from(counts.total_assignments)
        - f64::from(counts.cancellations)
        - f64::from(counts.rejections);
    round_score(100.0 * kept / f64::from(counts.total_assignments))
}

fn ratio_score(numerator: u32, denominator: u32) -> u32 {
    if denominator == 0 {
        return 0;
    }
    round_score(100.0 * f64::from(numerator) / f64::from(denominator))
}
