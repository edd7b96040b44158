//! Operative performance scoring, rating, fleet ranking and pool benchmarks.
//!
//! Everything here is read-only over a [`RecordStore`]: results are computed on
//! demand and never persisted.

pub mod benchmark;
pub mod domain;
pub mod identity;
pub mod metrics;
pub mod performance;
pub mod policy;
pub mod punctuality;
pub mod ranking;
pub mod rating;
pub mod router;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use benchmark::{
    BenchmarkSnapshot, PeerStats, PoolAverages, PoolBenchmarkEngine, PoolStanding,
    StandingPercentile,
};
pub use domain::{
    AssignmentRecord, ChecklistRecord, DateRange, DocumentRecord, ExecutionRecord, ExecutionState,
    Operative, OperativeId, OperativeIdentity, OperativeStatus, PlanningState, RejectionRecord,
    ServicePreference, ServiceScope,
};
pub use identity::{normalize_name, MatchConfidence, NameMatch, NameResolver};
pub use metrics::{
    MetricAggregator, MetricCounts, MetricSnapshot, SourceHealth, SourceRead, SourceStatus,
};
pub use performance::SubScores;
pub use policy::{
    BenchmarkPolicy, FleetScorePolicy, MetricPolicy, MonetaryBasis, PerformanceWeights,
    PolicyError, RatingPolicy, RatingWeights, ScoringPolicy, TierThresholds,
};
pub use punctuality::{BucketedPunctuality, DecayPunctuality, PunctualityTally};
pub use ranking::{
    FleetRanking, FleetRankingEngine, RankingEntry, RankingLookup, Tier, TopPercentile,
};
pub use rating::{
    Dimension, RatingCalculator, RatingDimensions, RatingLabel, RatingSnapshot, RevenuePercentiles,
};
pub use router::scoring_router;
pub use service::{ScoringError, ScoringService};
pub use store::{
    ExecutionCsvImporter, ExecutionQuery, ImportError, InMemoryRecordStore, RecordSnapshot,
    RecordStore, StoreError,
};
