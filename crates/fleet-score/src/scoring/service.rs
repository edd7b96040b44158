use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::benchmark::{BenchmarkSnapshot, PoolBenchmarkEngine};
use super::domain::{DateRange, ExecutionRecord, OperativeId, OperativeIdentity};
use super::identity::{MatchConfidence, NameResolver};
use super::metrics::{MetricAggregator, MetricSnapshot, MetricSources};
use super::policy::{MonetaryBasis, ScoringPolicy};
use super::ranking::{FleetRanking, FleetRankingEngine, RankingEntry, RankingLookup};
use super::rating::{RatingCalculator, RatingInputs, RatingSnapshot};
use super::store::{ExecutionQuery, RecordStore, StoreError};

/// Validated identifiers for a per-operative computation.
struct ResolvedIdentity<'a> {
    id: &'a OperativeId,
    name: &'a str,
    phone: &'a str,
}

fn require_identity(identity: &OperativeIdentity) -> Result<ResolvedIdentity<'_>, ScoringError> {
    let id = identity
        .id
        .as_ref()
        .filter(|id| !id.0.trim().is_empty())
        .ok_or(ScoringError::MissingIdentifier("operative id"))?;
    let name = require_text(identity.name.as_deref(), "name")?;
    let phone = require_text(identity.phone.as_deref(), "phone")?;
    Ok(ResolvedIdentity { id, name, phone })
}

fn require_text<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str, ScoringError> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(ScoringError::MissingIdentifier(field))
}

/// Read-only façade over the scoring components. Holds no cached results;
/// every call reads the store afresh.
pub struct ScoringService<S> {
    store: Arc<S>,
    aggregator: MetricAggregator,
    calculator: RatingCalculator,
    benchmarks: PoolBenchmarkEngine,
    policy: Arc<ScoringPolicy>,
}

impl<S> ScoringService<S>
where
    S: RecordStore + 'static,
{
    pub fn new(store: Arc<S>, policy: ScoringPolicy) -> Self {
        let aggregator = MetricAggregator::new(policy.metrics.clone(), policy.performance);
        let calculator = RatingCalculator::new(policy.rating.clone());
        let benchmarks = PoolBenchmarkEngine::new(policy.benchmark);

        Self {
            store,
            aggregator,
            calculator,
            benchmarks,
            policy: Arc::new(policy),
        }
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Ranking engine for the given monetary basis.
    pub fn ranking_engine(&self, basis: MonetaryBasis) -> FleetRankingEngine {
        FleetRankingEngine::new(self.policy.fleet.clone(), basis)
    }

    async fn read_metric_sources(&self, identity: &ResolvedIdentity<'_>) -> MetricSources {
        let execution_query = ExecutionQuery::for_name(identity.name);
        let (assignments, executions, rejections, checklists, documents) = tokio::join!(
            self.store.assignments(identity.id),
            self.store.executions(&execution_query),
            self.store.rejections(identity.id),
            self.store.checklists(identity.phone),
            self.store.documents(identity.phone),
        );

        MetricSources {
            assignments,
            executions,
            rejections,
            checklists,
            documents,
        }
    }

    fn execution_match(
        name: &str,
        executions: &Result<Vec<ExecutionRecord>, StoreError>,
    ) -> MatchConfidence {
        match executions {
            Ok(records) => NameResolver.assess(
                name,
                records.iter().map(|record| record.operative_name.as_str()),
            ),
            Err(_) => MatchConfidence::NoMatch,
        }
    }

    /// Five sub-scores and the composite performance score for one operative.
    pub async fn performance_metrics(
        &self,
        identity: &OperativeIdentity,
        as_of: NaiveDate,
    ) -> Result<MetricSnapshot, ScoringError> {
        let identity = require_identity(identity)?;
        let sources = self.read_metric_sources(&identity).await;
        let execution_match = Self::execution_match(identity.name, &sources.executions);
        if execution_match == MatchConfidence::Ambiguous {
            warn!(
                operative = %identity.id,
                name = identity.name,
                "execution records match several operatives by name"
            );
        }

        let snapshot = self
            .aggregator
            .aggregate(identity.id, &sources, execution_match, as_of);
        debug!(
            operative = %snapshot.operative_id,
            performance = snapshot.performance,
            "performance metrics computed"
        );
        Ok(snapshot)
    }

    /// Weighted rating across performance, availability, revenue and
    /// versatility.
    pub async fn operative_rating(
        &self,
        identity: &OperativeIdentity,
        as_of: NaiveDate,
    ) -> Result<RatingSnapshot, ScoringError> {
        let identity = require_identity(identity)?;
        let revenue_window =
            DateRange::trailing_days(as_of, self.policy.rating.revenue_window_days);
        let fleet_query = ExecutionQuery::fleet(revenue_window);

        let (sources, operative, fleet_executions) = tokio::join!(
            self.read_metric_sources(&identity),
            self.store.operative(identity.id),
            self.store.executions(&fleet_query),
        );

        let operative = operative
            .map_err(|error| ScoringError::Dependency {
                component: "operative profile",
                reason: error.to_string(),
            })?
            .ok_or_else(|| ScoringError::UnknownOperative(identity.id.clone()))?;

        let execution_match = Self::execution_match(identity.name, &sources.executions);
        let metrics = self
            .aggregator
            .aggregate(identity.id, &sources, execution_match, as_of);
        if metrics.sources.all_failed() {
            return Err(ScoringError::Dependency {
                component: "performance metrics",
                reason: "no metric source could be read".to_string(),
            });
        }

        // A failed fleet read only neutralizes the revenue dimension.
        if let Err(error) = &fleet_executions {
            warn!(%error, "fleet revenue unavailable; revenue dimension uses its default");
        }
        let executions = sources.executions.as_deref().unwrap_or(&[]);

        let snapshot = self.calculator.rate(
            RatingInputs {
                operative: &operative,
                metrics,
                executions,
                fleet_executions: &fleet_executions,
            },
            as_of,
        );

        info!(
            operative = %snapshot.operative_id,
            general_score = snapshot.general_score,
            stars = snapshot.stars,
            label = snapshot.label.label(),
            "operative rating computed"
        );
        Ok(snapshot)
    }

    /// Full sorted fleet for the ranking window.
    pub async fn fleet_ranking_table(
        &self,
        basis: MonetaryBasis,
        as_of: NaiveDate,
    ) -> Result<FleetRanking, ScoringError> {
        let engine = self.ranking_engine(basis);
        let executions = self
            .store
            .executions(&ExecutionQuery::fleet(engine.window(as_of)))
            .await?;
        let ranking = engine.rank(&executions, as_of);
        debug!(
            fleet_size = ranking.entries.len(),
            basis = basis.label(),
            "fleet ranking computed"
        );
        Ok(ranking)
    }

    /// Single-operative view over the same table the batch variant returns.
    pub async fn fleet_ranking(
        &self,
        name: &str,
        basis: MonetaryBasis,
        as_of: NaiveDate,
    ) -> Result<RankingLookup, ScoringError> {
        let name = require_text(Some(name), "name")?;
        let ranking = self.fleet_ranking_table(basis, as_of).await?;
        Ok(ranking.lookup(name))
    }

    pub async fn fleet_ranking_batch(
        &self,
        basis: MonetaryBasis,
        as_of: NaiveDate,
    ) -> Result<BTreeMap<String, RankingEntry>, ScoringError> {
        Ok(self.fleet_ranking_table(basis, as_of).await?.into_map())
    }

    pub async fn pool_benchmarks(
        &self,
        name: &str,
        as_of: NaiveDate,
    ) -> Result<BenchmarkSnapshot, ScoringError> {
        let name = require_text(Some(name), "name")?;
        let window = self.benchmarks.window(as_of);
        let executions = self
            .store
            .executions(&ExecutionQuery::fleet(window))
            .await?;
        let snapshot = self.benchmarks.benchmark(name, &executions, as_of);
        debug!(population = snapshot.population, "pool benchmarks computed");
        Ok(snapshot)
    }
}

/// Error raised by the scoring service.
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error("required identifier missing: {0}")]
    MissingIdentifier(&'static str),
    #[error("operative {0} not found")]
    UnknownOperative(OperativeId),
    #[error("{component} unavailable: {reason}")]
    Dependency {
        component: &'static str,
        reason: String,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}
