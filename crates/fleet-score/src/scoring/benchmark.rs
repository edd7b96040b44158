//! Pool benchmarks: unit economics of one operative against qualifying peers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::domain::{DateRange, ExecutionRecord};
use super::identity::{normalize_name, MatchConfidence, NameMatch, NameResolver};
use super::policy::BenchmarkPolicy;
use super::rating::{monetary_value, round_cents};

/// Share of the pool at or below this operative's revenue rank. Higher is
/// better, unlike the fleet ranking's top-X% percentile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StandingPercentile(pub u32);

impl StandingPercentile {
    pub fn from_rank(rank: usize, population: usize) -> Self {
        let raw = (population - rank + 1) as f64 / population as f64 * 100.0;
        Self(raw.round() as u32)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerStats {
    pub name: String,
    pub services: u32,
    pub revenue: f64,
    pub distance_km: f64,
    pub revenue_per_km: f64,
    pub revenue_per_service: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoolAverages {
    pub revenue: f64,
    pub revenue_per_km: f64,
    pub revenue_per_service: f64,
    pub services: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum PoolStanding {
    Ranked {
        stats: PeerStats,
        revenue_rank: usize,
        services_rank: usize,
        revenue_per_km_rank: usize,
        percentile: StandingPercentile,
        confidence: MatchConfidence,
    },
    /// The operative has too few qualifying services, or none at all.
    NotInPool,
    Ambiguous {
        candidates: Vec<String>,
    },
    /// No peer qualified, so there is nothing to compare against.
    EmptyPool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSnapshot {
    pub as_of: NaiveDate,
    pub window: DateRange,
    pub population: usize,
    pub averages: Option<PoolAverages>,
    pub top_performer: Option<PeerStats>,
    pub standing: PoolStanding,
}

#[derive(Debug, Clone)]
pub struct PoolBenchmarkEngine {
    policy: BenchmarkPolicy,
}

impl PoolBenchmarkEngine {
    pub fn new(policy: BenchmarkPolicy) -> Self {
        Self { policy }
    }

    pub fn window(&self, as_of: NaiveDate) -> DateRange {
        DateRange::trailing_months(as_of, self.policy.window_months)
    }

    /// Qualifying peers in the window, keyed by normalized name.
    pub fn pool(&self, executions: &[ExecutionRecord], as_of: NaiveDate) -> Vec<PeerStats> {
        let window = self.window(as_of);
        let mut grouped: BTreeMap<String, (u32, f64, f64)> = BTreeMap::new();

        for record in executions.iter().filter(|record| {
            record.is_completed() && window.contains(record.service_date)
        }) {
            let value = monetary_value(record, self.policy.basis);
            if value <= 0.0 {
                continue;
            }
            let key = normalize_name(&record.operative_name);
            if key.is_empty() {
                continue;
            }
            let (services, revenue, distance) = grouped.entry(key).or_default();
            *services += 1;
            *revenue += value;
            *distance += record.distance_km.max(0.0);
        }

        grouped
            .into_iter()
            .filter(|(_, (services, _, _))| *services >= self.policy.minimum_services)
            .map(|(name, (services, revenue, distance_km))| PeerStats {
                name,
                services,
                revenue,
                distance_km,
                revenue_per_km: if distance_km > 0.0 {
                    revenue / distance_km
                } else {
                    0.0
                },
                revenue_per_service: revenue / f64::from(services),
            })
            .collect()
    }

    pub fn benchmark(
        &self,
        name: &str,
        executions: &[ExecutionRecord],
        as_of: NaiveDate,
    ) -> BenchmarkSnapshot {
        let window = self.window(as_of);
        let pool = self.pool(executions, as_of);
        let population = pool.len();

        if population == 0 {
            return BenchmarkSnapshot {
                as_of,
                window,
                population,
                averages: None,
                top_performer: None,
                standing: PoolStanding::EmptyPool,
            };
        }

        let mean = |field: fn(&PeerStats) -> f64| {
            round_cents(pool.iter().map(field).sum::<f64>() / population as f64)
        };
        let averages = PoolAverages {
            revenue: mean(|peer| peer.revenue),
            revenue_per_km: mean(|peer| peer.revenue_per_km),
            revenue_per_service: mean(|peer| peer.revenue_per_service),
            services: mean(|peer| f64::from(peer.services)),
        };

        let by_revenue = ranked_names(&pool, |peer| peer.revenue);
        let by_services = ranked_names(&pool, |peer| f64::from(peer.services));
        let by_revenue_per_km = ranked_names(&pool, |peer| peer.revenue_per_km);

        let top_performer = by_revenue
            .first()
            .and_then(|top| pool.iter().find(|peer| &peer.name == top))
            .map(rounded);

        let keys = pool.iter().map(|peer| peer.name.as_str());
        let resolved = NameResolver.resolve(name, keys);
        let confidence = resolved.confidence();
        let standing = match resolved {
            NameMatch::Exact(key) | NameMatch::Partial(key) => {
                let rank_of = |order: &[String]| {
                    order
                        .iter()
                        .position(|candidate| candidate == &key)
                        .map(|index| index + 1)
                };
                match (
                    pool.iter().find(|peer| peer.name == key),
                    rank_of(&by_revenue),
                    rank_of(&by_services),
                    rank_of(&by_revenue_per_km),
                ) {
                    (Some(stats), Some(revenue_rank), Some(services_rank), Some(per_km_rank)) => {
                        PoolStanding::Ranked {
                            stats: rounded(stats),
                            revenue_rank,
                            services_rank,
                            revenue_per_km_rank: per_km_rank,
                            percentile: StandingPercentile::from_rank(revenue_rank, population),
                            confidence,
                        }
                    }
                    _ => PoolStanding::NotInPool,
                }
            }
            NameMatch::Ambiguous(candidates) => PoolStanding::Ambiguous { candidates },
            NameMatch::NoMatch => PoolStanding::NotInPool,
        };

        BenchmarkSnapshot {
            as_of,
            window,
            population,
            averages: Some(averages),
            top_performer,
            standing,
        }
    }
}

/// Names ordered by a metric, descending; ties keep name order.
fn ranked_names(pool: &[PeerStats], metric: fn(&PeerStats) -> f64) -> Vec<String> {
    let mut order: Vec<&PeerStats> = pool.iter().collect();
    order.sort_by(|left, right| match metric(right).total_cmp(&metric(left)) {
        Ordering::Equal => left.name.cmp(&right.name),
        other => other,
    });
    order.into_iter().map(|peer| peer.name.clone()).collect()
}

fn rounded(peer: &PeerStats) -> PeerStats {
    PeerStats {
        name: peer.name.clone(),
        services: peer.services,
        revenue: round_cents(peer.revenue),
        distance_km: round_cents(peer.distance_km),
        revenue_per_km: round_cents(peer.revenue_per_km),
        revenue_per_service: round_cents(peer.revenue_per_service),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::domain::ExecutionState;
    use chrono::Duration;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 30).expect("valid date")
    }

    fn engine() -> PoolBenchmarkEngine {
        PoolBenchmarkEngine::new(BenchmarkPolicy::default())
    }

    fn services(name: &str, count: usize, cost: f64, distance_km: f64) -> Vec<ExecutionRecord> {
        (0..count)
            .map(|index| ExecutionRecord {
                operative_name: name.to_string(),
                state: ExecutionState::Completed,
                service_date: as_of() - Duration::days(index as i64 * 3),
                scheduled_at: None,
                checked_in_at: None,
                distance_km,
                operative_cost: cost,
                sale_price: cost * 1.4,
                scope: None,
            })
            .collect()
    }

    fn fleet() -> Vec<ExecutionRecord> {
        let mut records = Vec::new();
        records.extend(services("Ana Ruiz", 5, 1000.0, 50.0));
        records.extend(services("Juan Perez", 4, 2000.0, 200.0));
        records.extend(services("Luis Gomez", 3, 500.0, 10.0));
        records.extend(services("Marta Diaz", 2, 9000.0, 10.0));
        records
    }

    #[test]
    fn pool_excludes_peers_below_minimum_services() {
        let pool = engine().pool(&fleet(), as_of());
        assert_eq!(pool.len(), 3);
        assert!(pool.iter().all(|peer| peer.name != "MARTA DIAZ"));

        let snapshot = engine().benchmark("Marta Diaz", &fleet(), as_of());
        assert_eq!(snapshot.population, 3);
        assert_eq!(snapshot.standing, PoolStanding::NotInPool);
        assert_eq!(
            snapshot.top_performer.map(|peer| peer.name),
            Some("JUAN PEREZ".to_string())
        );
    }

    #[test]
    fn ranks_each_axis_independently() {
        let snapshot = engine().benchmark("ana ruiz", &fleet(), as_of());

        match snapshot.standing {
            PoolStanding::Ranked {
                stats,
                revenue_rank,
                services_rank,
                revenue_per_km_rank,
                percentile,
                confidence,
            } => {
                // Revenue: Juan 8000, Ana 5000, Luis 1500.
                assert_eq!(revenue_rank, 2);
                assert_eq!(services_rank, 1);
                // Per km: Luis 50, Ana 20, Juan 10.
                assert_eq!(revenue_per_km_rank, 2);
                assert_eq!(percentile, StandingPercentile(67));
                assert_eq!(confidence, MatchConfidence::Exact);
                assert_eq!(stats.revenue_per_service, 1000.0);
            }
            other => panic!("expected ranked standing, got {other:?}"),
        }
    }

    #[test]
    fn averages_cover_qualifying_peers_only() {
        let snapshot = engine().benchmark("Ana Ruiz", &fleet(), as_of());
        let averages = snapshot.averages.expect("pool is not empty");

        assert_eq!(averages.revenue, 4833.33);
        assert_eq!(averages.services, 4.0);
        assert_eq!(averages.revenue_per_km, 26.67);
        assert_eq!(averages.revenue_per_service, 1166.67);
    }

    #[test]
    fn ignores_old_cancelled_and_unpaid_services() {
        let mut records = services("Ana Ruiz", 3, 1000.0, 20.0);
        records[0].state = ExecutionState::Cancelled;
        records[1].operative_cost = 0.0;
        records.extend(services("Ana Ruiz", 1, 1000.0, 20.0).into_iter().map(|mut record| {
            record.service_date = as_of() - Duration::days(200);
            record
        }));

        let snapshot = engine().benchmark("Ana Ruiz", &records, as_of());
        assert_eq!(snapshot.population, 0);
        assert_eq!(snapshot.standing, PoolStanding::EmptyPool);
        assert!(snapshot.averages.is_none());
    }

    #[test]
    fn top_of_pool_reads_one_hundred() {
        assert_eq!(StandingPercentile::from_rank(1, 3), StandingPercentile(100));
        assert_eq!(StandingPercentile::from_rank(3, 3), StandingPercentile(33));
        assert_eq!(StandingPercentile::from_rank(1, 1), StandingPercentile(100));
    }
}
