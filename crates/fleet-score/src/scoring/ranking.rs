//! Fleet-wide ranking over a trailing window.
//!
//! Both the single-operative lookup and the batch map are views over one
//! [`FleetRanking`], so they cannot disagree for the same snapshot.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::domain::{DateRange, ExecutionRecord};
use super::identity::{normalize_name, MatchConfidence, NameMatch, NameResolver};
use super::policy::{FleetScorePolicy, MonetaryBasis, TierThresholds};
use super::rating::{monetary_value, round_cents};

/// Top-X% position: 10 means "in the top 10%". Lower is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopPercentile(pub u32);

impl TopPercentile {
    pub fn from_position(position: usize, fleet_size: usize) -> Self {
        let raw = position as f64 / fleet_size as f64 * 100.0;
        Self(raw.round() as u32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Gold,
    Silver,
    Bronze,
    Standard,
}

impl Tier {
    pub fn classify(percentile: TopPercentile, thresholds: &TierThresholds) -> Self {
        let TopPercentile(value) = percentile;
        if value <= thresholds.gold {
            Tier::Gold
        } else if value <= thresholds.silver {
            Tier::Silver
        } else if value <= thresholds.bronze {
            Tier::Bronze
        } else {
            Tier::Standard
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Tier::Gold => "Gold",
            Tier::Silver => "Silver",
            Tier::Bronze => "Bronze",
            Tier::Standard => "Standard",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    /// Normalized name the fleet was grouped by.
    pub name: String,
    pub position: usize,
    pub fleet_size: usize,
    pub percentile: TopPercentile,
    pub tier: Tier,
    pub fleet_score: f64,
    pub completed: u32,
    pub revenue: f64,
    pub punctuality: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RankingLookup {
    Ranked {
        entry: RankingEntry,
        confidence: MatchConfidence,
    },
    /// Several fleet members match the name; no entry is chosen.
    Ambiguous { candidates: Vec<String> },
    /// The fleet has members but none match the name.
    NotRanked,
    /// Nobody worked in the window, so there is nothing to rank against.
    NoFleet,
}

/// Sorted fleet for one window and monetary basis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetRanking {
    pub window: DateRange,
    pub basis: MonetaryBasis,
    pub entries: Vec<RankingEntry>,
}

impl FleetRanking {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookup(&self, name: &str) -> RankingLookup {
        if self.entries.is_empty() {
            return RankingLookup::NoFleet;
        }

        let keys = self.entries.iter().map(|entry| entry.name.as_str());
        let resolved = NameResolver.resolve(name, keys);
        let confidence = resolved.confidence();
        match resolved {
            NameMatch::Exact(key) | NameMatch::Partial(key) => self
                .entries
                .iter()
                .find(|entry| entry.name == key)
                .map(|entry| RankingLookup::Ranked {
                    entry: entry.clone(),
                    confidence,
                })
                .unwrap_or(RankingLookup::NotRanked),
            NameMatch::Ambiguous(candidates) => RankingLookup::Ambiguous { candidates },
            NameMatch::NoMatch => RankingLookup::NotRanked,
        }
    }

    pub fn into_map(self) -> BTreeMap<String, RankingEntry> {
        self.entries
            .into_iter()
            .map(|entry| (entry.name.clone(), entry))
            .collect()
    }
}

#[derive(Debug, Default)]
struct FleetMember<'a> {
    completed: u32,
    revenue: f64,
    records: Vec<&'a ExecutionRecord>,
}

/// Ranking engine for one monetary basis. The dispatch board and the finance
/// view each build their own instance.
#[derive(Debug, Clone)]
pub struct FleetRankingEngine {
    policy: FleetScorePolicy,
    basis: MonetaryBasis,
}

impl FleetRankingEngine {
    pub fn new(policy: FleetScorePolicy, basis: MonetaryBasis) -> Self {
        Self { policy, basis }
    }

    pub fn window(&self, as_of: NaiveDate) -> DateRange {
        DateRange::trailing_days(as_of, self.policy.window_days)
    }

    pub fn basis(&self) -> MonetaryBasis {
        self.basis
    }

    pub fn rank(&self, executions: &[ExecutionRecord], as_of: NaiveDate) -> FleetRanking {
        let window = self.window(as_of);
        let mut members: BTreeMap<String, FleetMember<'_>> = BTreeMap::new();

        for record in executions
            .iter()
            .filter(|record| window.contains(record.service_date))
        {
            let key = normalize_name(&record.operative_name);
            if key.is_empty() {
                continue;
            }
            let member = members.entry(key).or_default();
            if record.is_completed() {
                member.completed += 1;
                member.revenue += monetary_value(record, self.basis);
            }
            member.records.push(record);
        }

        let mut scored: Vec<(String, f64, f64, FleetMember<'_>)> = members
            .into_iter()
            .map(|(name, member)| {
                let punctuality = self
                    .policy
                    .punctuality
                    .average(member.records.iter().copied());
                let score = self.fleet_score(member.completed, member.revenue, punctuality);
                (name, score, punctuality, member)
            })
            .collect();

        // BTreeMap iteration already orders names; a stable sort keeps that as
        // the tie-break.
        scored.sort_by(|left, right| right.1.total_cmp(&left.1));

        let fleet_size = scored.len();
        let entries = scored
            .into_iter()
            .enumerate()
            .map(|(index, (name, score, punctuality, member))| {
                let position = index + 1;
                let percentile = TopPercentile::from_position(position, fleet_size);
                RankingEntry {
                    name,
                    position,
                    fleet_size,
                    percentile,
                    tier: Tier::classify(percentile, &self.policy.tiers),
                    fleet_score: round_cents(score),
                    completed: member.completed,
                    revenue: round_cents(member.revenue),
                    punctuality: round_cents(punctuality),
                }
            })
            .collect();

        FleetRanking {
            window,
            basis: self.basis,
            entries,
        }
    }

    /// `w_c*min(100, completed/target*100) + w_r*min(100, revenue/target*100)
    /// + w_p*punctuality`
    pub fn fleet_score(&self, completed: u32, revenue: f64, punctuality: f64) -> f64 {
        let policy = &self.policy;
        let completion = capped_ratio(f64::from(completed), policy.completion_target);
        let revenue = capped_ratio(revenue, policy.revenue_target);
        policy.completion_weight * completion
            + policy.revenue_weight * revenue
            + policy.punctuality_weight * punctuality
    }
}

fn capped_ratio(value: f64, target: f64) -> f64 {
    if target <= 0.0 {
        return 100.0;
    }
    (value / target * 100.0).clamp(0.0, 100.0)
}
