use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use fleet_score::scoring::{
    ExecutionRecord, ExecutionState, InMemoryRecordStore, MonetaryBasis, RankingLookup,
    RecordSnapshot, ScoringPolicy, ScoringService, Tier, TopPercentile,
};

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, 30).expect("valid as-of date")
}

fn completed(name: &str, days_ago: i64) -> ExecutionRecord {
    let date = as_of() - Duration::days(days_ago);
    let scheduled = date.and_hms_opt(6, 0, 0).expect("valid time");
    ExecutionRecord {
        operative_name: name.to_string(),
        state: ExecutionState::Completed,
        service_date: date,
        scheduled_at: Some(scheduled),
        checked_in_at: Some(scheduled),
        distance_km: 15.0,
        operative_cost: 1000.0,
        sale_price: 1600.0,
        scope: None,
    }
}

/// Ten operatives; operative k completes 11 - k services, so scores fall
/// strictly with k.
fn fleet_of_ten() -> Vec<ExecutionRecord> {
    (1..=10)
        .flat_map(|k: i64| {
            let name = format!("Operative {k:02}");
            (0..(11 - k)).map(move |day| completed(&name, day))
        })
        .collect()
}

fn service(executions: Vec<ExecutionRecord>) -> ScoringService<InMemoryRecordStore> {
    let snapshot = RecordSnapshot::default().with_executions(executions);
    ScoringService::new(
        Arc::new(InMemoryRecordStore::new(snapshot)),
        ScoringPolicy::default(),
    )
}

#[tokio::test]
async fn fleet_of_ten_maps_positions_to_documented_tiers() {
    let service = service(fleet_of_ten());
    let batch = service
        .fleet_ranking_batch(MonetaryBasis::OperativeCost, as_of())
        .await
        .expect("ranking computed");

    assert_eq!(batch.len(), 10);
    for k in 1..=10usize {
        let entry = &batch[&format!("OPERATIVE {k:02}")];
        assert_eq!(entry.position, k, "position of operative {k}");
        assert_eq!(entry.fleet_size, 10);
        assert_eq!(entry.percentile, TopPercentile(k as u32 * 10));

        let expected_tier = match k {
            1 => Tier::Gold,
            2 => Tier::Silver,
            3..=5 => Tier::Bronze,
            _ => Tier::Standard,
        };
        assert_eq!(entry.tier, expected_tier, "tier of operative {k}");
    }
}

#[tokio::test]
async fn positions_form_a_strict_order_by_fleet_score() {
    let service = service(fleet_of_ten());
    let ranking = service
        .fleet_ranking_table(MonetaryBasis::OperativeCost, as_of())
        .await
        .expect("ranking computed");

    for pair in ranking.entries.windows(2) {
        assert!(pair[0].fleet_score > pair[1].fleet_score);
        assert_eq!(pair[0].position + 1, pair[1].position);
    }
}

#[tokio::test]
async fn single_lookup_matches_batch_bit_for_bit() {
    let service = service(fleet_of_ten());
    let batch = service
        .fleet_ranking_batch(MonetaryBasis::SalePrice, as_of())
        .await
        .expect("batch computed");

    for (name, expected) in &batch {
        let lookup = service
            .fleet_ranking(&name.to_lowercase(), MonetaryBasis::SalePrice, as_of())
            .await
            .expect("lookup computed");
        match lookup {
            RankingLookup::Ranked { entry, .. } => assert_eq!(&entry, expected),
            other => panic!("expected {name} to be ranked, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn equal_scores_break_ties_by_name() {
    let executions = vec![
        completed("Zoe Vargas", 1),
        completed("Alma Ochoa", 1),
        completed("Mario Leal", 1),
    ];
    let service = service(executions);

    let ranking = service
        .fleet_ranking_table(MonetaryBasis::OperativeCost, as_of())
        .await
        .expect("ranking computed");
    let names: Vec<&str> = ranking.entries.iter().map(|entry| entry.name.as_str()).collect();
    assert_eq!(names, ["ALMA OCHOA", "MARIO LEAL", "ZOE VARGAS"]);
}

#[tokio::test]
async fn empty_window_reports_no_fleet_instead_of_rank_one() {
    let stale = vec![completed("Operative 01", 90)];
    let service = service(stale);

    let lookup = service
        .fleet_ranking("Operative 01", MonetaryBasis::OperativeCost, as_of())
        .await
        .expect("lookup computed");
    assert_eq!(lookup, RankingLookup::NoFleet);

    let batch = service
        .fleet_ranking_batch(MonetaryBasis::OperativeCost, as_of())
        .await
        .expect("batch computed");
    assert!(batch.is_empty());
}
