use chrono::NaiveDate;
use fleet_score::config::DataConfig;
use fleet_score::error::AppError;
use fleet_score::scoring::{InMemoryRecordStore, MonetaryBasis, ScoringService};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type SnapshotScoringService = ScoringService<InMemoryRecordStore>;

/// Load the configured exports and policy into a ready scoring service.
pub(crate) fn build_service(data: &DataConfig) -> Result<SnapshotScoringService, AppError> {
    let policy = data.load_policy()?;
    let snapshot = data.load_snapshot()?;

    if data.snapshot_path.is_none() && data.executions_csv.is_none() {
        warn!("no record export configured; every computation will see an empty fleet");
    }
    info!(
        operatives = snapshot.operatives.len(),
        executions = snapshot.executions.len(),
        assignments = snapshot.assignments.len(),
        custom_policy = data.policy_path.is_some(),
        "record snapshot loaded"
    );

    Ok(ScoringService::new(
        Arc::new(InMemoryRecordStore::new(snapshot)),
        policy,
    ))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_basis(raw: &str) -> Result<MonetaryBasis, String> {
    match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
        "operative_cost" | "cost" => Ok(MonetaryBasis::OperativeCost),
        "sale_price" | "sale" => Ok(MonetaryBasis::SalePrice),
        other => Err(format!(
            "unknown basis '{other}'; expected operative-cost or sale-price"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_basis_aliases() {
        assert_eq!(parse_basis("Sale-Price"), Ok(MonetaryBasis::SalePrice));
        assert_eq!(parse_basis("cost"), Ok(MonetaryBasis::OperativeCost));
        assert!(parse_basis("margin").is_err());
    }

    #[test]
    fn rejects_non_iso_dates() {
        assert_eq!(
            parse_date(" 2025-06-30 "),
            Ok(NaiveDate::from_ymd_opt(2025, 6, 30).expect("valid date"))
        );
        assert!(parse_date("30/06/2025").is_err());
    }

    #[test]
    fn empty_data_config_builds_an_empty_service() {
        let service = build_service(&DataConfig::default()).expect("service builds");
        assert_eq!(service.policy().fleet.window_days, 30);
    }
}
