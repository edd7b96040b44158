use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use std::io::Read;
use std::path::Path;

use crate::scoring::domain::{ExecutionRecord, ExecutionState, ServiceScope};

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid snapshot document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },
}

/// Reads execution exports with the dispatch tool's column headers.
pub struct ExecutionCsvImporter;

impl ExecutionCsvImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<ExecutionRecord>, ImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<ExecutionRecord>, ImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for (index, row) in csv_reader.deserialize::<ExecutionRow>().enumerate() {
            // Header is line 1.
            let row_number = index + 2;
            records.push(row?.into_record(row_number)?);
        }

        Ok(records)
    }
}

#[derive(Debug, Deserialize)]
struct ExecutionRow {
    #[serde(rename = "Operative")]
    operative: String,
    #[serde(rename = "Status")]
    status: String,
    #[serde(rename = "Service Date")]
    service_date: String,
    #[serde(
        rename = "Scheduled At",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    scheduled_at: Option<String>,
    #[serde(
        rename = "Checked In At",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    checked_in_at: Option<String>,
    #[serde(rename = "Distance Km", default, deserialize_with = "empty_string_as_none")]
    distance_km: Option<String>,
    #[serde(
        rename = "Operative Cost",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    operative_cost: Option<String>,
    #[serde(rename = "Sale Price", default, deserialize_with = "empty_string_as_none")]
    sale_price: Option<String>,
    #[serde(rename = "Scope", default, deserialize_with = "empty_string_as_none")]
    scope: Option<String>,
}

impl ExecutionRow {
    fn into_record(self, row: usize) -> Result<ExecutionRecord, ImportError> {
        let invalid = |reason: String| ImportError::InvalidRow { row, reason };

        let state = parse_state(&self.status)
            .ok_or_else(|| invalid(format!("unknown status '{}'", self.status)))?;
        let service_date = parse_datetime(&self.service_date)
            .map(|dt| dt.date())
            .ok_or_else(|| invalid(format!("unparseable service date '{}'", self.service_date)))?;

        let scheduled_at = self.scheduled_at.as_deref().and_then(parse_datetime);
        let checked_in_at = self.checked_in_at.as_deref().and_then(parse_datetime);

        let amount = |label: &str, raw: Option<&str>| -> Result<f64, ImportError> {
            match raw {
                None => Ok(0.0),
                Some(value) => parse_amount(value)
                    .ok_or_else(|| invalid(format!("unparseable {label} '{value}'"))),
            }
        };

        Ok(ExecutionRecord {
            operative_name: self.operative,
            state,
            service_date,
            scheduled_at,
            checked_in_at,
            distance_km: amount("distance", self.distance_km.as_deref())?,
            operative_cost: amount("operative cost", self.operative_cost.as_deref())?,
            sale_price: amount("sale price", self.sale_price.as_deref())?,
            scope: self.scope.as_deref().and_then(parse_scope),
        })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_state(value: &str) -> Option<ExecutionState> {
    match value.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
        "completed" | "done" | "finished" => Some(ExecutionState::Completed),
        "in_progress" | "started" => Some(ExecutionState::InProgress),
        "scheduled" | "pending" => Some(ExecutionState::Scheduled),
        "cancelled" | "canceled" => Some(ExecutionState::Cancelled),
        _ => None,
    }
}

fn parse_scope(value: &str) -> Option<ServiceScope> {
    match value.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
        "local" => Some(ServiceScope::Local),
        "out_of_town" | "foraneo" | "foreign" => Some(ServiceScope::OutOfTown),
        _ => None,
    }
}

/// Accepts `1,250.50` and `$1250.5` style amounts.
fn parse_amount(value: &str) -> Option<f64> {
    let cleaned: String = value
        .chars()
        .filter(|ch| !matches!(ch, ',' | '$' | ' '))
        .collect();
    cleaned.parse::<f64>().ok().filter(|amount| amount.is_finite())
}

fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    None
}
