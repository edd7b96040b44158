use chrono::{Duration, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned operative identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OperativeId(pub String);

impl fmt::Display for OperativeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperativeStatus {
    Active,
    Suspended,
    Inactive,
}

impl OperativeStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Suspended => "Suspended",
            Self::Inactive => "Inactive",
        }
    }
}

/// Declared preference for where an operative is willing to work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServicePreference {
    Local,
    OutOfTown,
    #[default]
    Indifferent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceScope {
    Local,
    OutOfTown,
}

/// Operative master record as exposed by the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operative {
    pub id: OperativeId,
    pub name: String,
    pub phone: String,
    pub status: OperativeStatus,
    #[serde(default)]
    pub base_zone: Option<String>,
    #[serde(default)]
    pub preference: ServicePreference,
    /// Whether the operative is currently marked available for new work.
    #[serde(default)]
    pub available: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanningState {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

/// Planned or offered service, independent of whether it was executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub operative_id: OperativeId,
    pub service_date: NaiveDate,
    pub state: PlanningState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

/// Realized service. Joined to operatives by free-text name, not by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub operative_name: String,
    pub state: ExecutionState,
    pub service_date: NaiveDate,
    #[serde(default)]
    pub scheduled_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub checked_in_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub distance_km: f64,
    /// Amount paid to the operative.
    #[serde(default)]
    pub operative_cost: f64,
    /// Amount billed to the client.
    #[serde(default)]
    pub sale_price: f64,
    #[serde(default)]
    pub scope: Option<ServiceScope>,
}

impl ExecutionRecord {
    pub fn is_completed(&self) -> bool {
        self.state == ExecutionState::Completed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectionRecord {
    pub operative_id: OperativeId,
    pub rejected_on: NaiveDate,
}

/// Pre-service compliance checklist, keyed by the operative's phone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistRecord {
    pub phone: String,
    pub filed_on: NaiveDate,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub phone: String,
    pub document_type: String,
    pub verified: bool,
    #[serde(default)]
    pub expires_on: Option<NaiveDate>,
}

impl DocumentRecord {
    pub fn is_expired(&self, as_of: NaiveDate) -> bool {
        self.expires_on.map(|date| date < as_of).unwrap_or(false)
    }
}

/// Inclusive calendar window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn trailing_days(as_of: NaiveDate, days: u32) -> Self {
        let start = as_of
            .checked_sub_signed(Duration::days(i64::from(days)))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end: as_of }
    }

    pub fn trailing_months(as_of: NaiveDate, months: u32) -> Self {
        let start = as_of
            .checked_sub_months(Months::new(months))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end: as_of }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Identifiers supplied by a caller for a per-operative computation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperativeIdentity {
    #[serde(default)]
    pub id: Option<OperativeId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl OperativeIdentity {
    pub fn new(id: impl Into<String>, name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            id: Some(OperativeId(id.into())),
            name: Some(name.into()),
            phone: Some(phone.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_window_is_inclusive_on_both_ends() {
        let as_of = NaiveDate::from_ymd_opt(2025, 3, 31).expect("valid date");
        let window = DateRange::trailing_days(as_of, 30);

        assert_eq!(window.start, NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid"));
        assert!(window.contains(window.start));
        assert!(window.contains(as_of));
        assert!(!window.contains(as_of + Duration::days(1)));
    }

    #[test]
    fn windows_near_the_calendar_floor_clamp_instead_of_overflowing() {
        let as_of = NaiveDate::MIN + Duration::days(3);

        let days = DateRange::trailing_days(as_of, 30);
        assert_eq!(days.start, NaiveDate::MIN);
        assert_eq!(days.end, as_of);

        let months = DateRange::trailing_months(as_of, 6);
        assert_eq!(months.start, NaiveDate::MIN);
    }

    #[test]
    fn month_window_clamps_to_month_end() {
        let as_of = NaiveDate::from_ymd_opt(2025, 8, 31).expect("valid date");
        let window = DateRange::trailing_months(as_of, 6);
        assert_eq!(window.start, NaiveDate::from_ymd_opt(2025, 2, 28).expect("valid"));
    }

    #[test]
    fn documents_without_expiry_never_expire() {
        let as_of = NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date");
        let document = DocumentRecord {
            phone: "555-0100".to_string(),
            document_type: "firearm_license".to_string(),
            verified: true,
            expires_on: None,
        };
        assert!(!document.is_expired(as_of));
    }
}
