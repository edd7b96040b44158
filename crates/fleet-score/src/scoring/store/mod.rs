mod csv_import;
mod snapshot;

pub use csv_import::{ExecutionCsvImporter, ImportError};
pub use snapshot::RecordSnapshot;

use async_trait::async_trait;

use super::domain::{
    AssignmentRecord, ChecklistRecord, DateRange, DocumentRecord, ExecutionRecord, Operative,
    OperativeId, RejectionRecord,
};
use super::identity::{normalize_name, NameResolver};

/// Filter for execution reads. `name` is a case-insensitive partial match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionQuery {
    pub name: Option<String>,
    pub range: Option<DateRange>,
}

impl ExecutionQuery {
    pub fn fleet(range: DateRange) -> Self {
        Self {
            name: None,
            range: Some(range),
        }
    }

    pub fn for_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            range: None,
        }
    }
}

/// Read-only client for the external record store. Implementations own
/// transport, retries and caching; the engine only consumes these reads.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn operative(&self, id: &OperativeId) -> Result<Option<Operative>, StoreError>;
    async fn assignments(&self, id: &OperativeId) -> Result<Vec<AssignmentRecord>, StoreError>;
    async fn executions(&self, query: &ExecutionQuery) -> Result<Vec<ExecutionRecord>, StoreError>;
    async fn rejections(&self, id: &OperativeId) -> Result<Vec<RejectionRecord>, StoreError>;
    async fn checklists(&self, phone: &str) -> Result<Vec<ChecklistRecord>, StoreError>;
    async fn documents(&self, phone: &str) -> Result<Vec<DocumentRecord>, StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),
    #[error("record store rejected the query: {0}")]
    InvalidQuery(String),
}

/// Store backed by a loaded [`RecordSnapshot`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordStore {
    snapshot: RecordSnapshot,
    resolver: NameResolver,
}

impl InMemoryRecordStore {
    pub fn new(snapshot: RecordSnapshot) -> Self {
        Self {
            snapshot,
            resolver: NameResolver,
        }
    }

    pub fn snapshot(&self) -> &RecordSnapshot {
        &self.snapshot
    }
}

fn same_phone(left: &str, right: &str) -> bool {
    let digits = |value: &str| value.chars().filter(char::is_ascii_digit).collect::<String>();
    let left = digits(left);
    !left.is_empty() && left == digits(right)
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn operative(&self, id: &OperativeId) -> Result<Option<Operative>, StoreError> {
        Ok(self
            .snapshot
            .operatives
            .iter()
            .find(|operative| &operative.id == id)
            .cloned())
    }

    async fn assignments(&self, id: &OperativeId) -> Result<Vec<AssignmentRecord>, StoreError> {
        Ok(self
            .snapshot
            .assignments
            .iter()
            .filter(|record| &record.operative_id == id)
            .cloned()
            .collect())
    }

    async fn executions(&self, query: &ExecutionQuery) -> Result<Vec<ExecutionRecord>, StoreError> {
        if let Some(name) = &query.name {
            if normalize_name(name).is_empty() {
                return Err(StoreError::InvalidQuery("empty name filter".to_string()));
            }
        }

        Ok(self
            .snapshot
            .executions
            .iter()
            .filter(|record| {
                query
                    .name
                    .as_deref()
                    .map(|name| self.resolver.matches(name, &record.operative_name))
                    .unwrap_or(true)
            })
            .filter(|record| {
                query
                    .range
                    .map(|range| range.contains(record.service_date))
                    .unwrap_or(true)
            })
            .cloned()
            .collect())
    }

    async fn rejections(&self, id: &OperativeId) -> Result<Vec<RejectionRecord>, StoreError> {
        Ok(self
            .snapshot
            .rejections
            .iter()
            .filter(|record| &record.operative_id == id)
            .cloned()
            .collect())
    }

    async fn checklists(&self, phone: &str) -> Result<Vec<ChecklistRecord>, StoreError> {
        Ok(self
            .snapshot
            .checklists
            .iter()
            .filter(|record| same_phone(phone, &record.phone))
            .cloned()
            .collect())
    }

    async fn documents(&self, phone: &str) -> Result<Vec<DocumentRecord>, StoreError> {
        Ok(self
            .snapshot
            .documents
            .iter()
            .filter(|record| same_phone(phone, &record.phone))
            .cloned()
            .collect())
    }
}
