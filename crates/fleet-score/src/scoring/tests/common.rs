use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::response::Response;
use chrono::{Duration, NaiveDate};
use serde_json::Value;

use crate::scoring::domain::{
    AssignmentRecord, ChecklistRecord, DocumentRecord, ExecutionRecord, ExecutionState, Operative,
    OperativeId, OperativeIdentity, OperativeStatus, PlanningState, RejectionRecord,
    ServicePreference, ServiceScope,
};
use crate::scoring::policy::ScoringPolicy;
use crate::scoring::store::{
    ExecutionQuery, InMemoryRecordStore, RecordSnapshot, RecordStore, StoreError,
};
use crate::scoring::{scoring_router, ScoringService};

pub(super) fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 30).expect("valid date")
}

pub(super) fn ana() -> OperativeIdentity {
    OperativeIdentity::new("op-1", "Ana Ruiz", "555-0100")
}

pub(super) fn nadia() -> OperativeIdentity {
    OperativeIdentity::new("op-3", "Nadia Torres", "555-0300")
}

fn operative(id: &str, name: &str, phone: &str, available: bool) -> Operative {
    Operative {
        id: OperativeId(id.to_string()),
        name: name.to_string(),
        phone: phone.to_string(),
        status: OperativeStatus::Active,
        base_zone: Some("Centro".to_string()),
        preference: ServicePreference::Indifferent,
        available,
    }
}

pub(super) fn on_time_service(name: &str, days_ago: i64, cost: f64) -> ExecutionRecord {
    let date = as_of() - Duration::days(days_ago);
    let scheduled = date.and_hms_opt(8, 0, 0).expect("valid time");
    ExecutionRecord {
        operative_name: name.to_string(),
        state: ExecutionState::Completed,
        service_date: date,
        scheduled_at: Some(scheduled),
        checked_in_at: Some(scheduled - Duration::minutes(5)),
        distance_km: 20.0,
        operative_cost: cost,
        sale_price: cost * 1.5,
        scope: Some(if days_ago % 2 == 0 {
            ServiceScope::Local
        } else {
            ServiceScope::OutOfTown
        }),
    }
}

/// Ana has a spotless month; Juan and Luis fill out the fleet; Nadia exists
/// but has never worked.
pub(super) fn fleet_snapshot() -> RecordSnapshot {
    let ana_id = OperativeId("op-1".to_string());
    let mut snapshot = RecordSnapshot {
        operatives: vec![
            operative("op-1", "Ana Ruiz", "555-0100", true),
            operative("op-2", "Juan Perez", "555-0200", true),
            operative("op-3", "Nadia Torres", "555-0300", false),
        ],
        ..RecordSnapshot::default()
    };

    for day in 0..20 {
        snapshot
            .executions
            .push(on_time_service("Ana Ruiz", day, 1000.0));
        snapshot.assignments.push(AssignmentRecord {
            operative_id: ana_id.clone(),
            service_date: as_of() - Duration::days(day),
            state: PlanningState::Completed,
        });
        snapshot.checklists.push(ChecklistRecord {
            phone: "555-0100".to_string(),
            filed_on: as_of() - Duration::days(day),
            completed: true,
        });
    }
    for document_type in ["license", "insurance", "id", "background", "vehicle"] {
        snapshot.documents.push(DocumentRecord {
            phone: "(555) 0100".to_string(),
            document_type: document_type.to_string(),
            verified: true,
            expires_on: None,
        });
    }
    for day in 0..10 {
        snapshot
            .executions
            .push(on_time_service("Juan Perez", day * 2, 500.0));
    }
    for day in 0..5 {
        snapshot
            .executions
            .push(on_time_service("Luis Gomez", day * 3, 300.0));
    }
    snapshot.rejections.push(RejectionRecord {
        operative_id: OperativeId("op-2".to_string()),
        rejected_on: as_of(),
    });

    snapshot
}

pub(super) fn build_service() -> ScoringService<InMemoryRecordStore> {
    ScoringService::new(
        Arc::new(InMemoryRecordStore::new(fleet_snapshot())),
        ScoringPolicy::default(),
    )
}

/// Which reads a [`FlakyStore`] should fail.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct Outage {
    pub(super) operative: bool,
    pub(super) metric_sources: bool,
    pub(super) fleet: bool,
}

/// Wraps the in-memory store, fails selected reads and counts every read.
pub(super) struct FlakyStore {
    inner: InMemoryRecordStore,
    outage: Outage,
    reads: AtomicUsize,
}

impl FlakyStore {
    pub(super) fn new(outage: Outage) -> Self {
        Self {
            inner: InMemoryRecordStore::new(fleet_snapshot()),
            outage,
            reads: AtomicUsize::new(0),
        }
    }

    pub(super) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::SeqCst);
    }
}

fn offline() -> StoreError {
    StoreError::Unavailable("connection refused".to_string())
}

#[async_trait]
impl RecordStore for FlakyStore {
    async fn operative(&self, id: &OperativeId) -> Result<Option<Operative>, StoreError> {
        self.record_read();
        if self.outage.operative {
            return Err(offline());
        }
        self.inner.operative(id).await
    }

    async fn assignments(&self, id: &OperativeId) -> Result<Vec<AssignmentRecord>, StoreError> {
        self.record_read();
        if self.outage.metric_sources {
            return Err(offline());
        }
        self.inner.assignments(id).await
    }

    async fn executions(&self, query: &ExecutionQuery) -> Result<Vec<ExecutionRecord>, StoreError> {
        self.record_read();
        let fleet_read = query.name.is_none();
        if (fleet_read && self.outage.fleet) || (!fleet_read && self.outage.metric_sources) {
            return Err(offline());
        }
        self.inner.executions(query).await
    }

    async fn rejections(&self, id: &OperativeId) -> Result<Vec<RejectionRecord>, StoreError> {
        self.record_read();
        if self.outage.metric_sources {
            return Err(offline());
        }
        self.inner.rejections(id).await
    }

    async fn checklists(&self, phone: &str) -> Result<Vec<ChecklistRecord>, StoreError> {
        self.record_read();
        if self.outage.metric_sources {
            return Err(offline());
        }
        self.inner.checklists(phone).await
    }

    async fn documents(&self, phone: &str) -> Result<Vec<DocumentRecord>, StoreError> {
        self.record_read();
        if self.outage.metric_sources {
            return Err(offline());
        }
        self.inner.documents(phone).await
    }
}

pub(super) fn flaky_service(outage: Outage) -> ScoringService<FlakyStore> {
    ScoringService::new(Arc::new(FlakyStore::new(outage)), ScoringPolicy::default())
}

/// Healthy store shared with the caller so tests can inspect its read count.
pub(super) fn counted_service() -> (Arc<FlakyStore>, ScoringService<FlakyStore>) {
    let store = Arc::new(FlakyStore::new(Outage::default()));
    let service = ScoringService::new(store.clone(), ScoringPolicy::default());
    (store, service)
}

/// The standard fleet with every operative cost zeroed.
pub(super) fn zero_revenue_service() -> ScoringService<InMemoryRecordStore> {
    let mut snapshot = fleet_snapshot();
    for record in &mut snapshot.executions {
        record.operative_cost = 0.0;
    }
    ScoringService::new(
        Arc::new(InMemoryRecordStore::new(snapshot)),
        ScoringPolicy::default(),
    )
}

pub(super) fn router() -> axum::Router {
    scoring_router(Arc::new(build_service()))
}

pub(super) fn flaky_router(outage: Outage) -> axum::Router {
    scoring_router(Arc::new(flaky_service(outage)))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
