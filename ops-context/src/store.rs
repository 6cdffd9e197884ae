use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::{ContextError, Result},
    models::RetrievalWindow,
    records::{ProcedureRecord, ScheduleRecord, StaffRecord, TheatreRecord},
};

/// Equality filters for schedule retrieval over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleFilter {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub theatre: Option<String>,
    pub specialty: Option<String>,
}

impl ScheduleFilter {
    pub fn on(date: NaiveDate) -> Self {
        Self::between(date, date)
    }

    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from,
            to,
            theatre: None,
            specialty: None,
        }
    }

    pub fn for_window(window: RetrievalWindow) -> Self {
        Self::between(window.from, window.to)
    }

    pub fn window(&self) -> RetrievalWindow {
        RetrievalWindow {
            from: self.from,
            to: self.to,
        }
    }

    /// Theatre matches the record's id or display name.
    pub fn with_theatre(mut self, theatre: Option<String>) -> Self {
        self.theatre = theatre;
        self
    }

    pub fn with_specialty(mut self, specialty: Option<String>) -> Self {
        self.specialty = specialty;
        self
    }

    pub fn matches(&self, record: &ScheduleRecord) -> bool {
        let window = self.window();
        let in_range = record.date.is_some_and(|date| window.contains(date));
        let theatre_ok = self
            .theatre
            .as_deref()
            .is_none_or(|wanted| record.is_in_theatre(wanted));
        let specialty_ok = self
            .specialty
            .as_deref()
            .is_none_or(|wanted| record.specialty.as_deref() == Some(wanted));
        in_range && theatre_ok && specialty_ok
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BacklogFilter {
    pub status: Option<String>,
    pub limit: Option<usize>,
}

impl BacklogFilter {
    pub fn with_status(status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
            limit: None,
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, record: &ProcedureRecord) -> bool {
        self.status
            .as_deref()
            .is_none_or(|wanted| record.status.as_deref() == Some(wanted))
    }
}

/// Read-only access to the operational sources.
///
/// Implementations convert their native documents into typed records and return
/// them in a stable order: schedules by date, start time then id, everything
/// else by id.
#[async_trait]
pub trait OperationalStore: Send + Sync {
    async fn schedules(&self, filter: &ScheduleFilter) -> Result<Vec<ScheduleRecord>>;
    async fn staff(&self, limit: Option<usize>) -> Result<Vec<StaffRecord>>;
    async fn backlog(&self, filter: &BacklogFilter) -> Result<Vec<ProcedureRecord>>;
    async fn theatres(&self) -> Result<Vec<TheatreRecord>>;
}

/// Seed document layout: one list of raw documents per collection.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SeedData {
    pub schedule: Vec<Value>,
    pub staff: Vec<Value>,
    pub backlog: Vec<Value>,
    pub resources: Vec<Value>,
}

/// In-memory implementation of OperationalStore
#[derive(Clone, Default)]
pub struct InMemoryOperationalStore {
    schedule: Arc<DashMap<String, Value>>,
    staff: Arc<DashMap<String, Value>>,
    backlog: Arc<DashMap<String, Value>>,
    resources: Arc<DashMap<String, Value>>,
}

fn document_id(doc: &Value) -> String {
    match doc.get("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => id.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => Uuid::new_v4().to_string(),
    }
}

fn insert_document(collection: &DashMap<String, Value>, doc: Value) -> String {
    let id = document_id(&doc);
    collection.insert(id.clone(), doc);
    id
}

fn parse_all<T>(collection: &DashMap<String, Value>, build: impl Fn(&str, &Value) -> T) -> Vec<T> {
    collection
        .iter()
        .map(|entry| build(entry.key(), entry.value()))
        .collect()
}

impl InMemoryOperationalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: SeedData) -> Self {
        let store = Self::new();
        for doc in seed.schedule {
            store.insert_schedule(doc);
        }
        for doc in seed.staff {
            store.insert_staff(doc);
        }
        for doc in seed.backlog {
            store.insert_backlog(doc);
        }
        for doc in seed.resources {
            store.insert_theatre(doc);
        }
        store
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let seed: SeedData =
            serde_yaml::from_str(raw).map_err(|e| ContextError::SeedError(e.to_string()))?;
        Ok(Self::from_seed(seed))
    }

    pub fn from_seed_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ContextError::SeedError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&raw)
    }

    /// Insert a raw schedule document, returning its id.
    pub fn insert_schedule(&self, doc: Value) -> String {
        insert_document(&self.schedule, doc)
    }

    pub fn insert_staff(&self, doc: Value) -> String {
        insert_document(&self.staff, doc)
    }

    pub fn insert_backlog(&self, doc: Value) -> String {
        insert_document(&self.backlog, doc)
    }

    pub fn insert_theatre(&self, doc: Value) -> String {
        insert_document(&self.resources, doc)
    }
}

#[async_trait]
impl OperationalStore for InMemoryOperationalStore {
    async fn schedules(&self, filter: &ScheduleFilter) -> Result<Vec<ScheduleRecord>> {
        let mut records: Vec<ScheduleRecord> =
            parse_all(&self.schedule, |id, doc| ScheduleRecord::from_document(id, doc))
                .into_iter()
                .filter(|record| filter.matches(record))
                .collect();
        records.sort_by(|a, b| {
            (a.date, &a.start_time, &a.id).cmp(&(b.date, &b.start_time, &b.id))
        });
        Ok(records)
    }

    async fn staff(&self, limit: Option<usize>) -> Result<Vec<StaffRecord>> {
        let mut records = parse_all(&self.staff, |id, doc| StaffRecord::from_document(id, doc));
        records.sort_by(|a, b| a.id.cmp(&b.id));
        if let Some(limit) = limit {
            records.truncate(limit);
        }
        Ok(records)
    }

    async fn backlog(&self, filter: &BacklogFilter) -> Result<Vec<ProcedureRecord>> {
        let mut records: Vec<ProcedureRecord> =
            parse_all(&self.backlog, |id, doc| ProcedureRecord::from_document(id, doc))
                .into_iter()
                .filter(|record| filter.matches(record))
                .collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        if let Some(limit) = filter.limit {
            records.truncate(limit);
        }
        Ok(records)
    }

    async fn theatres(&self) -> Result<Vec<TheatreRecord>> {
        let mut records = parse_all(&self.resources, |id, doc| TheatreRecord::from_document(id, doc));
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, day).unwrap()
    }

    #[tokio::test]
    async fn schedules_filter_by_date_theatre_and_specialty() {
        let store = InMemoryOperationalStore::new();
        store.insert_schedule(json!({ "id": "a", "date": "2026-10-16", "theatre": "T1", "specialty": "urology" }));
        store.insert_schedule(json!({ "id": "b", "date": "2026-10-16", "theatre": "T2", "specialty": "urology" }));
        store.insert_schedule(json!({ "id": "c", "date": "2026-10-17", "theatre": "T1", "specialty": "urology" }));
        store.insert_schedule(json!({ "id": "d", "theatre": "T1" }));

        let all_today = store.schedules(&ScheduleFilter::on(date(16))).await.unwrap();
        assert_eq!(all_today.len(), 2);

        let filtered = store
            .schedules(
                &ScheduleFilter::on(date(16))
                    .with_theatre(Some("T1".to_string()))
                    .with_specialty(Some("urology".to_string())),
            )
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "a");

        let range = store
            .schedules(&ScheduleFilter::between(date(16), date(17)))
            .await
            .unwrap();
        let ids: Vec<_> = range.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn theatre_filter_accepts_id_or_name() {
        let store = InMemoryOperationalStore::new();
        store.insert_schedule(json!({ "id": "a", "date": "2026-10-16", "theatre": "Main Theatre 1", "theatreId": "th-1" }));
        store.insert_schedule(json!({ "id": "b", "date": "2026-10-16", "theatre": "Main Theatre 2", "theatreId": "th-2" }));

        for wanted in ["th-1", "Main Theatre 1"] {
            let records = store
                .schedules(&ScheduleFilter::on(date(16)).with_theatre(Some(wanted.to_string())))
                .await
                .unwrap();
            let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
            assert_eq!(ids, vec!["a"], "selected {wanted}");
        }
    }

    #[test]
    fn filter_window_round_trips() {
        let window = RetrievalWindow {
            from: date(12),
            to: date(18),
        };
        let filter = ScheduleFilter::for_window(window);
        assert_eq!(filter.window(), window);
        assert!(filter.window().contains(date(18)));
        assert!(!filter.window().contains(date(19)));
    }

    #[tokio::test]
    async fn schedules_sort_by_start_time() {
        let store = InMemoryOperationalStore::new();
        store.insert_schedule(json!({ "id": "late", "date": "2026-10-16", "startTime": "13:00" }));
        store.insert_schedule(json!({ "id": "early", "date": "2026-10-16", "startTime": "08:00" }));

        let records = store.schedules(&ScheduleFilter::on(date(16))).await.unwrap();
        assert_eq!(records[0].id, "early");
        assert_eq!(records[1].id, "late");
    }

    #[tokio::test]
    async fn backlog_filters_status_and_limit() {
        let store = InMemoryOperationalStore::new();
        for i in 0..5 {
            store.insert_backlog(json!({ "id": format!("p{i}"), "status": "waiting" }));
        }
        store.insert_backlog(json!({ "id": "done", "status": "scheduled" }));

        let waiting = store
            .backlog(&BacklogFilter::with_status("waiting"))
            .await
            .unwrap();
        assert_eq!(waiting.len(), 5);

        let limited = store
            .backlog(&BacklogFilter::with_status("waiting").limit(2))
            .await
            .unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].id, "p0");
    }

    #[tokio::test]
    async fn documents_without_id_get_one() {
        let store = InMemoryOperationalStore::new();
        let id = store.insert_staff(json!({ "firstName": "Sam", "role": "Nurse" }));
        assert!(!id.is_empty());

        let staff = store.staff(None).await.unwrap();
        assert_eq!(staff.len(), 1);
        assert_eq!(staff[0].id, id);
    }

    #[test]
    fn seed_yaml_loads_every_collection() {
        let store = InMemoryOperationalStore::from_yaml_str(
            r#"
schedule:
  - id: s1
    date: "2026-10-16"
    theatre: Theatre 1
staff:
  - id: st1
    role: Nurse
backlog:
  - id: p1
    status: waiting
resources:
  - id: t1
    name: Theatre 1
"#,
        )
        .unwrap();

        assert_eq!(store.schedule.len(), 1);
        assert_eq!(store.staff.len(), 1);
        assert_eq!(store.backlog.len(), 1);
        assert_eq!(store.resources.len(), 1);
    }

    #[test]
    fn invalid_seed_is_an_error() {
        let result = InMemoryOperationalStore::from_yaml_str("schedule: 12");
        assert!(matches!(result, Err(ContextError::SeedError(_))));
    }
}
