use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::info;

use crate::{
    error::Result,
    records::{ProcedureRecord, ScheduleRecord, StaffRecord, TheatreRecord},
    store::{BacklogFilter, OperationalStore, ScheduleFilter},
};

/// Postgres-backed OperationalStore over a single JSONB document table.
///
/// Every source collection lives in `ops_documents`, keyed by `(collection, id)`.
/// Theatre and specialty filters are applied after parsing so that the field
/// aliases accepted by the record builders apply here too.
pub struct PostgresOperationalStore {
    pool: PgPool,
}

const SCHEDULE: &str = "schedule";
const STAFF: &str = "staff";
const BACKLOG: &str = "backlog";
const RESOURCES: &str = "resources";

impl PostgresOperationalStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        info!("Connected to Postgres operational store");
        Ok(store)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS ops_documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                doc JSONB NOT NULL,
                PRIMARY KEY (collection, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS ops_documents_date_idx ON ops_documents ((doc->>'date')) WHERE collection = 'schedule'",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Upsert a raw document into one of the source collections.
    pub async fn upsert(&self, collection: &str, id: &str, doc: &Value) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO ops_documents (collection, id, doc)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id) DO UPDATE SET doc = EXCLUDED.doc
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(doc)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fetch(&self, collection: &str, limit: Option<usize>) -> Result<Vec<(String, Value)>> {
        let limit = limit.map(|l| l as i64);
        let rows = sqlx::query_as::<_, (String, Value)>(
            "SELECT id, doc FROM ops_documents WHERE collection = $1 ORDER BY id LIMIT $2",
        )
        .bind(collection)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl OperationalStore for PostgresOperationalStore {
    async fn schedules(&self, filter: &ScheduleFilter) -> Result<Vec<ScheduleRecord>> {
        let rows = sqlx::query_as::<_, (String, Value)>(
            r#"
            SELECT id, doc FROM ops_documents
            WHERE collection = $1
              AND LEFT(COALESCE(doc->>'date', doc->>'sessionDate'), 10) BETWEEN $2 AND $3
            ORDER BY COALESCE(doc->>'date', doc->>'sessionDate'),
                     COALESCE(doc->>'startTime', doc->>'scheduledTime'),
                     id
            "#,
        )
        .bind(SCHEDULE)
        .bind(filter.from.format("%Y-%m-%d").to_string())
        .bind(filter.to.format("%Y-%m-%d").to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|(id, doc)| ScheduleRecord::from_document(id.as_str(), doc))
            .filter(|record| filter.matches(record))
            .collect())
    }

    async fn staff(&self, limit: Option<usize>) -> Result<Vec<StaffRecord>> {
        Ok(self
            .fetch(STAFF, limit)
            .await?
            .iter()
            .map(|(id, doc)| StaffRecord::from_document(id.as_str(), doc))
            .collect())
    }

    async fn backlog(&self, filter: &BacklogFilter) -> Result<Vec<ProcedureRecord>> {
        let limit = filter.limit.map(|l| l as i64);
        let rows = sqlx::query_as::<_, (String, Value)>(
            r#"
            SELECT id, doc FROM ops_documents
            WHERE collection = $1
              AND ($2::TEXT IS NULL OR LOWER(doc->>'status') = $2)
            ORDER BY id
            LIMIT $3
            "#,
        )
        .bind(BACKLOG)
        .bind(filter.status.as_deref())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|(id, doc)| ProcedureRecord::from_document(id.as_str(), doc))
            .collect())
    }

    async fn theatres(&self) -> Result<Vec<TheatreRecord>> {
        Ok(self
            .fetch(RESOURCES, None)
            .await?
            .iter()
            .map(|(id, doc)| TheatreRecord::from_document(id.as_str(), doc))
            .collect())
    }
}
