pub mod config;
mod document;
pub mod error;
pub mod formatter;
pub mod historical;
pub mod insights;
pub mod intent;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod recommendations;
pub mod records;
pub mod retriever;
pub mod store;
#[cfg(feature = "postgres")]
pub mod store_postgres;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use error::{ContextError, Result};
pub use formatter::{ContextBlock, format_context};
pub use intent::{QueryCategory, QueryIntent, analyze_query};
pub use models::{
    ContextMetadata, ContextResult, DataContext, DataSource, Insight, InsightKind,
    MetricsSnapshot, PageContext, Recommendation, RetrievalWindow, Severity, ViewType,
};
pub use pipeline::ContextPipeline;
pub use records::{ProcedureRecord, ScheduleRecord, SessionType, StaffRecord, TheatreRecord};
pub use store::{BacklogFilter, InMemoryOperationalStore, OperationalStore, ScheduleFilter};
#[cfg(feature = "postgres")]
pub use store_postgres::PostgresOperationalStore;
