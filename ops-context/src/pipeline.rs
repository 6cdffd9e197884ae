//! ContextPipeline – turns one natural-language query into a [`ContextResult`] ready for
//! prompt injection.
//!
//! ## Stages
//! 1. **Analyze**: keyword and regex classification of the query (no I/O).
//! 2. **Resolve window**: pick the schedule date range from the page selection or the
//!    query's date entities.
//! 3. **Retrieve**: fan out to every operational source concurrently. A failing source
//!    contributes an empty list; it never aborts the request.
//! 4. **Reason**: threshold rules produce insights, then recommendations are derived from
//!    the data and the insights.
//! 5. **Annotate**: attach metadata (timestamp, categories, sources, window, elapsed time).
//!
//! Rendering is a separate step, see [`crate::formatter::format_context`].
//!
//! ## Sharing across requests
//! Build one `ContextPipeline` at startup and clone it into handlers:
//! ```rust,ignore
//! struct AppState {
//!     pipeline: ContextPipeline,
//! }
//!
//! let result = state.pipeline.build(&message, page_context).await?;
//! ```
//! Cloning copies two `Arc`s; the pipeline holds no per-request state, so concurrent
//! invocations never observe each other.
//!
//! ## Failure model
//! The only hard failure is an empty query ([`ContextError::EmptyQuery`]). Everything
//! downstream degrades: empty lists for unavailable sources, zeroed metrics, an empty
//! historical summary.

use std::sync::Arc;
use std::time::Instant;

use chrono::{Local, NaiveDate, Utc};
use tracing::{debug, info};

use crate::{
    config::PipelineConfig,
    error::{ContextError, Result},
    insights::generate_insights,
    intent::analyze_query,
    models::{ContextMetadata, ContextResult, PageContext},
    recommendations::generate_recommendations,
    retriever::{MultiSourceRetriever, resolve_window},
    store::OperationalStore,
};

#[derive(Clone)]
pub struct ContextPipeline {
    store: Arc<dyn OperationalStore>,
    config: Arc<PipelineConfig>,
}

impl ContextPipeline {
    pub fn new(store: Arc<dyn OperationalStore>, config: PipelineConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Build context relative to the local calendar date.
    pub async fn build(&self, query: &str, page: Option<PageContext>) -> Result<ContextResult> {
        self.build_on(query, page, Local::now().date_naive()).await
    }

    /// Build context with an explicit "today". Deterministic apart from the
    /// metadata timestamp and processing time.
    pub async fn build_on(
        &self,
        query: &str,
        page: Option<PageContext>,
        today: NaiveDate,
    ) -> Result<ContextResult> {
        if query.trim().is_empty() {
            return Err(ContextError::EmptyQuery);
        }
        let started = Instant::now();

        let intent = analyze_query(query);
        debug!(
            categories = ?intent.categories,
            sentiment = ?intent.sentiment,
            "Query analyzed"
        );

        let window = resolve_window(&intent, page.as_ref(), today);
        let data_context = MultiSourceRetriever::new(self.store.as_ref(), &self.config)
            .retrieve(window, page.as_ref(), today)
            .await;

        let insights = generate_insights(&data_context);
        let recommendations = generate_recommendations(&data_context, &insights);

        let metadata = ContextMetadata {
            timestamp: Utc::now(),
            query_categories: intent.categories.iter().copied().collect(),
            sources_used: data_context.sources_used(),
            retrieval_window: window,
            processing_time_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        };

        info!(
            window = %window,
            schedules = data_context.schedules.len(),
            insights = insights.len(),
            recommendations = recommendations.len(),
            elapsed_ms = metadata.processing_time_ms,
            "Context built"
        );

        Ok(ContextResult {
            page_context: page,
            data_context,
            insights,
            recommendations,
            metadata,
        })
    }
}
