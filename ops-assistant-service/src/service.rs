use axum::{
    Router,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, Request, StatusCode},
    middleware::{Next, from_fn},
    response::Json,
    routing::{get, post},
};
use chrono::{Local, NaiveDate};
use ops_context::{
    ContextPipeline, InMemoryOperationalStore, OperationalStore, PostgresOperationalStore,
    format_context,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Instrument, debug, error, info};
use uuid::Uuid;

use crate::{
    config::ServiceConfig,
    models::{AssistantRequest, AssistantResponse},
    shortcuts::{ShortcutInfo, match_shortcut, shortcut_catalogue, suggest_for_page},
};

pub const CORRELATION_HEADER: &str = "x-correlation-id";

const PIPELINE_FAILURE_MESSAGE: &str = "I apologize, but I'm having trouble connecting to my AI service right now. Please try again, or ask me about specific theatre schedules, staff availability, or operations.";

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<Value>)>;
type ApiError = (StatusCode, Json<Value>);

fn bad_request_error(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn internal_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

#[derive(Clone)]
pub struct AppState {
    pub pipeline: ContextPipeline,
    /// Pins "today" for every request when set.
    pub fixed_date: Option<NaiveDate>,
}

impl AppState {
    pub fn new(pipeline: ContextPipeline) -> Self {
        Self {
            pipeline,
            fixed_date: None,
        }
    }

    fn today(&self) -> NaiveDate {
        self.fixed_date
            .unwrap_or_else(|| Local::now().date_naive())
    }
}

pub async fn create_app(config: &ServiceConfig) -> anyhow::Result<Router> {
    let app_state = create_app_state(config).await?;
    Ok(build_router(app_state))
}

async fn create_app_state(config: &ServiceConfig) -> anyhow::Result<AppState> {
    let store = create_store(config).await?;
    let pipeline = ContextPipeline::new(store, config.pipeline_config()?);
    let tunables = pipeline.config();
    info!(
        target_headcount = tunables.target_headcount,
        history_window_days = tunables.history_window_days,
        "Context pipeline ready"
    );
    Ok(AppState::new(pipeline))
}

async fn create_store(config: &ServiceConfig) -> anyhow::Result<Arc<dyn OperationalStore>> {
    if let Some(database_url) = &config.database_url {
        info!("Using PostgreSQL operational store");
        match PostgresOperationalStore::connect(database_url).await {
            Ok(store) => return Ok(Arc::new(store)),
            Err(e) => error!(
                "Failed to connect to PostgreSQL: {}. Falling back to in-memory store.",
                e
            ),
        }
    }

    match &config.seed_file {
        Some(path) => {
            info!("Using in-memory store seeded from {}", path.display());
            Ok(Arc::new(InMemoryOperationalStore::from_seed_file(path)?))
        }
        None => {
            info!("Using empty in-memory store (set OPS_SEED_FILE or DATABASE_URL to load data)");
            Ok(Arc::new(InMemoryOperationalStore::new()))
        }
    }
}

/// Tag each request with a correlation id and run it inside an `http_request` span.
async fn correlation_id_middleware(
    mut request: Request<axum::body::Body>,
    next: Next,
) -> axum::response::Response {
    let correlation_id = Uuid::new_v4().to_string();
    let header = HeaderValue::from_str(&correlation_id).ok();

    if let Some(value) = &header {
        request.headers_mut().insert(CORRELATION_HEADER, value.clone());
    }

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    let mut response = next.run(request).instrument(span).await;

    if let Some(value) = header {
        response.headers_mut().insert(CORRELATION_HEADER, value);
    }
    response
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/assistant/shortcuts", get(list_shortcuts))
        .route("/assistant/context", post(build_context))
        .layer(from_fn(correlation_id_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "service": "Theatre Operations Assistant Service",
        "version": "1.0.0",
        "description": "Context intelligence for theatre scheduling and resourcing questions",
        "endpoints": {
            "POST /assistant/context": "Build operational context for a message",
            "GET /assistant/shortcuts": "List voice command shortcuts (optional ?page= for suggestions)",
            "GET /health": "Health check"
        },
        "pipeline": state.pipeline.config()
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

#[derive(Debug, Deserialize)]
struct ShortcutQuery {
    page: Option<String>,
}

async fn list_shortcuts(Query(query): Query<ShortcutQuery>) -> Json<Vec<ShortcutInfo>> {
    match query.page {
        Some(page) => Json(suggest_for_page(&page)),
        None => Json(shortcut_catalogue()),
    }
}

fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(CORRELATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn validate_message(message: Option<&str>) -> Result<&str, ApiError> {
    match message.map(str::trim) {
        Some(message) if !message.is_empty() => Ok(message),
        _ => Err(bad_request_error("Message is required")),
    }
}

async fn build_context(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AssistantRequest>,
) -> ApiResult<AssistantResponse> {
    let message = validate_message(request.message.as_deref())?;
    let request_id = request_id(&headers);
    let today = state.today();

    info!(
        request_id = %request_id,
        page = ?request.page_context.as_ref().map(|p| p.current_page.as_str()),
        "Building assistant context"
    );
    if let Some(user_context) = &request.user_context {
        debug!(request_id = %request_id, user_context = %user_context, "User context supplied");
    }

    let shortcut = match_shortcut(message, today);
    if let Some(matched) = shortcut.as_ref().filter(|m| !m.continue_to_pipeline) {
        info!(request_id = %request_id, shortcut = matched.id, "Shortcut answered request");
        return Ok(Json(AssistantResponse {
            request_id,
            shortcut,
            context: None,
            context_block: None,
        }));
    }

    match state
        .pipeline
        .build_on(message, request.page_context, today)
        .await
    {
        Ok(context) => {
            let context_block = format_context(&context);
            Ok(Json(AssistantResponse {
                request_id,
                shortcut,
                context: Some(context),
                context_block: Some(context_block),
            }))
        }
        Err(e) => {
            error!(request_id = %request_id, "Failed to build context: {}", e);
            Err(internal_error(PIPELINE_FAILURE_MESSAGE, &e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use ops_context::PipelineConfig;
    use tower::ServiceExt;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn app() -> Router {
        let store = InMemoryOperationalStore::new();
        store.insert_schedule(json!({
            "id": "s1",
            "date": "2026-10-17",
            "theatre": "Theatre 1",
            "sessionType": "AM",
            "startTime": "08:00",
            "bookedMinutes": 120,
        }));
        let pipeline = ContextPipeline::new(Arc::new(store), PipelineConfig::default());
        build_router(AppState {
            pipeline,
            fixed_date: Some(today()),
        })
    }

    async fn post_context(body: Value) -> (StatusCode, HeaderMap, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/assistant/context")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, serde_json::from_slice(&bytes).unwrap())
    }

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn blank_message_is_rejected() {
        for body in [json!({ "message": "   " }), json!({})] {
            let (status, _, body) = post_context(body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, json!({ "error": "Message is required" }));
        }
    }

    #[tokio::test]
    async fn query_shortcut_continues_into_pipeline() {
        let (status, headers, body) =
            post_context(json!({ "message": "show tomorrow's sessions" })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["shortcut"]["id"], "show-schedule-tomorrow");
        assert_eq!(body["context"]["metadata"]["retrievalWindow"]["from"], "2026-10-17");
        assert_eq!(body["context"]["dataContext"]["schedules"][0]["id"], "s1");
        let block = body["contextBlock"].as_str().unwrap();
        assert!(block.contains("1. Theatre 1 - 2026-10-17 08:00"));

        let correlation = headers.get(CORRELATION_HEADER).unwrap().to_str().unwrap();
        assert_eq!(body["requestId"], correlation);
    }

    #[tokio::test]
    async fn navigation_shortcut_skips_pipeline() {
        let (status, _, body) = post_context(json!({ "message": "Go to schedule" })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["shortcut"]["action"]["target"], "/schedule");
        assert_eq!(body["shortcut"]["continueToPipeline"], false);
        assert!(body.get("context").is_none());
        assert!(body.get("contextBlock").is_none());
    }

    #[tokio::test]
    async fn page_context_is_echoed_in_result() {
        let (status, _, body) = post_context(json!({
            "message": "how many cases are waiting?",
            "pageContext": { "currentPage": "/procedures", "viewType": "procedures" },
            "userContext": { "role": "theatre manager" }
        }))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.get("shortcut").is_none());
        assert_eq!(body["context"]["pageContext"]["currentPage"], "/procedures");
        assert!(
            body["contextBlock"]
                .as_str()
                .unwrap()
                .starts_with("USER LOCATION: /procedures\n")
        );
    }

    #[tokio::test]
    async fn shortcut_listing_and_suggestions() {
        let (status, all) = get_json("/assistant/shortcuts").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(all.as_array().unwrap().len(), 13);

        let (_, suggested) = get_json("/assistant/shortcuts?page=/staff").await;
        let ids: Vec<_> = suggested
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            ids,
            vec![
                "check-staff-availability",
                "show-staff-roster",
                "check-readiness",
                "check-conflicts",
            ]
        );
    }

    #[tokio::test]
    async fn root_reports_pipeline_tunables() {
        let (status, body) = get_json("/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pipeline"]["target_headcount"], 100);
        assert_eq!(body["pipeline"]["history_window_days"], 7);
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let (status, body) = get_json("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn bundled_seed_and_config_load() {
        let store = InMemoryOperationalStore::from_yaml_str(include_str!("../seed.yaml")).unwrap();
        let config = PipelineConfig::from_yaml_str(include_str!("../pipeline.yaml")).unwrap();
        assert_eq!(config.history_window_days, 14);
        let pipeline = ContextPipeline::new(Arc::new(store), config);

        let result = pipeline
            .build_on("what's on today?", None, today())
            .await
            .unwrap();

        assert_eq!(result.data_context.schedules.len(), 2);
        assert_eq!(result.data_context.metrics.waiting_list_size, 2);
        assert_eq!(result.data_context.staff.len(), 4);
        assert_eq!(result.data_context.historical.common_issues[0].issue, "Late start");
        assert_eq!(result.data_context.historical.common_issues[0].frequency, 2);
    }

    #[test]
    fn pipeline_failure_uses_apology() {
        let (status, Json(body)) = internal_error(PIPELINE_FAILURE_MESSAGE, "boom");
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().starts_with("I apologize"));
    }
}
