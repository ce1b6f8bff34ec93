use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use bomsync_core::models::{BomStatistics, SyncHistoryEntry};
use bomsync_core::snapshot::VersionComparison;
use bomsync_core::source::SourceStore;
use bomsync_core::{ArticleRecord, EtlService, Part, SyncResult};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::AppError;

const SERVICE_NAME: &str = "BOM to article master sync";
const DEFAULT_HISTORY_LIMIT: usize = 20;
const MAX_HISTORY_LIMIT: usize = 500;

pub type SharedService<S> = Arc<Mutex<EtlService<S>>>;

pub struct AppState<S> {
    service: SharedService<S>,
    sync_in_progress: Arc<AtomicBool>,
    allow_clear: bool,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            sync_in_progress: Arc::clone(&self.sync_in_progress),
            allow_clear: self.allow_clear,
        }
    }
}

impl<S> AppState<S> {
    pub fn new(service: EtlService<S>, allow_clear: bool) -> Self {
        Self {
            service: Arc::new(Mutex::new(service)),
            sync_in_progress: Arc::new(AtomicBool::new(false)),
            allow_clear,
        }
    }

    /// Another handle to the service, e.g. to close it after the server stops
    pub fn service(&self) -> SharedService<S> {
        Arc::clone(&self.service)
    }
}

pub fn app_router<S>(state: AppState<S>) -> Router
where
    S: SourceStore + Send + 'static,
{
    Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .route("/api/sync", post(trigger_sync::<S>))
        .route("/api/sync/history", get(sync_history::<S>))
        .route("/api/bom/tree", get(bom_tree::<S>))
        .route("/api/stats", get(statistics::<S>))
        .route("/api/sage100/articles", get(articles::<S>))
        .route("/api/sage100/clear", delete(clear_articles::<S>))
        .route("/api/snapshots/{version}", post(capture_snapshot::<S>))
        .route("/api/versions/compare", get(compare_versions::<S>))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state)
}

/// Holds the single-flight flag for the duration of one sync.
struct SyncGuard(Arc<AtomicBool>);

impl SyncGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for SyncGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Run `task` against the service on the blocking pool.
async fn with_service<S, R, F>(state: &AppState<S>, task: F) -> Result<R, AppError>
where
    S: SourceStore + Send + 'static,
    R: Send + 'static,
    F: FnOnce(&mut EtlService<S>) -> bomsync_core::Result<R> + Send + 'static,
{
    let service = Arc::clone(&state.service);
    tokio::task::spawn_blocking(move || {
        let mut service = service
            .lock()
            .map_err(|_| AppError::internal("ETL service lock poisoned"))?;
        task(&mut *service).map_err(AppError::from)
    })
    .await
    .map_err(|error| AppError::internal(format!("Worker task failed: {error}")))?
}

#[derive(Debug, Serialize)]
struct RootResponse {
    status: &'static str,
    service: &'static str,
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        status: "running",
        service: SERVICE_NAME,
    })
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: i64,
}

async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().timestamp(),
    })
}

async fn trigger_sync<S>(State(state): State<AppState<S>>) -> Result<Json<SyncResult>, AppError>
where
    S: SourceStore + Send + 'static,
{
    let guard = SyncGuard::acquire(&state.sync_in_progress)
        .ok_or_else(|| AppError::conflict("A sync is already in progress"))?;

    tracing::info!("API: Sync requested");
    let result = with_service(&state, move |service| {
        let _guard = guard;
        Ok(service.run_sync())
    })
    .await?;
    Ok(Json(result))
}

#[derive(Debug, Serialize)]
struct TreeResponse {
    tree: Vec<Part>,
    count: usize,
}

async fn bom_tree<S>(State(state): State<AppState<S>>) -> Result<Json<TreeResponse>, AppError>
where
    S: SourceStore + Send + 'static,
{
    let tree = with_service(&state, |service| service.source_tree()).await?;
    Ok(Json(TreeResponse {
        count: tree.len(),
        tree,
    }))
}

#[derive(Debug, Serialize)]
struct ArticlesResponse {
    articles: Vec<ArticleRecord>,
    count: usize,
}

async fn articles<S>(State(state): State<AppState<S>>) -> Result<Json<ArticlesResponse>, AppError>
where
    S: SourceStore + Send + 'static,
{
    let articles = with_service(&state, |service| service.target_articles()).await?;
    Ok(Json(ArticlesResponse {
        count: articles.len(),
        articles,
    }))
}

async fn statistics<S>(State(state): State<AppState<S>>) -> Result<Json<BomStatistics>, AppError>
where
    S: SourceStore + Send + 'static,
{
    let stats = with_service(&state, |service| service.bom_statistics()).await?;
    Ok(Json(stats))
}

#[derive(Debug, Default, Deserialize)]
struct HistoryQuery {
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct HistoryResponse {
    history: Vec<SyncHistoryEntry>,
}

async fn sync_history<S>(
    State(state): State<AppState<S>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, AppError>
where
    S: SourceStore + Send + 'static,
{
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    let history = with_service(&state, move |service| service.sync_history(limit)).await?;
    Ok(Json(HistoryResponse { history }))
}

#[derive(Debug, Serialize)]
struct ClearResponse {
    status: &'static str,
    removed: usize,
}

async fn clear_articles<S>(State(state): State<AppState<S>>) -> Result<Json<ClearResponse>, AppError>
where
    S: SourceStore + Send + 'static,
{
    if !state.allow_clear {
        return Err(AppError::forbidden(
            "Clearing the article master is disabled (set BOMSYNC_ALLOW_CLEAR=true)",
        ));
    }
    let removed = with_service(&state, |service| service.clear_target()).await?;
    Ok(Json(ClearResponse {
        status: "cleared",
        removed,
    }))
}

#[derive(Debug, Serialize)]
struct SnapshotResponse {
    version: String,
    captured: usize,
}

async fn capture_snapshot<S>(
    State(state): State<AppState<S>>,
    Path(version): Path<String>,
) -> Result<Json<SnapshotResponse>, AppError>
where
    S: SourceStore + Send + 'static,
{
    let version = version.trim().to_string();
    if version.is_empty() {
        return Err(AppError::bad_request("Snapshot version must not be empty"));
    }
    let label = version.clone();
    let captured = with_service(&state, move |service| service.capture_snapshot(&label)).await?;
    Ok(Json(SnapshotResponse { version, captured }))
}

#[derive(Debug, Default, Deserialize)]
struct CompareQuery {
    old: Option<String>,
    new: Option<String>,
}

async fn compare_versions<S>(
    State(state): State<AppState<S>>,
    Query(query): Query<CompareQuery>,
) -> Result<Json<VersionComparison>, AppError>
where
    S: SourceStore + Send + 'static,
{
    let non_empty = |value: Option<String>| {
        value
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };
    let (Some(old), Some(new)) = (non_empty(query.old), non_empty(query.new)) else {
        return Err(AppError::bad_request(
            "Query parameters 'old' and 'new' are required",
        ));
    };

    let comparison =
        with_service(&state, move |service| service.compare_versions(&old, &new)).await?;
    Ok(Json(comparison))
}
