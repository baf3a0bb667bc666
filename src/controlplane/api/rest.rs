//! REST API Handlers
//!
//! Implements the host, inventory and task endpoints of the dashboard.

use super::server::ApiContext;
use crate::error::{Error, Result};
use crate::hosts::{parse_duration_secs, HostUpdate, SourceFilter};
use crate::inventory::RefreshFlag;
use crate::tasks::TaskOutcome;
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

// =============================================================================
// Request/Response Types
// =============================================================================

/// `sources` filter of the host list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostListQuery {
    #[serde(default)]
    pub sources: Option<String>,
}

/// Add host request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHostRequest {
    pub hostname: String,
    #[serde(default)]
    pub addr: Option<String>,
    #[serde(default)]
    pub labels: Option<Vec<String>>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Host update request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateHostRequest {
    /// Toggle maintenance mode
    #[serde(default)]
    pub maintenance: bool,
    #[serde(default)]
    pub force: bool,
    #[serde(default)]
    pub update_labels: bool,
    /// Kept untyped so that non-list values map to a 400
    #[serde(default)]
    pub labels: Option<serde_json::Value>,
}

/// Identify device request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyDeviceRequest {
    pub device: String,
    /// Seconds, as a number or a numeric string
    pub duration: serde_json::Value,
}

/// `refresh` flag of the inventory endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InventoryQuery {
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Task list filter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskListQuery {
    #[serde(default)]
    pub name: Option<String>,
}

/// Task reference returned by task-backed endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    pub name: String,
    pub metadata: BTreeMap<String, String>,
}

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

// =============================================================================
// REST Router
// =============================================================================

/// REST API router builder
pub struct RestRouter {
    context: ApiContext,
    request_timeout: Duration,
    max_body_size: usize,
    permissive_cors: bool,
}

impl RestRouter {
    /// Create a new REST router
    pub fn new(context: ApiContext) -> Self {
        Self {
            context,
            request_timeout: Duration::from_secs(30),
            max_body_size: 1024 * 1024,
            permissive_cors: false,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }

    /// Allow cross-origin requests from any origin
    pub fn with_permissive_cors(mut self, enabled: bool) -> Self {
        self.permissive_cors = enabled;
        self
    }

    /// Build the Axum router
    pub fn build(self) -> Router {
        let router = Router::new()
            // Host endpoints
            .route("/api/host", get(list_hosts).post(create_host))
            .route(
                "/api/host/:name",
                get(get_host).put(update_host).delete(delete_host),
            )
            .route("/api/host/:name/identify_device", post(identify_device))
            .route("/api/host/:name/inventory", get(host_inventory))
            // UI helper endpoints
            .route("/ui-api/host/labels", get(list_labels))
            .route("/ui-api/host/inventory", get(all_inventories))
            // Task endpoints
            .route("/api/task", get(list_tasks))
            .route("/api/task/:id", delete(cancel_task))
            // Health endpoint
            .route("/health", get(health_check))
            .layer(DefaultBodyLimit::max(self.max_body_size))
            .layer(TimeoutLayer::new(self.request_timeout))
            .layer(TraceLayer::new_for_http())
            .with_state(self.context);

        if self.permissive_cors {
            router.layer(CorsLayer::permissive())
        } else {
            router
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// List hosts
async fn list_hosts(
    State(ctx): State<ApiContext>,
    Query(query): Query<HostListQuery>,
) -> Response {
    let filter = SourceFilter::from_query(query.sources.as_deref());
    let response = match ctx.hosts.get_hosts(filter).await {
        Ok(hosts) => (StatusCode::OK, Json(hosts)).into_response(),
        Err(e) => error_response(&e),
    };
    observed(&ctx, "host_list", response)
}

/// Add a host
async fn create_host(
    State(ctx): State<ApiContext>,
    body: std::result::Result<Json<CreateHostRequest>, JsonRejection>,
) -> Response {
    let request = match request_body(body) {
        Ok(request) => request,
        Err(e) => return observed(&ctx, "host_create", error_response(&e)),
    };
    info!("Adding host: {}", request.hostname);

    let response = match ctx
        .hosts
        .add_host(
            &request.hostname,
            request.addr,
            request.labels.unwrap_or_default(),
            request.status.as_deref(),
        )
        .await
    {
        Ok(()) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "hostname": request.hostname })),
        )
            .into_response(),
        Err(e) => error_response(&e),
    };
    observed(&ctx, "host_create", response)
}

/// Get host info
async fn get_host(State(ctx): State<ApiContext>, Path(name): Path<String>) -> Response {
    let response = match ctx.hosts.get_host(&name).await {
        Ok(host) => (StatusCode::OK, Json(host)).into_response(),
        Err(e) => error_response(&e),
    };
    observed(&ctx, "host_get", response)
}

/// Update host labels and/or maintenance mode
async fn update_host(
    State(ctx): State<ApiContext>,
    Path(name): Path<String>,
    body: std::result::Result<Json<UpdateHostRequest>, JsonRejection>,
) -> Response {
    let request = match request_body(body) {
        Ok(request) => request,
        Err(e) => return observed(&ctx, "host_update", error_response(&e)),
    };
    debug!("Updating host {}: {:?}", name, request);

    let update = HostUpdate {
        toggle_maintenance: request.maintenance,
        force: request.force,
        labels: request
            .update_labels
            .then(|| request.labels.unwrap_or(serde_json::Value::Null)),
    };

    let result = match ctx.hosts.update_host(&name, update).await {
        Ok(()) => ctx.hosts.get_host(&name).await,
        Err(e) => Err(e),
    };
    let response = match result {
        Ok(host) => (StatusCode::OK, Json(host)).into_response(),
        Err(e) => error_response(&e),
    };
    observed(&ctx, "host_update", response)
}

/// Remove a host
async fn delete_host(State(ctx): State<ApiContext>, Path(name): Path<String>) -> Response {
    let response = match ctx.hosts.remove_host(&name).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(&e),
    };
    observed(&ctx, "host_delete", response)
}

/// Blink a device's ident light
async fn identify_device(
    State(ctx): State<ApiContext>,
    Path(name): Path<String>,
    body: std::result::Result<Json<IdentifyDeviceRequest>, JsonRejection>,
) -> Response {
    let request = match request_body(body) {
        Ok(request) => request,
        Err(e) => return observed(&ctx, "host_identify_device", error_response(&e)),
    };
    let response = match parse_duration_secs(&request.duration) {
        Ok(duration) => match ctx
            .hosts
            .identify_device(&name, &request.device, duration)
            .await
        {
            Ok(TaskOutcome::Finished { info, result: Ok(()) }) => (
                StatusCode::OK,
                Json(TaskResponse {
                    name: info.name,
                    metadata: info.metadata,
                }),
            )
                .into_response(),
            Ok(TaskOutcome::Finished { result: Err(e), .. }) => error_response(&e),
            Ok(TaskOutcome::Executing(info)) => (StatusCode::ACCEPTED, Json(info)).into_response(),
            Err(e) => error_response(&e),
        },
        Err(e) => error_response(&e),
    };
    ctx.metrics.set_executing_tasks(ctx.tasks.executing_count());
    observed(&ctx, "host_identify_device", response)
}

/// Annotated inventory of one host
async fn host_inventory(
    State(ctx): State<ApiContext>,
    Path(name): Path<String>,
    Query(query): Query<InventoryQuery>,
) -> Response {
    let refresh = RefreshFlag::from_query(query.refresh.as_deref());
    let hostnames = [name];

    let response = match ctx.inventory.get_inventories(Some(&hostnames[..]), refresh).await {
        Ok(inventories) => match inventories.into_iter().next() {
            Some(inventory) => (StatusCode::OK, Json(inventory)).into_response(),
            None => (StatusCode::OK, Json(serde_json::json!({}))).into_response(),
        },
        Err(e) => error_response(&e),
    };
    observed(&ctx, "host_inventory", response)
}

/// Sorted labels of all orchestrator hosts
async fn list_labels(State(ctx): State<ApiContext>) -> Response {
    let response = match ctx.hosts.list_labels().await {
        Ok(labels) => (StatusCode::OK, Json(labels)).into_response(),
        Err(e) => error_response(&e),
    };
    observed(&ctx, "ui_labels", response)
}

/// Annotated inventory of all hosts
async fn all_inventories(
    State(ctx): State<ApiContext>,
    Query(query): Query<InventoryQuery>,
) -> Response {
    let refresh = RefreshFlag::from_query(query.refresh.as_deref());

    let response = match ctx.inventory.get_inventories(None, refresh).await {
        Ok(inventories) => (StatusCode::OK, Json(inventories)).into_response(),
        Err(e) => error_response(&e),
    };
    observed(&ctx, "ui_inventory", response)
}

/// List background tasks
async fn list_tasks(
    State(ctx): State<ApiContext>,
    Query(query): Query<TaskListQuery>,
) -> Response {
    let tasks = ctx.tasks.list(query.name.as_deref());
    ctx.metrics.set_executing_tasks(ctx.tasks.executing_count());
    observed(&ctx, "task_list", (StatusCode::OK, Json(tasks)).into_response())
}

/// Cancel a background task
async fn cancel_task(State(ctx): State<ApiContext>, Path(id): Path<String>) -> Response {
    let response = match ctx.tasks.cancel(&id) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(&e),
    };
    observed(&ctx, "task_cancel", response)
}

/// Health check
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

// =============================================================================
// Utility Functions
// =============================================================================

/// HTTP status for an error
pub fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::HostNotFound { .. } | Error::TaskNotFound { .. } => StatusCode::NOT_FOUND,
        Error::InvalidArgument(_)
        | Error::HostAlreadyExists { .. }
        | Error::OrchestratorOperation { .. } => StatusCode::BAD_REQUEST,
        Error::OrchestratorUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        Error::Internal(_)
        | Error::Configuration(_)
        | Error::JsonParse(_)
        | Error::YamlParse(_)
        | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Unwrap a JSON body, turning extractor rejections into `InvalidArgument`
fn request_body<T>(body: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    body.map(|Json(request)| request)
        .map_err(|rejection| Error::InvalidArgument(rejection.body_text()))
}

fn error_response(err: &Error) -> Response {
    let status = status_for(err);
    if err.is_client_error() {
        debug!("Request rejected: {}", err);
    } else if err.is_transient() {
        warn!("Request failed, retry later: {}", err);
    } else {
        error!("Request failed: {}", err);
    }

    (
        status,
        Json(ApiErrorResponse {
            error: err.code().into(),
            message: err.to_string(),
            details: None,
        }),
    )
        .into_response()
}

fn observed(ctx: &ApiContext, endpoint: &str, response: Response) -> Response {
    ctx.metrics.observe(endpoint, response.status().as_u16());
    response
}
