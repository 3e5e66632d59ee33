//! HTTP binding for the task service.
//!
//! Routes:
//!
//! | Method | Path | Success |
//! |---|---|---|
//! | GET | `/api/health` | 200 |
//! | GET | `/api/tasks` | 200, one page of tasks |
//! | POST | `/api/tasks` | 201, created task |
//! | GET | `/api/tasks/{id}` | 200 |
//! | PUT, PATCH | `/api/tasks/{id}` | 200, updated task |
//! | DELETE | `/api/tasks/{id}` | 200, acknowledgement |
//!
//! Errors are returned as `{"code", "message", "details"?}`.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::error::{Error, FieldError, Result};
use crate::query::ListParams;
use crate::service::{DeleteAck, TaskPageView, TaskService};
use crate::urgency::TaskView;
use crate::validate::TaskPayload;

#[derive(Clone)]
pub struct AppState {
    pub service: TaskService,
}

/// Error body returned to HTTP clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

#[derive(Debug, Clone)]
pub struct ApiErrorResponse {
    pub status: StatusCode,
    pub error: ApiError,
}

impl ApiErrorResponse {
    fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            error: ApiError {
                code: code.to_string(),
                message: message.into(),
                details: None,
            },
        }
    }

    fn with_details(mut self, details: &[FieldError]) -> Self {
        self.error.details = Some(details.to_vec());
        self
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<Error> for ApiErrorResponse {
    fn from(err: Error) -> Self {
        match &err {
            Error::ValidationFailed(fields) => {
                Self::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", "Validation failed")
                    .with_details(fields)
            }
            Error::InvalidParameter(fields) => Self::new(
                StatusCode::BAD_REQUEST,
                "INVALID_PARAMETER",
                "Invalid query parameters",
            )
            .with_details(fields),
            Error::InvalidId(_) => {
                Self::new(StatusCode::BAD_REQUEST, "INVALID_ID", err.to_string())
            }
            Error::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", "Task not found"),
            Error::PersistenceUnavailable(_) | Error::LockFailed(_) => {
                tracing::error!(error = %err, "task storage unavailable");
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "Task storage is unavailable",
                )
            }
            _ => {
                tracing::error!(error = %err, "unhandled error");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An unexpected error occurred",
                )
            }
        }
    }
}

impl From<JsonRejection> for ApiErrorResponse {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::new(
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                "Request body is too large",
            );
        }
        Self::new(StatusCode::BAD_REQUEST, "INVALID_BODY", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiErrorResponse {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "INVALID_PARAMETER",
            rejection.body_text(),
        )
    }
}

type ApiResult<T> = std::result::Result<T, ApiErrorResponse>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    server_status: &'static str,
}

/// Build the API router around `service`.
pub fn router(service: TaskService, body_limit_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/{id}",
            get(get_task)
                .put(update_task)
                .patch(update_task)
                .delete(delete_task),
        )
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(AppState { service })
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        server_status: "operational",
    })
}

async fn list_tasks(
    State(state): State<AppState>,
    params: std::result::Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<TaskPageView>> {
    let Query(params) = params?;
    let page = state.service.get_many(&params).await?;
    Ok(Json(page.into_views(state.service.now())))
}

async fn create_task(
    State(state): State<AppState>,
    payload: std::result::Result<Json<TaskPayload>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TaskView>)> {
    let Json(payload) = payload?;
    let task = state.service.create(&payload).await?;
    tracing::info!(id = %task.id, "task created");
    Ok((
        StatusCode::CREATED,
        Json(TaskView::at(task, state.service.now())),
    ))
}

async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TaskView>> {
    let task = state.service.get_one(&id).await?;
    Ok(Json(TaskView::at(task, state.service.now())))
}

async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<TaskPayload>, JsonRejection>,
) -> ApiResult<Json<TaskView>> {
    let Json(payload) = payload?;
    let task = state.service.update(&id, &payload).await?;
    Ok(Json(TaskView::at(task, state.service.now())))
}

async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteAck>> {
    let ack = state.service.delete(&id).await?;
    tracing::info!(id = %ack.id, "task deleted");
    Ok(Json(ack))
}

/// Bind and serve until SIGINT or SIGTERM.
pub async fn serve(config: &ServerConfig, service: TaskService) -> Result<()> {
    let app = router(service, config.body_limit_bytes);
    let listener = TcpListener::bind(config.bind_address()).await?;
    match listener.local_addr() {
        Ok(address) => tracing::info!("Listening on {}", address),
        Err(error) => tracing::warn!(%error, "Could not determine local address"),
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::warn!(%error, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C, initiating graceful shutdown"),
        () = terminate => tracing::info!("Received SIGTERM, initiating graceful shutdown"),
    }
}
