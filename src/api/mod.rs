//! HTTP surface for Pickwick.
//!
//! This module exposes a compact Axum router over the two stores:
//!
//! - `GET /legacy-client/:id` – Read a record from the legacy flat file and
//!   return its normalized projection. Query controls: `parse_numbers`,
//!   `parse_dates`, `latest`.
//! - `POST /legacy-client/:id` – Apply an attribute map to a legacy record,
//!   rewriting the flat file (with a `.bak` safety copy).
//! - `POST /students`, `POST /students/batch`, `GET /students`,
//!   `GET /students/:student_id`, `PUT /students/:student_id`,
//!   `DELETE /students/:student_id[?hard=true]` – CRUD over the `students`
//!   collection.
//! - `POST /student-tasks`, `GET /student-tasks/:task_id`,
//!   `PUT /student-tasks/:task_id`, `DELETE /student-tasks/:task_id`,
//!   `GET /students/:student_id/tasks` – CRUD over the `student_tasks`
//!   collection.
//! - `GET /health` – Service identity and liveness.
//! - `GET /metrics` – Store operation counters.
//!
//! Handlers funnel every failure into [`ApiError`], which renders the wire
//! shapes consumers of the original service expect: a
//! `{"status": 404, "message": "Not found <path>"}` body for missing
//! resources, `{"message": ...}` for validation failures, and
//! `{"message": ..., "detail": ...}` for operational failures.

mod legacy;
mod students;
mod tasks;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use time::Date;

use crate::docstore::DocumentStore;
use crate::metrics::{MetricsSnapshot, ServiceMetrics};
use crate::pick::RecordStore;
use crate::projection::DATE_FORMAT;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Legacy flat-file record store.
    pub records: Arc<RecordStore>,
    /// Document collections backing the CRUD endpoints.
    pub documents: Arc<DocumentStore>,
    /// Operation counters served by `GET /metrics`.
    pub metrics: Arc<ServiceMetrics>,
}

impl AppState {
    /// Assemble shared state from the two stores, starting fresh counters.
    pub fn new(records: RecordStore, documents: DocumentStore) -> Self {
        Self {
            records: Arc::new(records),
            documents: Arc::new(documents),
            metrics: Arc::new(ServiceMetrics::new()),
        }
    }
}

/// Build the HTTP router exposing the full API surface.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/legacy-client/:client_id",
            get(legacy::get_client).post(legacy::update_client),
        )
        .route("/students", get(students::list).post(students::add))
        .route("/students/batch", post(students::add_batch))
        .route(
            "/students/:student_id",
            get(students::get)
                .put(students::update)
                .delete(students::delete),
        )
        .route("/students/:student_id/tasks", get(tasks::list_for_student))
        .route("/student-tasks", post(tasks::add))
        .route(
            "/student-tasks/:task_id",
            get(tasks::get).put(tasks::update).delete(tasks::delete),
        )
        .route("/health", get(health))
        .route("/metrics", get(metrics_snapshot))
        .fallback(fallback)
        .with_state(state)
}

/// Error envelope shared by every handler.
#[derive(Debug)]
pub enum ApiError {
    /// Resource missing; rendered in the legacy `status`/`message` shape.
    NotFound {
        /// Request path echoed in the message.
        path: String,
    },
    /// Client-side validation failure.
    BadRequest {
        /// Explanation returned to the client.
        message: String,
    },
    /// Operational failure, reported with diagnostic detail.
    Internal {
        /// Operation that failed.
        message: String,
        /// Source error text.
        detail: String,
    },
}

impl ApiError {
    /// Not-found response for the given request path.
    pub fn not_found(path: &str) -> Self {
        Self::NotFound {
            path: path.to_string(),
        }
    }

    /// Validation failure with a client-facing message.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Operational failure naming the operation and its source error.
    pub fn internal(message: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        Self::Internal {
            message: message.into(),
            detail: detail.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound { path } => (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "status": 404,
                    "message": format!("Not found {path}"),
                })),
            )
                .into_response(),
            Self::BadRequest { message } => {
                (StatusCode::BAD_REQUEST, Json(json!({ "message": message }))).into_response()
            }
            Self::Internal { message, detail } => {
                tracing::error!(%message, %detail, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": message, "detail": detail })),
                )
                    .into_response()
            }
        }
    }
}

/// Render the legacy not-found shape for unknown paths.
async fn fallback(uri: Uri) -> ApiError {
    ApiError::not_found(uri.path())
}

/// Service identity and liveness.
async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "pickwick",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Counter snapshot for observability.
async fn metrics_snapshot(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

/// Strict `YYYY-MM-DD` check shared by the CRUD payload validators.
fn valid_date(raw: &str) -> bool {
    Date::parse(raw, DATE_FORMAT).is_ok()
}

/// Serialize a payload into a document map.
fn to_document<T: serde::Serialize>(payload: &T) -> Result<crate::docstore::Document, ApiError> {
    match serde_json::to_value(payload) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => Err(ApiError::internal(
            "Error encoding document",
            "payload did not serialize to an object",
        )),
        Err(err) => Err(ApiError::internal("Error encoding document", err)),
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{harness, send};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn health_reports_service_identity() {
        let harness = harness();
        let (status, body) = send(&harness.router, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "pickwick");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn unknown_paths_render_the_legacy_not_found_shape() {
        let harness = harness();
        let (status, body) = send(&harness.router, Method::GET, "/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], 404);
        assert_eq!(body["message"], "Not found /nope");
    }

    #[tokio::test]
    async fn metrics_counters_track_store_activity() {
        let harness = harness();

        let snapshot = harness.state.metrics.snapshot();
        assert_eq!(snapshot.legacy_reads, 0);

        send(&harness.router, Method::GET, "/legacy-client/101", None).await;
        send(
            &harness.router,
            Method::POST,
            "/legacy-client/101",
            Some(json!({"1": "Renamed"})),
        )
        .await;

        let (status, body) = send(&harness.router, Method::GET, "/metrics", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["legacy_reads"], 1);
        assert_eq!(body["legacy_updates"], 1);
    }
}
