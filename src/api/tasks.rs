//! CRUD handlers for the `student_tasks` collection.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::Uri,
};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value, json};

use crate::api::{ApiError, AppState, to_document, valid_date};

const COLLECTION: &str = "student_tasks";

/// Payload for `POST /student-tasks` and `PUT /student-tasks/:task_id`.
///
/// Unlike students, task updates do carry `is_deleted`, so a task can be
/// resurrected through an ordinary update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct TaskPayload {
    /// External task identifier used by every lookup.
    task_id: String,
    /// Owning student's external identifier.
    student_id: String,
    score: Number,
    is_deleted: bool,
    /// Creation date, `YYYY-MM-DD`.
    created: String,
    created_by: String,
    /// Last-change date, `YYYY-MM-DD`.
    last_updated: String,
    last_updated_by: String,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct DeleteQuery {
    /// Remove the document instead of setting `is_deleted`.
    #[serde(default)]
    hard: bool,
}

fn validate_dates(payload: &TaskPayload) -> Result<(), ApiError> {
    if valid_date(&payload.created) && valid_date(&payload.last_updated) {
        Ok(())
    } else {
        Err(ApiError::bad_request(
            "Invalid date format (expected YYYY-MM-DD)",
        ))
    }
}

/// Add one task for a student.
pub(super) async fn add(
    State(state): State<AppState>,
    Json(payload): Json<TaskPayload>,
) -> Result<Json<&'static str>, ApiError> {
    validate_dates(&payload)?;

    let document = to_document(&payload)?;
    state
        .documents
        .insert(COLLECTION, document)
        .await
        .map_err(|err| ApiError::internal("Error adding task", err))?;
    state.metrics.record_documents_written(1);

    tracing::info!(
        task_id = payload.task_id,
        student_id = payload.student_id,
        "Task added"
    );
    Ok(Json("Task added successfully"))
}

/// Fetch one task by task id.
pub(super) async fn get(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    uri: Uri,
) -> Result<Json<Value>, ApiError> {
    match state
        .documents
        .find_first(COLLECTION, "task_id", &json!(task_id))
        .await
    {
        Some(document) => Ok(Json(Value::Object(document))),
        None => Err(ApiError::not_found(uri.path())),
    }
}

/// List every task belonging to one student. Unknown students yield an
/// empty array, not a 404.
pub(super) async fn list_for_student(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Json<Vec<Value>> {
    let tasks = state
        .documents
        .find_matching(COLLECTION, "student_id", &json!(student_id))
        .await
        .into_iter()
        .map(Value::Object)
        .collect();
    Json(tasks)
}

/// Replace a task's fields, reporting whether anything changed.
pub(super) async fn update(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    uri: Uri,
    Json(payload): Json<TaskPayload>,
) -> Result<Json<&'static str>, ApiError> {
    validate_dates(&payload)?;

    let changes = to_document(&payload)?;
    let outcome = state
        .documents
        .update_first(COLLECTION, "task_id", &json!(task_id), &changes)
        .await
        .map_err(|err| ApiError::internal("Error updating task", err))?;

    if outcome.modified {
        state.metrics.record_documents_written(1);
        Ok(Json("Task updated successfully"))
    } else if outcome.matched {
        Ok(Json("Task found, but no changes applied"))
    } else {
        Err(ApiError::not_found(uri.path()))
    }
}

/// Soft delete by default; `?hard=true` removes the document.
pub(super) async fn delete(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Query(query): Query<DeleteQuery>,
    uri: Uri,
) -> Result<Json<&'static str>, ApiError> {
    if query.hard {
        let removed = state
            .documents
            .delete_first(COLLECTION, "task_id", &json!(task_id))
            .await
            .map_err(|err| ApiError::internal("Error deleting task", err))?;
        if removed {
            tracing::info!(task_id, "Task hard deleted");
            return Ok(Json("Task hard deleted successfully"));
        }
        return Err(ApiError::not_found(uri.path()));
    }

    let flag = to_document(&json!({ "is_deleted": true }))?;
    let outcome = state
        .documents
        .update_first(COLLECTION, "task_id", &json!(task_id), &flag)
        .await
        .map_err(|err| ApiError::internal("Error deleting task", err))?;
    if outcome.modified {
        state.metrics.record_documents_written(1);
        Ok(Json("Task soft deleted successfully"))
    } else {
        Err(ApiError::not_found(uri.path()))
    }
}
