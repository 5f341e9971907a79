//! CRUD handlers for the `students` collection.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::Uri,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::api::{ApiError, AppState, to_document, valid_date};

const COLLECTION: &str = "students";

/// Payload for `POST /students` and each entry of `POST /students/batch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct StudentPayload {
    /// External identifier every lookup uses.
    student_id: String,
    first_name: String,
    last_name: String,
    age: u32,
    gender: String,
    /// Portrait image URL.
    image: String,
    active: bool,
    is_deleted: bool,
    /// Creation date, `YYYY-MM-DD`.
    created: String,
    created_by: String,
    /// Last-change date, `YYYY-MM-DD`.
    last_updated: String,
    last_updated_by: String,
}

/// Payload for `PUT /students/:student_id`.
///
/// Deliberately has no `is_deleted` field: updates never resurrect or
/// delete a student, only the delete endpoint touches that flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct StudentUpdatePayload {
    student_id: String,
    first_name: String,
    last_name: String,
    age: u32,
    gender: String,
    image: String,
    active: bool,
    created: String,
    created_by: String,
    last_updated: String,
    last_updated_by: String,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct DeleteQuery {
    /// Remove the document instead of setting `is_deleted`.
    #[serde(default)]
    hard: bool,
}

/// Add one student.
pub(super) async fn add(
    State(state): State<AppState>,
    Json(payload): Json<StudentPayload>,
) -> Result<Json<&'static str>, ApiError> {
    if !valid_date(&payload.created) || !valid_date(&payload.last_updated) {
        return Err(ApiError::bad_request(
            "Invalid date format (expected YYYY-MM-DD)",
        ));
    }

    let document = to_document(&payload)?;
    state
        .documents
        .insert(COLLECTION, document)
        .await
        .map_err(|err| ApiError::internal("Error adding student", err))?;
    state.metrics.record_documents_written(1);

    tracing::info!(student_id = payload.student_id, "Student added");
    Ok(Json("Student added successfully!"))
}

/// Add a batch of students in one request.
pub(super) async fn add_batch(
    State(state): State<AppState>,
    Json(batch): Json<Vec<StudentPayload>>,
) -> Result<Json<&'static str>, ApiError> {
    if batch.is_empty() {
        return Err(ApiError::bad_request("Missing or empty student list"));
    }
    if batch
        .iter()
        .any(|entry| !valid_date(&entry.created) || !valid_date(&entry.last_updated))
    {
        return Err(ApiError::bad_request(
            "Invalid or missing date format in one or more student records (expected YYYY-MM-DD)",
        ));
    }

    let documents = batch
        .iter()
        .map(to_document)
        .collect::<Result<Vec<_>, _>>()?;
    let count = documents.len();
    state
        .documents
        .insert_many(COLLECTION, documents)
        .await
        .map_err(|err| ApiError::internal("Error adding students", err))?;
    state.metrics.record_documents_written(count as u64);

    tracing::info!(count, "Student batch added");
    Ok(Json("Students added successfully"))
}

/// Fetch one student by external id.
pub(super) async fn get(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    uri: Uri,
) -> Result<Json<Value>, ApiError> {
    match state
        .documents
        .find_first(COLLECTION, "student_id", &json!(student_id))
        .await
    {
        Some(document) => Ok(Json(Value::Object(document))),
        None => Err(ApiError::not_found(uri.path())),
    }
}

/// List every student. An empty collection is a 200 with an empty array.
pub(super) async fn list(State(state): State<AppState>) -> Json<Vec<Value>> {
    let students = state
        .documents
        .list(COLLECTION)
        .await
        .into_iter()
        .map(Value::Object)
        .collect();
    Json(students)
}

/// Replace a student's fields, reporting whether anything changed.
pub(super) async fn update(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    uri: Uri,
    Json(payload): Json<StudentUpdatePayload>,
) -> Result<Json<&'static str>, ApiError> {
    if !valid_date(&payload.created) || !valid_date(&payload.last_updated) {
        return Err(ApiError::bad_request(
            "Invalid date format (expected YYYY-MM-DD)",
        ));
    }

    let changes = to_document(&payload)?;
    let outcome = state
        .documents
        .update_first(COLLECTION, "student_id", &json!(student_id), &changes)
        .await
        .map_err(|err| ApiError::internal("Error updating student", err))?;

    if outcome.modified {
        state.metrics.record_documents_written(1);
        Ok(Json("Student updated successfully"))
    } else if outcome.matched {
        Ok(Json("Student found, but no changes applied"))
    } else {
        Err(ApiError::not_found(uri.path()))
    }
}

/// Soft delete by default; `?hard=true` removes the document.
///
/// Soft deleting an already-deleted student modifies nothing and therefore
/// renders 404, the same contract the original service exposed.
pub(super) async fn delete(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    Query(query): Query<DeleteQuery>,
    uri: Uri,
) -> Result<Json<&'static str>, ApiError> {
    if query.hard {
        let removed = state
            .documents
            .delete_first(COLLECTION, "student_id", &json!(student_id))
            .await
            .map_err(|err| ApiError::internal("Error deleting student", err))?;
        if removed {
            tracing::info!(student_id, "Student hard deleted");
            return Ok(Json("Student hard deleted successfully"));
        }
        return Err(ApiError::not_found(uri.path()));
    }

    let flag = to_document(&json!({ "is_deleted": true }))?;
    let outcome = state
        .documents
        .update_first(COLLECTION, "student_id", &json!(student_id), &flag)
        .await
        .map_err(|err| ApiError::internal("Error deleting student", err))?;
    if outcome.modified {
        state.metrics.record_documents_written(1);
        Ok(Json("Student soft deleted successfully"))
    } else {
        Err(ApiError::not_found(uri.path()))
    }
}

#[cfg(test)]
mod tests {
    use crate::api::fixtures::{harness, send};
    use axum::http::{Method, StatusCode};
    use serde_json::{Value, json};

    fn student(id: &str) -> Value {
        json!({
            "student_id": id,
            "first_name": "Ada",
            "last_name": "Lovelace",
            "age": 21,
            "gender": "female",
            "image": "https://example.org/ada.png",
            "active": true,
            "is_deleted": false,
            "created": "2024-01-10",
            "created_by": "registrar",
            "last_updated": "2024-01-10",
            "last_updated_by": "registrar",
        })
    }

    fn update_payload(id: &str, age: u32) -> Value {
        json!({
            "student_id": id,
            "first_name": "Ada",
            "last_name": "Lovelace",
            "age": age,
            "gender": "female",
            "image": "https://example.org/ada.png",
            "active": true,
            "created": "2024-01-10",
            "created_by": "registrar",
            "last_updated": "2024-02-01",
            "last_updated_by": "registrar",
        })
    }

    #[tokio::test]
    async fn add_then_get_round_trips() {
        let harness = harness();
        let (status, body) = send(
            &harness.router,
            Method::POST,
            "/students",
            Some(student("s1")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!("Student added successfully!"));

        let (status, body) = send(&harness.router, Method::GET, "/students/s1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["student_id"], "s1");
        assert_eq!(body["age"], 21);
        assert!(body["_id"].is_string());
    }

    #[tokio::test]
    async fn add_rejects_malformed_dates() {
        let harness = harness();
        let mut payload = student("s1");
        payload["created"] = json!("10/01/2024");

        let (status, body) =
            send(&harness.router, Method::POST, "/students", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid date format (expected YYYY-MM-DD)");
    }

    #[tokio::test]
    async fn batch_add_validates_every_entry() {
        let harness = harness();
        let mut bad = student("s2");
        bad["last_updated"] = json!("2024-2-1");

        let (status, body) = send(
            &harness.router,
            Method::POST,
            "/students/batch",
            Some(json!([student("s1"), bad])),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["message"],
            "Invalid or missing date format in one or more student records (expected YYYY-MM-DD)"
        );

        let (_, listing) = send(&harness.router, Method::GET, "/students", None).await;
        assert_eq!(listing, json!([]));
    }

    #[tokio::test]
    async fn batch_add_inserts_all_entries() {
        let harness = harness();
        let (status, body) = send(
            &harness.router,
            Method::POST,
            "/students/batch",
            Some(json!([student("s1"), student("s2")])),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!("Students added successfully"));

        let (_, listing) = send(&harness.router, Method::GET, "/students", None).await;
        assert_eq!(listing.as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn empty_batch_is_rejected() {
        let harness = harness();
        let (status, _) = send(
            &harness.router,
            Method::POST,
            "/students/batch",
            Some(json!([])),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn listing_an_empty_collection_returns_an_empty_array() {
        let harness = harness();
        let (status, body) = send(&harness.router, Method::GET, "/students", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn missing_student_renders_404() {
        let harness = harness();
        let (status, body) = send(&harness.router, Method::GET, "/students/ghost", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Not found /students/ghost");
    }

    #[tokio::test]
    async fn update_distinguishes_modified_from_unchanged() {
        let harness = harness();
        send(
            &harness.router,
            Method::POST,
            "/students",
            Some(student("s1")),
        )
        .await;

        let (status, body) = send(
            &harness.router,
            Method::PUT,
            "/students/s1",
            Some(update_payload("s1", 22)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!("Student updated successfully"));

        let (status, body) = send(
            &harness.router,
            Method::PUT,
            "/students/s1",
            Some(update_payload("s1", 22)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!("Student found, but no changes applied"));

        let (status, _) = send(
            &harness.router,
            Method::PUT,
            "/students/ghost",
            Some(update_payload("ghost", 22)),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_leaves_the_deleted_flag_alone() {
        let harness = harness();
        send(
            &harness.router,
            Method::POST,
            "/students",
            Some(student("s1")),
        )
        .await;
        send(&harness.router, Method::DELETE, "/students/s1", None).await;

        send(
            &harness.router,
            Method::PUT,
            "/students/s1",
            Some(update_payload("s1", 23)),
        )
        .await;
        let (_, body) = send(&harness.router, Method::GET, "/students/s1", None).await;
        assert_eq!(body["is_deleted"], true);
        assert_eq!(body["age"], 23);
    }

    #[tokio::test]
    async fn soft_delete_is_a_one_shot_operation() {
        let harness = harness();
        send(
            &harness.router,
            Method::POST,
            "/students",
            Some(student("s1")),
        )
        .await;

        let (status, body) = send(&harness.router, Method::DELETE, "/students/s1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!("Student soft deleted successfully"));

        let (_, fetched) = send(&harness.router, Method::GET, "/students/s1", None).await;
        assert_eq!(fetched["is_deleted"], true);

        let (status, _) = send(&harness.router, Method::DELETE, "/students/s1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn hard_delete_removes_the_document() {
        let harness = harness();
        send(
            &harness.router,
            Method::POST,
            "/students",
            Some(student("s1")),
        )
        .await;

        let (status, body) = send(
            &harness.router,
            Method::DELETE,
            "/students/s1?hard=true",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!("Student hard deleted successfully"));

        let (status, _) = send(&harness.router, Method::GET, "/students/s1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &harness.router,
            Method::DELETE,
            "/students/s1?hard=true",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
