//! Handlers for the legacy flat-file adapter.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::Uri,
};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::api::{ApiError, AppState};
use crate::pick::{AttributeMap, AttributeValue, UpdateError};
use crate::projection::{LatestPolicy, Projection, ProjectionOptions, project};

/// Query controls for `GET /legacy-client/:id`.
///
/// The flags are lenient on purpose: anything other than the literal
/// `false` (case-insensitive) leaves a flag enabled, and anything other
/// than the literal `first` selects the last balance.
#[derive(Debug, Default, Deserialize)]
pub(super) struct ProjectionQuery {
    #[serde(default)]
    parse_numbers: Option<String>,
    #[serde(default)]
    parse_dates: Option<String>,
    #[serde(default)]
    latest: Option<String>,
}

impl ProjectionQuery {
    fn options(&self) -> ProjectionOptions {
        ProjectionOptions {
            parse_numbers: flag_enabled(self.parse_numbers.as_deref()),
            parse_dates: flag_enabled(self.parse_dates.as_deref()),
            latest: LatestPolicy::from_query(self.latest.as_deref().unwrap_or("last")),
        }
    }
}

fn flag_enabled(raw: Option<&str>) -> bool {
    raw.is_none_or(|value| !value.eq_ignore_ascii_case("false"))
}

/// Read a record from the flat file and return its projection.
pub(super) async fn get_client(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
    Query(query): Query<ProjectionQuery>,
    uri: Uri,
) -> Result<Json<Projection>, ApiError> {
    let record = state
        .records
        .read(&client_id)
        .map_err(|err| ApiError::internal("Error reading legacy record", err))?;
    state.metrics.record_legacy_read();

    match project(&record, &query.options()) {
        Some(projection) => Ok(Json(projection)),
        None => Err(ApiError::not_found(uri.path())),
    }
}

/// Apply an attribute map to a legacy record and rewrite the flat file.
///
/// The body is a JSON object mapping string-encoded positive integers to a
/// replacement scalar or array; arrays become multivalues.
pub(super) async fn update_client(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
    uri: Uri,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<Value>, ApiError> {
    if body.is_empty() {
        return Err(ApiError::bad_request(
            "Missing JSON body with attribute mapping",
        ));
    }

    let mut record = state
        .records
        .read(&client_id)
        .map_err(|err| ApiError::internal("Error updating legacy record", err))?;
    if !record.is_found() {
        return Err(ApiError::not_found(uri.path()));
    }

    let changes = parse_attribute_map(&body)?;
    state
        .records
        .update(&mut record, &changes)
        .map_err(|err| match err {
            UpdateError::RecordNotFound(_) => ApiError::not_found(uri.path()),
            UpdateError::InvalidPosition(position) => ApiError::bad_request(format!(
                "Invalid attribute key: {position} (must be a positive integer)"
            )),
            UpdateError::Store(source) => {
                ApiError::internal("Error updating legacy record", source)
            }
        })?;
    state.metrics.record_legacy_update();

    tracing::info!(
        client_id,
        positions = changes.len(),
        "Legacy record updated"
    );
    Ok(Json(json!({ "message": "Legacy record updated successfully" })))
}

fn parse_attribute_map(body: &Map<String, Value>) -> Result<AttributeMap, ApiError> {
    let mut changes = AttributeMap::new();
    for (key, value) in body {
        let position = key
            .parse::<usize>()
            .ok()
            .filter(|position| *position >= 1)
            .ok_or_else(|| {
                ApiError::bad_request(format!(
                    "Invalid attribute key: {key} (must be a positive integer)"
                ))
            })?;
        changes.insert(position, attribute_value(value));
    }
    Ok(changes)
}

/// JSON strings are written verbatim; arrays become multivalues with each
/// element rendered the same way; any other JSON value is written as its
/// JSON text.
fn attribute_value(value: &Value) -> AttributeValue {
    match value {
        Value::Array(items) => {
            AttributeValue::Multivalue(items.iter().map(scalar_text).collect())
        }
        other => AttributeValue::Scalar(scalar_text(other)),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use crate::api::fixtures::{harness, harness_with_records, send};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn returns_the_projection_for_a_known_client() {
        let harness = harness();
        let (status, body) = send(&harness.router, Method::GET, "/legacy-client/101", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["client_id"], "101");
        assert_eq!(body["client_name"], "John Doe");
        assert_eq!(body["current_balance"], "12.50");
        assert_eq!(
            body["legacy_balances_history"],
            json!(["2500.00", "400.00", "12.50"])
        );
        assert_eq!(body["transactions"][0]["date"], "2023-11-01");
        assert_eq!(body["data_source"], "Simulated Universe/Pick Flat File");
    }

    #[tokio::test]
    async fn unknown_client_renders_404() {
        let harness = harness();
        let (status, body) = send(&harness.router, Method::GET, "/legacy-client/999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], 404);
        assert_eq!(body["message"], "Not found /legacy-client/999");
    }

    #[tokio::test]
    async fn query_flags_control_the_projection() {
        let harness = harness();

        let (_, first) = send(
            &harness.router,
            Method::GET,
            "/legacy-client/101?latest=first",
            None,
        )
        .await;
        assert_eq!(first["current_balance"], "2500.00");

        let (_, lenient) = send(
            &harness.router,
            Method::GET,
            "/legacy-client/101?latest=oldest&parse_numbers=yes",
            None,
        )
        .await;
        assert_eq!(lenient["current_balance"], "12.50");
    }

    #[tokio::test]
    async fn raw_flags_disable_coercion() {
        let harness = harness_with_records("201^Pat^007.50^2024-13-77\n");

        let (_, parsed) = send(&harness.router, Method::GET, "/legacy-client/201", None).await;
        assert_eq!(parsed["legacy_balances_history"], json!(["7.50"]));
        assert_eq!(parsed["transaction_dates"], json!(["2024-13-77"]));

        let (_, raw) = send(
            &harness.router,
            Method::GET,
            "/legacy-client/201?parse_numbers=false&parse_dates=FALSE",
            None,
        )
        .await;
        assert_eq!(raw["legacy_balances_history"], json!(["007.50"]));
    }

    #[tokio::test]
    async fn update_rewrites_the_record_and_reports_success() {
        let harness = harness();
        let (status, body) = send(
            &harness.router,
            Method::POST,
            "/legacy-client/102",
            Some(json!({"1": "Jane Doe", "2": ["999.99", "0.00"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Legacy record updated successfully");

        let (_, reread) = send(&harness.router, Method::GET, "/legacy-client/102", None).await;
        assert_eq!(reread["client_name"], "Jane Doe");
        assert_eq!(
            reread["legacy_balances_history"],
            json!(["999.99", "0.00"])
        );

        let backup = harness.state.records.backup_path();
        let contents = std::fs::read_to_string(backup).expect("backup exists");
        assert!(contents.contains("102^Jane Smith^150.00]800.00^2024-02-10]2024-03-15"));
    }

    #[tokio::test]
    async fn update_requires_a_non_empty_mapping() {
        let harness = harness();
        let (status, body) = send(
            &harness.router,
            Method::POST,
            "/legacy-client/101",
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Missing JSON body with attribute mapping");
    }

    #[tokio::test]
    async fn update_rejects_non_positive_attribute_keys() {
        let harness = harness();

        let (status, body) = send(
            &harness.router,
            Method::POST,
            "/legacy-client/101",
            Some(json!({"name": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["message"],
            "Invalid attribute key: name (must be a positive integer)"
        );

        let (status, body) = send(
            &harness.router,
            Method::POST,
            "/legacy-client/101",
            Some(json!({"0": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["message"],
            "Invalid attribute key: 0 (must be a positive integer)"
        );
    }

    #[tokio::test]
    async fn update_of_unknown_client_renders_404() {
        let harness = harness();
        let (status, _) = send(
            &harness.router,
            Method::POST,
            "/legacy-client/999",
            Some(json!({"1": "ghost"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn non_string_scalars_are_written_as_json_text() {
        let harness = harness();
        send(
            &harness.router,
            Method::POST,
            "/legacy-client/103",
            Some(json!({"2": 42.5, "5": true})),
        )
        .await;

        let (_, body) = send(
            &harness.router,
            Method::GET,
            "/legacy-client/103?parse_numbers=false",
            None,
        )
        .await;
        assert_eq!(body["legacy_balances_history"], json!(["42.5"]));
    }
}
