use crate::error::{ApiError, ErrorResponse};
use crate::kv::{encode_field, Record};
use crate::models::{is_truthy, MessageResponse};
use crate::repository::NewRecord;
use crate::routes;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value as JsonValue;

/// GET /api/carreras handler - List every career
#[utoipa::path(
    get,
    path = routes::CAREERS,
    responses(
        (status = 200, description = "All stored careers", body = Vec<serde_json::Value>),
        (status = 500, description = "Store error", body = ErrorResponse)
    ),
    tag = "carreras"
)]
pub async fn list_careers_handler(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Vec<Record>>), ApiError> {
    let careers = state
        .repository
        .list_all(&state.config.keyspace.career_index)
        .await?;

    tracing::info!("Listed {} careers", careers.len());
    Ok((StatusCode::OK, Json(careers)))
}

/// POST /api/carreras handler - Create or overwrite careers in bulk
///
/// Entries without a usable `codigo` are skipped. All writes of one request
/// go to the store in a single batch.
#[utoipa::path(
    post,
    path = routes::CAREERS,
    request_body = Vec<serde_json::Value>,
    responses(
        (status = 201, description = "Careers stored", body = MessageResponse),
        (status = 400, description = "Body is not an array", body = ErrorResponse),
        (status = 500, description = "Store error", body = ErrorResponse)
    ),
    tag = "carreras"
)]
pub async fn create_careers_handler(
    State(state): State<AppState>,
    payload: Result<Json<JsonValue>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let Json(body) = payload?;
    let JsonValue::Array(entries) = body else {
        return Err(ApiError::InvalidBody(
            "Request body must be an array of careers".to_string(),
        ));
    };

    let keys = &state.config.keyspace;
    let submitted = entries.len();
    let careers: Vec<NewRecord> = entries
        .into_iter()
        .filter_map(|entry| {
            let JsonValue::Object(record) = entry else {
                return None;
            };
            let codigo = record
                .get("codigo")
                .filter(|value| is_truthy(value))
                .map(encode_field)?;
            Some(NewRecord {
                key: keys.career_key(&codigo),
                record,
                indexes: vec![keys.career_index.clone()],
            })
        })
        .collect();

    let stored = careers.len();
    if stored < submitted {
        tracing::warn!("Skipped {} career entries without a codigo", submitted - stored);
    }

    state.repository.add_all(careers).await?;

    tracing::info!("Stored {} careers", stored);
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Careers created successfully".to_string(),
        }),
    ))
}

/// PUT /api/carreras/{codigo} handler - Merge fields into a career
///
/// Only the path code selects the record. A `codigo` inside the body is
/// stored like any other field.
#[utoipa::path(
    put,
    path = routes::CAREER_ITEM,
    params(
        ("codigo" = String, Path, description = "Career code")
    ),
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Updated career", body = serde_json::Value),
        (status = 400, description = "Body is not an object", body = ErrorResponse),
        (status = 404, description = "Career not found", body = ErrorResponse),
        (status = 500, description = "Store error", body = ErrorResponse)
    ),
    tag = "carreras"
)]
pub async fn update_career_handler(
    State(state): State<AppState>,
    Path(codigo): Path<String>,
    payload: Result<Json<JsonValue>, JsonRejection>,
) -> Result<(StatusCode, Json<Record>), ApiError> {
    let Json(body) = payload?;
    let JsonValue::Object(changes) = body else {
        return Err(ApiError::InvalidBody(
            "Request body must be an object of fields".to_string(),
        ));
    };

    let key = state.config.keyspace.career_key(&codigo);
    match state.repository.update(&key, &changes).await? {
        Some(career) => {
            tracing::info!("Updated career {}", codigo);
            Ok((StatusCode::OK, Json(career)))
        }
        None => {
            tracing::info!("Career not found: {}", codigo);
            Err(ApiError::CareerNotFound(codigo))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::{send, send_raw, setup_test_app};
    use axum::http::StatusCode;
    use serde_json::{json, Value as JsonValue};

    fn codes(list: &JsonValue) -> Vec<String> {
        let mut codes: Vec<String> = list
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["codigo"].as_str().unwrap().to_string())
            .collect();
        codes.sort();
        codes
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let (app, _store) = setup_test_app();

        let (status, body) = send(
            &app,
            "POST",
            "/api/carreras",
            Some(json!([{"codigo": "ING01", "semestre": 1}])),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["message"].is_string());

        let (status, body) = send(&app, "GET", "/api/carreras", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([{"codigo": "ING01", "semestre": "1"}]));
    }

    #[tokio::test]
    async fn test_create_is_one_batch() {
        let (app, store) = setup_test_app();

        let (status, _) = send(
            &app,
            "POST",
            "/api/carreras",
            Some(json!([{"codigo": "A"}, {"codigo": "B"}, {"codigo": "C"}])),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(store.round_trips(), 1);

        let (_, body) = send(&app, "GET", "/api/carreras", None).await;
        assert_eq!(codes(&body), vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_same_code_twice_keeps_one_entry_with_last_write() {
        let (app, _store) = setup_test_app();

        let first = json!([{"codigo": "ING01", "semestre": 1}]);
        send(&app, "POST", "/api/carreras", Some(first)).await;
        let second = json!([{"codigo": "ING01", "semestre": 2}]);
        send(&app, "POST", "/api/carreras", Some(second)).await;

        let (_, body) = send(&app, "GET", "/api/carreras", None).await;
        assert_eq!(body, json!([{"codigo": "ING01", "semestre": "2"}]));
    }

    #[tokio::test]
    async fn test_malformed_entries_are_skipped() {
        let (app, _store) = setup_test_app();

        let (status, _) = send(
            &app,
            "POST",
            "/api/carreras",
            Some(json!([
                {"codigo": "OK1"},
                {"nombre": "sin codigo"},
                {"codigo": ""},
                null,
                "ING02",
                {"codigo": 7}
            ])),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, body) = send(&app, "GET", "/api/carreras", None).await;
        assert_eq!(codes(&body), vec!["7", "OK1"]);
    }

    #[tokio::test]
    async fn test_all_malformed_entries_contacts_no_store() {
        let (app, store) = setup_test_app();

        let (status, _) = send(&app, "POST", "/api/carreras", Some(json!([{"x": 1}]))).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(store.round_trips(), 0);
    }

    #[tokio::test]
    async fn test_non_array_body_is_rejected_without_writes() {
        let (app, store) = setup_test_app();

        for body in [json!({"codigo": "ING01"}), json!("ING01"), json!(3)] {
            let (status, response) = send(&app, "POST", "/api/carreras", Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(response["error"].as_str().unwrap().contains("array"));
        }

        assert_eq!(store.writes(), 0);
        assert_eq!(store.round_trips(), 0);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request_with_json_error() {
        let (app, store) = setup_test_app();

        let (status, body) = send_raw(
            &app,
            "POST",
            "/api/carreras",
            Some("application/json"),
            "[{invalid json}",
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
        assert_eq!(store.round_trips(), 0);
    }

    #[tokio::test]
    async fn test_body_without_json_content_type_is_bad_request() {
        let (app, store) = setup_test_app();
        let careers = r#"[{"codigo": "ING01"}]"#;

        for content_type in [None, Some("text/plain")] {
            let (status, body) =
                send_raw(&app, "POST", "/api/carreras", content_type, careers).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "content type {:?}", content_type);
            assert!(body["error"].as_str().unwrap().contains("Content-Type"));
        }

        let (status, body) = send_raw(&app, "PUT", "/api/carreras/ING01", None, "{}").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        assert_eq!(store.round_trips(), 0);
    }

    #[tokio::test]
    async fn test_list_empty() {
        let (app, _store) = setup_test_app();

        let (status, body) = send(&app, "GET", "/api/carreras", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let (app, _store) = setup_test_app();
        send(
            &app,
            "POST",
            "/api/carreras",
            Some(json!([{"codigo": "ING01", "semestre": 1, "nombre": "Informatica"}])),
        )
        .await;

        let (status, body) = send(
            &app,
            "PUT",
            "/api/carreras/ING01",
            Some(json!({"semestre": 3, "sede": "Norte"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"codigo": "ING01", "semestre": "3", "nombre": "Informatica", "sede": "Norte"})
        );
    }

    #[tokio::test]
    async fn test_update_writes_body_codigo_verbatim() {
        let (app, _store) = setup_test_app();
        send(&app, "POST", "/api/carreras", Some(json!([{"codigo": "ING01"}]))).await;

        let (status, body) =
            send(&app, "PUT", "/api/carreras/ING01", Some(json!({"codigo": "OTHER"}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["codigo"], "OTHER");

        let (status, _) = send(&app, "PUT", "/api/carreras/OTHER", Some(json!({"a": 1}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_not_found() {
        let (app, store) = setup_test_app();

        let (status, body) =
            send(&app, "PUT", "/api/carreras/NOPE", Some(json!({"semestre": 2}))).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("NOPE"));
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_update_requires_object_body() {
        let (app, _store) = setup_test_app();
        send(&app, "POST", "/api/carreras", Some(json!([{"codigo": "ING01"}]))).await;

        let (status, _) = send(&app, "PUT", "/api/carreras/ING01", Some(json!([1, 2]))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_store_failure_is_internal_error() {
        let (app, store) = setup_test_app();
        store.set_unavailable(true);

        let (status, body) = send(&app, "GET", "/api/carreras", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].is_string());

        let (status, _) = send(&app, "POST", "/api/carreras", Some(json!([{"codigo": "A"}]))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (status, _) = send(&app, "PUT", "/api/carreras/A", Some(json!({"a": 1}))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
