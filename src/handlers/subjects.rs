use crate::error::{ApiError, ErrorResponse};
use crate::ids::generate_id;
use crate::kv::{encode_field, Record};
use crate::models::{is_truthy, CreateSubjectRequest};
use crate::repository::NewRecord;
use crate::routes;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value as JsonValue;

/// Fields fixed at creation time
const IMMUTABLE_FIELDS: [&str; 2] = ["id", "cod"];

/// POST /api/asignaturas handler - Create a subject under an existing career
#[utoipa::path(
    post,
    path = routes::SUBJECTS,
    request_body = CreateSubjectRequest,
    responses(
        (
            status = 201,
            description = "Created subject, including its generated id",
            body = serde_json::Value
        ),
        (status = 400, description = "Missing required field", body = ErrorResponse),
        (status = 404, description = "Career not found", body = ErrorResponse),
        (status = 500, description = "Store error", body = ErrorResponse)
    ),
    tag = "asignaturas"
)]
pub async fn create_subject_handler(
    State(state): State<AppState>,
    payload: Result<Json<JsonValue>, JsonRejection>,
) -> Result<(StatusCode, Json<Record>), ApiError> {
    let Json(body) = payload?;
    if !body.is_object() {
        return Err(ApiError::InvalidBody(
            "Request body must be a subject object".to_string(),
        ));
    }
    let request: CreateSubjectRequest = serde_json::from_value(body)?;

    let cod = request.cod.filter(is_truthy);
    let asig = request.asig.filter(is_truthy);
    let (Some(cod), Some(asig), Some(uc)) = (cod, asig, request.uc) else {
        return Err(ApiError::InvalidBody(
            "Fields cod, asig and uc are required".to_string(),
        ));
    };

    let keys = &state.config.keyspace;
    let codigo = encode_field(&cod);
    if !state.repository.exists(&keys.career_key(&codigo)).await? {
        tracing::info!("Career not found for new subject: {}", codigo);
        return Err(ApiError::CareerNotFound(codigo));
    }

    let id = generate_id();
    let mut subject = Record::new();
    subject.insert("id".to_string(), JsonValue::String(id.clone()));
    subject.insert("cod".to_string(), cod);
    subject.insert("asig".to_string(), asig);
    subject.insert("uc".to_string(), uc);
    subject.insert(
        "requisitos".to_string(),
        request.requisitos.unwrap_or_else(|| JsonValue::Array(Vec::new())),
    );

    state
        .repository
        .add(NewRecord {
            key: keys.subject_key(&id),
            record: subject.clone(),
            indexes: vec![
                keys.subject_index.clone(),
                keys.career_subjects_index(&codigo),
            ],
        })
        .await?;

    tracing::info!("Created subject {} for career {}", id, codigo);
    Ok((StatusCode::CREATED, Json(subject)))
}

/// GET /api/asignaturas handler - List every subject
#[utoipa::path(
    get,
    path = routes::SUBJECTS,
    responses(
        (status = 200, description = "All stored subjects", body = Vec<serde_json::Value>),
        (status = 500, description = "Store error", body = ErrorResponse)
    ),
    tag = "asignaturas"
)]
pub async fn list_subjects_handler(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Vec<Record>>), ApiError> {
    let subjects = state
        .repository
        .list_all(&state.config.keyspace.subject_index)
        .await?;

    tracing::info!("Listed {} subjects", subjects.len());
    Ok((StatusCode::OK, Json(subjects)))
}

/// GET /api/carreras/{codigo}/asignaturas handler - List the subjects of one career
///
/// The career itself is not looked up; an unknown code yields an empty list.
#[utoipa::path(
    get,
    path = routes::CAREER_SUBJECTS,
    params(
        ("codigo" = String, Path, description = "Career code")
    ),
    responses(
        (
            status = 200,
            description = "Subjects of the career, possibly empty",
            body = Vec<serde_json::Value>
        ),
        (status = 500, description = "Store error", body = ErrorResponse)
    ),
    tag = "asignaturas"
)]
pub async fn list_career_subjects_handler(
    State(state): State<AppState>,
    Path(codigo): Path<String>,
) -> Result<(StatusCode, Json<Vec<Record>>), ApiError> {
    let index = state.config.keyspace.career_subjects_index(&codigo);
    let subjects = state.repository.list_all(&index).await?;

    tracing::info!("Listed {} subjects for career {}", subjects.len(), codigo);
    Ok((StatusCode::OK, Json(subjects)))
}

/// PUT /api/asignaturas/{id} handler - Merge fields into a subject
///
/// `id` and `cod` are dropped from the body before merging.
#[utoipa::path(
    put,
    path = routes::SUBJECT_ITEM,
    params(
        ("id" = String, Path, description = "Subject id")
    ),
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Updated subject", body = serde_json::Value),
        (status = 400, description = "Body is not an object", body = ErrorResponse),
        (status = 404, description = "Subject not found", body = ErrorResponse),
        (status = 500, description = "Store error", body = ErrorResponse)
    ),
    tag = "asignaturas"
)]
pub async fn update_subject_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<JsonValue>, JsonRejection>,
) -> Result<(StatusCode, Json<Record>), ApiError> {
    let Json(body) = payload?;
    let JsonValue::Object(mut changes) = body else {
        return Err(ApiError::InvalidBody(
            "Request body must be an object of fields".to_string(),
        ));
    };
    for field in IMMUTABLE_FIELDS {
        if changes.remove(field).is_some() {
            tracing::debug!("Ignoring immutable field {} in update of subject {}", field, id);
        }
    }

    let key = state.config.keyspace.subject_key(&id);
    match state.repository.update(&key, &changes).await? {
        Some(subject) => {
            tracing::info!("Updated subject {}", id);
            Ok((StatusCode::OK, Json(subject)))
        }
        None => {
            tracing::info!("Subject not found: {}", id);
            Err(ApiError::SubjectNotFound(id))
        }
    }
}
