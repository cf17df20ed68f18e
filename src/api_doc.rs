use axum::Json;
use utoipa::OpenApi;

use crate::error::{ErrorResponse, HealthResponse, UnhealthyResponse};
use crate::handlers;
use crate::models::{CreateSubjectRequest, MessageResponse};

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "rust-kv-catalog API",
        version = "1.0.0",
        description = "Careers and subjects catalogue backed by a Redis-compatible \
                       REST key-value store"
    ),
    paths(
        handlers::health::health_handler,
        handlers::careers::list_careers_handler,
        handlers::careers::create_careers_handler,
        handlers::careers::update_career_handler,
        handlers::subjects::create_subject_handler,
        handlers::subjects::list_subjects_handler,
        handlers::subjects::list_career_subjects_handler,
        handlers::subjects::update_subject_handler
    ),
    components(
        schemas(
            MessageResponse,
            CreateSubjectRequest,
            ErrorResponse,
            HealthResponse,
            UnhealthyResponse
        )
    ),
    tags(
        (name = "health", description = "Health check operations"),
        (name = "carreras", description = "Career operations"),
        (name = "asignaturas", description = "Subject operations")
    )
)]
pub struct ApiDoc;

/// GET /api-docs/openapi.json handler
pub async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        for path in [
            crate::routes::HEALTH,
            crate::routes::CAREERS,
            crate::routes::CAREER_ITEM,
            crate::routes::CAREER_SUBJECTS,
            crate::routes::SUBJECTS,
            crate::routes::SUBJECT_ITEM,
        ] {
            assert!(paths.iter().any(|p| p.as_str() == path), "missing path {}", path);
        }
    }

    #[tokio::test]
    async fn test_openapi_handler_serves_json() {
        let Json(doc) = openapi_handler().await;
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["info"]["title"], "rust-kv-catalog API");
    }
}
