// Route path constants - single source of truth for all API paths

use axum::{
    routing::{get, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::api_doc::openapi_handler;
use crate::handlers;
use crate::state::AppState;

pub const HEALTH: &str = "/health";
pub const OPENAPI: &str = "/api-docs/openapi.json";
pub const CAREERS: &str = "/api/carreras";
pub const CAREER_ITEM: &str = "/api/carreras/{codigo}";
pub const CAREER_SUBJECTS: &str = "/api/carreras/{codigo}/asignaturas";
pub const SUBJECTS: &str = "/api/asignaturas";
pub const SUBJECT_ITEM: &str = "/api/asignaturas/{id}";

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(HEALTH, get(handlers::health_handler))
        .route(OPENAPI, get(openapi_handler))
        .route(
            CAREERS,
            get(handlers::list_careers_handler).post(handlers::create_careers_handler),
        )
        .route(CAREER_ITEM, put(handlers::update_career_handler))
        .route(CAREER_SUBJECTS, get(handlers::list_career_subjects_handler))
        .route(
            SUBJECTS,
            get(handlers::list_subjects_handler).post(handlers::create_subject_handler),
        )
        .route(SUBJECT_ITEM, put(handlers::update_subject_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
