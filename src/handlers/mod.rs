pub mod careers;
pub mod health;
pub mod subjects;

pub use careers::{create_careers_handler, list_careers_handler, update_career_handler};
pub use health::health_handler;
pub use subjects::{
    create_subject_handler, list_career_subjects_handler, list_subjects_handler,
    update_subject_handler,
};

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::{Config, Keyspace};
    use crate::kv::MemoryStore;
    use crate::repository::Repository;
    use crate::state::AppState;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use serde_json::Value as JsonValue;
    use std::sync::Arc;
    use tower::ServiceExt;

    /// Full router over a fresh in-memory store
    pub fn setup_test_app() -> (Router, MemoryStore) {
        let config = Config {
            kv_rest_api_url: "http://localhost:0".to_string(),
            kv_rest_api_token: "test-token".to_string(),
            service_port: 3000,
            service_host: "0.0.0.0".to_string(),
            keyspace: Keyspace::default(),
        };

        let store = MemoryStore::new();
        let state = AppState {
            repository: Repository::new(Arc::new(store.clone())),
            config: Arc::new(config),
        };

        (crate::routes::router(state), store)
    }

    /// Send one request and decode the JSON response body
    pub async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<JsonValue>,
    ) -> (StatusCode, JsonValue) {
        match body {
            Some(body) => {
                let raw = serde_json::to_string(&body).unwrap();
                send_raw(app, method, uri, Some("application/json"), &raw).await
            }
            None => send_raw(app, method, uri, None, "").await,
        }
    }

    /// Send a request with an arbitrary content type and body text
    pub async fn send_raw(
        app: &Router,
        method: &str,
        uri: &str,
        content_type: Option<&str>,
        body: &str,
    ) -> (StatusCode, JsonValue) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            request = request.header("content-type", content_type);
        }
        let request = request.body(Body::from(body.to_string())).unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, body)
    }
}
