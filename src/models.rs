use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Acknowledgement returned by bulk career creation
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Request body for subject creation
///
/// Fields are kept as raw JSON so that an explicit `0` credit count can be
/// told apart from a missing one. `null` counts as missing.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateSubjectRequest {
    /// Code of the owning career
    pub cod: Option<serde_json::Value>,
    /// Subject name
    pub asig: Option<serde_json::Value>,
    /// Credit count
    pub uc: Option<serde_json::Value>,
    /// Prerequisite subject ids, defaults to an empty list
    pub requisitos: Option<serde_json::Value>,
}

/// JavaScript-style truthiness, used to tell a usable identifier from a
/// placeholder such as `""`, `0`, `false` or `null`
pub fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(_) | JsonValue::Object(_) => true,
    }
}
