//! Success envelopes and presence checks shared by the handlers

use axum::Json;
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::middleware::RequestId;

/// `{ <field>: items, success: true, metadata: { count, generatedAt, requestId, ..context } }`
pub fn list_envelope<T: Serialize>(
    field: &str,
    items: &[T],
    request_id: RequestId,
    context: Map<String, Value>,
) -> Json<Value> {
    let mut metadata = context;
    metadata.insert("count".to_string(), json!(items.len()));
    metadata.insert("generatedAt".to_string(), json!(Utc::now().to_rfc3339()));
    metadata.insert("requestId".to_string(), json!(request_id.as_str()));

    Json(json!({
        field: items,
        "success": true,
        "metadata": metadata,
    }))
}

/// A string counts as present when it has non-whitespace content
pub fn present_str(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// A list counts as present when it has at least one element
pub fn present_list<T>(value: Option<Vec<T>>) -> Option<Vec<T>> {
    value.filter(|v| !v.is_empty())
}
