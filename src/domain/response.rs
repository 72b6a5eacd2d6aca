// Backend response shapes
use serde_json::{Map, Value};

use super::profile::is_profile_object;

/// Fields the chat backend is known to put its payload in, in lookup order
pub const PAYLOAD_FIELDS: [&str; 5] = ["response", "message", "content", "data", "result"];

const MAX_DEPTH: usize = 3;

/// A backend reply, classified once so callers extract from a known shape
#[derive(Debug, Clone, PartialEq)]
pub enum BackendResponse {
    /// A chart object (`status` + `chart_type`, or a successful `data` array)
    Chart(Map<String, Value>),
    /// Several chart objects from a dashboard-style reply
    Charts(Vec<Value>),
    /// A table profile (`{"profile": {"column_profiles": ..}}`)
    Profile(Map<String, Value>),
    /// An error object (`error` set, `status: error` or `success: false`)
    Failure(Map<String, Value>),
    /// Free text (possibly JSON) found in one of the payload fields
    Embedded { field: String, text: String },
    /// Nothing recognizable
    Opaque(Value),
}

impl BackendResponse {
    pub fn classify(value: Value) -> Self {
        match classify_value(&value, 0) {
            Some(classified) => classified,
            None => BackendResponse::Opaque(value),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BackendResponse::Chart(_) => "chart",
            BackendResponse::Charts(_) => "charts",
            BackendResponse::Profile(_) => "profile",
            BackendResponse::Failure(_) => "failure",
            BackendResponse::Embedded { .. } => "embedded",
            BackendResponse::Opaque(_) => "opaque",
        }
    }
}

fn classify_value(value: &Value, depth: usize) -> Option<BackendResponse> {
    if depth > MAX_DEPTH {
        return None;
    }
    match value {
        Value::Object(map) => classify_object(map, depth),
        Value::String(text) => Some(classify_text("", text, depth)),
        _ => None,
    }
}

fn classify_object(map: &Map<String, Value>, depth: usize) -> Option<BackendResponse> {
    if is_profile_object(map) {
        return Some(BackendResponse::Profile(map.clone()));
    }

    if let Some(charts) = map.get("charts").and_then(Value::as_array) {
        if !charts.is_empty() {
            return Some(BackendResponse::Charts(charts.clone()));
        }
    }

    if is_chart_object(map) {
        return Some(BackendResponse::Chart(map.clone()));
    }

    if is_failure_object(map) {
        return Some(BackendResponse::Failure(map.clone()));
    }

    let mut fallback = None;
    for field in PAYLOAD_FIELDS {
        match map.get(field) {
            Some(Value::String(text)) => match classify_text(field, text, depth) {
                embedded @ BackendResponse::Embedded { .. } => {
                    fallback.get_or_insert(embedded);
                }
                structured => return Some(structured),
            },
            Some(Value::Object(nested)) => match classify_object(nested, depth + 1) {
                Some(embedded @ BackendResponse::Embedded { .. }) => {
                    fallback.get_or_insert(embedded);
                }
                Some(BackendResponse::Opaque(_)) | None => {}
                Some(structured) => return Some(structured),
            },
            _ => {}
        }
    }

    fallback
}

/// Text that decodes to a chart, profile or error object is promoted; anything else stays embedded
fn classify_text(field: &str, text: &str, depth: usize) -> BackendResponse {
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(text) {
        if let Some(
            structured @ (BackendResponse::Chart(_)
            | BackendResponse::Charts(_)
            | BackendResponse::Profile(_)
            | BackendResponse::Failure(_)),
        ) =
            classify_value(&value, depth + 1)
        {
            return structured;
        }
    }

    BackendResponse::Embedded {
        field: field.to_string(),
        text: text.to_string(),
    }
}

fn is_failure_object(map: &Map<String, Value>) -> bool {
    map.get("error").is_some_and(|e| !e.is_null())
        || map.get("status").and_then(Value::as_str) == Some("error")
        || map.get("success").and_then(Value::as_bool) == Some(false)
}

fn is_chart_object(map: &Map<String, Value>) -> bool {
    if map.contains_key("status") && map.contains_key("chart_type") {
        return true;
    }
    let success = map.get("status").and_then(Value::as_str) == Some("success");
    let has_rows = map
        .get("data")
        .and_then(Value::as_array)
        .is_some_and(|rows| !rows.is_empty());
    success && has_rows
}
