// Error-shaped backend responses
use crate::domain::chart::{ChartSpec, ErrorKind};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

const MAX_MESSAGE_CHARS: usize = 200;

static ERROR_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""error"\s*:"#).expect("error key pattern"));

const ERROR_TOKENS: [&str; 6] = [
    "TABLE_OR_VIEW_NOT_FOUND",
    "SQLSTATE",
    "ERROR",
    "Exception",
    "Failed",
    "cannot be found",
];

pub fn is_error_response(text: &str) -> bool {
    ERROR_KEY.is_match(text) || ERROR_TOKENS.iter().any(|token| text.contains(token))
}

/// `Some(error spec)` when the text looks like an error, `None` otherwise
pub fn detect_error(text: &str) -> Option<ChartSpec> {
    if !is_error_response(text) {
        return None;
    }

    let trimmed = text.trim();
    if trimmed.starts_with('{') {
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
            if let Some(error) = map.get("error") {
                let raw = match error {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                return Some(ChartSpec::error(clean_error_message(&raw), ErrorKind::Database));
            }
        }
    }

    Some(ChartSpec::error(clean_error_message(text), ErrorKind::General))
}

/// Reduce a technical error to something presentable; never leaks SQLSTATE codes
pub fn clean_error_message(error_text: &str) -> String {
    if error_text.contains("TABLE_OR_VIEW_NOT_FOUND") {
        return "Requested data table not found in database.".to_string();
    }

    if let Some((main, _)) = error_text.split_once("SQLSTATE") {
        let main = main.replace("[TABLE_OR_VIEW_NOT_FOUND]", "");
        let main = main.trim().trim_end_matches(['(', '[', ':', ';', ',']).trim();
        if !main.is_empty() {
            return truncate(main);
        }
    }

    if error_text.contains("cannot be found") {
        return "The requested data source cannot be found. Please verify the data source and date range."
            .to_string();
    }

    let without_state = error_text
        .split_once("SQLSTATE")
        .map(|(before, _)| before)
        .unwrap_or(error_text);

    if without_state.contains("Failed to") || without_state.contains("Error:") {
        let first_line = without_state.lines().next().unwrap_or_default().trim();
        if !first_line.is_empty() {
            return truncate(first_line);
        }
    }

    let clean = without_state.trim();
    if clean.is_empty() {
        return "An error occurred while processing the request.".to_string();
    }
    truncate(clean)
}

fn truncate(message: &str) -> String {
    if message.chars().count() > MAX_MESSAGE_CHARS {
        let head: String = message.chars().take(MAX_MESSAGE_CHARS).collect();
        format!("{}...", head)
    } else {
        message.to_string()
    }
}
