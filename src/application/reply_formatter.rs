// User-facing reply text and chart titles
use crate::application::profile_summary::ProfileSummary;
use crate::application::response_parser::clean_error_message;
use crate::domain::chart::{ChartData, ChartType};
use crate::domain::dashboard::DashboardRegistryEntry;
use serde_json::{Map, Value};

const TEXT_FIELDS: [&str; 9] = [
    "response",
    "message",
    "text",
    "content",
    "answer",
    "result",
    "output",
    "reply",
    "description",
];

const ABBREVIATIONS: [&str; 4] = ["id", "url", "api", "sql"];

pub fn chart_summary(chart: &ChartData) -> String {
    format!(
        "Generated {} chart with {} data points.",
        chart.chart_type, chart.data_count
    )
}

pub fn error_text(message: &str) -> String {
    format!("Error: {}", message)
}

pub fn dashboard_text(entry: &DashboardRegistryEntry, rendered: usize) -> String {
    format!(
        "Live dashboard with the requested charts has been created.\n\
         Title: {}\n\
         ID: {}\n\
         Charts: {} requested, {} rendered\n\
         Page: {}",
        entry.title,
        entry.dashboard_id,
        entry.charts.len(),
        rendered,
        entry.page_reference
    )
}

pub fn profile_text(summary: &ProfileSummary) -> String {
    let mut lines = vec![
        format!(
            "Profile of {}: {} rows, {} columns ({} profiled, {} with errors).",
            summary.table_name,
            summary.row_count,
            summary.total_columns,
            summary.columns.len(),
            summary.failed_columns.len()
        ),
        format!(
            "Quality score: {} ({:?})",
            summary.quality.score, summary.quality.category
        ),
    ];
    lines.extend(summary.recommendations.iter().map(|r| format!("- {}", r)));
    lines.join("\n")
}

/// Best human-readable text in a backend body, falling back to pretty-printed JSON.
/// Error bodies are reduced to a clean message.
pub fn response_text(body: &Value) -> String {
    let Some(map) = body.as_object() else {
        return match body {
            Value::String(s) => s.trim().to_string(),
            other => other.to_string(),
        };
    };

    if let Some(message) = error_message(map) {
        return error_text(&message);
    }

    extract_text(map, 0).unwrap_or_else(|| {
        let pretty = serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string());
        format!("Response received:\n```json\n{}\n```", pretty)
    })
}

fn error_message(map: &Map<String, Value>) -> Option<String> {
    let is_error = map.contains_key("error")
        || map.get("status").and_then(Value::as_str) == Some("error")
        || map.get("success").and_then(Value::as_bool) == Some(false);
    if !is_error {
        return None;
    }
    let message = ["error", "message"]
        .iter()
        .find_map(|field| map.get(*field).and_then(Value::as_str))
        .unwrap_or("Unknown error occurred");
    Some(clean_error_message(message))
}

fn extract_text(map: &Map<String, Value>, depth: usize) -> Option<String> {
    let direct = TEXT_FIELDS.iter().find_map(|field| {
        map.get(*field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    });
    if let Some(text) = direct {
        // A JSON document posing as text is unwrapped one level
        if depth == 0 {
            if let Ok(Value::Object(inner)) = serde_json::from_str::<Value>(text) {
                if let Some(found) = extract_text(&inner, depth + 1) {
                    return Some(found);
                }
            }
        }
        return Some(text.to_string());
    }

    if depth == 0 {
        if let Some(nested) = map.get("data").and_then(Value::as_object) {
            return extract_text(nested, depth + 1);
        }
    }
    None
}

/// Default chart title from chart type and axis columns
pub fn chart_title(chart_type: ChartType, x: &str, y: &str) -> String {
    let x_display = format_column_name(x);
    let y_display = format_column_name(y);
    match chart_type {
        ChartType::Bar => format!("{} by {}", y_display, x_display),
        ChartType::Pie => format!("Distribution of {}", y_display),
        ChartType::Line => format!("{} over {}", y_display, x_display),
        ChartType::Scatter => format!("{} vs {}", y_display, x_display),
        ChartType::Candlestick => "OHLC Price Chart".to_string(),
    }
}

/// `customer_id` -> `Customer ID`
pub fn format_column_name(column: &str) -> String {
    if column.is_empty() {
        return "Value".to_string();
    }
    column
        .split(['_', '-', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let lower = word.to_lowercase();
            if ABBREVIATIONS.contains(&lower.as_str()) {
                lower.to_uppercase()
            } else {
                let mut chars = lower.chars();
                chars
                    .next()
                    .map(|first| first.to_uppercase().chain(chars).collect())
                    .unwrap_or_default()
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_column_name() {
        assert_eq!(format_column_name("customer_id"), "Customer ID");
        assert_eq!(format_column_name("total-spend"), "Total Spend");
        assert_eq!(format_column_name("Close"), "Close");
        assert_eq!(format_column_name(""), "Value");
    }

    #[test]
    fn test_chart_titles() {
        assert_eq!(chart_title(ChartType::Bar, "customer_name", "spend"), "Spend by Customer Name");
        assert_eq!(chart_title(ChartType::Pie, "category", "count"), "Distribution of Count");
        assert_eq!(chart_title(ChartType::Scatter, "Open", "Close"), "Close vs Open");
        assert_eq!(chart_title(ChartType::Candlestick, "Date", "Close"), "OHLC Price Chart");
    }

    #[test]
    fn test_response_text_prefers_known_fields() {
        assert_eq!(response_text(&json!({"answer": "  42 "})), "42");
        assert_eq!(
            response_text(&json!({"data": {"message": "nested hello"}})),
            "nested hello"
        );
        assert_eq!(
            response_text(&json!({"response": "{\"reply\": \"unwrapped\"}"})),
            "unwrapped"
        );
    }

    #[test]
    fn test_response_text_for_errors_and_unknown_shapes() {
        assert_eq!(
            response_text(&json!({"status": "error", "message": "quota exceeded"})),
            "Error: quota exceeded"
        );
        let sql = response_text(&json!({
            "status": "error",
            "error": "[TABLE_OR_VIEW_NOT_FOUND] The table `tcs_stock` cannot be found. SQLSTATE: 42P01"
        }));
        assert_eq!(sql, "Error: Requested data table not found in database.");

        let fallback = response_text(&json!({"rows": 3}));
        assert!(fallback.starts_with("Response received:"));
        assert!(fallback.contains("\"rows\": 3"));
    }
}
