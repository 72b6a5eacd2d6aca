// Fill in chart metadata the backend left out, then enforce record invariants
use crate::domain::chart::{ChartData, ChartType, OHLC_COLUMNS, Record, YAxis};
use serde_json::{Map, Value};

const X_CANDIDATES: [&str; 6] = ["Date", "date", "time", "Time", "timestamp", "Timestamp"];

/// Turn a parsed chart document into chart data.
///
/// `None` when the document is not a usable chart: no object rows, an
/// unsupported `chart_type`, or no row left after dropping the ones missing
/// an axis column.
pub fn enhance(document: &Map<String, Value>) -> Option<ChartData> {
    let records: Vec<Record> = document
        .get("data")?
        .as_array()?
        .iter()
        .filter_map(|row| row.as_object().cloned())
        .collect();
    if records.is_empty() {
        return None;
    }

    let chart_type = match document.get("chart_type") {
        Some(Value::String(label)) => match label.parse::<ChartType>() {
            Ok(chart_type) => chart_type,
            Err(e) => {
                tracing::warn!("{}", e);
                return None;
            }
        },
        _ => detect_chart_type(&records),
    };

    let x = match document.get("x") {
        Some(Value::String(x)) if !x.is_empty() => x.clone(),
        _ => detect_x_column(&records),
    };

    let y = declared_y(document.get("y")).unwrap_or_else(|| detect_y_columns(&records, chart_type, &x));
    if y.columns().is_empty() {
        return None;
    }

    let data = retain_complete(records, chart_type, &x, &y);
    if data.is_empty() {
        tracing::warn!("No record carries every axis column ({} / {:?})", x, y);
        return None;
    }

    let chart = ChartData::new(chart_type, data, x, y);
    tracing::info!(
        "Enhanced chart data with {} complete records",
        chart.data_count
    );
    Some(chart)
}

pub fn detect_chart_type(records: &[Record]) -> ChartType {
    let Some(first) = records.first() else {
        return ChartType::Line;
    };

    if OHLC_COLUMNS.iter().all(|col| first.contains_key(*col)) {
        return ChartType::Candlestick;
    }

    let numeric = first.values().filter(|v| v.is_number()).count();
    if numeric >= 2 {
        ChartType::Scatter
    } else {
        ChartType::Line
    }
}

pub fn detect_x_column(records: &[Record]) -> String {
    let Some(first) = records.first() else {
        return "Date".to_string();
    };

    X_CANDIDATES
        .iter()
        .find(|candidate| first.contains_key(**candidate))
        .map(|candidate| candidate.to_string())
        .or_else(|| first.keys().next().cloned())
        .unwrap_or_else(|| "Date".to_string())
}

pub fn detect_y_columns(records: &[Record], chart_type: ChartType, x: &str) -> YAxis {
    if chart_type == ChartType::Candlestick {
        return YAxis::ohlc();
    }

    let numeric: Vec<String> = records
        .first()
        .map(|first| {
            first
                .iter()
                .filter(|(k, v)| v.is_number() && k.as_str() != x && !matches!(k.as_str(), "Date" | "date"))
                .map(|(k, _)| k.clone())
                .collect()
        })
        .unwrap_or_default();

    if numeric.is_empty() {
        return fallback_y_column(records, x);
    }

    let take = match chart_type {
        ChartType::Scatter => 2,
        ChartType::Line | ChartType::Bar => 1,
        _ => numeric.len(),
    };
    YAxis::Columns(numeric.into_iter().take(take).collect())
}

/// No numeric column: the first non-x column, or x itself for single-column rows
fn fallback_y_column(records: &[Record], x: &str) -> YAxis {
    let column = records
        .first()
        .and_then(|first| first.keys().find(|k| k.as_str() != x).or_else(|| first.keys().next()))
        .cloned()
        .unwrap_or_else(|| x.to_string());
    tracing::debug!("No numeric y column, falling back to {}", column);
    YAxis::Columns(vec![column])
}

fn declared_y(value: Option<&Value>) -> Option<YAxis> {
    match value? {
        Value::String(column) if !column.is_empty() => Some(YAxis::Column(column.clone())),
        Value::Array(items) => {
            let columns: Vec<String> = items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect();
            (!columns.is_empty()).then_some(YAxis::Columns(columns))
        }
        _ => None,
    }
}

/// Drop records missing the x column, any y column, or (for candlestick) any OHLC column
fn retain_complete(records: Vec<Record>, chart_type: ChartType, x: &str, y: &YAxis) -> Vec<Record> {
    let mut required: Vec<&str> = vec![x];
    required.extend(y.columns());
    if chart_type == ChartType::Candlestick {
        required.extend(OHLC_COLUMNS);
    }

    let before = records.len();
    let kept: Vec<Record> = records
        .into_iter()
        .filter(|record| required.iter().all(|col| record.contains_key(*col)))
        .collect();
    if kept.len() < before {
        tracing::debug!("Dropped {} records missing axis columns", before - kept.len());
    }
    kept
}
