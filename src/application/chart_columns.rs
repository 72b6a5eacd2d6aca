// Final x/y column resolution before a chart is handed to a renderer
use crate::domain::chart::{OHLC_COLUMNS, Record, YAxis};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ColumnError {
    #[error("no data records to resolve columns from")]
    EmptyData,
    #[error("missing candlestick columns: {0:?}")]
    MissingOhlc(Vec<String>),
    #[error("could not determine x and y columns")]
    Undetermined,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ResolvedColumns {
    pub x: String,
    pub y: String,
}

/// Resolve x/y, auto-detecting from the first record when not declared.
///
/// A declared y list of four or more entries is a candlestick request: every
/// record must carry Open/High/Low/Close and y becomes `Close`. With a
/// single-column dataset x and y both name that column.
pub fn resolve_columns(
    records: &[Record],
    x: Option<&str>,
    y: Option<&YAxis>,
) -> Result<ResolvedColumns, ColumnError> {
    let first = records.first().ok_or(ColumnError::EmptyData)?;
    let columns: Vec<&str> = first.keys().map(String::as_str).collect();

    let mut y_col = match y {
        Some(YAxis::Columns(list)) if list.len() >= 4 => {
            let missing: Vec<String> = OHLC_COLUMNS
                .iter()
                .filter(|col| !records.iter().all(|r| r.contains_key(**col)))
                .map(|col| col.to_string())
                .collect();
            if !missing.is_empty() {
                tracing::error!("Missing candlestick columns: {:?}", missing);
                return Err(ColumnError::MissingOhlc(missing));
            }
            "Close".to_string()
        }
        Some(YAxis::Column(col)) => col.clone(),
        Some(YAxis::Columns(list)) => list.first().cloned().unwrap_or_default(),
        None => String::new(),
    };

    let x_col = match x {
        Some(x) if !x.is_empty() => x.to_string(),
        _ => columns.first().map(|c| c.to_string()).unwrap_or_default(),
    };

    if y_col.is_empty() {
        y_col = columns
            .get(1)
            .or_else(|| columns.first())
            .map(|c| c.to_string())
            .unwrap_or_default();
        tracing::debug!("Auto-detected y column: {}", y_col);
    }

    if x_col.is_empty() || y_col.is_empty() {
        return Err(ColumnError::Undetermined);
    }

    Ok(ResolvedColumns { x: x_col, y: y_col })
}
