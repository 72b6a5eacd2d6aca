// Chart domain models
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One data row: column name -> scalar, in payload order.
pub type Record = Map<String, Value>;

pub const OHLC_COLUMNS: [&str; 4] = ["Open", "High", "Low", "Close"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Pie,
    Line,
    Scatter,
    Candlestick,
}

impl ChartType {
    pub const ALL: [ChartType; 5] = [
        ChartType::Bar,
        ChartType::Pie,
        ChartType::Line,
        ChartType::Scatter,
        ChartType::Candlestick,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::Pie => "pie",
            ChartType::Line => "line",
            ChartType::Scatter => "scatter",
            ChartType::Candlestick => "candlestick",
        }
    }

    /// Fields a salvaged record must carry to be usable for this chart type
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            ChartType::Candlestick => &["Date", "Open", "High", "Low", "Close"],
            ChartType::Scatter | ChartType::Line => &["Date"],
            ChartType::Bar | ChartType::Pie => &[],
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported chart type: {0}")]
pub struct UnsupportedChartType(pub String);

impl FromStr for ChartType {
    type Err = UnsupportedChartType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_lowercase();
        ChartType::ALL
            .into_iter()
            .find(|t| t.as_str() == label)
            .ok_or_else(|| UnsupportedChartType(s.to_string()))
    }
}

/// Dependent axis: a single column, or an ordered list (OHLC for candlestick)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum YAxis {
    Column(String),
    Columns(Vec<String>),
}

impl YAxis {
    pub fn ohlc() -> Self {
        YAxis::Columns(OHLC_COLUMNS.iter().map(|c| c.to_string()).collect())
    }

    pub fn columns(&self) -> Vec<&str> {
        match self {
            YAxis::Column(c) => vec![c.as_str()],
            YAxis::Columns(cs) => cs.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub chart_type: ChartType,
    pub data: Vec<Record>,
    pub x: String,
    pub y: YAxis,
    pub data_count: usize,
    pub data_complete: bool,
}

impl ChartData {
    pub fn new(chart_type: ChartType, data: Vec<Record>, x: String, y: YAxis) -> Self {
        let data_count = data.len();
        Self {
            chart_type,
            data,
            x,
            y,
            data_count,
            data_complete: true,
        }
    }

    /// First record's column names, in payload order
    pub fn columns(&self) -> Vec<&str> {
        self.data
            .first()
            .map(|r| r.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Database,
    General,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartFailure {
    pub error: String,
    pub error_type: ErrorKind,
}

/// Normalized result of parsing one backend response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ChartSpec {
    Success(ChartData),
    Error(ChartFailure),
}

impl ChartSpec {
    pub fn error(message: impl Into<String>, error_type: ErrorKind) -> Self {
        ChartSpec::Error(ChartFailure {
            error: message.into(),
            error_type,
        })
    }

    pub fn as_success(&self) -> Option<&ChartData> {
        match self {
            ChartSpec::Success(data) => Some(data),
            ChartSpec::Error(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chart_type_from_str() {
        assert_eq!("Scatter".parse::<ChartType>(), Ok(ChartType::Scatter));
        assert_eq!(" pie ".parse::<ChartType>(), Ok(ChartType::Pie));
        let err = "histogram".parse::<ChartType>().unwrap_err();
        assert_eq!(err.to_string(), "unsupported chart type: histogram");
    }

    #[test]
    fn test_spec_serializes_with_status_tag() {
        let mut record = Record::new();
        record.insert("Date".to_string(), json!("2016-05-31"));
        record.insert("Close".to_string(), json!(545.45));
        let spec = ChartSpec::Success(ChartData::new(
            ChartType::Line,
            vec![record],
            "Date".to_string(),
            YAxis::Columns(vec!["Close".to_string()]),
        ));

        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["chart_type"], "line");
        assert_eq!(value["y"], json!(["Close"]));
        assert_eq!(value["data_count"], 1);

        let failure = ChartSpec::error("Requested data table not found in database.", ErrorKind::Database);
        let value = serde_json::to_value(&failure).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["error_type"], "database");
    }
}
