//! Tolerant parsing of chart responses.
//!
//! Backend chart payloads are LLM-generated JSON that may be cut off by a
//! token limit, wrapped in prose, or replaced by an error message. The
//! parser runs an ordered chain of strategies; each returns `Some` when it
//! produced a result and `None` when it does not apply, in which case the
//! next one is tried. Whatever the input, the outcome is either a
//! [`ChartSpec`] or `None` ("no result").

mod enhance;
mod error_detection;
mod salvage;

pub use error_detection::clean_error_message;

use crate::domain::chart::{ChartSpec, YAxis};
use serde::Serialize;
use serde_json::{Map, Value};

/// One way of turning raw response text into a chart spec
pub trait ParseStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn attempt(&self, text: &str) -> Option<ChartSpec>;
}

/// Error-shaped text always wins over any chart that could be salvaged from it
pub struct ErrorDetection;

impl ParseStrategy for ErrorDetection {
    fn name(&self) -> &'static str {
        "error_detection"
    }

    fn attempt(&self, text: &str) -> Option<ChartSpec> {
        error_detection::detect_error(text)
    }
}

/// JSON parse after dropping every record that does not parse on its own
pub struct ReassembledJson;

impl ParseStrategy for ReassembledJson {
    fn name(&self) -> &'static str {
        "reassembled_json"
    }

    fn attempt(&self, text: &str) -> Option<ChartSpec> {
        let document = salvage::reassemble(text)?;
        if document.get("status").and_then(Value::as_str) != Some("success") {
            return None;
        }
        enhance::enhance(&document).map(ChartSpec::Success)
    }
}

/// Regex extraction of chart type and rows when the document will not parse
pub struct PatternExtraction;

impl ParseStrategy for PatternExtraction {
    fn name(&self) -> &'static str {
        "pattern_extraction"
    }

    fn attempt(&self, text: &str) -> Option<ChartSpec> {
        let chart_type = salvage::extract_chart_type(text)?;
        let records = salvage::extract_records(text, chart_type);
        if records.is_empty() {
            tracing::warn!("Could not extract data records from response");
            return None;
        }

        let mut document = Map::new();
        document.insert("status".to_string(), Value::from("success"));
        document.insert("chart_type".to_string(), Value::from(chart_type.as_str()));
        document.insert(
            "data".to_string(),
            Value::Array(records.into_iter().map(Value::Object).collect()),
        );
        enhance::enhance(&document).map(ChartSpec::Success)
    }
}

pub struct TolerantParser {
    strategies: Vec<Box<dyn ParseStrategy>>,
}

impl Default for TolerantParser {
    fn default() -> Self {
        Self {
            strategies: vec![
                Box::new(ErrorDetection),
                Box::new(ReassembledJson),
                Box::new(PatternExtraction),
            ],
        }
    }
}

impl TolerantParser {
    pub fn new(strategies: Vec<Box<dyn ParseStrategy>>) -> Self {
        Self { strategies }
    }

    /// Run the strategy chain; `None` means no usable chart could be recovered
    pub fn parse(&self, text: &str) -> Option<ChartSpec> {
        for strategy in &self.strategies {
            if let Some(spec) = strategy.attempt(text) {
                tracing::info!("Response parsed by {} strategy", strategy.name());
                tracing::debug!("Parsing stats: {:?}", ParseStats::collect(text, Some(&spec)));
                return Some(spec);
            }
            tracing::debug!("{} strategy did not apply", strategy.name());
        }

        tracing::warn!("No parsing strategy produced a chart ({} bytes)", text.len());
        None
    }
}

/// Diagnostics about one parse call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseStats {
    pub original_length: usize,
    pub parsing_successful: bool,
    pub records_extracted: usize,
    pub chart_type: String,
    pub truncated_response: bool,
    pub data_columns: Vec<String>,
    pub x_column: Option<String>,
    pub y_columns: Vec<String>,
}

impl ParseStats {
    pub fn collect(original: &str, parsed: Option<&ChartSpec>) -> Self {
        let chart = parsed.and_then(ChartSpec::as_success);
        Self {
            original_length: original.len(),
            parsing_successful: parsed.is_some(),
            records_extracted: chart.map(|c| c.data.len()).unwrap_or(0),
            chart_type: chart
                .map(|c| c.chart_type.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            truncated_response: !original.trim_end().ends_with('}'),
            data_columns: chart
                .map(|c| c.columns().into_iter().map(str::to_string).collect())
                .unwrap_or_default(),
            x_column: chart.map(|c| c.x.clone()),
            y_columns: chart
                .map(|c| match &c.y {
                    YAxis::Column(col) => vec![col.clone()],
                    YAxis::Columns(cols) => cols.clone(),
                })
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chart::{ChartType, ErrorKind};

    const TRUNCATED_SCATTER: &str = r#"{"status":"success","chart_type":"scatter","data":[{"Open":551.0,"Close":545.45,"Date":"2016-05-31"},{"Open":547.2,"Close":550.15,"Date":"2016-05-30"},{"Open":543.15,"Close":545.4,"Date":"2016-05-27"}"#;

    #[test]
    fn test_truncated_scatter_is_recovered() {
        let spec = TolerantParser::default().parse(TRUNCATED_SCATTER).unwrap();
        let chart = spec.as_success().expect("success spec");
        assert_eq!(chart.chart_type, ChartType::Scatter);
        assert_eq!(chart.data.len(), 3);
        assert_eq!(chart.data_count, 3);
        assert_eq!(chart.x, "Date");
        assert_eq!(chart.y, YAxis::Columns(vec!["Open".into(), "Close".into()]));
    }

    #[test]
    fn test_error_takes_precedence_over_data() {
        let text = r#"{"status": "success", "chart_type": "line", "error": "[TABLE_OR_VIEW_NOT_FOUND] The table `tcs_stock` cannot be found. SQLSTATE: 42P01", "data": [{"Date": "2018-01-01", "Close": 1.0}]}"#;
        match TolerantParser::default().parse(text).unwrap() {
            ChartSpec::Error(failure) => {
                assert!(!failure.error.contains("SQLSTATE"));
                assert_eq!(failure.error_type, ErrorKind::Database);
            }
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_is_byte_stable() {
        let text = r#"{"status": "success", "chart_type": "bar", "data": [{"region": "EU", "sales": 12}, {"region": "US", "sales": 30}], "x": "region", "y": "sales"}"#;
        let parser = TolerantParser::default();
        let first = serde_json::to_string(&parser.parse(text).unwrap()).unwrap();
        let second = serde_json::to_string(&parser.parse(text).unwrap()).unwrap();
        assert_eq!(first, second);
        assert!(first.starts_with(r#"{"status":"success","chart_type":"bar","data":[{"region":"EU","sales":12}"#));
    }

    #[test]
    fn test_only_invalid_fragments_yield_no_result() {
        let text = r#"{"status": "success", "chart_type": "bar", "data": [{"a": }, {bad json}, {"b" 2}]}"#;
        assert!(TolerantParser::default().parse(text).is_none());
    }

    #[test]
    fn test_pattern_fallback_when_preamble_is_broken() {
        let text = r#"{"status": "success", "chart_type": "line", "title": "unterminated, "data": [{"Date": "2018-01-01", "Close": 10.5}, {"Date": "2018-01-02", "Close": 11.25}"#;
        let spec = TolerantParser::default().parse(text).unwrap();
        let chart = spec.as_success().unwrap();
        assert_eq!(chart.chart_type, ChartType::Line);
        assert_eq!(chart.data_count, 2);
        assert_eq!(chart.x, "Date");
        assert_eq!(chart.y, YAxis::Columns(vec!["Close".into()]));
    }

    #[test]
    fn test_text_only_rows_still_get_a_y_column() {
        let text = r#"{"status":"success","chart_type":"line","data":[{"Date":"2018-01-01","label":"a"},{"Date":"2018-01-02","label":"b"}]}"#;
        let spec = TolerantParser::default().parse(text).unwrap();
        let chart = spec.as_success().unwrap();
        assert!(!chart.y.columns().is_empty());
        assert!(chart.data.iter().all(|r| chart.y.columns().iter().all(|c| r.contains_key(*c))));
    }

    #[test]
    fn test_unsupported_chart_type_is_no_result() {
        let text = r#"{"status": "success", "chart_type": "radar", "data": [{"axis": "a", "v": 1}]}"#;
        assert!(TolerantParser::default().parse(text).is_none());
    }

    #[test]
    fn test_chart_type_inferred_when_missing() {
        let text = r#"{"status": "success", "data": [{"Date": "d1", "Open": 1, "High": 3, "Low": 0.5, "Close": 2}]}"#;
        let spec = TolerantParser::default().parse(text).unwrap();
        let chart = spec.as_success().unwrap();
        assert_eq!(chart.chart_type, ChartType::Candlestick);
        assert_eq!(chart.y, YAxis::ohlc());
    }

    #[test]
    fn test_custom_strategy_chain() {
        let parser = TolerantParser::new(vec![Box::new(PatternExtraction)]);
        // Without error detection in the chain the rows are salvaged
        let text = r#"{"status": "success", "chart_type": "pie", "note": "Exception", "data": [{"slice": "a", "share": 3}]"#;
        let spec = parser.parse(text).unwrap();
        assert_eq!(spec.as_success().unwrap().chart_type, ChartType::Pie);
        assert!(TolerantParser::default().parse(text).unwrap().as_success().is_none());
    }

    #[test]
    fn test_stats_for_truncated_input() {
        let parser = TolerantParser::default();
        let spec = parser.parse(TRUNCATED_SCATTER);
        let stats = ParseStats::collect(TRUNCATED_SCATTER, spec.as_ref());
        assert!(stats.parsing_successful);
        assert_eq!(stats.records_extracted, 3);
        assert_eq!(stats.chart_type, "scatter");
        assert_eq!(stats.data_columns, vec!["Open", "Close", "Date"]);
        assert_eq!(stats.y_columns, vec!["Open", "Close"]);

        let empty = ParseStats::collect("not json", None);
        assert!(!empty.parsing_successful);
        assert!(empty.truncated_response);
        assert_eq!(empty.chart_type, "unknown");
    }
}
