//! Record salvage from truncated or malformed chart payloads.
//!
//! Two independent recovery paths live here:
//!
//! * [`reassemble`] walks the `"data": [` array with a string-aware brace
//!   scanner, keeps every object that parses on its own and rebuilds the
//!   surrounding document around them.
//! * [`extract_records`] is the regex path used when the document itself is
//!   beyond repair: it pulls record-shaped substrings out of the raw text and
//!   validates each against the chart type's required fields.

use crate::domain::chart::{ChartType, Record};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Number, Value};

static DATA_ARRAY_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""data"\s*:\s*\["#).expect("data marker pattern"));
static STATUS_SUCCESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""status"\s*:\s*"success""#).expect("status pattern"));
static CHART_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""chart_type"\s*:\s*"([^"]+)""#).expect("chart type pattern"));
// One level of nesting is enough for flat chart rows.
static RECORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[^{}]*(?:\{[^{}]*\}[^{}]*)*\}").expect("record pattern"));
static DATE_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""Date"\s*:\s*"([^"]+)""#).expect("date field pattern"));
static NUMERIC_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""(\w+)"\s*:\s*(-?\d+(?:\.\d+)?)"#).expect("numeric field pattern"));

/// Objects found inside a JSON array, plus whatever followed its closing bracket
#[derive(Debug, Default)]
struct ArrayScan<'a> {
    objects: Vec<&'a str>,
    tail: Option<&'a str>,
}

/// Rebuild a chart document keeping only the records that parse individually.
///
/// Returns `None` when nothing parseable can be produced.
pub fn reassemble(text: &str) -> Option<Map<String, Value>> {
    let trimmed = text.trim();
    let Some(marker) = DATA_ARRAY_START.find(trimmed) else {
        return parse_leading_object(from_first_brace(trimmed));
    };

    let scan = scan_array(&trimmed[marker.end()..]);
    let complete: Vec<&str> = scan
        .objects
        .into_iter()
        .filter(|candidate| match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(_)) => true,
            _ => {
                tracing::debug!("Skipping incomplete record: {}", preview(candidate));
                false
            }
        })
        .collect();

    if complete.is_empty() {
        return parse_leading_object(from_first_brace(trimmed));
    }

    let preamble = from_first_brace(&trimmed[..marker.start()]);
    let preamble = if preamble.is_empty() { "{" } else { preamble };
    let base = format!("{}\"data\": [{}]", preamble, complete.join(", "));

    let rebuilt = scan
        .tail
        .and_then(|tail| parse_leading_object(&format!("{}{}", base, tail)))
        .or_else(|| parse_leading_object(&format!("{}}}", base)));

    if rebuilt.is_some() {
        tracing::info!(
            "Cleaned response: kept {} complete records",
            complete.len()
        );
    }
    rebuilt
}

/// Regex-based record recovery for documents that will not parse even after reassembly
pub fn extract_records(text: &str, chart_type: ChartType) -> Vec<Record> {
    let Some(marker) = DATA_ARRAY_START.find(text) else {
        return Vec::new();
    };
    let section = &text[marker.end()..];

    RECORD
        .find_iter(section)
        .filter_map(|m| {
            let candidate = m.as_str();
            match serde_json::from_str::<Value>(candidate) {
                Ok(Value::Object(record)) => Some(record),
                Ok(_) => None,
                Err(_) => extract_fields_manually(candidate),
            }
        })
        .filter(|record| has_required_fields(record, chart_type))
        .collect()
}

/// `Some(chart_type)` when the text claims success and names a supported chart type
pub fn extract_chart_type(text: &str) -> Option<ChartType> {
    if !STATUS_SUCCESS.is_match(text) {
        return None;
    }
    let label = CHART_TYPE.captures(text)?.get(1)?.as_str();
    match label.parse::<ChartType>() {
        Ok(chart_type) => Some(chart_type),
        Err(e) => {
            tracing::warn!("{}", e);
            None
        }
    }
}

/// Last resort for a record that is not valid JSON: a `Date` string plus numeric pairs
fn extract_fields_manually(candidate: &str) -> Option<Record> {
    let mut record = Record::new();

    if let Some(date) = DATE_FIELD.captures(candidate).and_then(|c| c.get(1)) {
        record.insert("Date".to_string(), Value::String(date.as_str().to_string()));
    }

    for caps in NUMERIC_FIELD.captures_iter(candidate) {
        let (name, raw) = (&caps[1], &caps[2]);
        if name == "Date" {
            continue;
        }
        let number = raw.parse::<f64>().ok().and_then(Number::from_f64);
        if let Some(number) = number {
            record.insert(name.to_string(), Value::Number(number));
        }
    }

    (record.len() > 1).then_some(record)
}

fn has_required_fields(record: &Record, chart_type: ChartType) -> bool {
    chart_type
        .required_fields()
        .iter()
        .all(|field| record.contains_key(*field))
}

/// Walk array elements after `[`, collecting balanced `{...}` spans until `]` or end of input
fn scan_array(section: &str) -> ArrayScan<'_> {
    let bytes = section.as_bytes();
    let mut scan = ArrayScan::default();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' => match balanced_object_end(bytes, i) {
                Some(end) => {
                    scan.objects.push(&section[i..=end]);
                    i = end + 1;
                }
                // Cut off mid-record
                None => break,
            },
            b']' => {
                scan.tail = Some(&section[i + 1..]);
                break;
            }
            _ => i += 1,
        }
    }

    scan
}

/// Index of the `}` closing the object opened at `start`, honoring string literals
fn balanced_object_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse the first JSON object in `text`, ignoring anything after it
fn parse_leading_object(text: &str) -> Option<Map<String, Value>> {
    let mut stream = serde_json::Deserializer::from_str(text).into_iter::<Value>();
    match stream.next() {
        Some(Ok(Value::Object(map))) => Some(map),
        _ => None,
    }
}

fn from_first_brace(text: &str) -> &str {
    text.find('{').map(|pos| &text[pos..]).unwrap_or("")
}

fn preview(text: &str) -> String {
    text.chars().take(50).collect()
}
