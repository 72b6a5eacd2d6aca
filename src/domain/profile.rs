// Table profiling domain model
use serde::Deserialize;
use serde_json::{Map, Value};

/// `{"profile": {...}}` as returned by the profiling flow
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProfileDocument {
    pub profile: TableProfile,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TableProfile {
    #[serde(default)]
    pub table_name: String,
    #[serde(default)]
    pub row_count: u64,
    /// Column name -> stats object or `{"error": ..}`, in payload order
    pub column_profiles: Map<String, Value>,
    #[serde(default)]
    pub anomalies: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ColumnStats {
    pub data_type: String,
    #[serde(default)]
    pub non_null_count: u64,
    #[serde(default)]
    pub null_percentage: f64,
    #[serde(default)]
    pub distinct_count: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ColumnProfile {
    Failed { error: String },
    Stats(ColumnStats),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    /// Anomalies without a `severity` field count as medium
    pub fn of(anomaly: &Value) -> Self {
        match anomaly.get("severity").and_then(Value::as_str) {
            Some("High") => Severity::High,
            Some("Medium") | None => Severity::Medium,
            Some(_) => Severity::Low,
        }
    }
}

impl TableProfile {
    /// Columns whose entry is a recognizable stats or error object
    pub fn columns(&self) -> impl Iterator<Item = (&str, ColumnProfile)> + '_ {
        self.column_profiles.iter().filter_map(|(name, entry)| {
            serde_json::from_value::<ColumnProfile>(entry.clone())
                .ok()
                .map(|profile| (name.as_str(), profile))
        })
    }
}

/// `true` for `{"profile": {"column_profiles": ..}}`
pub fn is_profile_object(map: &Map<String, Value>) -> bool {
    map.get("profile")
        .and_then(Value::as_object)
        .is_some_and(|profile| profile.contains_key("column_profiles"))
}
