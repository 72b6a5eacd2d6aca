// Profile summary - Completeness, uniqueness and an overall quality score for a profiled table
use crate::domain::profile::{ColumnProfile, ProfileDocument, Severity, TableProfile};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnQuality {
    pub column: String,
    pub data_type: String,
    /// Percent of non-null values
    pub completeness: f64,
    /// Distinct values as a percent of table rows
    pub uniqueness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedColumn {
    pub column: String,
    pub error: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QualityCategory {
    Excellent,
    Good,
    Fair,
    Poor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityScore {
    pub score: f64,
    pub category: QualityCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileSummary {
    pub table_name: String,
    pub row_count: u64,
    pub total_columns: usize,
    pub columns: Vec<ColumnQuality>,
    pub failed_columns: Vec<FailedColumn>,
    pub data_types: BTreeMap<String, usize>,
    pub anomalies: Vec<String>,
    pub quality: QualityScore,
    pub recommendations: Vec<String>,
}

/// Summarize a `{"profile": ..}` object; `None` when it does not decode as a profile
pub fn from_document(document: &Map<String, Value>) -> Option<ProfileSummary> {
    match serde_json::from_value::<ProfileDocument>(Value::Object(document.clone())) {
        Ok(document) => Some(summarize(&document.profile)),
        Err(e) => {
            tracing::warn!("Profile response did not decode: {}", e);
            None
        }
    }
}

pub fn summarize(profile: &TableProfile) -> ProfileSummary {
    let mut columns = Vec::new();
    let mut failed_columns = Vec::new();
    let mut data_types = BTreeMap::new();

    for (name, entry) in profile.columns() {
        match entry {
            ColumnProfile::Stats(stats) => {
                *data_types.entry(stats.data_type.clone()).or_insert(0) += 1;
                let uniqueness = if profile.row_count > 0 {
                    stats.distinct_count as f64 / profile.row_count as f64 * 100.0
                } else {
                    0.0
                };
                columns.push(ColumnQuality {
                    column: name.to_string(),
                    data_type: stats.data_type,
                    completeness: 100.0 - stats.null_percentage,
                    uniqueness,
                });
            }
            ColumnProfile::Failed { error } => failed_columns.push(FailedColumn {
                column: name.to_string(),
                error,
            }),
        }
    }

    let severities: Vec<Severity> = profile.anomalies.iter().map(Severity::of).collect();
    let quality = quality_score(&columns, &severities);
    let recommendations = recommendations(&columns, &severities);

    tracing::info!(
        "Profiled {}: {} columns, quality {:.1}",
        profile.table_name,
        profile.column_profiles.len(),
        quality.score
    );

    ProfileSummary {
        table_name: profile.table_name.clone(),
        row_count: profile.row_count,
        total_columns: profile.column_profiles.len(),
        columns,
        failed_columns,
        data_types,
        anomalies: profile.anomalies.iter().map(anomaly_text).collect(),
        quality,
        recommendations,
    }
}

/// 100 minus deductions for anomalies (by severity) and for columns with many nulls
pub fn quality_score(columns: &[ColumnQuality], anomalies: &[Severity]) -> QualityScore {
    let anomaly_deductions: f64 = anomalies
        .iter()
        .map(|severity| match severity {
            Severity::High => 20.0,
            Severity::Medium => 10.0,
            Severity::Low => 5.0,
        })
        .sum();

    let null_deductions: f64 = columns
        .iter()
        .map(|c| match 100.0 - c.completeness {
            missing if missing > 50.0 => 15.0,
            missing if missing > 20.0 => 10.0,
            missing if missing > 10.0 => 5.0,
            _ => 0.0,
        })
        .sum();

    let score = (100.0 - anomaly_deductions - null_deductions).max(0.0);
    let category = match score {
        s if s >= 90.0 => QualityCategory::Excellent,
        s if s >= 75.0 => QualityCategory::Good,
        s if s >= 60.0 => QualityCategory::Fair,
        _ => QualityCategory::Poor,
    };

    QualityScore {
        score: (score * 10.0).round() / 10.0,
        category,
    }
}

pub fn recommendations(columns: &[ColumnQuality], anomalies: &[Severity]) -> Vec<String> {
    let mut recommendations = Vec::new();

    let high = anomalies.iter().filter(|s| **s == Severity::High).count();
    if high > 0 {
        recommendations.push(format!(
            "High Priority: Address {} critical data quality issues immediately.",
            high
        ));
    }

    let high_missing = columns.iter().filter(|c| 100.0 - c.completeness > 20.0).count();
    if high_missing > 0 {
        recommendations.push(format!(
            "Missing Data: Investigate high missing value rates in {} columns.",
            high_missing
        ));
    }

    if anomalies.is_empty() {
        recommendations
            .push("Great Job: Your data quality is excellent! Continue monitoring regularly.".to_string());
    } else {
        recommendations
            .push("Regular Monitoring: Set up automated quality checks to catch issues early.".to_string());
    }
    recommendations
}

fn anomaly_text(anomaly: &Value) -> String {
    match anomaly {
        Value::String(s) => s.clone(),
        Value::Object(map) => ["message", "description", "issue"]
            .iter()
            .find_map(|field| map.get(*field).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| anomaly.to_string()),
        other => other.to_string(),
    }
}
