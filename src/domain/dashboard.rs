// Dashboard domain model
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::chart::ChartType;

/// A chart the dashboard should show, expressed as a query for the chart flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRequest {
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub title: String,
    pub description: String,
    pub query: String,
}

impl ChartRequest {
    pub fn new(chart_type: ChartType, description: &str) -> Self {
        Self {
            chart_type,
            title: format!("{} Chart: {}", capitalize(chart_type.as_str()), title_case(description)),
            description: description.to_string(),
            query: format!("Create a {} chart for {}", chart_type, description),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardRegistryEntry {
    pub title: String,
    pub dashboard_id: String,
    pub created: DateTime<Utc>,
    pub charts: Vec<ChartRequest>,
    pub page_reference: String,
}

impl DashboardRegistryEntry {
    pub fn new(title: String, charts: Vec<ChartRequest>, created: DateTime<Utc>) -> Self {
        let stamp = created.format("%Y%m%d_%H%M%S").to_string();
        let page_reference = format!("dashboard_{}_{}", clean_page_name(&title), stamp);
        Self {
            title,
            dashboard_id: format!("dash_{}", stamp),
            created,
            charts,
            page_reference,
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}

pub(crate) fn title_case(text: &str) -> String {
    text.split_whitespace().map(capitalize).collect::<Vec<_>>().join(" ")
}

/// Lower-cased, whitespace collapsed to `_`, path-hostile characters removed
fn clean_page_name(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join("_").to_lowercase()
}
