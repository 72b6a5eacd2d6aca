// Derive chart requests from a natural-language dashboard query
use crate::domain::chart::ChartType;
use crate::domain::dashboard::ChartRequest;
use once_cell::sync::Lazy;
use regex::Regex;

static SEGMENT_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]\s*(?:and\s+)?|\s+and\s+").expect("segment split pattern"));
static LEADING_PREPOSITION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:for|of|showing|with)\s+").expect("preposition pattern"));

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("chart request pattern"))
        .collect()
}

static CHART_PATTERNS: Lazy<Vec<(ChartType, Vec<Regex>)>> = Lazy::new(|| {
    vec![
        (
            ChartType::Bar,
            compile(&[
                r"bar chart.+?(?:for|of|showing|with)\s+(.+?)\s*$",
                r"bar chart.+?(.+?)\s*$",
                r"top\s+\d*\s*customers?\s+by\s+spend",
                r"customers?\s+by\s+(?:total\s+)?spend",
            ]),
        ),
        (
            ChartType::Pie,
            compile(&[
                r"pie chart.+?(?:for|of|showing|with)\s+(.+?)\s*$",
                r"pie chart.+?(.+?)\s*$",
                r"product\s+categories?(?:\s+pie\s+chart)?",
                r"categories?\s+(?:pie\s+chart|distribution)",
            ]),
        ),
        (
            ChartType::Line,
            compile(&[
                r"line chart.+?(?:for|of|showing|with)\s+(.+?)\s*$",
                r"line chart.+?(.+?)\s*$",
            ]),
        ),
    ]
});

/// Split the query into segments and collect one chart request per matched chart type.
/// Falls back to the customer-spend and product-category presets when nothing matches.
pub fn plan_charts(query: &str) -> Vec<ChartRequest> {
    let query_lower = query.to_lowercase();
    let mut charts: Vec<ChartRequest> = Vec::new();

    for segment in SEGMENT_SPLIT.split(&query_lower) {
        let segment = segment.trim();
        if segment.chars().count() < 5 {
            continue;
        }

        for (chart_type, patterns) in CHART_PATTERNS.iter() {
            let Some(caps) = patterns.iter().find_map(|p| p.captures(segment)) else {
                continue;
            };

            let description = match caps.get(1) {
                Some(group) => group.as_str().trim().to_string(),
                None => preset_description(*chart_type, segment),
            };
            let description = LEADING_PREPOSITION.replace(&description, "").trim().to_string();

            if description.is_empty() {
                continue;
            }
            let duplicate = charts
                .iter()
                .any(|c| c.chart_type == *chart_type && c.description == description);
            if !duplicate {
                charts.push(ChartRequest::new(*chart_type, &description));
            }
        }
    }

    if charts.is_empty() {
        if query_lower.contains("customer") && query_lower.contains("spend") {
            charts.push(ChartRequest::new(ChartType::Bar, "top 10 customers by spend"));
        }
        if query_lower.contains("categor") && query_lower.contains("product") {
            charts.push(ChartRequest::new(ChartType::Pie, "product categories"));
        }
    }

    tracing::debug!("Planned {} dashboard charts", charts.len());
    charts
}

fn preset_description(chart_type: ChartType, segment: &str) -> String {
    match chart_type {
        ChartType::Bar if segment.contains("customer") && segment.contains("spend") => {
            "top 10 customers by spend".to_string()
        }
        ChartType::Pie if segment.contains("product") && segment.contains("categor") => {
            "product categories".to_string()
        }
        _ => segment
            .replace("chart", "")
            .replace(chart_type.as_str(), "")
            .trim()
            .to_string(),
    }
}
