// Query router - Keyword-precedence intent classification
use crate::domain::intent::QueryIntent;
use crate::infrastructure::config::KeywordConfig;

#[derive(Debug, Clone)]
pub struct QueryRouter {
    // Checked in order; dashboard requests often also mention "chart".
    rules: Vec<(QueryIntent, &'static str, Vec<String>)>,
}

impl QueryRouter {
    pub fn new(keywords: &KeywordConfig) -> Self {
        let lower = |list: &[String]| list.iter().map(|k| k.to_lowercase()).collect::<Vec<_>>();
        Self {
            rules: vec![
                (QueryIntent::Dashboard, "DASHBOARD", lower(&keywords.dashboard)),
                (QueryIntent::ChartTable, "CHART", lower(&keywords.chart)),
                (QueryIntent::ChartTable, "TABLE", lower(&keywords.table)),
            ],
        }
    }

    /// Classify a free-text query. Never fails: no match means `General`.
    pub fn classify(&self, query: &str) -> QueryIntent {
        let query_lower = query.to_lowercase();

        for (intent, label, keywords) in &self.rules {
            if let Some(keyword) = keywords.iter().find(|k| query_lower.contains(k.as_str())) {
                tracing::info!("Query classified as {} based on keyword: {}", label, keyword);
                return *intent;
            }
        }

        tracing::info!("Query classified as GENERAL - no routing keyword matched");
        QueryIntent::General
    }
}

impl Default for QueryRouter {
    fn default() -> Self {
        Self::new(&KeywordConfig::default())
    }
}
