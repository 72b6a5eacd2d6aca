// Chat service - Route a query, call the backend and turn the reply into text and charts
use crate::application::chart_columns::{resolve_columns, ResolvedColumns};
use crate::application::chat_backend::ChatBackend;
use crate::application::dashboard_service::{DashboardError, DashboardService};
use crate::application::profile_summary::{self, ProfileSummary};
use crate::application::query_router::QueryRouter;
use crate::application::reply_formatter;
use crate::application::response_parser::TolerantParser;
use crate::domain::chart::{ChartData, ChartSpec};
use crate::domain::dashboard::{ChartRequest, DashboardRegistryEntry};
use crate::domain::intent::QueryIntent;
use crate::domain::response::BackendResponse;
use crate::domain::session::ChatSession;
use crate::infrastructure::config::FlowsConfig;
use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// A chart ready for a renderer
#[derive(Debug, Clone, Serialize)]
pub struct ChartView {
    pub title: String,
    #[serde(flatten)]
    pub columns: ResolvedColumns,
    pub chart: ChartData,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub intent: QueryIntent,
    pub text: String,
    pub charts: Vec<ChartView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashboard: Option<DashboardRegistryEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfileSummary>,
}

impl ChatReply {
    fn text_only(intent: QueryIntent, text: String) -> Self {
        Self {
            intent,
            text,
            charts: Vec::new(),
            dashboard: None,
            profile: None,
        }
    }
}

#[derive(Clone)]
pub struct ChatService {
    backend: Arc<dyn ChatBackend>,
    dashboards: DashboardService,
    router: Arc<QueryRouter>,
    parser: Arc<TolerantParser>,
    flows: FlowsConfig,
}

impl ChatService {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        dashboards: DashboardService,
        router: QueryRouter,
        flows: FlowsConfig,
    ) -> Self {
        Self {
            backend,
            dashboards,
            router: Arc::new(router),
            parser: Arc::new(TolerantParser::default()),
            flows,
        }
    }

    pub fn parser(&self) -> &TolerantParser {
        &self.parser
    }

    /// Answer one query within a session. Transport failures are returned as errors.
    pub async fn handle(&self, session: &mut ChatSession, query: &str) -> anyhow::Result<ChatReply> {
        let intent = self.router.classify(query);
        tracing::debug!("Session {} query routed to {}", session.id, intent);

        let reply = match intent {
            QueryIntent::Dashboard => self.create_dashboard(query).await?,
            QueryIntent::ChartTable | QueryIntent::General => self.ask(intent, query).await?,
        };

        session.record(query, intent, &reply.text);
        Ok(reply)
    }

    async fn ask(&self, intent: QueryIntent, query: &str) -> anyhow::Result<ChatReply> {
        let flow = match intent {
            QueryIntent::ChartTable => &self.flows.chart,
            _ => &self.flows.general,
        };
        let body = self.backend.send(flow, query).await?;
        let response = BackendResponse::classify(body.clone());
        tracing::debug!("Backend response classified as {}", response.kind());

        if let BackendResponse::Profile(document) = &response {
            if let Some(summary) = profile_summary::from_document(document) {
                return Ok(ChatReply {
                    text: reply_formatter::profile_text(&summary),
                    profile: Some(summary),
                    ..ChatReply::text_only(intent, String::new())
                });
            }
        }

        let specs = self.extract_specs(intent, response);
        let charts: Vec<ChartView> = specs.iter().filter_map(|spec| chart_view(spec, None)).collect();
        let failure = specs.iter().find_map(|spec| match spec {
            ChartSpec::Error(failure) => Some(failure),
            ChartSpec::Success(_) => None,
        });

        // A failed element only matters when nothing could be rendered
        let text = match (charts.first(), failure) {
            (Some(view), _) if charts.len() == 1 => reply_formatter::chart_summary(&view.chart),
            (Some(_), _) => format!("Generated {} charts.", charts.len()),
            (None, Some(failure)) => reply_formatter::error_text(&failure.error),
            (None, None) => reply_formatter::response_text(&body),
        };

        Ok(ChatReply {
            intent,
            text,
            charts,
            dashboard: None,
            profile: None,
        })
    }

    /// Extract chart specs from an already classified body.
    ///
    /// Free text is only run through the tolerant parser for chart/table
    /// queries; for general questions prose mentioning "Failed" is an answer,
    /// not an error. Error objects always go through it so the message is cleaned.
    fn extract_specs(&self, intent: QueryIntent, response: BackendResponse) -> Vec<ChartSpec> {
        match response {
            BackendResponse::Chart(map) | BackendResponse::Failure(map) => {
                self.parser.parse(&Value::Object(map).to_string()).into_iter().collect()
            }
            BackendResponse::Charts(charts) => charts
                .into_iter()
                .filter_map(|chart| match chart {
                    Value::Object(mut map) => {
                        map.entry("status").or_insert_with(|| Value::from("success"));
                        self.parser.parse(&Value::Object(map).to_string())
                    }
                    _ => None,
                })
                .collect(),
            BackendResponse::Embedded { text, .. } if intent == QueryIntent::ChartTable => {
                self.parser.parse(&text).into_iter().collect()
            }
            BackendResponse::Embedded { .. } | BackendResponse::Profile(_) | BackendResponse::Opaque(_) => {
                Vec::new()
            }
        }
    }

    async fn create_dashboard(&self, query: &str) -> anyhow::Result<ChatReply> {
        let entry = match self.dashboards.create_from_query(query).await {
            Ok(entry) => entry,
            Err(DashboardError::NoCharts) => {
                return Ok(ChatReply::text_only(
                    QueryIntent::Dashboard,
                    reply_formatter::error_text(&DashboardError::NoCharts.to_string()),
                ));
            }
            Err(DashboardError::Registry(e)) => return Err(e),
        };

        let fetches = entry.charts.iter().map(|request| self.fetch_chart(request));
        let charts: Vec<ChartView> = join_all(fetches).await.into_iter().flatten().collect();

        Ok(ChatReply {
            intent: QueryIntent::Dashboard,
            text: reply_formatter::dashboard_text(&entry, charts.len()),
            charts,
            dashboard: Some(entry),
            profile: None,
        })
    }

    /// Fetch one dashboard chart through the chart flow; failures only cost that chart
    async fn fetch_chart(&self, request: &ChartRequest) -> Option<ChartView> {
        let body = match self.backend.send(&self.flows.chart, &request.query).await {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("Error fetching dashboard chart {}: {:#}", request.title, e);
                return None;
            }
        };

        self.extract_specs(QueryIntent::ChartTable, BackendResponse::classify(body))
            .iter()
            .find_map(|spec| chart_view(spec, Some(&request.title)))
    }
}

fn chart_view(spec: &ChartSpec, title: Option<&str>) -> Option<ChartView> {
    let chart = spec.as_success()?;
    match resolve_columns(&chart.data, Some(chart.x.as_str()), Some(&chart.y)) {
        Ok(columns) => Some(ChartView {
            title: title
                .map(str::to_string)
                .unwrap_or_else(|| reply_formatter::chart_title(chart.chart_type, &columns.x, &columns.y)),
            columns,
            chart: chart.clone(),
        }),
        Err(e) => {
            tracing::warn!("Dropping {} chart: {}", chart.chart_type, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chart::ChartType;
    use crate::infrastructure::config::{FlowConfig, KeywordConfig};
    use crate::infrastructure::memory_registry::InMemoryRegistry;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Replies with a canned body per flow id and records every call
    struct FakeBackend {
        replies: Vec<(String, anyhow::Result<Value>)>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl FakeBackend {
        fn new(replies: Vec<(&str, anyhow::Result<Value>)>) -> Self {
            Self {
                replies: replies.into_iter().map(|(f, r)| (f.to_string(), r)).collect(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatBackend for FakeBackend {
        async fn send(&self, flow: &FlowConfig, query: &str) -> anyhow::Result<Value> {
            self.calls
                .lock()
                .unwrap()
                .push((flow.flow_id.clone(), query.to_string()));
            match self.replies.iter().find(|(id, _)| *id == flow.flow_id) {
                Some((_, Ok(body))) => Ok(body.clone()),
                Some((_, Err(e))) => Err(anyhow::anyhow!("{}", e)),
                None => anyhow::bail!("no reply configured for flow {}", flow.flow_id),
            }
        }
    }

    fn flows() -> FlowsConfig {
        FlowsConfig {
            general: FlowConfig {
                space_name: "General".to_string(),
                flow_id: "general".to_string(),
            },
            chart: FlowConfig {
                space_name: "Charts".to_string(),
                flow_id: "chart".to_string(),
            },
        }
    }

    fn service(backend: Arc<FakeBackend>) -> ChatService {
        let dashboards = DashboardService::new(Arc::new(InMemoryRegistry::default()));
        ChatService::new(backend, dashboards, QueryRouter::new(&KeywordConfig::default()), flows())
    }

    #[tokio::test]
    async fn test_general_question_returns_answer_text() {
        let backend = Arc::new(FakeBackend::new(vec![(
            "general",
            Ok(json!({"response": "Revenue grew 12% after the Failed launch was reverted."})),
        )]));
        let service = service(backend.clone());
        let mut session = ChatSession::with_history_limit("s1".to_string(), 10);

        let reply = service.handle(&mut session, "How did revenue change?").await.unwrap();

        assert_eq!(reply.intent, QueryIntent::General);
        assert!(reply.text.starts_with("Revenue grew 12%"));
        assert!(reply.charts.is_empty());
        assert_eq!(session.history.len(), 1);
        assert_eq!(backend.calls.lock().unwrap()[0].0, "general");
    }

    #[tokio::test]
    async fn test_truncated_chart_payload_is_rendered() {
        let embedded = r#"{"status":"success","chart_type":"scatter","data":[{"Open":551.0,"Close":545.45,"Date":"2016-05-31"},{"Open":547.2,"Close":550.15,"Date":"2016-05-30"},{"Open":543.15,"Cl"#;
        let backend = Arc::new(FakeBackend::new(vec![("chart", Ok(json!({"response": embedded})))]));
        let service = service(backend);
        let mut session = ChatSession::with_history_limit("s1".to_string(), 10);

        let reply = service
            .handle(&mut session, "Plot Wipro open vs close for May 2016")
            .await
            .unwrap();

        assert_eq!(reply.intent, QueryIntent::ChartTable);
        assert_eq!(reply.charts.len(), 1);
        let view = &reply.charts[0];
        assert_eq!(view.chart.chart_type, ChartType::Scatter);
        assert_eq!(view.chart.data_count, 2);
        assert_eq!(view.columns.x, "Date");
        assert_eq!(view.columns.y, "Open");
        assert_eq!(reply.text, "Generated scatter chart with 2 data points.");
    }

    #[tokio::test]
    async fn test_backend_error_payload_becomes_clean_message() {
        let backend = Arc::new(FakeBackend::new(vec![(
            "chart",
            Ok(json!({"response": "{\"error\": \"[TABLE_OR_VIEW_NOT_FOUND] The table `x` cannot be found. SQLSTATE: 42P01\"}"})),
        )]));
        let service = service(backend);
        let mut session = ChatSession::with_history_limit("s1".to_string(), 10);

        let reply = service.handle(&mut session, "show table of trades").await.unwrap();

        assert!(reply.text.starts_with("Error: "));
        assert!(!reply.text.contains("SQLSTATE"));
        assert!(reply.charts.is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_propagates_without_recording() {
        let backend = Arc::new(FakeBackend::new(vec![(
            "chart",
            Err(anyhow::anyhow!("Chat API request failed with status 503")),
        )]));
        let service = service(backend);
        let mut session = ChatSession::with_history_limit("s1".to_string(), 10);

        let err = service.handle(&mut session, "plot sales").await.unwrap_err();
        assert!(err.to_string().contains("503"));
        assert!(session.history.is_empty());
    }

    #[tokio::test]
    async fn test_dashboard_fetches_each_planned_chart() {
        let chart = json!({
            "status": "success",
            "chart_type": "bar",
            "data": [{"customer": "Acme", "spend": 120.5}, {"customer": "Globex", "spend": 98.0}],
            "x": "customer",
            "y": "spend"
        });
        let backend = Arc::new(FakeBackend::new(vec![("chart", Ok(chart))]));
        let service = service(backend.clone());
        let mut session = ChatSession::with_history_limit("s1".to_string(), 10);

        let reply = service
            .handle(
                &mut session,
                "Create a dashboard with a bar chart for top customers and a line chart for monthly sales",
            )
            .await
            .unwrap();

        let entry = reply.dashboard.expect("dashboard entry");
        assert_eq!(entry.charts.len(), 2);
        assert_eq!(reply.charts.len(), 2);
        assert_eq!(reply.charts[0].title, "Bar Chart: Top Customers");
        assert_eq!(backend.calls.lock().unwrap().len(), 2);
        assert!(reply.text.contains("2 requested, 2 rendered"));
    }

    #[tokio::test]
    async fn test_dashboard_without_chart_requests() {
        let backend = Arc::new(FakeBackend::new(vec![]));
        let service = service(backend.clone());
        let mut session = ChatSession::with_history_limit("s1".to_string(), 10);

        let reply = service.handle(&mut session, "build dashboard").await.unwrap();

        assert_eq!(reply.intent, QueryIntent::Dashboard);
        assert_eq!(reply.text, "Error: Could not parse dashboard requirements from query");
        assert!(backend.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_multiple_embedded_charts() {
        let inner = json!({"charts": [
            {"chart_type": "pie", "data": [{"category": "Toys", "count": 4}]},
            {"chart_type": "bar", "data": [{"month": "Jan", "sales": 10}]}
        ]})
        .to_string();
        let backend = Arc::new(FakeBackend::new(vec![("chart", Ok(json!({"message": inner})))]));
        let service = service(backend);
        let mut session = ChatSession::with_history_limit("s1".to_string(), 10);

        let reply = service.handle(&mut session, "visualize categories and sales").await.unwrap();

        assert_eq!(reply.charts.len(), 2);
        assert_eq!(reply.charts[0].title, "Distribution of Count");
        assert_eq!(reply.text, "Generated 2 charts.");
    }

    #[tokio::test]
    async fn test_top_level_error_object_is_cleaned_for_every_intent() {
        let error = json!({
            "status": "error",
            "error": "[TABLE_OR_VIEW_NOT_FOUND] The table `tcs_stock` cannot be found. SQLSTATE: 42P01"
        });
        let backend = Arc::new(FakeBackend::new(vec![
            ("chart", Ok(error.clone())),
            ("general", Ok(error)),
        ]));
        let service = service(backend);
        let mut session = ChatSession::with_history_limit("s1".to_string(), 10);

        let chart = service.handle(&mut session, "plot TCS close prices").await.unwrap();
        let general = service.handle(&mut session, "who is the ceo").await.unwrap();

        assert_eq!(chart.intent, QueryIntent::ChartTable);
        assert_eq!(general.intent, QueryIntent::General);
        for reply in [chart, general] {
            assert_eq!(reply.text, "Error: Requested data table not found in database.");
            assert!(!reply.text.contains("SQLSTATE"));
        }
    }

    #[tokio::test]
    async fn test_failed_chart_does_not_hide_rendered_ones() {
        let inner = json!({"charts": [
            {"chart_type": "line", "error": "Failed to run query"},
            {"chart_type": "pie", "data": [{"category": "Toys", "count": 4}]}
        ]})
        .to_string();
        let backend = Arc::new(FakeBackend::new(vec![("chart", Ok(json!({"response": inner})))]));
        let service = service(backend);
        let mut session = ChatSession::with_history_limit("s1".to_string(), 10);

        let reply = service.handle(&mut session, "visualize categories").await.unwrap();

        assert_eq!(reply.charts.len(), 1);
        assert_eq!(reply.charts[0].chart.chart_type, ChartType::Pie);
        assert_eq!(reply.text, "Generated pie chart with 1 data points.");
    }

    #[tokio::test]
    async fn test_profile_response_is_summarized() {
        let profile = json!({
            "profile": {
                "table_name": "customers",
                "row_count": 10,
                "column_profiles": {
                    "id": {"data_type": "bigint", "non_null_count": 10, "null_percentage": 0.0, "distinct_count": 10}
                },
                "anomalies": []
            }
        });
        let backend = Arc::new(FakeBackend::new(vec![(
            "general",
            Ok(json!({"response": profile.to_string()})),
        )]));
        let service = service(backend);
        let mut session = ChatSession::with_history_limit("s1".to_string(), 10);

        let reply = service.handle(&mut session, "profile the customers").await.unwrap();

        let summary = reply.profile.expect("profile summary");
        assert_eq!(summary.table_name, "customers");
        assert_eq!(summary.quality.score, 100.0);
        assert!(reply.text.starts_with("Profile of customers: 10 rows, 1 columns"));
        assert!(reply.charts.is_empty());
    }
}
