use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub api: ApiSettings,
    pub flows: FlowsConfig,
    pub keywords: KeywordConfig,
    pub sessions: SessionSettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub token: String,
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://localhost/chatservice/chat".to_string(),
            token: String::new(),
            timeout_secs: 60,
        }
    }
}

/// Limits for the in-memory chat session store
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SessionSettings {
    pub max_sessions: usize,
    pub idle_ttl_secs: u64,
    pub max_history: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_sessions: 1000,
            idle_ttl_secs: 3600,
            max_history: 50,
        }
    }
}

/// A named backend pipeline
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct FlowConfig {
    pub space_name: String,
    pub flow_id: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct FlowsConfig {
    /// Plain question answering
    pub general: FlowConfig,
    /// Chart and table JSON generation
    pub chart: FlowConfig,
}

/// Ordered keyword lists used by the query router
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct KeywordConfig {
    pub dashboard: Vec<String>,
    pub chart: Vec<String>,
    pub table: Vec<String>,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            dashboard: to_strings(&[
                "dashboard",
                "live dashboard",
                "create dashboard",
                "build dashboard",
                "dashboard with",
                "interactive dashboard",
                "real-time dashboard",
            ]),
            chart: to_strings(&[
                "chart",
                "plot",
                "graph",
                "visualize",
                "visualization",
                "bar chart",
                "line chart",
                "pie chart",
                "scatter plot",
                "histogram",
                "heatmap",
                "candlestick",
                "stacked bar",
                "create chart",
                "show chart",
                "generate chart",
                "plot data",
                "visualize data",
            ]),
            table: to_strings(&[
                "table",
                "raw data",
                "show data",
                "view data",
                "display data",
                "data table",
                "show table",
                "preview data",
                "sample data",
                "first rows",
                "head",
                "limit",
                "select",
                "query",
                "sql",
                "dataframe",
                "dataset",
            ]),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Load `config/app.*` (optional) overlaid with `CHAT_ANALYTICS__*` environment variables
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/app").required(false))
        .add_source(
            config::Environment::with_prefix("CHAT_ANALYTICS")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    let app_config: AppConfig = settings.try_deserialize()?;
    if app_config.api.token.is_empty() {
        tracing::warn!("No API token configured; backend calls will be rejected");
    }
    Ok(app_config)
}
