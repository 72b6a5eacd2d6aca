// HTTP client for the hosted chat API
use crate::application::chat_backend::ChatBackend;
use crate::infrastructure::config::{ApiSettings, FlowConfig};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    query: &'a str,
    space_name: &'a str,
    #[serde(rename = "flowId")]
    flow_id: &'a str,
}

#[derive(Debug, Clone)]
pub struct ChatApiClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl ChatApiClient {
    pub fn new(settings: &ApiSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to build chat API HTTP client")?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            token: settings.token.clone(),
        })
    }
}

#[async_trait]
impl ChatBackend for ChatApiClient {
    async fn send(&self, flow: &FlowConfig, query: &str) -> Result<Value> {
        let preview: String = query.chars().take(100).collect();
        tracing::info!("Sending to flow {}: {}", flow.space_name, preview);

        let request = ChatRequest {
            query,
            space_name: &flow.space_name,
            flow_id: &flow.flow_id,
        };

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to chat API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Chat API request failed with status {}: {}", status, body);
        }

        let body = response
            .text()
            .await
            .context("Failed to read chat API response")?;

        // Some flows answer with plain text instead of a JSON document
        let value = serde_json::from_str(&body).unwrap_or(Value::String(body));
        tracing::debug!("Chat API request to {} successful", flow.space_name);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use serde_json::json;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/chat", addr)
    }

    fn client(base_url: String) -> ChatApiClient {
        ChatApiClient::new(&ApiSettings {
            base_url,
            token: "secret".to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    fn flow() -> FlowConfig {
        FlowConfig {
            space_name: "Json_Generator".to_string(),
            flow_id: "flow-1".to_string(),
        }
    }

    #[test]
    fn test_request_body_uses_flow_id_key() {
        let request = ChatRequest {
            query: "plot sales",
            space_name: "Json_Generator",
            flow_id: "flow-1",
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"query": "plot sales", "space_name": "Json_Generator", "flowId": "flow-1"})
        );
    }

    #[tokio::test]
    async fn test_send_posts_query_with_bearer_token() {
        let router = Router::new().route(
            "/chat",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Json(json!({"response": body["query"], "auth": auth, "flow": body["flowId"]}))
            }),
        );
        let url = serve(router).await;

        let body = client(url).send(&flow(), "top customers").await.unwrap();

        assert_eq!(body["response"], "top customers");
        assert_eq!(body["auth"], "Bearer secret");
        assert_eq!(body["flow"], "flow-1");
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let router = Router::new().route(
            "/chat",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "busy") }),
        );
        let url = serve(router).await;

        let err = client(url).send(&flow(), "hello").await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_plain_text_body_is_wrapped() {
        let router = Router::new().route("/chat", post(|| async { "just words" }));
        let url = serve(router).await;

        let body = client(url).send(&flow(), "hello").await.unwrap();
        assert_eq!(body, Value::String("just words".to_string()));
    }
}
