// Backend trait for the hosted chat API
use crate::infrastructure::config::FlowConfig;
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send a query to one flow and return the decoded JSON body.
    /// Non-success HTTP statuses and connection failures are errors.
    async fn send(&self, flow: &FlowConfig, query: &str) -> anyhow::Result<Value>;
}
