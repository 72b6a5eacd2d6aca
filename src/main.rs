// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use anyhow::Context;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::chat_service::ChatService;
use crate::application::dashboard_service::DashboardService;
use crate::application::query_router::QueryRouter;
use crate::infrastructure::chat_api_client::ChatApiClient;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::memory_registry::InMemoryRegistry;
use crate::presentation::app_state::{AppState, SessionStore};
use crate::presentation::handlers::{
    chat, clear_dashboards, dashboard_stats, delete_dashboard, get_session, health_check,
    list_dashboards, parse_response,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_app_config()?;

    // Create adapters (infrastructure layer)
    let backend = Arc::new(ChatApiClient::new(&config.api)?);
    let registry = Arc::new(InMemoryRegistry::default());

    // Create services (application layer)
    let dashboard_service = DashboardService::new(registry);
    let chat_service = ChatService::new(
        backend,
        dashboard_service.clone(),
        QueryRouter::new(&config.keywords),
        config.flows,
    );

    // Create application state
    let state = Arc::new(AppState {
        chat_service,
        dashboard_service,
        sessions: SessionStore::new(&config.sessions),
    });

    // Build router (presentation layer)
    // Compression is negotiated in the response builders, not by a layer
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/chat", post(chat))
        .route("/sessions/:id", get(get_session))
        .route("/parse", post(parse_response))
        .route("/dashboards", get(list_dashboards).delete(clear_dashboards))
        .route("/dashboards/stats", get(dashboard_stats))
        .route("/dashboards/:index", delete(delete_dashboard))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind_addr
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind_addr))?;
    tracing::info!("Starting chat-analytics service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
