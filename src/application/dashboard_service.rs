// Dashboard service - Use case for creating and managing dashboards
use crate::application::dashboard_planner::plan_charts;
use crate::application::dashboard_registry::{DashboardRegistry, RegistryStats};
use crate::domain::dashboard::DashboardRegistryEntry;
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;

const DASHBOARD_TITLE: &str = "Live Dashboard";

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Could not parse dashboard requirements from query")]
    NoCharts,
    #[error(transparent)]
    Registry(#[from] anyhow::Error),
}

#[derive(Clone)]
pub struct DashboardService {
    registry: Arc<dyn DashboardRegistry>,
}

impl DashboardService {
    pub fn new(registry: Arc<dyn DashboardRegistry>) -> Self {
        Self { registry }
    }

    pub async fn create_from_query(&self, query: &str) -> Result<DashboardRegistryEntry, DashboardError> {
        let charts = plan_charts(query);
        if charts.is_empty() {
            return Err(DashboardError::NoCharts);
        }

        let entry = DashboardRegistryEntry::new(DASHBOARD_TITLE.to_string(), charts, Utc::now());
        self.registry.append(entry.clone()).await?;

        tracing::info!(
            "Dashboard {} registered with {} charts",
            entry.dashboard_id,
            entry.charts.len()
        );
        Ok(entry)
    }

    pub async fn list(&self) -> anyhow::Result<Vec<DashboardRegistryEntry>> {
        self.registry.list().await
    }

    pub async fn remove(&self, index: usize) -> anyhow::Result<Option<DashboardRegistryEntry>> {
        let removed = self.registry.remove(index).await?;
        match &removed {
            Some(entry) => tracing::info!("Removed dashboard: {}", entry.title),
            None => tracing::warn!("Invalid dashboard index: {}", index),
        }
        Ok(removed)
    }

    pub async fn clear(&self) -> anyhow::Result<()> {
        self.registry.clear().await?;
        tracing::info!("Dashboard registry cleared");
        Ok(())
    }

    pub async fn stats(&self) -> anyhow::Result<RegistryStats> {
        self.registry.stats().await
    }
}
