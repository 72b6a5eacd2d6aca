// Registry trait for created dashboards
use crate::domain::dashboard::DashboardRegistryEntry;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryStats {
    pub total_dashboards: usize,
    pub total_charts: usize,
    pub chart_types: BTreeMap<String, usize>,
    pub newest_dashboard: Option<DashboardRegistryEntry>,
    pub oldest_dashboard: Option<DashboardRegistryEntry>,
}

impl RegistryStats {
    pub fn from_entries(entries: &[DashboardRegistryEntry]) -> Self {
        let mut chart_types = BTreeMap::new();
        for chart in entries.iter().flat_map(|e| &e.charts) {
            *chart_types.entry(chart.chart_type.to_string()).or_insert(0) += 1;
        }

        Self {
            total_dashboards: entries.len(),
            total_charts: entries.iter().map(|e| e.charts.len()).sum(),
            chart_types,
            newest_dashboard: entries.iter().max_by_key(|e| e.created).cloned(),
            oldest_dashboard: entries.iter().min_by_key(|e| e.created).cloned(),
        }
    }
}

/// Storage for dashboard entries. Order is insertion order; indexes refer to it.
#[async_trait]
pub trait DashboardRegistry: Send + Sync {
    async fn list(&self) -> anyhow::Result<Vec<DashboardRegistryEntry>>;

    async fn append(&self, entry: DashboardRegistryEntry) -> anyhow::Result<()>;

    /// Remove the entry at `index`; `None` when the index is out of range
    async fn remove(&self, index: usize) -> anyhow::Result<Option<DashboardRegistryEntry>>;

    async fn clear(&self) -> anyhow::Result<()>;

    async fn stats(&self) -> anyhow::Result<RegistryStats> {
        Ok(RegistryStats::from_entries(&self.list().await?))
    }
}
