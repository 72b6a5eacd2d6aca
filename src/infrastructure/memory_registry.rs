// In-memory dashboard registry
use crate::application::dashboard_registry::DashboardRegistry;
use crate::domain::dashboard::DashboardRegistryEntry;
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    entries: RwLock<Vec<DashboardRegistryEntry>>,
}

#[async_trait]
impl DashboardRegistry for InMemoryRegistry {
    async fn list(&self) -> Result<Vec<DashboardRegistryEntry>> {
        Ok(self.entries.read().await.clone())
    }

    async fn append(&self, entry: DashboardRegistryEntry) -> Result<()> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn remove(&self, index: usize) -> Result<Option<DashboardRegistryEntry>> {
        let mut entries = self.entries.write().await;
        if index < entries.len() {
            Ok(Some(entries.remove(index)))
        } else {
            Ok(None)
        }
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}
