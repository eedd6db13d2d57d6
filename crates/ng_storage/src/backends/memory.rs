use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ng_core::{Category, ContentRecord, RecordId, RecordStorage, Result};
use tokio::sync::RwLock;

use crate::StorageBackend;

#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    records: Arc<RwLock<HashMap<RecordId, ContentRecord>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

fn newest_first(records: &mut [ContentRecord]) {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
}

#[async_trait]
impl StorageBackend for InMemoryStorage {
    async fn new() -> Result<Self> {
        Ok(InMemoryStorage::new())
    }
}

#[async_trait]
impl RecordStorage for InMemoryStorage {
    async fn save(&self, record: &ContentRecord) -> Result<RecordId> {
        let mut records = self.records.write().await;
        if records.insert(record.id.clone(), record.clone()).is_some() {
            tracing::debug!("Replaced record {}", record.id);
        }
        Ok(record.id.clone())
    }

    async fn get(&self, id: &RecordId) -> Result<Option<ContentRecord>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn get_by_category(&self, category: Category) -> Result<Vec<ContentRecord>> {
        let mut records: Vec<ContentRecord> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.category == category)
            .cloned()
            .collect();
        newest_first(&mut records);
        Ok(records)
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<ContentRecord>> {
        let mut records: Vec<ContentRecord> = self.records.read().await.values().cloned().collect();
        newest_first(&mut records);
        records.truncate(limit);
        Ok(records)
    }

    async fn delete(&self, id: &RecordId) -> Result<()> {
        self.records.write().await.remove(id);
        Ok(())
    }
}
