use async_trait::async_trait;

use crate::types::{Category, ContentRecord, RecordId};
use crate::Result;

#[async_trait]
pub trait RecordStorage: Send + Sync {
    /// Persist a record. Saving the same id twice replaces the earlier copy.
    async fn save(&self, record: &ContentRecord) -> Result<RecordId>;

    async fn get(&self, id: &RecordId) -> Result<Option<ContentRecord>>;

    async fn get_by_category(&self, category: Category) -> Result<Vec<ContentRecord>>;

    /// Most recently created records first.
    async fn list_recent(&self, limit: usize) -> Result<Vec<ContentRecord>>;

    async fn delete(&self, id: &RecordId) -> Result<()>;
}
