use std::sync::Arc;

use async_trait::async_trait;
use ng_core::{Error, RecordStorage, Result};

pub mod backends;

pub use backends::*;

#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn new() -> Result<Self>
    where
        Self: Sized;
}

pub fn available_backends() -> Vec<&'static str> {
    let mut backends = vec!["memory"];
    if cfg!(feature = "sqlite") {
        backends.push("sqlite");
    }
    backends
}

/// Open the backend named `kind`. `url` is backend specific: a database
/// path for SQLite, ignored for memory.
pub async fn create_storage(kind: &str, url: Option<&str>) -> Result<Arc<dyn RecordStorage>> {
    let storage: Arc<dyn RecordStorage> = match kind {
        "memory" => Arc::new(InMemoryStorage::new()),
        #[cfg(feature = "sqlite")]
        "sqlite" => Arc::new(match url {
            Some(path) => SQLiteStorage::new_with_path(path).await?,
            None => <SQLiteStorage as StorageBackend>::new().await?,
        }),
        other => {
            return Err(Error::Storage(format!(
                "Unknown storage backend: {}. Available backends: {}",
                other,
                available_backends().join(", ")
            )))
        }
    };
    if kind == "memory" && url.is_some() {
        tracing::warn!("Memory storage ignores the backend url");
    }
    Ok(storage)
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{available_backends, create_storage, StorageBackend};
}
