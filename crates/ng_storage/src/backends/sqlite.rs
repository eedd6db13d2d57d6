use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ng_core::{Category, ContentRecord, Error, RecordId, RecordStorage, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqliteRow};
use sqlx::Row;

use crate::StorageBackend;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS records (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        headline TEXT NOT NULL,
        summary TEXT NOT NULL,
        category TEXT NOT NULL,
        article TEXT NOT NULL,
        created_at TEXT NOT NULL,
        photo_credit TEXT,
        image TEXT
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS records_category_created_at
        ON records (category, created_at)
    "#,
];

const SELECT_COLUMNS: &str =
    "SELECT id, title, headline, summary, category, article, created_at, photo_credit, image FROM records";

fn storage_error(context: &str, e: sqlx::Error) -> Error {
    Error::Storage(format!("{}: {}", context, e))
}

pub struct SQLiteStorage {
    pool: SqlitePool,
    db_path: PathBuf,
}

#[async_trait]
impl StorageBackend for SQLiteStorage {
    async fn new() -> Result<Self> {
        Self::new_with_path("records.db").await
    }
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| storage_error("Failed to connect to database", e))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| storage_error(&format!("Failed to run migration {}", i), e))?;
        }

        Ok(Self { pool, db_path })
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }
}

fn record_from_row(row: &SqliteRow) -> Result<ContentRecord> {
    let category: String = row.get("category");
    let created_at: String = row.get("created_at");
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| Error::Storage(format!("Bad timestamp {:?}: {}", created_at, e)))?
        .with_timezone(&Utc);

    Ok(ContentRecord {
        id: RecordId::from(row.get::<String, _>("id")),
        title: row.get("title"),
        headline: row.get("headline"),
        summary: row.get("summary"),
        category: category.parse::<Category>()?,
        article: row.get("article"),
        created_at,
        photo_credit: row.get("photo_credit"),
        image: row.get("image"),
    })
}

#[async_trait]
impl RecordStorage for SQLiteStorage {
    async fn save(&self, record: &ContentRecord) -> Result<RecordId> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO records
                (id, title, headline, summary, category, article, created_at, photo_credit, image)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id.as_str())
        .bind(&record.title)
        .bind(&record.headline)
        .bind(&record.summary)
        .bind(record.category.as_str())
        .bind(&record.article)
        .bind(record.created_at.to_rfc3339())
        .bind(record.photo_credit.as_deref())
        .bind(record.image.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to save record", e))?;

        Ok(record.id.clone())
    }

    async fn get(&self, id: &RecordId) -> Result<Option<ContentRecord>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to load record", e))?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn get_by_category(&self, category: Category) -> Result<Vec<ContentRecord>> {
        let rows = sqlx::query(&format!(
            "{} WHERE category = ? ORDER BY created_at DESC, id",
            SELECT_COLUMNS
        ))
        .bind(category.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to query records", e))?;

        rows.iter().map(record_from_row).collect()
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<ContentRecord>> {
        let rows = sqlx::query(&format!("{} ORDER BY created_at DESC, id LIMIT ?", SELECT_COLUMNS))
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to query records", e))?;

        rows.iter().map(record_from_row).collect()
    }

    async fn delete(&self, id: &RecordId) -> Result<()> {
        sqlx::query("DELETE FROM records WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to delete record", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ng_core::RawArticle;
    use tempfile::tempdir;

    fn record(body: &str, category: Category) -> ContentRecord {
        let article = RawArticle::new(body).with_photo_credit("Wire");
        ContentRecord {
            id: article.fingerprint(),
            title: "Title".to_string(),
            headline: "Headline".to_string(),
            summary: "Summary".to_string(),
            category,
            article: body.to_string(),
            created_at: Utc::now(),
            photo_credit: article.photo_credit.clone(),
            image: None,
        }
    }

    #[tokio::test]
    async fn test_sqlite_storage() {
        let dir = tempdir().unwrap();
        let storage = SQLiteStorage::new_with_path(dir.path().join("nested/records.db"))
            .await
            .unwrap();

        let saved = record("economy story", Category::Economy);
        let id = storage.save(&saved).await.unwrap();
        storage.save(&saved).await.unwrap();

        let loaded = storage.get(&id).await.unwrap().unwrap();
        assert_eq!(loaded.category, Category::Economy);
        assert_eq!(loaded.photo_credit.as_deref(), Some("Wire"));
        assert_eq!(loaded.created_at.timestamp(), saved.created_at.timestamp());

        assert_eq!(storage.list_recent(10).await.unwrap().len(), 1);
        assert_eq!(storage.get_by_category(Category::Economy).await.unwrap().len(), 1);
        assert!(storage.get_by_category(Category::Sports).await.unwrap().is_empty());

        storage.delete(&id).await.unwrap();
        assert!(storage.get(&id).await.unwrap().is_none());
    }
}
