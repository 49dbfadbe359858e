//! SQLite-backed local store
//!
//! This module provides persistent storage for:
//! - Session values (tokens and the cached user profile)
//! - Builder drafts cached per survey

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

pub mod db;
pub mod repository;

pub use repository::drafts::DraftEntry;

use crate::builder::Draft;

/// Local store handle; cheap to clone
#[derive(Debug, Clone)]
pub struct LocalStore {
    pub(crate) pool: sqlx::SqlitePool,
    path: PathBuf,
}

impl LocalStore {
    /// Open (creating if needed) the store at `path` and bring its schema up to date
    pub async fn open(path: &Path) -> Result<Self> {
        log::debug!("Opening local store at: {:?}", path);
        let pool = db::connect(path).await?;
        db::run_migrations(&pool).await?;

        Ok(Self {
            pool,
            path: path.to_path_buf(),
        })
    }

    /// Create a store for testing (in-memory database)
    pub async fn new_test() -> Result<Self> {
        let pool = db::connect_memory().await?;
        db::run_migrations(&pool).await?;

        Ok(Self {
            pool,
            path: PathBuf::from(":memory:"),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // Key/value storage
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        repository::storage::get(&self.pool, key).await
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        repository::storage::set(&self.pool, key, value).await
    }

    pub async fn remove(&self, key: &str) -> Result<bool> {
        repository::storage::remove(&self.pool, key).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key).await? {
            Some(raw) => {
                let value = serde_json::from_str(&raw)
                    .with_context(|| format!("Failed to parse stored value '{}'", key))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)
            .with_context(|| format!("Failed to serialize value for '{}'", key))?;
        self.set(key, &raw).await
    }

    // Draft cache
    pub async fn save_draft(&self, draft: &Draft) -> Result<()> {
        repository::drafts::save(&self.pool, draft).await
    }

    pub async fn load_draft(&self, survey_id: &str) -> Result<Option<Draft>> {
        repository::drafts::load(&self.pool, survey_id).await
    }

    pub async fn delete_draft(&self, survey_id: &str) -> Result<bool> {
        repository::drafts::delete(&self.pool, survey_id).await
    }

    pub async fn list_drafts(&self) -> Result<Vec<DraftEntry>> {
        repository::drafts::list(&self.pool).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_storage_set_get_remove() {
        let store = LocalStore::new_test().await.unwrap();
        assert_eq!(store.get("access_token").await.unwrap(), None);

        store.set("access_token", "abc").await.unwrap();
        store.set("access_token", "def").await.unwrap();
        assert_eq!(store.get("access_token").await.unwrap().as_deref(), Some("def"));

        assert!(store.remove("access_token").await.unwrap());
        assert!(!store.remove("access_token").await.unwrap());
    }

    #[tokio::test]
    async fn test_json_values() {
        let store = LocalStore::new_test().await.unwrap();
        store.set_json("numbers", &vec![1, 2, 3]).await.unwrap();
        let numbers: Option<Vec<u32>> = store.get_json("numbers").await.unwrap();
        assert_eq!(numbers, Some(vec![1, 2, 3]));

        store.set("broken", "{not json").await.unwrap();
        assert!(store.get_json::<Vec<u32>>("broken").await.is_err());
    }

    #[tokio::test]
    async fn test_draft_cache() {
        let store = LocalStore::new_test().await.unwrap();
        let mut draft = Draft::new("42", "Pulse");
        draft.add_page();
        store.save_draft(&draft).await.unwrap();

        let loaded = store.load_draft("42").await.unwrap().unwrap();
        assert_eq!(loaded, draft);

        let entries = store.list_drafts().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].survey_id, "42");

        assert!(store.delete_draft("42").await.unwrap());
        assert!(store.load_draft("42").await.unwrap().is_none());
    }
}
