//! Repository for key/value storage

use anyhow::{Context, Result};
use sqlx::SqlitePool;

pub async fn get(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM storage WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to read stored value '{}'", key))?;

    Ok(value)
}

pub async fn set(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query("INSERT OR REPLACE INTO storage (key, value) VALUES (?, ?)")
        .bind(key)
        .bind(value)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to store value '{}'", key))?;

    log::debug!("Stored value: {}", key);
    Ok(())
}

/// Remove a key; returns whether it existed
pub async fn remove(pool: &SqlitePool, key: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM storage WHERE key = ?")
        .bind(key)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to remove stored value '{}'", key))?;

    Ok(result.rows_affected() > 0)
}
