//! Database connection and schema management

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::path::Path;

/// Versioned schema steps, applied in order
const MIGRATIONS: &[(i64, &str, &str)] = &[
    (
        1,
        "storage",
        r#"
        CREATE TABLE IF NOT EXISTS storage (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    ),
    (
        2,
        "drafts",
        r#"
        CREATE TABLE IF NOT EXISTS drafts (
            survey_id TEXT PRIMARY KEY,
            json TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    ),
];

/// Connect to SQLite database with proper configuration
pub async fn connect(db_path: &Path) -> Result<SqlitePool> {
    let database_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let pool = SqlitePool::connect(&database_url)
        .await
        .with_context(|| format!("Failed to connect to database: {}", db_path.display()))?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await
        .context("Failed to enable WAL mode")?;

    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await
        .context("Failed to set synchronous mode")?;

    log::debug!("Connected to SQLite database: {}", db_path.display());
    Ok(pool)
}

/// Connect to in-memory database for testing.
/// A single connection keeps every query on the same database.
pub async fn connect_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .context("Failed to connect to in-memory database")?;

    log::debug!("Connected to in-memory SQLite database");
    Ok(pool)
}

/// Apply schema steps that have not run yet
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create schema_migrations table")?;

    let current: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM schema_migrations")
        .fetch_one(pool)
        .await
        .context("Failed to read schema version")?;

    for (version, name, sql) in MIGRATIONS.iter().filter(|(v, _, _)| *v > current) {
        log::info!("Applying migration {} ({})", version, name);
        let mut tx = pool.begin().await.context("Failed to start migration")?;

        sqlx::query(sql)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Migration {} ({}) failed", version, name))?;

        sqlx::query("INSERT INTO schema_migrations (version, name) VALUES (?, ?)")
            .bind(*version)
            .bind(*name)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to record migration {}", version))?;

        tx.commit().await.context("Failed to commit migration")?;
    }

    Ok(())
}

/// Highest applied schema version
pub async fn schema_version(pool: &SqlitePool) -> Result<i64> {
    sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM schema_migrations")
        .fetch_one(pool)
        .await
        .context("Failed to read schema version")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = connect_memory().await.unwrap();
        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();
        assert_eq!(schema_version(&pool).await.unwrap(), 2);
    }
}
