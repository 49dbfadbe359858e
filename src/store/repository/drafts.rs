//! Repository for cached builder drafts

use crate::builder::Draft;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// Summary row for listing cached drafts
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DraftEntry {
    pub survey_id: String,
    pub updated_at: DateTime<Utc>,
}

/// Save or replace the cached draft for its survey
pub async fn save(pool: &SqlitePool, draft: &Draft) -> Result<()> {
    let json = serde_json::to_string(draft).context("Failed to serialize draft to JSON")?;

    sqlx::query(
        r#"
        INSERT OR REPLACE INTO drafts (survey_id, json, updated_at)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(&draft.survey_id)
    .bind(json)
    .bind(Utc::now())
    .execute(pool)
    .await
    .with_context(|| format!("Failed to save draft for survey '{}'", draft.survey_id))?;

    log::debug!("Saved draft for survey: {}", draft.survey_id);
    Ok(())
}

pub async fn load(pool: &SqlitePool, survey_id: &str) -> Result<Option<Draft>> {
    let json: Option<String> = sqlx::query_scalar("SELECT json FROM drafts WHERE survey_id = ?")
        .bind(survey_id)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to load draft for survey '{}'", survey_id))?;

    json.map(|json| {
        serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse cached draft for survey '{}'", survey_id))
    })
    .transpose()
}

pub async fn delete(pool: &SqlitePool, survey_id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM drafts WHERE survey_id = ?")
        .bind(survey_id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to delete draft for survey '{}'", survey_id))?;

    if result.rows_affected() > 0 {
        log::debug!("Deleted draft for survey: {}", survey_id);
    }
    Ok(result.rows_affected() > 0)
}

/// Cached drafts, most recently saved first
pub async fn list(pool: &SqlitePool) -> Result<Vec<DraftEntry>> {
    let entries = sqlx::query_as::<_, DraftEntry>(
        "SELECT survey_id, updated_at FROM drafts ORDER BY updated_at DESC",
    )
    .fetch_all(pool)
    .await
    .context("Failed to list cached drafts")?;

    Ok(entries)
}
