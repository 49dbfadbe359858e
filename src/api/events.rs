//! Event (survey) endpoints

use super::client::{ApiResult, SurveyClient};
use super::constants::paths;
use super::error::ApiError;
use super::models::{Event, EventInput, QrCode};
use chrono::{DateTime, Utc};
use serde_json::json;

impl SurveyClient {
    pub async fn list_events(&self) -> ApiResult<Vec<Event>> {
        self.get(paths::EVENTS, &[]).await
    }

    pub async fn get_event(&self, id: &str) -> ApiResult<Event> {
        self.get(&paths::event(id), &[]).await
    }

    pub async fn create_event(&self, input: &EventInput) -> ApiResult<Event> {
        validate_event(input)?;
        self.post(paths::EVENTS, input).await
    }

    pub async fn update_event(&self, id: &str, input: &EventInput) -> ApiResult<Event> {
        validate_event(input)?;
        self.put(&paths::event(id), input).await
    }

    pub async fn delete_event(&self, id: &str) -> ApiResult<()> {
        log::info!("Deleting event {}", id);
        self.delete(&paths::event(id)).await
    }

    pub async fn publish_event(&self, id: &str) -> ApiResult<Event> {
        self.post(&paths::event_action(id, "publish"), &json!({})).await
    }

    pub async fn schedule_event(
        &self,
        id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ApiResult<Event> {
        if end <= start {
            return Err(ApiError::validation("Schedule end must be after its start"));
        }
        self.post(
            &paths::event_action(id, "schedule"),
            &json!({ "start_date": start, "end_date": end }),
        )
        .await
    }

    pub async fn event_qr_code(&self, id: &str) -> ApiResult<QrCode> {
        self.get(&paths::event_action(id, "qr"), &[]).await
    }
}

/// Client-side checks run before an event is sent
pub fn validate_event(input: &EventInput) -> ApiResult<()> {
    let mut details = Vec::new();
    if input.title.trim().is_empty() {
        details.push("title: is required".to_string());
    }
    if let (Some(start), Some(end)) = (input.start_date, input.end_date) {
        if end <= start {
            details.push("end_date: must be after start_date".to_string());
        }
    }
    if input.target_score.is_some_and(|score| score > 100) {
        details.push("target_score: must be between 0 and 100".to_string());
    }

    if details.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation {
            message: "Event is incomplete".to_string(),
            details,
        })
    }
}
