//! Question endpoints

use super::client::{ApiResult, SurveyClient};
use super::constants::paths;
use super::models::Question;
use crate::sync::{QuestionPayload, QuestionStore};
use async_trait::async_trait;

impl SurveyClient {
    pub async fn list_questions(&self, survey_id: &str) -> ApiResult<Vec<Question>> {
        self.get(&paths::event_questions(survey_id), &[]).await
    }

    pub async fn create_question(&self, survey_id: &str, payload: &QuestionPayload) -> ApiResult<Question> {
        self.post(&paths::event_questions(survey_id), payload).await
    }

    pub async fn update_question(&self, question_id: &str, payload: &QuestionPayload) -> ApiResult<Question> {
        self.put(&paths::question(question_id), payload).await
    }

    pub async fn delete_question(&self, question_id: &str) -> ApiResult<()> {
        self.delete(&paths::question(question_id)).await
    }
}

#[async_trait]
impl QuestionStore for SurveyClient {
    async fn list(&self, survey_id: &str) -> ApiResult<Vec<Question>> {
        self.list_questions(survey_id).await
    }

    async fn create(&self, survey_id: &str, payload: &QuestionPayload) -> ApiResult<Question> {
        self.create_question(survey_id, payload).await
    }

    async fn update(&self, question_id: &str, payload: &QuestionPayload) -> ApiResult<Question> {
        self.update_question(question_id, payload).await
    }

    async fn remove(&self, question_id: &str) -> ApiResult<()> {
        self.delete_question(question_id).await
    }
}
