//! In-memory question backend shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use survey_admin::api::client::ApiResult;
use survey_admin::api::{ApiError, Question};
use survey_admin::sync::{QuestionPayload, QuestionStore};

pub const LOCKED_MESSAGE: &str = "Cannot modify questions: survey already has responses";

#[derive(Default)]
pub struct FakeQuestions {
    questions: Mutex<Vec<Question>>,
    calls: Mutex<Vec<String>>,
    next_id: Mutex<u32>,
    /// Question ids the backend refuses to touch
    locked: HashSet<String>,
    /// Titles the backend refuses to create
    locked_titles: HashSet<String>,
    /// Question ids whose update fails with a server error
    broken: HashSet<String>,
    /// Error returned by `list`
    list_error: Option<ApiError>,
}

impl FakeQuestions {
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions: Mutex::new(questions),
            next_id: Mutex::new(100),
            ..Self::default()
        }
    }

    pub fn locked(mut self, question_id: &str) -> Self {
        self.locked.insert(question_id.to_string());
        self
    }

    pub fn locked_create(mut self, title: &str) -> Self {
        self.locked_titles.insert(title.to_string());
        self
    }

    pub fn broken(mut self, question_id: &str) -> Self {
        self.broken.insert(question_id.to_string());
        self
    }

    pub fn failing_list(mut self, error: ApiError) -> Self {
        self.list_error = Some(error);
        self
    }

    /// Calls in order, as "POST", "PUT <id>" or "DELETE <id>"
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn questions(&self) -> Vec<Question> {
        self.questions.lock().unwrap().clone()
    }

    pub fn question(&self, id: &str) -> Option<Question> {
        self.questions().into_iter().find(|q| q.id == id)
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

pub fn question(id: &str, question_type: &str, title: &str, page_number: usize, order: usize) -> Question {
    Question {
        id: id.to_string(),
        question_type: question_type.to_string(),
        title: title.to_string(),
        subtitle: None,
        required: false,
        page_number,
        order,
        options: None,
    }
}

fn from_payload(id: String, payload: &QuestionPayload) -> Question {
    Question {
        id,
        question_type: payload.question_type.clone(),
        title: payload.title.clone(),
        subtitle: Some(payload.subtitle.clone()),
        required: payload.required,
        page_number: payload.page_number,
        order: payload.order,
        options: payload.options.clone(),
    }
}

#[async_trait]
impl QuestionStore for FakeQuestions {
    async fn list(&self, _survey_id: &str) -> ApiResult<Vec<Question>> {
        if let Some(error) = &self.list_error {
            return Err(error.clone());
        }
        Ok(self.questions())
    }

    async fn create(&self, _survey_id: &str, payload: &QuestionPayload) -> ApiResult<Question> {
        self.record("POST".to_string());
        if self.locked_titles.contains(&payload.title) {
            return Err(ApiError::HasResponses(LOCKED_MESSAGE.to_string()));
        }
        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            next.to_string()
        };
        let question = from_payload(id, payload);
        self.questions.lock().unwrap().push(question.clone());
        Ok(question)
    }

    async fn update(&self, question_id: &str, payload: &QuestionPayload) -> ApiResult<Question> {
        self.record(format!("PUT {}", question_id));
        if self.locked.contains(question_id) {
            return Err(ApiError::HasResponses(LOCKED_MESSAGE.to_string()));
        }
        if self.broken.contains(question_id) {
            return Err(ApiError::Status {
                status: 500,
                message: "Internal server error".to_string(),
            });
        }
        let question = from_payload(question_id.to_string(), payload);
        let mut questions = self.questions.lock().unwrap();
        match questions.iter_mut().find(|q| q.id == question_id) {
            Some(slot) => *slot = question.clone(),
            None => return Err(ApiError::Status {
                status: 404,
                message: "Question not found".to_string(),
            }),
        }
        Ok(question)
    }

    async fn remove(&self, question_id: &str) -> ApiResult<()> {
        self.record(format!("DELETE {}", question_id));
        if self.locked.contains(question_id) {
            return Err(ApiError::HasResponses(LOCKED_MESSAGE.to_string()));
        }
        self.questions.lock().unwrap().retain(|q| q.id != question_id);
        Ok(())
    }
}
