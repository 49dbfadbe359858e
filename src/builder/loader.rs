//! Draft loading with fallbacks
//!
//! Priority: local cache, remote questions, legacy template (only for
//! configured titles), blank draft.

use super::draft::{Draft, Page};
use super::template;
use crate::api::models::Question;
use crate::store::LocalStore;
use crate::sync::{QuestionStore, element_from_question};
use anyhow::Result;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftOrigin {
    Cache,
    Remote,
    LegacyTemplate,
    Blank,
}

impl DraftOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cache => "local cache",
            Self::Remote => "remote questions",
            Self::LegacyTemplate => "legacy template",
            Self::Blank => "blank draft",
        }
    }
}

pub struct DraftLoader<'a, S: QuestionStore + ?Sized> {
    store: &'a LocalStore,
    questions: &'a S,
    legacy_titles: &'a [String],
}

impl<'a, S: QuestionStore + ?Sized> DraftLoader<'a, S> {
    pub fn new(store: &'a LocalStore, questions: &'a S, legacy_titles: &'a [String]) -> Self {
        Self {
            store,
            questions,
            legacy_titles,
        }
    }

    pub async fn load(&self, survey_id: &str, title: &str) -> Result<(Draft, DraftOrigin)> {
        if let Some(draft) = self.load_cached(survey_id).await? {
            return Ok((draft, DraftOrigin::Cache));
        }
        self.load_fresh(survey_id, title).await
    }

    /// The locally cached draft, repaired, if there is one
    pub async fn load_cached(&self, survey_id: &str) -> Result<Option<Draft>> {
        let Some(mut draft) = self.store.load_draft(survey_id).await? else {
            return Ok(None);
        };
        log::info!("Loaded draft for survey {} from local cache", survey_id);
        draft.renumber_pages();
        draft.normalize_ids();
        Ok(Some(draft))
    }

    /// Build a draft without looking at the cache
    pub async fn load_fresh(&self, survey_id: &str, title: &str) -> Result<(Draft, DraftOrigin)> {
        match self.questions.list(survey_id).await {
            Ok(questions) => {
                if let Some(draft) = draft_from_questions(survey_id, title, &questions) {
                    log::info!(
                        "Built draft for survey {} from {} remote questions",
                        survey_id,
                        questions.len()
                    );
                    return Ok((draft, DraftOrigin::Remote));
                }
            }
            Err(error) if error.is_unauthorized() => return Err(error.into()),
            Err(error) => log::warn!("Could not fetch questions for survey {}: {}", survey_id, error),
        }

        if template::matches_legacy_title(title, self.legacy_titles) {
            log::info!("Seeding survey {} from the legacy template", survey_id);
            return Ok((template::legacy_template(survey_id, title), DraftOrigin::LegacyTemplate));
        }

        Ok((Draft::new(survey_id, title), DraftOrigin::Blank))
    }
}

/// Group questions by page number and order them; page numbers with gaps
/// collapse onto contiguous page ids. `None` when there are no questions.
pub fn draft_from_questions(survey_id: &str, title: &str, questions: &[Question]) -> Option<Draft> {
    if questions.is_empty() {
        return None;
    }

    let mut by_page: BTreeMap<usize, Vec<&Question>> = BTreeMap::new();
    for question in questions {
        by_page.entry(question.page_number).or_default().push(question);
    }

    let mut draft = Draft::new(survey_id, title);
    draft.pages = by_page
        .into_values()
        .enumerate()
        .map(|(index, mut questions)| {
            questions.sort_by_key(|q| q.order);
            let mut page = Page::new(index + 1);
            page.elements = questions.into_iter().map(element_from_question).collect();
            page
        })
        .collect();
    draft.normalize_ids();
    Some(draft)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: &str, page_number: usize, order: usize) -> Question {
        Question {
            id: id.to_string(),
            question_type: "text".to_string(),
            title: format!("Question {}", id),
            subtitle: None,
            required: false,
            page_number,
            order,
            options: None,
        }
    }

    #[test]
    fn test_questions_grouped_and_ordered() {
        let questions = vec![question("3", 4, 1), question("1", 1, 0), question("2", 4, 0)];
        let draft = draft_from_questions("s", "Survey", &questions).unwrap();

        assert_eq!(draft.pages.len(), 2);
        assert_eq!(draft.pages[1].id, 2);
        assert_eq!(draft.pages[1].title, "Page 2");
        let ids: Vec<&str> = draft.pages[1].elements.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["q-2", "q-3"]);
    }

    #[test]
    fn test_no_questions_yields_none() {
        assert!(draft_from_questions("s", "Survey", &[]).is_none());
    }
}
