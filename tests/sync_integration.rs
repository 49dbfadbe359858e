//! Reconciliation against an in-memory question backend

mod common;

use common::{FakeQuestions, question};
use survey_admin::builder::{Draft, Element, ElementId, ElementType};
use survey_admin::sync::{self, sync_draft};

fn source_id_of(question: &survey_admin::api::Question) -> Option<String> {
    question
        .options
        .as_ref()?
        .get("conditionalRequired")?
        .get("sourceId")?
        .as_str()
        .map(str::to_string)
}

#[tokio::test]
async fn test_removed_question_and_new_element() {
    let backend = FakeQuestions::new(vec![question("1", "text", "Q1", 1, 0)]);
    let mut draft = Draft::new("s1", "Survey");
    let fresh = draft
        .add_element(1, Element::new(ElementType::Text).titled("New question"))
        .unwrap();

    let report = sync_draft(&backend, &mut draft).await.unwrap();

    assert_eq!(report.deleted, 1);
    assert_eq!(report.created, 1);
    assert_eq!(report.updated, 0);
    assert_eq!(backend.calls(), vec!["DELETE 1", "POST"]);

    // The new element now carries its server id
    let (old, new) = &report.id_remap[0];
    assert_eq!(old, &fresh);
    assert_eq!(new.as_str(), "q-101");
    assert!(draft.element(new).is_ok());
    assert_eq!(backend.questions().len(), 1);
}

#[tokio::test]
async fn test_locked_question_is_a_warning() {
    let backend = FakeQuestions::new(vec![
        question("1", "text", "Q1", 1, 0),
        question("2", "text", "Q2", 1, 1),
    ])
    .locked("1");
    let mut draft = Draft::new("s1", "Survey");
    draft
        .add_element(1, Element::with_id(ElementId::remote("1"), ElementType::Text).titled("Q1 edited"))
        .unwrap();
    draft
        .add_element(1, Element::with_id(ElementId::remote("2"), ElementType::Text).titled("Q2 edited"))
        .unwrap();

    let report = sync_draft(&backend, &mut draft).await.unwrap();

    assert_eq!(report.updated, 1);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("already has responses"));
    assert_eq!(backend.question("2").unwrap().title, "Q2 edited");
    assert_eq!(backend.question("1").unwrap().title, "Q1");
}

#[tokio::test]
async fn test_locked_delete_is_a_warning() {
    let backend = FakeQuestions::new(vec![question("1", "text", "Q1", 1, 0)]).locked("1");
    let mut draft = Draft::new("s1", "Survey");
    draft
        .add_element(1, Element::new(ElementType::Text).titled("Replacement"))
        .unwrap();

    let report = sync_draft(&backend, &mut draft).await.unwrap();

    assert_eq!(backend.calls(), vec!["DELETE 1", "POST"]);
    assert_eq!((report.created, report.updated, report.deleted), (1, 0, 0));
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("already has responses"));
    // The locked question stays on the backend next to the new one
    assert!(backend.question("1").is_some());
    assert_eq!(backend.question("101").unwrap().title, "Replacement");
}

#[tokio::test]
async fn test_locked_create_is_a_warning() {
    let backend = FakeQuestions::new(Vec::new()).locked_create("Blocked");
    let mut draft = Draft::new("s1", "Survey");
    let blocked = draft
        .add_element(1, Element::new(ElementType::Text).titled("Blocked"))
        .unwrap();
    draft
        .add_element(1, Element::new(ElementType::Date).titled("Accepted"))
        .unwrap();

    let report = sync_draft(&backend, &mut draft).await.unwrap();

    assert_eq!(backend.calls(), vec!["POST", "POST"]);
    assert_eq!(report.created, 1);
    assert_eq!(report.warnings.len(), 1);
    // The refused element keeps its temporary id so a later sync retries it
    assert!(draft.element(&blocked).is_ok());
    assert!(blocked.remote_question_id().is_none());
    assert_eq!(report.id_remap.len(), 1);
    assert_eq!(backend.question("101").unwrap().title, "Accepted");
}

#[tokio::test]
async fn test_other_failures_abort() {
    let backend = FakeQuestions::new(vec![
        question("1", "text", "Q1", 1, 0),
        question("2", "text", "Q2", 1, 1),
    ])
    .broken("1");
    let mut draft = Draft::new("s1", "Survey");
    draft
        .add_element(1, Element::with_id(ElementId::remote("1"), ElementType::Text))
        .unwrap();
    draft
        .add_element(1, Element::with_id(ElementId::remote("2"), ElementType::Text))
        .unwrap();

    let error = sync_draft(&backend, &mut draft).await.unwrap_err();
    assert!(error.to_string().contains("HTTP 500"));
    // Nothing after the failing step was sent
    assert_eq!(backend.calls(), vec!["PUT 1"]);
}

#[tokio::test]
async fn test_rule_reference_follows_created_source() {
    let backend = FakeQuestions::new(Vec::new());
    let mut draft = Draft::new("s1", "Survey");
    let rating = draft
        .add_element(1, Element::new(ElementType::Rating).titled("Satisfaction"))
        .unwrap();
    draft
        .add_element(
            1,
            Element::new(ElementType::Text)
                .titled("Why?")
                .with_conditional_required(rating.clone(), 7),
        )
        .unwrap();

    let report = sync_draft(&backend, &mut draft).await.unwrap();

    assert_eq!(report.created, 2);
    // The rating was created first, so the follow-up already sent its server id
    assert_eq!(report.updated, 0);
    let follow_up = backend.question("102").unwrap();
    assert_eq!(source_id_of(&follow_up).as_deref(), Some("q-101"));
}

#[tokio::test]
async fn test_rule_reference_sent_before_source_is_resent() {
    let backend = FakeQuestions::new(Vec::new());
    let mut draft = Draft::new("s1", "Survey");
    let rating = Element::new(ElementType::Rating).titled("Satisfaction");
    let follow_up = Element::new(ElementType::Text)
        .titled("Why?")
        .with_conditional_required(rating.id.clone(), 7);
    draft.add_element(1, follow_up).unwrap();
    draft.add_page();
    draft.add_element(2, rating).unwrap();

    let report = sync_draft(&backend, &mut draft).await.unwrap();

    assert_eq!(report.created, 2);
    assert_eq!(report.updated, 1);
    assert_eq!(backend.calls(), vec!["POST", "POST", "PUT 101"]);
    let follow_up = backend.question("101").unwrap();
    assert_eq!(source_id_of(&follow_up).as_deref(), Some("q-102"));

    let local = draft.element(&ElementId::new("q-101")).unwrap();
    assert_eq!(
        local.conditional_required.as_ref().map(|r| r.source_id.as_str()),
        Some("q-102")
    );
}

#[tokio::test]
async fn test_second_sync_only_updates() {
    let backend = FakeQuestions::new(Vec::new());
    let mut draft = Draft::new("s1", "Survey");
    draft.add_element(1, Element::new(ElementType::Text)).unwrap();
    draft.add_element(1, Element::new(ElementType::Date)).unwrap();
    sync_draft(&backend, &mut draft).await.unwrap();

    let remote = backend.questions();
    let plan = sync::plan(&draft, &remote);
    assert_eq!((plan.creates(), plan.updates(), plan.deletes()), (0, 2, 0));

    let report = sync_draft(&backend, &mut draft).await.unwrap();
    assert_eq!((report.created, report.updated, report.deleted), (0, 2, 0));
}
