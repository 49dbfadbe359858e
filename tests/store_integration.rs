//! Local store and draft loading

mod common;

use common::{FakeQuestions, question};
use survey_admin::api::ApiError;
use survey_admin::builder::template::legacy_template;
use survey_admin::builder::{Draft, DraftLoader, DraftOrigin, Element, ElementType};
use survey_admin::store::LocalStore;

fn legacy_titles() -> Vec<String> {
    vec!["App Satisfaction".to_string()]
}

#[tokio::test]
async fn test_saved_draft_reloads_unchanged() {
    let store = LocalStore::new_test().await.unwrap();
    let mut draft = legacy_template("s1", "App satisfaction");
    draft.meta.target_respondents = Some(250);
    draft.pages[2].title = "Wrap-up".to_string();

    store.save_draft(&draft).await.unwrap();
    let reloaded = store.load_draft("s1").await.unwrap().unwrap();

    assert_eq!(reloaded, draft);
    assert_eq!(store.list_drafts().await.unwrap()[0].survey_id, "s1");
}

#[tokio::test]
async fn test_saving_twice_keeps_one_entry() {
    let store = LocalStore::new_test().await.unwrap();
    let mut draft = Draft::new("s1", "Survey");
    store.save_draft(&draft).await.unwrap();
    draft.add_page();
    store.save_draft(&draft).await.unwrap();

    assert_eq!(store.list_drafts().await.unwrap().len(), 1);
    assert_eq!(store.load_draft("s1").await.unwrap().unwrap().pages.len(), 2);
    assert!(store.delete_draft("s1").await.unwrap());
    assert!(store.load_draft("s1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_cache_wins_over_remote() {
    let store = LocalStore::new_test().await.unwrap();
    let mut cached = Draft::new("s1", "Survey");
    cached
        .add_element(1, Element::new(ElementType::Date).titled("Cached"))
        .unwrap();
    store.save_draft(&cached).await.unwrap();
    let backend = FakeQuestions::new(vec![question("1", "text", "Remote", 1, 0)]);
    let titles = legacy_titles();

    let (draft, origin) = DraftLoader::new(&store, &backend, &titles)
        .load("s1", "Survey")
        .await
        .unwrap();

    assert_eq!(origin, DraftOrigin::Cache);
    assert_eq!(draft.pages[0].elements[0].title, "Cached");
}

#[tokio::test]
async fn test_remote_questions_grouped_by_page() {
    let store = LocalStore::new_test().await.unwrap();
    let backend = FakeQuestions::new(vec![
        question("3", "text", "Third", 2, 0),
        question("2", "date", "Second", 1, 1),
        question("1", "text", "First", 1, 0),
    ]);
    let titles = legacy_titles();

    let (draft, origin) = DraftLoader::new(&store, &backend, &titles)
        .load("s1", "App Satisfaction")
        .await
        .unwrap();

    assert_eq!(origin, DraftOrigin::Remote);
    assert_eq!(draft.pages.len(), 2);
    let titles: Vec<&str> = draft.pages[0].elements.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["First", "Second"]);
    assert_eq!(draft.pages[1].elements[0].id.as_str(), "q-3");
}

#[tokio::test]
async fn test_legacy_template_only_for_configured_titles() {
    let store = LocalStore::new_test().await.unwrap();
    let backend = FakeQuestions::new(Vec::new());
    let titles = legacy_titles();
    let loader = DraftLoader::new(&store, &backend, &titles);

    let (draft, origin) = loader.load("s1", "2025 app satisfaction").await.unwrap();
    assert_eq!(origin, DraftOrigin::LegacyTemplate);
    assert_eq!(draft.pages.len(), 3);

    let (draft, origin) = loader.load("s2", "Engagement pulse").await.unwrap();
    assert_eq!(origin, DraftOrigin::Blank);
    assert_eq!(draft.pages.len(), 1);
    assert!(draft.pages[0].elements.is_empty());
}

#[tokio::test]
async fn test_backend_failures_while_loading() {
    let store = LocalStore::new_test().await.unwrap();
    let titles = legacy_titles();

    let offline = FakeQuestions::new(Vec::new())
        .failing_list(ApiError::Network("connection refused".to_string()));
    let (_, origin) = DraftLoader::new(&store, &offline, &titles)
        .load("s1", "App satisfaction")
        .await
        .unwrap();
    assert_eq!(origin, DraftOrigin::LegacyTemplate);

    let expired = FakeQuestions::new(Vec::new())
        .failing_list(ApiError::Unauthorized("jwt expired".to_string()));
    let error = DraftLoader::new(&store, &expired, &titles)
        .load("s1", "App satisfaction")
        .await
        .unwrap_err();
    assert!(
        error
            .downcast_ref::<ApiError>()
            .is_some_and(ApiError::is_unauthorized)
    );
}

#[tokio::test]
async fn test_cache_and_fresh_loads_are_separate() {
    let store = LocalStore::new_test().await.unwrap();
    let backend = FakeQuestions::new(vec![question("1", "text", "Remote", 1, 0)]);
    let titles = legacy_titles();
    let loader = DraftLoader::new(&store, &backend, &titles);

    assert!(loader.load_cached("s1").await.unwrap().is_none());

    let mut cached = Draft::new("s1", "Survey");
    cached
        .add_element(1, Element::new(ElementType::Date).titled("Cached"))
        .unwrap();
    cached.pages[0].id = 4;
    store.save_draft(&cached).await.unwrap();

    // Cached drafts come back repaired
    let draft = loader.load_cached("s1").await.unwrap().unwrap();
    assert_eq!(draft.pages[0].id, 1);
    assert_eq!(draft.pages[0].elements[0].title, "Cached");

    let (draft, origin) = loader.load_fresh("s1", "Survey").await.unwrap();
    assert_eq!(origin, DraftOrigin::Remote);
    assert_eq!(draft.pages[0].elements[0].title, "Remote");
}
