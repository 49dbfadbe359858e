//! Debounced suggestions and mapped-application lookups
//!
//! Both use [`LatestRequest`]: every new request takes a generation number
//! and only the newest generation may apply its result.

use crate::api::client::ApiResult;
use crate::api::{SurveyClient, UserProfile};
use crate::builder::{DataSource, MasterData, Selection};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Single-slot latest-request token
#[derive(Debug, Default)]
pub struct LatestRequest {
    generation: AtomicU64,
}

impl LatestRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, superseding every earlier one
    pub fn issue(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_latest(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Keep `value` only if `generation` is still the latest
    pub fn accept<T>(&self, generation: u64, value: T) -> Option<T> {
        if self.is_latest(generation) {
            Some(value)
        } else {
            log::debug!("Discarding stale result for request {}", generation);
            None
        }
    }
}

/// Backend lookups behind suggestions
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    async fn search_users(&self, query: &str) -> ApiResult<Vec<UserProfile>>;
    async fn mapped_applications(&self, source: DataSource, upstream: &str) -> ApiResult<Vec<String>>;
}

#[async_trait]
impl SuggestionSource for SurveyClient {
    async fn search_users(&self, query: &str) -> ApiResult<Vec<UserProfile>> {
        SurveyClient::search_users(self, query).await
    }

    async fn mapped_applications(&self, source: DataSource, upstream: &str) -> ApiResult<Vec<String>> {
        match source {
            DataSource::AppDepartment => self.applications_for_department(upstream).await,
            DataSource::AppFunction => self.applications_for_function(upstream).await,
            _ => Ok(Vec::new()),
        }
    }
}

/// Debounced admin user search
pub struct UserSuggestions<'a, S: SuggestionSource + ?Sized> {
    source: &'a S,
    debounce: Duration,
    latest: LatestRequest,
}

impl<'a, S: SuggestionSource + ?Sized> UserSuggestions<'a, S> {
    pub fn new(source: &'a S, debounce: Duration) -> Self {
        Self {
            source,
            debounce,
            latest: LatestRequest::new(),
        }
    }

    /// Suggestions for `query`, or `None` when a newer query superseded it
    pub async fn suggest(&self, query: &str) -> ApiResult<Option<Vec<UserProfile>>> {
        let generation = self.latest.issue();
        tokio::time::sleep(self.debounce).await;
        if !self.latest.is_latest(generation) {
            return Ok(None);
        }

        let query = query.trim();
        if query.is_empty() {
            return Ok(self.latest.accept(generation, Vec::new()));
        }

        let users = self.source.search_users(query).await?;
        Ok(self.latest.accept(generation, users))
    }
}

/// Mapped-application fetches where only the latest selection wins
pub struct ApplicationLookup<'a, S: SuggestionSource + ?Sized> {
    source: &'a S,
    department: LatestRequest,
    function: LatestRequest,
}

impl<'a, S: SuggestionSource + ?Sized> ApplicationLookup<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            department: LatestRequest::new(),
            function: LatestRequest::new(),
        }
    }

    fn token(&self, source: DataSource) -> Option<&LatestRequest> {
        match source {
            DataSource::AppDepartment => Some(&self.department),
            DataSource::AppFunction => Some(&self.function),
            _ => None,
        }
    }

    /// Applications for an upstream selection, or `None` when a newer
    /// lookup for the same source superseded this one
    pub async fn lookup(&self, source: DataSource, upstream: &str) -> ApiResult<Option<Vec<String>>> {
        let Some(token) = self.token(source) else {
            return Ok(Some(Vec::new()));
        };
        let generation = token.issue();
        let applications = self.source.mapped_applications(source, upstream).await?;
        Ok(token.accept(generation, applications))
    }

    /// Fetch both application lists for the selection's department and
    /// function. Department labels are resolved back to plain names first.
    pub async fn fill(&self, master: &MasterData, selection: &mut Selection) -> ApiResult<()> {
        if let Some(label) = selection.department.clone() {
            let name = master
                .department_by_label(&label)
                .map(|dept| dept.name.clone())
                .unwrap_or(label);
            if let Some(apps) = self.lookup(DataSource::AppDepartment, &name).await? {
                selection.department_applications = apps;
            }
        }
        if let Some(function) = selection.function.clone() {
            if let Some(apps) = self.lookup(DataSource::AppFunction, &function).await? {
                selection.function_applications = apps;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowSource;

    #[async_trait]
    impl SuggestionSource for SlowSource {
        async fn search_users(&self, query: &str) -> ApiResult<Vec<UserProfile>> {
            Ok(vec![UserProfile {
                id: "1".to_string(),
                email: format!("{}@example.com", query),
                name: query.to_string(),
                role: "admin".to_string(),
            }])
        }

        async fn mapped_applications(&self, _source: DataSource, upstream: &str) -> ApiResult<Vec<String>> {
            // The first selection answers slowly, the second one fast
            let delay = if upstream == "Finance" { 60 } else { 0 };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(vec![format!("{} App", upstream)])
        }
    }

    #[test]
    fn test_latest_request_generations() {
        let latest = LatestRequest::new();
        let first = latest.issue();
        let second = latest.issue();
        assert!(!latest.is_latest(first));
        assert_eq!(latest.accept(first, "old"), None);
        assert_eq!(latest.accept(second, "new"), Some("new"));
    }

    #[tokio::test]
    async fn test_debounce_drops_superseded_query() {
        let suggestions = UserSuggestions::new(&SlowSource, Duration::from_millis(40));
        let (first, second) = tokio::join!(suggestions.suggest("al"), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            suggestions.suggest("alice").await
        });

        assert_eq!(first.unwrap(), None);
        let users = second.unwrap().unwrap();
        assert_eq!(users[0].name, "alice");
    }

    #[tokio::test]
    async fn test_out_of_order_application_responses() {
        let lookup = ApplicationLookup::new(&SlowSource);
        let (slow, fast) = tokio::join!(lookup.lookup(DataSource::AppDepartment, "Finance"), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            lookup.lookup(DataSource::AppDepartment, "Legal").await
        });

        assert_eq!(slow.unwrap(), None);
        assert_eq!(fast.unwrap(), Some(vec!["Legal App".to_string()]));
    }

    #[tokio::test]
    async fn test_fill_selection() {
        let lookup = ApplicationLookup::new(&SlowSource);
        let mut selection = Selection {
            department: Some("Legal".to_string()),
            function: Some("Audit".to_string()),
            ..Selection::default()
        };
        lookup.fill(&MasterData::default(), &mut selection).await.unwrap();
        assert_eq!(selection.department_applications, vec!["Legal App"]);
        assert_eq!(selection.function_applications, vec!["Audit App"]);
    }
}
