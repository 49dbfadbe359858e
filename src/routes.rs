//! Admin console routes
//!
//! Parses and renders the console's paths, and handles the legacy
//! `/admin/login` redirect with its `next` target.

use crate::api::models::MasterDataKind;
use clap::ValueEnum;
use std::fmt;

pub const LOGIN_PATH: &str = "/login";
pub const LEGACY_LOGIN_PATH: &str = "/admin/login";

/// Exact paths a login may hand over to
const NEXT_ALLOW_LIST: &[&str] = &["/dashboard", "/events", "/events/new", "/users"];

/// Prefixes a login may hand over to
const NEXT_ALLOW_PREFIXES: &[&str] = &["/events/", "/master-data/"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
    Events,
    NewEvent,
    Builder(String),
    Operations(String),
    MasterData(MasterDataKind),
    Users,
}

impl Route {
    pub fn parse(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let route = match segments.as_slice() {
            ["login"] => Self::Login,
            ["dashboard"] | [] => Self::Dashboard,
            ["events"] => Self::Events,
            ["events", "new"] => Self::NewEvent,
            ["events", id, "builder"] => Self::Builder(id.to_string()),
            ["events", id, "operations"] => Self::Operations(id.to_string()),
            ["master-data", kind] => Self::MasterData(MasterDataKind::from_str(kind, true).ok()?),
            ["users"] => Self::Users,
            _ => return None,
        };
        Some(route)
    }

    pub fn path(&self) -> String {
        match self {
            Self::Login => LOGIN_PATH.to_string(),
            Self::Dashboard => "/dashboard".to_string(),
            Self::Events => "/events".to_string(),
            Self::NewEvent => "/events/new".to_string(),
            Self::Builder(id) => format!("/events/{}/builder", id),
            Self::Operations(id) => format!("/events/{}/operations", id),
            Self::MasterData(kind) => format!("/master-data/{}", kind.path()),
            Self::Users => "/users".to_string(),
        }
    }

    /// Routes reachable without a session
    pub fn is_public(&self) -> bool {
        matches!(self, Self::Login)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Keep a `next` target only when it points at a known admin path
pub fn sanitize_next(next: &str) -> Option<String> {
    let next = next.trim();
    // Reject absolute and protocol-relative URLs
    if !next.starts_with('/') || next.starts_with("//") || next.contains("://") {
        return None;
    }

    let path = next.split(['?', '#']).next().unwrap_or_default();
    let allowed = NEXT_ALLOW_LIST.contains(&path)
        || NEXT_ALLOW_PREFIXES
            .iter()
            .any(|prefix| path.starts_with(prefix) && path.len() > prefix.len());

    (allowed && Route::parse(path).is_some()).then(|| next.to_string())
}

/// Redirect target for a request to the legacy login path.
/// `query` is the raw query string without the leading `?`.
pub fn legacy_login_redirect(query: &str) -> String {
    let next = query
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "next")
        .and_then(|(_, value)| urlencoding::decode(value).ok())
        .and_then(|value| sanitize_next(&value));

    match next {
        Some(next) => format!("{}?next={}", LOGIN_PATH, urlencoding::encode(&next)),
        None => LOGIN_PATH.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_render() {
        assert_eq!(Route::parse("/events/12/builder"), Some(Route::Builder("12".to_string())));
        assert_eq!(
            Route::parse("/master-data/business-units"),
            Some(Route::MasterData(MasterDataKind::BusinessUnits))
        );
        assert_eq!(Route::parse("/events/new?x=1"), Some(Route::NewEvent));
        assert_eq!(Route::parse("/settings"), None);
        assert_eq!(Route::Operations("4".to_string()).path(), "/events/4/operations");
    }

    #[test]
    fn test_next_allow_list() {
        assert_eq!(sanitize_next("/events/9/builder").as_deref(), Some("/events/9/builder"));
        assert_eq!(sanitize_next("/users").as_deref(), Some("/users"));
        assert_eq!(sanitize_next("https://evil.example.com"), None);
        assert_eq!(sanitize_next("//evil.example.com/events"), None);
        assert_eq!(sanitize_next("/login"), None);
        assert_eq!(sanitize_next("/events/"), None);
    }

    #[test]
    fn test_legacy_login_redirect() {
        assert_eq!(
            legacy_login_redirect("next=%2Fevents%2F3%2Fbuilder"),
            "/login?next=%2Fevents%2F3%2Fbuilder"
        );
        assert_eq!(legacy_login_redirect("next=https%3A%2F%2Fevil.com"), "/login");
        assert_eq!(legacy_login_redirect(""), "/login");
    }
}
