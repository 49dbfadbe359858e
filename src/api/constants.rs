//! API constants and endpoint paths for the survey backend

/// Default base path of the REST API
pub const DEFAULT_BASE_PATH: &str = "/api/v1";

/// User agent sent with every request
pub const USER_AGENT: &str = "survey-admin/0.1";

/// Standard headers
pub mod headers {
    /// Content type for JSON requests
    pub const CONTENT_TYPE_JSON: &str = "application/json";

    /// Accept header for spreadsheet downloads
    pub const ACCEPT_XLSX: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
}

/// Relative endpoint paths
pub mod paths {
    pub const LOGIN: &str = "auth/login";
    pub const LOGOUT: &str = "auth/logout";
    pub const VALIDATE: &str = "auth/validate";
    pub const REFRESH: &str = "auth/refresh";

    pub const EVENTS: &str = "events";

    pub const USERS: &str = "users";
    pub const USERS_IMPORT: &str = "users/import";
    pub const USERS_EXPORT: &str = "users/export";
    pub const USERS_SEARCH: &str = "users/search";

    pub const MAPPED_BY_DEPARTMENT: &str = "applications/mapped/department";
    pub const MAPPED_BY_FUNCTION: &str = "applications/mapped/function";

    pub fn event(id: &str) -> String {
        format!("{}/{}", EVENTS, id)
    }

    pub fn event_action(id: &str, action: &str) -> String {
        format!("{}/{}/{}", EVENTS, id, action)
    }

    pub fn event_questions(id: &str) -> String {
        event_action(id, "questions")
    }

    pub fn question(id: &str) -> String {
        format!("questions/{}", id)
    }

    pub fn user(id: &str) -> String {
        format!("{}/{}", USERS, id)
    }
}

/// Join a base URL and base path into the API root without a trailing slash
pub fn api_root(base_url: &str, base_path: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    let base_path = base_path.trim_matches('/');
    if base_path.is_empty() {
        base_url.to_string()
    } else {
        format!("{}/{}", base_url, base_path)
    }
}

/// Build a full endpoint URL from the API root and a relative path
pub fn endpoint(api_root: &str, path: &str) -> String {
    format!("{}/{}", api_root, path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_root_joins_cleanly() {
        assert_eq!(api_root("https://host/", "/api/v1/"), "https://host/api/v1");
        assert_eq!(api_root("https://host", ""), "https://host");
        assert_eq!(
            endpoint("https://host/api/v1", "/events"),
            "https://host/api/v1/events"
        );
    }

    #[test]
    fn test_resource_paths() {
        assert_eq!(paths::event_questions("7"), "events/7/questions");
        assert_eq!(paths::question("12"), "questions/12");
        assert_eq!(paths::event_action("7", "publish"), "events/7/publish");
    }
}
