//! User management endpoints, including spreadsheet import/export

use super::client::{ApiResult, SurveyClient};
use super::constants::{headers, paths};
use super::error::ApiError;
use super::models::{ImportSummary, User, UserInput, UserProfile};
use reqwest::multipart::{Form, Part};
use std::path::Path;

const XLS_MIME: &str = "application/vnd.ms-excel";

impl SurveyClient {
    pub async fn list_users(&self) -> ApiResult<Vec<User>> {
        self.get(paths::USERS, &[]).await
    }

    pub async fn create_user(&self, input: &UserInput) -> ApiResult<User> {
        validate_user(input)?;
        self.post(paths::USERS, input).await
    }

    pub async fn update_user(&self, id: &str, input: &UserInput) -> ApiResult<User> {
        validate_user(input)?;
        self.put(&paths::user(id), input).await
    }

    pub async fn delete_user(&self, id: &str) -> ApiResult<()> {
        self.delete(&paths::user(id)).await
    }

    /// Admin users matching a free-text query, used for suggestions
    pub async fn search_users(&self, query: &str) -> ApiResult<Vec<UserProfile>> {
        self.get(paths::USERS_SEARCH, &[("q", query)]).await
    }

    /// Upload a spreadsheet of users for bulk creation/update
    pub async fn import_users(&self, path: &Path) -> ApiResult<ImportSummary> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("users.xlsx")
            .to_string();
        let mime = spreadsheet_mime(path)?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ApiError::validation(format!("Cannot read {}: {}", path.display(), e)))?;

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime)
            .map_err(|e| ApiError::validation(e.to_string()))?;
        let form = Form::new().part("file", part);

        log::info!("Uploading user import {}", path.display());
        self.post_multipart(paths::USERS_IMPORT, form).await
    }

    /// Download the backend's spreadsheet export of all users
    pub async fn export_users(&self) -> ApiResult<Vec<u8>> {
        self.get_bytes(paths::USERS_EXPORT, headers::ACCEPT_XLSX).await
    }
}

fn spreadsheet_mime(path: &Path) -> ApiResult<&'static str> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("xlsx") => Ok(headers::ACCEPT_XLSX),
        Some("xls") => Ok(XLS_MIME),
        _ => Err(ApiError::validation("Only .xlsx and .xls files can be imported")),
    }
}

pub fn validate_user(input: &UserInput) -> ApiResult<()> {
    let mut details = Vec::new();
    if !input.email.contains('@') {
        details.push("email: must be a valid address".to_string());
    }
    if input.name.trim().is_empty() {
        details.push("name: is required".to_string());
    }
    if input.role.trim().is_empty() {
        details.push("role: is required".to_string());
    }

    if details.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation {
            message: "User is incomplete".to_string(),
            details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spreadsheet_mime() {
        assert_eq!(spreadsheet_mime(Path::new("a.XLSX")).unwrap(), headers::ACCEPT_XLSX);
        assert_eq!(spreadsheet_mime(Path::new("a.xls")).unwrap(), XLS_MIME);
        assert!(spreadsheet_mime(Path::new("a.csv")).is_err());
    }

    #[test]
    fn test_validate_user() {
        let input = UserInput {
            email: "someone".to_string(),
            name: String::new(),
            role: "admin".to_string(),
            ..UserInput::default()
        };
        match validate_user(&input).unwrap_err() {
            ApiError::Validation { details, .. } => assert_eq!(details.len(), 2),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
