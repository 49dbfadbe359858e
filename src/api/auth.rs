//! Authentication endpoints

use super::client::{ApiResult, SurveyClient};
use super::constants::paths;
use super::error::ApiError;
use super::models::{LoginRequest, LoginResponse, RefreshResponse, UserProfile};
use serde_json::json;

impl SurveyClient {
    /// Exchange credentials for tokens. Empty fields are rejected before any
    /// request is sent.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<LoginResponse> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ApiError::validation("Email and password are required"));
        }

        log::info!("Logging in as {}", email);
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.post(paths::LOGIN, &request).await
    }

    pub async fn logout(&self) -> ApiResult<()> {
        let _: serde_json::Value = self.post(paths::LOGOUT, &json!({})).await?;
        Ok(())
    }

    /// Check the current token and return the profile it belongs to
    pub async fn validate_token(&self) -> ApiResult<UserProfile> {
        if self.token().is_none() {
            return Err(ApiError::Unauthorized("No token provided".to_string()));
        }

        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum ValidateData {
            Wrapped { user: UserProfile },
            Bare(UserProfile),
        }

        match self.get::<ValidateData>(paths::VALIDATE, &[]).await? {
            ValidateData::Wrapped { user } | ValidateData::Bare(user) => Ok(user),
        }
    }

    pub async fn refresh_token(&self, refresh_token: &str) -> ApiResult<RefreshResponse> {
        self.post(paths::REFRESH, &json!({ "refresh_token": refresh_token }))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_login_requires_credentials() {
        let client = SurveyClient::new("http://127.0.0.1:9", "/api/v1", Duration::from_secs(1)).unwrap();
        let error = client.login("  ", "secret").await.unwrap_err();
        assert!(matches!(error, ApiError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_validate_without_token_is_unauthorized() {
        let client = SurveyClient::new("http://127.0.0.1:9", "/api/v1", Duration::from_secs(1)).unwrap();
        assert!(client.validate_token().await.unwrap_err().is_unauthorized());
    }
}
