//! Authenticated session
//!
//! Tokens and the signed-in profile live in the local store under fixed
//! keys so they survive between runs.

use crate::api::client::ApiResult;
use crate::api::{ApiError, SurveyClient, UserProfile};
use crate::store::LocalStore;
use anyhow::{Context, Result};

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const USER_KEY: &str = "user";

pub struct Session {
    client: SurveyClient,
    store: LocalStore,
    user: Option<UserProfile>,
}

impl Session {
    /// Restore stored credentials and check them against the backend.
    /// Rejected tokens are cleared; if the backend is unreachable the
    /// stored profile is kept.
    pub async fn init(mut client: SurveyClient, store: LocalStore) -> Result<Self> {
        let token = store.get(ACCESS_TOKEN_KEY).await?;
        let stored_user: Option<UserProfile> = store.get_json(USER_KEY).await.unwrap_or_else(|e| {
            log::warn!("Discarding unreadable stored user: {}", e);
            None
        });

        client.set_token(token);
        let mut session = Self {
            client,
            store,
            user: None,
        };

        if session.client.token().is_none() {
            log::debug!("No stored session");
            return Ok(session);
        }

        match session.client.validate_token().await {
            Ok(user) => {
                log::info!("Restored session for {}", user.email);
                session.set_user(user).await?;
            }
            Err(error) if error.is_unauthorized() => {
                if !session.try_refresh().await? {
                    log::info!("Stored session is no longer valid: {}", error);
                    session.clear().await?;
                }
            }
            Err(error) => {
                log::warn!("Could not validate stored session: {}", error);
                session.user = stored_user;
            }
        }

        Ok(session)
    }

    async fn try_refresh(&mut self) -> Result<bool> {
        let Some(refresh_token) = self.store.get(REFRESH_TOKEN_KEY).await? else {
            return Ok(false);
        };

        let refreshed = match self.client.refresh_token(&refresh_token).await {
            Ok(refreshed) => refreshed,
            Err(error) => {
                log::debug!("Token refresh failed: {}", error);
                return Ok(false);
            }
        };

        self.store_tokens(&refreshed.access_token, refreshed.refresh_token.as_deref())
            .await?;
        match self.client.validate_token().await {
            Ok(user) => {
                log::info!("Refreshed session for {}", user.email);
                self.set_user(user).await?;
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }

    pub fn client(&self) -> &SurveyClient {
        &self.client
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.client.token().is_some()
    }

    /// Fail early for commands that need a signed-in user
    pub fn require_auth(&self) -> Result<&SurveyClient> {
        if !self.is_authenticated() {
            anyhow::bail!("Not logged in. Run 'survey-admin auth login' first");
        }
        Ok(&self.client)
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<UserProfile> {
        let response = self.client.login(email, password).await?;
        self.store_tokens(&response.access_token, response.refresh_token.as_deref())
            .await?;
        self.set_user(response.user.clone()).await?;
        log::info!("Logged in as {}", response.user.email);
        Ok(response.user)
    }

    /// Best-effort backend logout, then drop every stored value
    pub async fn logout(&mut self) -> Result<()> {
        if self.is_authenticated() {
            if let Err(error) = self.client.logout().await {
                log::warn!("Backend logout failed, clearing local session anyway: {}", error);
            }
        }
        self.clear().await
    }

    /// Pass a call result through, ending the session when the backend
    /// rejected the token
    pub async fn guard<T>(&mut self, result: ApiResult<T>) -> ApiResult<T> {
        if let Err(ApiError::Unauthorized(message)) = &result {
            log::info!("Session ended by backend: {}", message);
            if let Err(error) = self.clear().await {
                log::error!("Failed to clear session: {:#}", error);
            }
        }
        result
    }

    pub async fn clear(&mut self) -> Result<()> {
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY] {
            self.store.remove(key).await?;
        }
        self.client.set_token(None);
        self.user = None;
        Ok(())
    }

    async fn store_tokens(&mut self, access_token: &str, refresh_token: Option<&str>) -> Result<()> {
        self.store
            .set(ACCESS_TOKEN_KEY, access_token)
            .await
            .context("Failed to store access token")?;
        match refresh_token {
            Some(token) => self.store.set(REFRESH_TOKEN_KEY, token).await?,
            None => {
                self.store.remove(REFRESH_TOKEN_KEY).await?;
            }
        }
        self.client.set_token(Some(access_token.to_string()));
        Ok(())
    }

    async fn set_user(&mut self, user: UserProfile) -> Result<()> {
        self.store.set_json(USER_KEY, &user).await?;
        self.user = Some(user);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn offline_client() -> SurveyClient {
        SurveyClient::new("http://127.0.0.1:9", "/api/v1", Duration::from_millis(500)).unwrap()
    }

    fn profile() -> UserProfile {
        UserProfile {
            id: "1".to_string(),
            email: "admin@example.com".to_string(),
            name: "Admin".to_string(),
            role: "admin".to_string(),
        }
    }

    #[tokio::test]
    async fn test_empty_store_is_signed_out() {
        let store = LocalStore::new_test().await.unwrap();
        let session = Session::init(offline_client(), store).await.unwrap();
        assert!(!session.is_authenticated());
        assert!(session.require_auth().is_err());
    }

    #[tokio::test]
    async fn test_unreachable_backend_keeps_stored_session() {
        let store = LocalStore::new_test().await.unwrap();
        store.set(ACCESS_TOKEN_KEY, "token").await.unwrap();
        store.set_json(USER_KEY, &profile()).await.unwrap();

        let session = Session::init(offline_client(), store).await.unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.user(), Some(&profile()));
    }

    #[tokio::test]
    async fn test_unauthorized_result_clears_session() {
        let store = LocalStore::new_test().await.unwrap();
        store.set(ACCESS_TOKEN_KEY, "token").await.unwrap();
        store.set(REFRESH_TOKEN_KEY, "refresh").await.unwrap();
        let mut session = Session::init(offline_client(), store.clone()).await.unwrap();

        let result: ApiResult<()> = Err(ApiError::Unauthorized("jwt expired".to_string()));
        assert!(session.guard(result).await.is_err());
        assert!(!session.is_authenticated());
        assert_eq!(store.get(ACCESS_TOKEN_KEY).await.unwrap(), None);
        assert_eq!(store.get(REFRESH_TOKEN_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_logout_offline_still_clears() {
        let store = LocalStore::new_test().await.unwrap();
        store.set(ACCESS_TOKEN_KEY, "token").await.unwrap();
        let mut session = Session::init(offline_client(), store.clone()).await.unwrap();

        session.logout().await.unwrap();
        assert!(!session.is_authenticated());
        assert_eq!(store.get(ACCESS_TOKEN_KEY).await.unwrap(), None);
    }
}
