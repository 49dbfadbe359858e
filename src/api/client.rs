use super::constants::{self, headers};
use super::error::{ApiError, flatten_details};
use super::models::ApiEnvelope;
use crate::config::ApiConfig;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

/// REST client for the survey backend with connection pooling
#[derive(Clone)]
pub struct SurveyClient {
    api_root: String,
    http_client: reqwest::Client,
    access_token: Option<String>,
}

impl SurveyClient {
    pub fn new(base_url: &str, base_path: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(constants::USER_AGENT)
            .build()?;

        Ok(Self::with_custom_client(base_url, base_path, http_client))
    }

    pub fn from_config(config: &ApiConfig) -> anyhow::Result<Self> {
        Self::new(
            &config.base_url,
            &config.base_path,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Create a new client with custom HTTP client configuration
    pub fn with_custom_client(base_url: &str, base_path: &str, http_client: reqwest::Client) -> Self {
        Self {
            api_root: constants::api_root(base_url, base_path),
            http_client,
            access_token: None,
        }
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.access_token = token;
    }

    pub fn token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn endpoint(&self, path: &str) -> String {
        constants::endpoint(&self.api_root, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.endpoint(path);
        log::debug!("{} {}", method, url);

        let builder = self.http_client.request(method, url);
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> ApiResult<T> {
        let request = self
            .request(Method::GET, path)
            .header("Accept", headers::CONTENT_TYPE_JSON)
            .query(query);
        self.send(request).await
    }

    pub(crate) async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<T> {
        let request = self.request(Method::POST, path).json(body);
        self.send(request).await
    }

    pub(crate) async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<T> {
        let request = self.request(Method::PUT, path).json(body);
        self.send(request).await
    }

    pub(crate) async fn delete(&self, path: &str) -> ApiResult<()> {
        let request = self.request(Method::DELETE, path);
        let _: Value = self.send(request).await?;
        Ok(())
    }

    pub(crate) async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> ApiResult<T> {
        let request = self.request(Method::POST, path).multipart(form);
        self.send(request).await
    }

    /// Download a binary payload such as a spreadsheet export
    pub(crate) async fn get_bytes(&self, path: &str, accept: &str) -> ApiResult<Vec<u8>> {
        let response = self
            .request(Method::GET, path)
            .header("Accept", accept)
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(&e))?;

        let status = response.status();
        log::debug!("Download status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(failure_from_body(status, &body));
        }

        let bytes = response.bytes().await.map_err(|e| ApiError::from_reqwest(&e))?;
        Ok(bytes.to_vec())
    }

    /// Send a request and unwrap the `{success, data}` envelope
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = request.send().await.map_err(|e| {
            log::warn!("Request failed before a response arrived: {}", e);
            ApiError::from_reqwest(&e)
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ApiError::from_reqwest(&e))?;
        log::debug!("Response status: {} ({} bytes)", status, body.len());

        parse_envelope(status, &body)
    }
}

/// Decode a response body into the envelope's `data`, classifying failures
pub fn parse_envelope<T: DeserializeOwned>(status: StatusCode, body: &str) -> ApiResult<T> {
    let envelope: ApiEnvelope = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(e) if status.is_success() => {
            return Err(ApiError::Decode(e.to_string()));
        }
        Err(_) => return Err(failure_from_body(status, body)),
    };

    if !status.is_success() || !envelope.success {
        let details = envelope
            .details
            .as_ref()
            .map(flatten_details)
            .unwrap_or_default();
        let status = if status.is_success() {
            StatusCode::BAD_REQUEST
        } else {
            status
        };
        let error = ApiError::from_failure(status, envelope.failure_message(), details);
        log::debug!("Backend reported failure: {}", error);
        return Err(error);
    }

    let data = envelope.data.unwrap_or(Value::Null);
    serde_json::from_value(data).map_err(|e| ApiError::Decode(e.to_string()))
}

fn failure_from_body(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<ApiEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.failure_message())
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty() && trimmed.len() < 500).then(|| trimmed.to_string())
        });
    ApiError::from_failure(status, message, Vec::new())
}
