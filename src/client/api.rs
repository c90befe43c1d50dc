//! Thin JSON client for the Campus Events HTTP API

use std::time::Duration;
use reqwest::header::RETRY_AFTER;
use reqwest::multipart::Form;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use crate::utils::errors::{CampusEventsError, Result};

/// Error body rendered by the server
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub code: Option<String>,
}

/// Map a failed response back onto the error it was rendered from
pub fn error_from_response(status: StatusCode, body: ApiErrorBody, retry_after: Option<u64>) -> CampusEventsError {
    let message = if body.error.is_empty() {
        status.canonical_reason().unwrap_or("Request failed").to_string()
    } else {
        body.error
    };

    match status {
        StatusCode::UNAUTHORIZED => CampusEventsError::Authentication(message),
        StatusCode::FORBIDDEN => CampusEventsError::PermissionDenied(message),
        StatusCode::NOT_FOUND => CampusEventsError::NotFound(message),
        StatusCode::TOO_MANY_REQUESTS => CampusEventsError::RateLimitExceeded {
            retry_after_seconds: retry_after.unwrap_or(60),
        },
        StatusCode::BAD_GATEWAY => CampusEventsError::PaymentGateway(message),
        StatusCode::BAD_REQUEST if body.code.as_deref() == Some("CAPACITY_EXCEEDED") => {
            CampusEventsError::CapacityExceeded(message)
        }
        s if s.is_client_error() => CampusEventsError::Validation(message),
        _ => CampusEventsError::ServiceUnavailable(message),
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("campus-events-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Send the access token as a bearer header
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        debug!(path = path, "GET");
        let response = self.authorized(self.client.get(self.url(path))).send().await?;
        Self::decode(response).await
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        debug!(path = path, "POST");
        let response = self.authorized(self.client.post(self.url(path))).json(body).send().await?;
        Self::decode(response).await
    }

    pub async fn post_multipart<T: DeserializeOwned>(&self, path: &str, form: Form) -> Result<T> {
        debug!(path = path, "POST multipart");
        let response = self.authorized(self.client.post(self.url(path))).multipart(form).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let body = response.json::<ApiErrorBody>().await.unwrap_or_default();

        warn!(status = status.as_u16(), error = %body.error, "API request failed");
        Err(error_from_response(status, body, retry_after))
    }
}
