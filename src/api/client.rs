use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use tracing::{debug, warn};

use crate::api::http_client::{HttpClient, HttpMethod, SimpleHttpResponse};
use crate::error::{self, StorefrontError, StorefrontResult};
use crate::session::AuthService;

/// Thin JSON client for the storefront REST backend.
///
/// Adds the bearer token of the current session to every request and
/// unwraps `{ "data": ... }` envelopes.
pub struct ApiClient {
    http: Arc<dyn HttpClient>,
    base_url: String,
    auth: Arc<AuthService>,
    max_get_attempts: usize,
}

impl ApiClient {
    pub fn new(http: Arc<dyn HttpClient>, base_url: impl Into<String>, auth: Arc<AuthService>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
            max_get_attempts: 1,
        }
    }

    /// Retry GETs that fail before a response arrives
    pub fn with_max_get_attempts(mut self, attempts: usize) -> Self {
        self.max_get_attempts = attempts.max(1);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> StorefrontResult<T> {
        let url = self.url(path);
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(50)
            .max_delay(Duration::from_secs(2))
            .map(jitter)
            .take(self.max_get_attempts - 1);

        let response = RetryIf::spawn(
            strategy,
            || {
                let url = url.clone();
                async move {
                    self.http
                        .send(HttpMethod::GET, &url, self.headers(false), None)
                        .await
                        .map_err(|e| {
                            warn!(url = %url, error = %e, "GET failed before a response arrived");
                            e
                        })
                }
            },
            |e: &StorefrontError| e.is_retryable(),
        )
        .await?;

        decode(path, response)
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> StorefrontResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_string(body)?;
        let response = self.execute(HttpMethod::POST, path, Some(body)).await?;
        decode(path, response)
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> StorefrontResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_string(body)?;
        let response = self.execute(HttpMethod::PUT, path, Some(body)).await?;
        decode(path, response)
    }

    pub async fn delete(&self, path: &str) -> StorefrontResult<()> {
        let response = self.execute(HttpMethod::DELETE, path, None).await?;
        decode::<Value>(path, response).map(|_| ())
    }

    async fn execute(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<String>,
    ) -> StorefrontResult<SimpleHttpResponse> {
        let url = self.url(path);
        debug!(method = %method, url = %url, "Sending API request");
        self.http
            .send(method, &url, self.headers(body.is_some()), body)
            .await
    }

    fn headers(&self, has_body: bool) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert(
            http::header::ACCEPT.as_str().to_string(),
            "application/json".to_string(),
        );
        if has_body {
            headers.insert(
                http::header::CONTENT_TYPE.as_str().to_string(),
                "application/json".to_string(),
            );
        }
        if let Some(bearer) = self.auth.bearer_header() {
            headers.insert(http::header::AUTHORIZATION.as_str().to_string(), bearer);
        }
        headers
    }
}

/// Turn a response into `T` or a typed error
fn decode<T: DeserializeOwned>(endpoint: &str, response: SimpleHttpResponse) -> StorefrontResult<T> {
    let status = response.status();
    let body = response.body().trim();

    if !response.is_success() {
        let parsed: Option<Value> = serde_json::from_str(body).ok();
        let message = parsed
            .as_ref()
            .and_then(|v| v.get("message").or_else(|| v.get("error")))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| (!body.is_empty()).then(|| body.to_string()))
            .or_else(|| {
                http::StatusCode::from_u16(status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| format!("HTTP {}", status));
        debug!(endpoint, status, message = %message, "API request rejected");
        return Err(error::api_request_failed(endpoint, status, message));
    }

    let value: Value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(body).map_err(|e| error::api_response_invalid(endpoint, e))?
    };

    let payload = match value {
        Value::Object(mut map) => match map.remove("data") {
            Some(data) => data,
            None => Value::Object(map),
        },
        other => other,
    };

    serde_json::from_value(payload).map_err(|e| error::api_response_invalid(endpoint, e))
}
