//! REST client implementation
//!
//! This module implements the HTTP plumbing shared by the table and storage
//! endpoints of the hosted backend: request/response types, error body
//! decoding, and retry with exponential backoff for network-class failures.

use crate::config::ContentClientConfig;
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

// =============================================================================
// Request Types
// =============================================================================

/// HTTP method for backend requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET request
    Get,
    /// POST request
    Post,
    /// PATCH request
    Patch,
    /// DELETE request
    Delete,
}

impl HttpMethod {
    /// Get the method name
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// Backend request
///
/// Query parameters keep their insertion order; PostgREST filters such as
/// `id=eq.<id>` are plain parameters.
#[derive(Debug, Clone)]
pub struct RestRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Path below the base URL (e.g., "rest/v1/teachers")
    pub path: String,
    /// Query parameters
    pub params: Vec<(String, String)>,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Request body
    pub body: Option<Vec<u8>>,
    /// Body content type
    pub content_type: Option<String>,
}

impl RestRequest {
    fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Vec::new(),
            headers: HashMap::new(),
            body: None,
            content_type: None,
        }
    }

    /// Create a GET request
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Create a POST request
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// Create a PATCH request
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    /// Create a DELETE request
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Add a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set a raw body with its content type
    pub fn body(mut self, body: Vec<u8>, content_type: impl Into<String>) -> Self {
        self.body = Some(body);
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the request body from JSON
    pub fn json_body<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self> {
        self.body = Some(serde_json::to_vec(value)?);
        self.content_type = Some("application/json".to_string());
        Ok(self)
    }

    /// Look up a query parameter
    pub fn param_value(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// Backend response
#[derive(Debug, Clone)]
pub struct RestResponse<T> {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HashMap<String, String>,
    /// Response data
    pub data: T,
}

impl<T> RestResponse<T> {
    /// Create a new response
    pub fn new(status: u16, headers: HashMap<String, String>, data: T) -> Self {
        Self {
            status,
            headers,
            data,
        }
    }

    /// Get a header value
    pub fn header(&self, key: &str) -> Option<&String> {
        self.headers.get(key)
    }

    /// Check if the response is successful (2xx status)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Error body returned by the table and storage endpoints
///
/// Tables answer `{code, message, details, hint}`, storage answers
/// `{statusCode, error, message}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Error code
    #[serde(default)]
    pub code: Option<String>,
    /// Short error name (storage)
    #[serde(default)]
    pub error: Option<String>,
    /// Human-readable message
    #[serde(default)]
    pub message: Option<String>,
    /// Hint for fixing the request
    #[serde(default)]
    pub hint: Option<String>,
}

impl ApiErrorBody {
    /// Best available description of the failure
    pub fn describe(&self) -> Option<String> {
        let message = self.message.as_deref().or(self.error.as_deref())?;
        Some(match &self.hint {
            Some(hint) => format!("{} ({})", message, hint),
            None => message.to_string(),
        })
    }
}

// =============================================================================
// Retry Logic with Exponential Backoff
// =============================================================================

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: usize,
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Backoff multiplier (e.g., 2.0 for exponential backoff)
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Create a new retry configuration
    pub fn new(max_retries: usize) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Set the initial delay
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the maximum delay
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the backoff multiplier
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    fn calculate_delay(&self, attempt: usize) -> Duration {
        let delay_ms =
            self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_millis(delay_ms as u64).min(self.max_delay)
    }
}

/// Retry an async operation while `should_retry` accepts its error
pub async fn retry<F, Fut, T, E>(
    config: RetryConfig,
    should_retry: impl Fn(&E) -> bool,
    mut operation: F,
) -> std::result::Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
{
    let mut attempts = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(err) => {
                attempts += 1;

                if !should_retry(&err) || attempts > config.max_retries {
                    return Err(err);
                }

                let delay = config.calculate_delay(attempts - 1);
                tracing::debug!(attempt = attempts, ?delay, "retrying backend request");
                sleep(delay).await;
            }
        }
    }
}

/// Retry network-class failures only
pub async fn network_retry<F, Fut, T>(config: RetryConfig, operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    retry(config, Error::is_network_error, operation).await
}

// =============================================================================
// Client Implementation
// =============================================================================

/// HTTP client for the hosted backend
///
/// # Examples
/// ```no_run
/// use content_client::rest::{RestClient, RestRequest};
/// use content_client::ContentClientConfig;
///
/// async fn example() -> content_client::Result<()> {
///     let config = ContentClientConfig::new("https://project.supabase.co", "anon-key");
///     let client = RestClient::new(config)?;
///
///     let request = RestRequest::get("rest/v1/teachers").param("select", "*");
///     let response = client.execute::<serde_json::Value>(&request).await?;
///     println!("{}", response.data);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RestClient {
    client: reqwest::Client,
    config: ContentClientConfig,
}

impl RestClient {
    /// Create a new client
    pub fn new(config: ContentClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { client, config })
    }

    /// Execute a request and decode its JSON body
    pub async fn execute<T: DeserializeOwned>(&self, request: &RestRequest) -> Result<RestResponse<T>> {
        let response = self.execute_raw(request).await?;
        let data: T = serde_json::from_str(&response.data)?;
        Ok(RestResponse::new(response.status, response.headers, data))
    }

    /// Execute a request, retrying network-class failures
    pub async fn execute_with_retry<T: DeserializeOwned>(
        &self,
        request: &RestRequest,
    ) -> Result<RestResponse<T>> {
        network_retry(RetryConfig::new(self.config.max_retries), || self.execute(request)).await
    }

    /// Execute a request and return the body text
    pub async fn execute_raw(&self, request: &RestRequest) -> Result<RestResponse<String>> {
        let url = self.url_for(&request.path);

        let mut req = match request.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Patch => self.client.patch(&url),
            HttpMethod::Delete => self.client.delete(&url),
        };

        if !request.params.is_empty() {
            req = req.query(&request.params);
        }

        if !self.config.api_key.is_empty() {
            req = req
                .header("apikey", &self.config.api_key)
                .bearer_auth(&self.config.api_key);
        }

        for (key, value) in &self.config.default_headers {
            req = req.header(key, value);
        }

        for (key, value) in &request.headers {
            req = req.header(key, value);
        }

        if let Some(body) = &request.body {
            if let Some(content_type) = &request.content_type {
                req = req.header("Content-Type", content_type);
            }
            req = req.body(body.clone());
        }

        tracing::debug!(method = request.method.as_str(), path = %request.path, "backend request");

        let response = req.send().await?;
        Self::read_response(response).await
    }

    async fn read_response(response: reqwest::Response) -> Result<RestResponse<String>> {
        let status = response.status().as_u16();

        let mut headers = HashMap::new();
        for (key, value) in response.headers() {
            if let Ok(value_str) = value.to_str() {
                headers.insert(key.to_string(), value_str.to_string());
            }
        }

        let success = response.status().is_success();
        let body = response.text().await?;

        if !success {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|b| b.describe())
                .unwrap_or_else(|| format!("HTTP {}: {}", status, body));
            tracing::warn!(status, %message, "backend request failed");
            return Err(Error::Api { status, message });
        }

        Ok(RestResponse::new(status, headers, body))
    }

    /// Absolute URL for a path below the base URL
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.config.base(), path.trim_start_matches('/'))
    }

    /// Get the client configuration
    pub fn config(&self) -> &ContentClientConfig {
        &self.config
    }
}
