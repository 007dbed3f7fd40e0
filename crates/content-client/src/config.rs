//! Client configuration

use std::collections::HashMap;
use std::time::Duration;

/// Configuration for the content backend client
#[derive(Debug, Clone)]
pub struct ContentClientConfig {
    /// Backend project URL (e.g., "https://xyzcompany.supabase.co")
    pub base_url: String,
    /// Public API key sent as `apikey` and bearer token
    pub api_key: String,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Retries for network-class failures
    pub max_retries: usize,
    /// Custom headers to include in all requests
    pub default_headers: HashMap<String, String>,
}

impl Default for ContentClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321".to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(30),
            user_agent: format!("academy-site/{}", env!("CARGO_PKG_VERSION")),
            max_retries: 2,
            default_headers: HashMap::new(),
        }
    }
}

impl ContentClientConfig {
    /// Create a new config for a backend URL and API key
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the retry count
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Add a default header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }

    /// Base URL without a trailing slash
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
