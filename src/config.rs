//! Site configuration. Backend URL, credentials, timeouts.

use content_client::{ContentClientConfig, CredentialStore};
use serde::Deserialize;
use site_core::AuthService;
use std::sync::Arc;
use std::time::Duration;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default admin session lifetime in minutes
pub const DEFAULT_SESSION_TTL_MINUTES: i64 = site_core::auth::DEFAULT_SESSION_TTL_MINUTES;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SiteConfig {
    /// Backend project URL. Read from ACADEMY_URL.
    #[serde(default)]
    pub url: Option<String>,

    /// Public (anon) API key. Read from ACADEMY_API_KEY.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds. Read from ACADEMY_TIMEOUT_SECS.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Retries for reads that fail with a network error. Read from ACADEMY_MAX_RETRIES.
    #[serde(default)]
    pub max_retries: Option<usize>,

    /// Admin session lifetime. Read from ACADEMY_SESSION_TTL_MINUTES.
    #[serde(default)]
    pub session_ttl_minutes: Option<i64>,
}

impl SiteConfig {
    /// Load `.env`, then `ACADEMY_*` variables and the optional file named by `ACADEMY_CONFIG`
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        if let Ok(path) = std::env::var("ACADEMY_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c = c.add_source(config::Environment::with_prefix("ACADEMY"));
        c.build()?.try_deserialize()
    }

    /// Request timeout. Defaults to 30 seconds.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Session lifetime. Defaults to 12 hours.
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.session_ttl_minutes.unwrap_or(DEFAULT_SESSION_TTL_MINUTES))
    }

    /// Admin sign-in service with the configured session lifetime
    pub fn auth_service<C: CredentialStore>(&self, credentials: Arc<C>) -> AuthService<C> {
        AuthService::new(credentials).with_ttl(self.session_ttl())
    }

    /// Client configuration for the backend; the URL and API key are required
    pub fn client_config(&self) -> Result<ContentClientConfig, config::ConfigError> {
        let url = self
            .url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| config::ConfigError::NotFound("ACADEMY_URL".into()))?;
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| config::ConfigError::NotFound("ACADEMY_API_KEY".into()))?;

        let mut client = ContentClientConfig::new(url, api_key).with_timeout(self.timeout());
        if let Some(max_retries) = self.max_retries {
            client = client.with_max_retries(max_retries);
        }
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = SiteConfig::default();
        assert_eq!(cfg.timeout(), Duration::from_secs(30));
        assert_eq!(cfg.session_ttl(), chrono::Duration::hours(12));
    }

    #[tokio::test]
    async fn test_auth_service_uses_session_ttl() {
        use content_client::{AdminUser, MemoryStore};
        use site_core::auth::password_digest;
        use site_core::AuthError;

        let store = Arc::new(MemoryStore::new().with_admin(AdminUser {
            id: "admin-1".into(),
            username: "admin".into(),
            password_hash: password_digest("secret"),
        }));

        let cfg = SiteConfig {
            session_ttl_minutes: Some(0),
            ..Default::default()
        };
        let auth = cfg.auth_service(Arc::clone(&store));
        let session = auth.sign_in("admin", "secret").await.unwrap();
        let err = auth.current_user(&session.token).await.unwrap_err();
        assert!(matches!(err, AuthError::SessionExpired));

        let auth = SiteConfig::default().auth_service(store);
        let session = auth.sign_in("admin", "secret").await.unwrap();
        assert!(session.expires_at > chrono::Utc::now() + chrono::Duration::hours(11));
    }

    #[test]
    fn test_client_config_requires_url_and_key() {
        let cfg = SiteConfig {
            api_key: Some("anon".into()),
            ..Default::default()
        };
        assert!(matches!(cfg.client_config(), Err(config::ConfigError::NotFound(_))));

        let cfg = SiteConfig {
            url: Some("https://project.supabase.co".into()),
            api_key: Some("  ".into()),
            ..Default::default()
        };
        assert!(cfg.client_config().is_err());
    }

    #[test]
    fn test_client_config() {
        let cfg = SiteConfig {
            url: Some("https://project.supabase.co/".into()),
            api_key: Some("anon".into()),
            timeout_secs: Some(5),
            max_retries: Some(4),
            session_ttl_minutes: None,
        };
        let client = cfg.client_config().unwrap();
        assert_eq!(client.base(), "https://project.supabase.co");
        assert_eq!(client.api_key, "anon");
        assert_eq!(client.timeout, Duration::from_secs(5));
        assert_eq!(client.max_retries, 4);
    }
}
