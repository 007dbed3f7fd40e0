//! Admin sessions
//!
//! Operators sign in against the `admin_users` table. A successful sign-in
//! issues an opaque token that expires after the configured lifetime.

use chrono::{DateTime, Duration, Utc};
use content_client::CredentialStore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Default session lifetime in minutes
pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 12 * 60;

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown user or wrong password
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// No session for the token
    #[error("No active session")]
    NoSession,

    /// The session outlived its lifetime
    #[error("Session expired")]
    SessionExpired,

    /// Credential lookup failed
    #[error("Backend error: {0}")]
    Backend(#[from] content_client::Error),
}

/// Result type for authentication operations
pub type Result<T> = std::result::Result<T, AuthError>;

/// A signed-in operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSession {
    /// Opaque session token
    pub token: String,
    /// Admin row id
    pub user_id: String,
    /// Login name
    pub username: String,
    /// When the session stops being valid
    pub expires_at: DateTime<Utc>,
}

impl AdminSession {
    /// Whether the session has expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Hex-encoded SHA-256 digest of a password, as stored in `password_hash`
pub fn password_digest(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Compare two strings without short-circuiting on the first difference
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Admin authentication service
///
/// ```rust,no_run
/// use content_client::{ContentClientConfig, RestContentStore};
/// use site_core::AuthService;
/// use std::sync::Arc;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let store = RestContentStore::new(ContentClientConfig::new("https://example.supabase.co", "key"))?;
/// let auth = AuthService::new(Arc::new(store));
/// let session = auth.sign_in("admin", "secret").await?;
/// println!("signed in until {}", session.expires_at);
/// # Ok(())
/// # }
/// ```
pub struct AuthService<C: CredentialStore> {
    credentials: Arc<C>,
    ttl: Duration,
    sessions: RwLock<HashMap<String, AdminSession>>,
}

impl<C: CredentialStore> AuthService<C> {
    /// Create a service with the default session lifetime
    pub fn new(credentials: Arc<C>) -> Self {
        Self {
            credentials,
            ttl: Duration::minutes(DEFAULT_SESSION_TTL_MINUTES),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Set the session lifetime
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sign in with a username and password
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<AdminSession> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let Some(user) = self.credentials.find_admin(username).await? else {
            tracing::info!(username = %username, "sign-in rejected: unknown user");
            return Err(AuthError::InvalidCredentials);
        };

        if !constant_time_eq(&password_digest(password), &user.password_hash.to_ascii_lowercase()) {
            tracing::info!(username = %username, "sign-in rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let now = Utc::now();
        let session = AdminSession {
            token: Uuid::new_v4().to_string(),
            user_id: user.id,
            username: user.username,
            expires_at: now + self.ttl,
        };

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, live| !live.is_expired_at(now));
        sessions.insert(session.token.clone(), session.clone());
        drop(sessions);
        tracing::info!(username = %session.username, "admin signed in");

        Ok(session)
    }

    /// End a session; unknown tokens are ignored
    pub async fn sign_out(&self, token: &str) {
        if let Some(session) = self.sessions.write().await.remove(token) {
            tracing::info!(username = %session.username, "admin signed out");
        }
    }

    /// The session behind a token
    ///
    /// Expired sessions are dropped and reported as [`AuthError::SessionExpired`].
    pub async fn current_user(&self, token: &str) -> Result<AdminSession> {
        let session = self
            .sessions
            .read()
            .await
            .get(token)
            .cloned()
            .ok_or(AuthError::NoSession)?;

        if session.is_expired_at(Utc::now()) {
            self.sessions.write().await.remove(token);
            return Err(AuthError::SessionExpired);
        }

        Ok(session)
    }

    /// Number of live sessions
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
