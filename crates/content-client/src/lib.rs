//! Content backend client for the academy site
//!
//! This crate provides typed records for the site's tables, the storage traits
//! the admin panel and public page depend on, and a REST implementation of
//! those traits for the hosted backend (PostgREST tables plus object storage).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod memory;
pub mod records;
pub mod rest;
pub mod rest_store;
pub mod store;

pub use config::ContentClientConfig;
pub use memory::MemoryStore;
pub use records::{
    AdminUser, CompanyLogo, CompanyLogoInput, Contact, ContactInput, Document, DocumentInput,
    ProgramCard, ProgramCardInput, Record, Review, ReviewInput, SiteContent, SiteContentEntry,
    Teacher, TeacherInput,
};
pub use rest::RestClient;
pub use rest_store::RestContentStore;
pub use store::{ContentBackend, CredentialStore, ObjectStorage, SiteContentStore, StoredObject, Table};

/// Result type for content backend operations
pub type Result<T> = std::result::Result<T, Error>;

/// Network failure statuses worth retrying
const RETRYABLE_STATUSES: [u16; 9] = [408, 425, 429, 500, 502, 503, 504, 522, 524];

/// Error types for content backend operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Request never produced a response
    #[error("Network error: {0}")]
    Network(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// API error with status code and message
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from server
        message: String,
    },

    /// The backend returned no row where one was expected
    #[error("Record not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Check if this is a network-related error that should be retried
    pub fn is_network_error(&self) -> bool {
        match self {
            Error::Network(_) => true,
            Error::Api { status, .. } => RETRYABLE_STATUSES.contains(status),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_types() {
        let err = Error::InvalidInput("test".to_string());
        assert!(err.to_string().contains("Invalid input"));
    }

    #[test]
    fn test_network_classification() {
        assert!(Error::Network("reset".into()).is_network_error());
        assert!(Error::Api { status: 503, message: "down".into() }.is_network_error());
        assert!(!Error::Api { status: 400, message: "bad".into() }.is_network_error());
        assert!(!Error::NotFound("x".into()).is_network_error());
    }

    #[test]
    fn test_api_error_display() {
        let err = Error::Api { status: 404, message: "relation does not exist".into() };
        let display = err.to_string();
        assert!(display.contains("404"));
        assert!(display.contains("relation does not exist"));
    }
}
