//! Academy site backend
//!
//! Ties the workspace crates together: configuration loading for the hosted
//! content backend, plus re-exports used by the command-line entry point.

pub mod config;

pub use config::SiteConfig;
pub use content_client::{ContentClientConfig, MemoryStore, RestContentStore};
pub use site_core::{load_page, AdminPanel, AuthService, PageView};
pub use video_embed::{resolve_embed_url, VideoPlatform};
