//! Core site logic for the academy site
//!
//! This crate contains the admin panel flows (form validation, saves and
//! uploads), public page assembly, and admin sessions. All video links go
//! through the shared resolver in `video-embed`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod admin;
pub mod auth;
pub mod forms;
pub mod render;

pub use admin::{AdminError, AdminPanel};
pub use auth::{AdminSession, AuthError, AuthService};
pub use forms::{video_badge, video_field_status, FormError, UploadFile, VideoFieldStatus};
pub use render::{fetch_page_data, load_page, stop_playback, with_autoplay, PageData, PageView, VideoFrame};
