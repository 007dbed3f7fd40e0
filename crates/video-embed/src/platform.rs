//! Video platform tags and stored video references

use serde::{Deserialize, Serialize};
use std::fmt;

/// Video host a reference belongs to
///
/// Serialized as the lowercase tag stored in the `video_platform` column.
/// Tags other than `youtube` and `vk` are kept verbatim in [`VideoPlatform::Other`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VideoPlatform {
    /// YouTube
    #[default]
    YouTube,
    /// VK Video
    Vk,
    /// Any other tag
    Other(String),
}

impl VideoPlatform {
    /// Get the platform tag as a string
    pub fn as_str(&self) -> &str {
        match self {
            VideoPlatform::YouTube => "youtube",
            VideoPlatform::Vk => "vk",
            VideoPlatform::Other(tag) => tag,
        }
    }

    /// Parse a platform tag (case-insensitive, surrounding whitespace ignored)
    pub fn from_tag(tag: &str) -> Self {
        let normalized = tag.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "youtube" => VideoPlatform::YouTube,
            "vk" => VideoPlatform::Vk,
            _ => VideoPlatform::Other(normalized),
        }
    }
}

impl From<String> for VideoPlatform {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

impl From<&str> for VideoPlatform {
    fn from(tag: &str) -> Self {
        Self::from_tag(tag)
    }
}

impl From<VideoPlatform> for String {
    fn from(platform: VideoPlatform) -> Self {
        match platform {
            VideoPlatform::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for VideoPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A video reference as entered by an operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoReference {
    /// Platform whose rules apply
    pub platform: VideoPlatform,
    /// Link or embed markup exactly as entered
    pub raw_input: String,
}

impl VideoReference {
    /// Create a new video reference
    pub fn new(platform: VideoPlatform, raw_input: impl Into<String>) -> Self {
        Self {
            platform,
            raw_input: raw_input.into(),
        }
    }
}
