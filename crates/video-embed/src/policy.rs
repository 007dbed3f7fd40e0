//! Per-platform validation policies

use serde::{Deserialize, Serialize};

/// How a missing VK `hash` parameter is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashRequirement {
    /// The link is rejected
    #[default]
    Required,
    /// A warning is logged and the link is accepted
    Advisory,
}

/// Validation rules applied to links of one platform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkPolicy {
    /// The input is used as-is
    #[default]
    PassThrough,
    /// A YouTube video id is extracted when possible, otherwise the input is used as-is
    YouTubeId,
    /// The input must be a VK `video_ext.php` embed link
    VkEmbed {
        /// Treatment of a missing `hash` parameter
        hash: HashRequirement,
    },
}

impl LinkPolicy {
    /// Whether this policy can reject an input
    pub fn is_strict(&self) -> bool {
        matches!(self, LinkPolicy::VkEmbed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strictness() {
        assert!(!LinkPolicy::PassThrough.is_strict());
        assert!(!LinkPolicy::YouTubeId.is_strict());
        assert!(LinkPolicy::VkEmbed {
            hash: HashRequirement::Advisory
        }
        .is_strict());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(LinkPolicy::default(), LinkPolicy::PassThrough);
        assert_eq!(HashRequirement::default(), HashRequirement::Required);
    }
}
