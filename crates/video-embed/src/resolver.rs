//! Video link resolution
//!
//! Turns a raw video reference into an embed URL suitable for an iframe `src`.
//! Operators paste one of:
//!
//! - a bare link (`https://youtu.be/dQw4w9WgXcQ`),
//! - a link without a scheme (`vkvideo.ru/video_ext.php?oid=…`),
//! - the full iframe snippet copied from the platform's share dialog.
//!
//! Resolution never fails with a panic or an `Err` at the call site: every
//! outcome is an [`EmbedResolution`] the caller can show inline or render as a
//! placeholder.

use crate::platform::{VideoPlatform, VideoReference};
use crate::policy::{HashRequirement, LinkPolicy};
use regex::Regex;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::OnceLock;
use thiserror::Error;
use url::Url;

/// Marker every VK embed link contains
const VK_EMBED_MARKER: &str = "video_ext.php";

/// YouTube embed URL prefix
const YOUTUBE_EMBED_BASE: &str = "https://www.youtube.com/embed/";

/// Errors produced while resolving a video link
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmbedError {
    /// Nothing was entered
    #[error("URL cannot be empty")]
    EmptyInput,

    /// Embed markup was pasted but carries no usable `src`
    #[error("Could not extract URL from embed markup")]
    UnextractableEmbed,

    /// Not a VK embed link
    #[error(
        "Invalid format: use a VK embed link containing video_ext.php \
         (e.g. https://vkvideo.ru/video_ext.php?oid=-157301945&id=456239025&hash=0998d1d02641da56) \
         or the full iframe code"
    )]
    UnrecognizedUrlShape,

    /// URL parser rejected the link
    #[error("Malformed URL: {0}")]
    MalformedUrl(String),

    /// `oid` or `id` is missing
    #[error("URL must contain oid and id parameters")]
    MissingRequiredParameter,

    /// `hash` is missing
    #[error("URL does not contain the required hash parameter; the video may not play without it")]
    MissingHashParameter,
}

impl EmbedError {
    /// Whether the error concerns the optional-looking `hash` parameter
    pub fn is_hash_related(&self) -> bool {
        matches!(self, EmbedError::MissingHashParameter)
    }
}

/// Outcome of resolving a video link
///
/// Either a valid embed URL or an error, never both. Serializes to
/// `{ "valid": bool, "embed_url"?: string, "error"?: string }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedResolution {
    outcome: Result<String, EmbedError>,
}

impl EmbedResolution {
    /// A successful resolution
    pub fn valid(embed_url: impl Into<String>) -> Self {
        Self {
            outcome: Ok(embed_url.into()),
        }
    }

    /// A failed resolution
    pub fn invalid(error: EmbedError) -> Self {
        Self {
            outcome: Err(error),
        }
    }

    /// Whether an embed URL was produced
    pub fn is_valid(&self) -> bool {
        self.outcome.is_ok()
    }

    /// The embed URL, if valid
    pub fn embed_url(&self) -> Option<&str> {
        self.outcome.as_deref().ok()
    }

    /// The error, if invalid
    pub fn error(&self) -> Option<&EmbedError> {
        self.outcome.as_ref().err()
    }

    /// Borrow the outcome as a `Result`
    pub fn as_result(&self) -> Result<&str, &EmbedError> {
        self.outcome.as_deref()
    }

    /// Convert into a `Result`
    pub fn into_result(self) -> Result<String, EmbedError> {
        self.outcome
    }
}

impl From<Result<String, EmbedError>> for EmbedResolution {
    fn from(outcome: Result<String, EmbedError>) -> Self {
        Self { outcome }
    }
}

#[derive(Serialize)]
struct ResolutionWire<'a> {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    embed_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Serialize for EmbedResolution {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        ResolutionWire {
            valid: self.is_valid(),
            embed_url: self.embed_url(),
            error: self.error().map(ToString::to_string),
        }
        .serialize(serializer)
    }
}

/// Resolves video references using a per-platform policy table
///
/// Platforms without an entry are passed through unchanged.
///
/// # Examples
/// ```
/// use video_embed::{VideoLinkResolver, VideoPlatform};
///
/// let resolver = VideoLinkResolver::new();
/// let resolution = resolver.resolve("https://youtu.be/dQw4w9WgXcQ", &VideoPlatform::YouTube);
/// assert_eq!(
///     resolution.embed_url(),
///     Some("https://www.youtube.com/embed/dQw4w9WgXcQ")
/// );
/// ```
#[derive(Debug, Clone)]
pub struct VideoLinkResolver {
    policies: HashMap<VideoPlatform, LinkPolicy>,
}

impl Default for VideoLinkResolver {
    fn default() -> Self {
        let mut policies = HashMap::new();
        policies.insert(VideoPlatform::YouTube, LinkPolicy::YouTubeId);
        policies.insert(
            VideoPlatform::Vk,
            LinkPolicy::VkEmbed {
                hash: HashRequirement::Required,
            },
        );
        Self { policies }
    }
}

impl VideoLinkResolver {
    /// Create a resolver with the standard YouTube and VK policies
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the policy for a platform
    pub fn with_policy(mut self, platform: VideoPlatform, policy: LinkPolicy) -> Self {
        self.policies.insert(platform, policy);
        self
    }

    /// Get the policy applied to a platform
    pub fn policy(&self, platform: &VideoPlatform) -> LinkPolicy {
        self.policies.get(platform).copied().unwrap_or_default()
    }

    /// Resolve a raw input for a platform
    pub fn resolve(&self, raw_input: &str, platform: &VideoPlatform) -> EmbedResolution {
        let outcome = match self.policy(platform) {
            LinkPolicy::PassThrough => Ok(raw_input.to_string()),
            LinkPolicy::YouTubeId => Ok(resolve_youtube(raw_input)),
            LinkPolicy::VkEmbed { hash } => resolve_vk(raw_input, hash),
        };

        match &outcome {
            Ok(embed_url) => {
                tracing::debug!(platform = %platform, embed_url = %embed_url, "video link resolved")
            }
            Err(error) => {
                tracing::debug!(platform = %platform, error = %error, "video link rejected")
            }
        }

        outcome.into()
    }

    /// Resolve a stored video reference
    pub fn resolve_reference(&self, reference: &VideoReference) -> EmbedResolution {
        self.resolve(&reference.raw_input, &reference.platform)
    }
}

/// Process-wide resolver with the standard policies
pub fn default_resolver() -> &'static VideoLinkResolver {
    static RESOLVER: OnceLock<VideoLinkResolver> = OnceLock::new();
    RESOLVER.get_or_init(VideoLinkResolver::new)
}

/// Resolve a raw input with the standard policies
pub fn resolve_embed_url(raw_input: &str, platform: &VideoPlatform) -> EmbedResolution {
    default_resolver().resolve(raw_input, platform)
}

/// Extract the embeddable URL from a raw input
///
/// Returns `None` for blank input. When the input is iframe markup, the value
/// of its first `src` attribute is returned as written; otherwise the trimmed
/// input is assumed to already be a URL.
pub fn extract_embeddable_source(raw_input: &str) -> Option<String> {
    match locate_source(raw_input) {
        Ok(source) => Some(source.to_string()),
        Err(EmbedError::EmptyInput) => None,
        Err(_) => Some(raw_input.trim().to_string()),
    }
}

fn youtube_id_regex() -> &'static Regex {
    static YOUTUBE_ID_REGEX: OnceLock<Regex> = OnceLock::new();
    YOUTUBE_ID_REGEX.get_or_init(|| {
        Regex::new(
            r"(?:youtube\.com/(?:watch\?(?:[^#\s]*&)?v=|embed/|v/)|youtu\.be/)([A-Za-z0-9_-]{11})",
        )
        .expect("YouTube id pattern is valid")
    })
}

fn src_attribute_regex() -> &'static Regex {
    static SRC_ATTRIBUTE_REGEX: OnceLock<Regex> = OnceLock::new();
    SRC_ATTRIBUTE_REGEX.get_or_init(|| {
        Regex::new(r#"(?i)(?:^|[^\w-])src\s*=\s*(?:"([^"]+)"|'([^']+)')"#)
            .expect("src attribute pattern is valid")
    })
}

fn contains_embed_tag(input: &str) -> bool {
    input.to_ascii_lowercase().contains("<iframe")
}

/// Locate the URL inside a raw input, distinguishing blank input from markup without `src`
fn locate_source(raw_input: &str) -> Result<&str, EmbedError> {
    let trimmed = raw_input.trim();
    if trimmed.is_empty() {
        return Err(EmbedError::EmptyInput);
    }

    if !contains_embed_tag(trimmed) {
        return Ok(trimmed);
    }

    let captures = src_attribute_regex()
        .captures(trimmed)
        .ok_or(EmbedError::UnextractableEmbed)?;
    let source = captures
        .get(1)
        .or_else(|| captures.get(2))
        .map(|m| m.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or(EmbedError::UnextractableEmbed)?;

    tracing::debug!(source = %source, "extracted src from embed markup");
    Ok(source)
}

fn resolve_youtube(raw_input: &str) -> String {
    match youtube_id_regex().captures(raw_input).and_then(|c| c.get(1)) {
        Some(id) => format!("{}{}", YOUTUBE_EMBED_BASE, id.as_str()),
        None => raw_input.to_string(),
    }
}

fn with_https_scheme(source: &str) -> Cow<'_, str> {
    let lower = source.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Cow::Borrowed(source)
    } else if source.starts_with("//") {
        Cow::Owned(format!("https:{}", source))
    } else {
        Cow::Owned(format!("https://{}", source))
    }
}

fn query_value(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

fn resolve_vk(raw_input: &str, hash: HashRequirement) -> Result<String, EmbedError> {
    let source = locate_source(raw_input)?;
    let candidate = with_https_scheme(source.trim());

    if !candidate.contains(VK_EMBED_MARKER) {
        return Err(EmbedError::UnrecognizedUrlShape);
    }

    let mut url = Url::parse(&candidate).map_err(|e| EmbedError::MalformedUrl(e.to_string()))?;

    if query_value(&url, "oid").is_none() || query_value(&url, "id").is_none() {
        return Err(EmbedError::MissingRequiredParameter);
    }

    if query_value(&url, "hash").is_none() {
        match hash {
            HashRequirement::Required => return Err(EmbedError::MissingHashParameter),
            HashRequirement::Advisory => {
                tracing::warn!(url = %url, "VK link has no hash parameter, video may not play")
            }
        }
    }

    if !url.query_pairs().any(|(key, _)| key == "hd") {
        url.query_pairs_mut().append_pair("hd", "2");
    }

    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VK_LINK: &str =
        "https://vkvideo.ru/video_ext.php?oid=-157301945&id=456239025&hash=0998d1d02641da56";

    fn vk(input: &str) -> EmbedResolution {
        resolve_embed_url(input, &VideoPlatform::Vk)
    }

    fn youtube(input: &str) -> EmbedResolution {
        resolve_embed_url(input, &VideoPlatform::YouTube)
    }

    // Extraction tests

    #[test]
    fn test_extract_blank_input() {
        assert_eq!(extract_embeddable_source(""), None);
        assert_eq!(extract_embeddable_source("   \n\t"), None);
    }

    #[test]
    fn test_extract_plain_url_is_trimmed() {
        assert_eq!(
            extract_embeddable_source("  https://example.com/video  "),
            Some("https://example.com/video".to_string())
        );
    }

    #[test]
    fn test_extract_from_iframe_double_quotes() {
        let markup = format!(
            r#"<iframe src="{}" width="853" height="480" allow="autoplay" frameborder="0" allowfullscreen></iframe>"#,
            VK_LINK
        );
        assert_eq!(extract_embeddable_source(&markup), Some(VK_LINK.to_string()));
    }

    #[test]
    fn test_extract_from_iframe_single_quotes_and_attribute_order() {
        let markup = format!(
            "<IFRAME width='853' height='480' SRC='{}' frameborder='0'></IFRAME>",
            VK_LINK
        );
        assert_eq!(extract_embeddable_source(&markup), Some(VK_LINK.to_string()));
    }

    #[test]
    fn test_extract_ignores_data_src() {
        let markup = format!(
            r#"<iframe data-src="https://other.example/x" src="{}"></iframe>"#,
            VK_LINK
        );
        assert_eq!(extract_embeddable_source(&markup), Some(VK_LINK.to_string()));
    }

    #[test]
    fn test_extract_src_without_leading_space() {
        let markup = format!(r#"<iframe width="853"src="{}"></iframe>"#, VK_LINK);
        assert_eq!(extract_embeddable_source(&markup), Some(VK_LINK.to_string()));
        assert!(vk(&markup).is_valid());
    }

    #[test]
    fn test_extract_data_src_alone_is_not_src() {
        let markup = format!(r#"<iframe data-src="{}"></iframe>"#, VK_LINK);
        assert_eq!(extract_embeddable_source(&markup), Some(markup.clone()));
        assert_eq!(vk(&markup).error(), Some(&EmbedError::UnextractableEmbed));
    }

    #[test]
    fn test_extract_keeps_src_value_verbatim() {
        assert_eq!(
            extract_embeddable_source(r#"<iframe src=" https://x/y "></iframe>"#),
            Some(" https://x/y ".to_string())
        );
        let markup = format!(r#"<iframe src=" {} "></iframe>"#, VK_LINK);
        assert_eq!(vk(&markup).embed_url(), Some(format!("{}&hd=2", VK_LINK).as_str()));
    }

    #[test]
    fn test_extract_markup_without_src_returns_input() {
        let markup = r#"<iframe width="853"></iframe>"#;
        assert_eq!(extract_embeddable_source(markup), Some(markup.to_string()));
    }

    // YouTube tests

    #[test]
    fn test_youtube_link_shapes() {
        let inputs = [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/v/dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "youtu.be/dQw4w9WgXcQ?t=42",
        ];

        for input in inputs {
            let resolution = youtube(input);
            assert!(resolution.is_valid(), "{} should be valid", input);
            assert_eq!(
                resolution.embed_url(),
                Some("https://www.youtube.com/embed/dQw4w9WgXcQ"),
                "{}",
                input
            );
        }
    }

    #[test]
    fn test_youtube_id_with_dash_and_underscore() {
        let resolution = youtube("https://youtu.be/a-b_c-d_e-f");
        assert_eq!(resolution.embed_url(), Some("https://www.youtube.com/embed/a-b_c-d_e-f"));
    }

    #[test]
    fn test_youtube_pass_through() {
        let resolution = youtube("not a url at all");
        assert!(resolution.is_valid());
        assert_eq!(resolution.embed_url(), Some("not a url at all"));
        assert!(resolution.error().is_none());
    }

    #[test]
    fn test_youtube_short_id_passes_through() {
        let resolution = youtube("https://youtu.be/abc");
        assert_eq!(resolution.embed_url(), Some("https://youtu.be/abc"));
    }

    // VK tests

    #[test]
    fn test_vk_bare_link_gets_hd() {
        let resolution = vk(VK_LINK);
        assert!(resolution.is_valid());
        let url = resolution.embed_url().unwrap();
        assert!(url.contains("oid=-157301945"));
        assert!(url.contains("id=456239025"));
        assert!(url.contains("hash=0998d1d02641da56"));
        assert!(url.ends_with("&hd=2"));
    }

    #[test]
    fn test_vk_existing_hd_kept() {
        let input = format!("{}&hd=1", VK_LINK);
        let resolution = vk(&input);
        assert_eq!(resolution.embed_url(), Some(input.as_str()));
    }

    #[test]
    fn test_vk_iframe_markup() {
        let markup = format!(
            r#"<iframe src="{}" width="853" height="480" frameborder="0" allowfullscreen></iframe>"#,
            VK_LINK
        );
        let resolution = vk(&markup);
        assert_eq!(resolution.embed_url(), Some(format!("{}&hd=2", VK_LINK).as_str()));
    }

    #[test]
    fn test_vk_scheme_added() {
        let resolution =
            vk("vkvideo.ru/video_ext.php?oid=-157301945&id=456239025&hash=0998d1d02641da56");
        assert_eq!(resolution.embed_url(), Some(format!("{}&hd=2", VK_LINK).as_str()));
    }

    #[test]
    fn test_vk_protocol_relative_link() {
        let resolution =
            vk("//vkvideo.ru/video_ext.php?oid=-157301945&id=456239025&hash=0998d1d02641da56");
        assert_eq!(resolution.embed_url(), Some(format!("{}&hd=2", VK_LINK).as_str()));
    }

    #[test]
    fn test_vk_empty_input() {
        assert_eq!(vk("").error(), Some(&EmbedError::EmptyInput));
        assert_eq!(vk("   ").error(), Some(&EmbedError::EmptyInput));
        assert!(!vk("").is_valid());
    }

    #[test]
    fn test_vk_markup_without_src() {
        let resolution = vk(r#"<iframe width="853" height="480"></iframe>"#);
        assert_eq!(resolution.error(), Some(&EmbedError::UnextractableEmbed));
    }

    #[test]
    fn test_vk_regular_page_link_rejected() {
        let resolution = vk("https://vk.com/video-157301945_456239025");
        assert_eq!(resolution.error(), Some(&EmbedError::UnrecognizedUrlShape));
        assert!(resolution.error().unwrap().to_string().contains("video_ext.php"));
    }

    #[test]
    fn test_vk_malformed_url() {
        let resolution = vk("https://vk video.ru/video_ext.php?oid=1&id=2&hash=3");
        match resolution.error() {
            Some(EmbedError::MalformedUrl(message)) => assert!(!message.is_empty()),
            other => panic!("expected malformed URL error, got {:?}", other),
        }
    }

    #[test]
    fn test_vk_missing_oid_or_id() {
        let resolution = vk("https://vkvideo.ru/video_ext.php?oid=-1&hash=abc");
        assert_eq!(resolution.error(), Some(&EmbedError::MissingRequiredParameter));

        let resolution = vk("https://vkvideo.ru/video_ext.php?id=2&hash=abc");
        assert_eq!(resolution.error(), Some(&EmbedError::MissingRequiredParameter));

        let resolution = vk("https://vkvideo.ru/video_ext.php?oid=&id=2&hash=abc");
        assert_eq!(resolution.error(), Some(&EmbedError::MissingRequiredParameter));
    }

    #[test]
    fn test_vk_missing_hash_rejected() {
        let resolution = vk("https://vkvideo.ru/video_ext.php?oid=-1&id=2");
        assert!(!resolution.is_valid());
        assert!(resolution.embed_url().is_none());
        assert!(resolution.error().unwrap().is_hash_related());
        assert!(resolution.error().unwrap().to_string().contains("hash"));
    }

    #[test]
    fn test_vk_missing_hash_advisory() {
        let resolver = VideoLinkResolver::new().with_policy(
            VideoPlatform::Vk,
            LinkPolicy::VkEmbed {
                hash: HashRequirement::Advisory,
            },
        );
        let resolution = resolver.resolve("https://vkvideo.ru/video_ext.php?oid=-1&id=2", &VideoPlatform::Vk);
        assert_eq!(
            resolution.embed_url(),
            Some("https://vkvideo.ru/video_ext.php?oid=-1&id=2&hd=2")
        );
    }

    #[test]
    fn test_vk_idempotent() {
        let first = vk(VK_LINK).into_result().unwrap();
        let second = vk(&first).into_result().unwrap();
        assert_eq!(first, second);
        assert_eq!(second.matches("hd=").count(), 1);
    }

    // Policy table tests

    #[test]
    fn test_unknown_platform_passes_through() {
        let platform = VideoPlatform::Other("rutube".to_string());
        let resolution = resolve_embed_url("  anything goes  ", &platform);
        assert_eq!(resolution.embed_url(), Some("  anything goes  "));
    }

    #[test]
    fn test_custom_platform_policy() {
        let resolver = VideoLinkResolver::new().with_policy(
            VideoPlatform::Other("vkvideo".to_string()),
            LinkPolicy::VkEmbed {
                hash: HashRequirement::Required,
            },
        );
        let platform = VideoPlatform::Other("vkvideo".to_string());
        assert!(resolver.policy(&platform).is_strict());
        assert!(!resolver.resolve("https://example.com", &platform).is_valid());
    }

    #[test]
    fn test_resolve_reference() {
        let reference = VideoReference::new(VideoPlatform::YouTube, "https://youtu.be/dQw4w9WgXcQ");
        let resolution = default_resolver().resolve_reference(&reference);
        assert_eq!(resolution.embed_url(), Some("https://www.youtube.com/embed/dQw4w9WgXcQ"));
    }

    // Resolution shape tests

    #[test]
    fn test_resolution_invariant() {
        let ok = EmbedResolution::valid("https://example.com");
        assert!(ok.is_valid() && ok.embed_url().is_some() && ok.error().is_none());

        let err = EmbedResolution::invalid(EmbedError::EmptyInput);
        assert!(!err.is_valid() && err.embed_url().is_none() && err.error().is_some());
    }

    #[test]
    fn test_resolution_serialization() {
        let json = serde_json::to_value(vk("")).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["error"], "URL cannot be empty");
        assert!(json.get("embed_url").is_none());

        let json = serde_json::to_value(youtube("https://youtu.be/dQw4w9WgXcQ")).unwrap();
        assert_eq!(json["valid"], true);
        assert_eq!(json["embed_url"], "https://www.youtube.com/embed/dQw4w9WgXcQ");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_embed_error_display() {
        assert_eq!(EmbedError::EmptyInput.to_string(), "URL cannot be empty");
        assert_eq!(
            EmbedError::MissingRequiredParameter.to_string(),
            "URL must contain oid and id parameters"
        );
        assert!(EmbedError::MalformedUrl("bad".into()).to_string().contains("bad"));
    }
}
