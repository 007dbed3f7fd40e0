//! Video embed resolution for the academy site
//!
//! This crate turns operator-entered video references (links, scheme-less
//! links, or pasted iframe snippets) into embed URLs for the supported video
//! platforms. It is shared by the admin form validators and the public page.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod platform;
pub mod policy;
pub mod resolver;

pub use platform::{VideoPlatform, VideoReference};
pub use policy::{HashRequirement, LinkPolicy};
pub use resolver::{
    default_resolver, extract_embeddable_source, resolve_embed_url, EmbedError, EmbedResolution,
    VideoLinkResolver,
};
