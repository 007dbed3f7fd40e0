//! Admin form validation
//!
//! Forms arrive as raw strings (as a browser submits them) and are turned into
//! typed backend payloads. Video links are checked with the shared resolver
//! before a record may be saved.

use content_client::{
    CompanyLogoInput, ContactInput, DocumentInput, ProgramCardInput, ReviewInput, TeacherInput,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use video_embed::{default_resolver, EmbedError, VideoPlatform, VideoReference};

/// Editable text keys per site section
pub const SECTION_KEYS: &[(&str, &[&str])] = &[
    ("hero", &["title", "subtitle", "hero_image_url", "logo_url"]),
    ("program", &["title", "subtitle"]),
    ("teachers", &["title", "subtitle"]),
    ("reviews", &["title", "logos_title"]),
    ("documents", &["title", "text", "button_text"]),
    ("cta", &["title", "subtitle"]),
    ("contacts", &["title"]),
    ("footer", &["copyright"]),
];

/// Validation errors shown next to the form
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// A required field is blank
    #[error("{0} is required")]
    MissingField(&'static str),

    /// A numeric field does not hold a whole number
    #[error("{0} must be a whole number")]
    InvalidNumber(&'static str),

    /// The video link was rejected
    #[error(transparent)]
    Video(#[from] EmbedError),

    /// An upload was expected
    #[error("A file must be selected")]
    MissingFile,

    /// Section text key that the site does not display
    #[error("Unknown content field {section}.{key}")]
    UnknownContentKey {
        /// Section name
        section: String,
        /// Key name
        key: String,
    },
}

/// Result type for form validation
pub type Result<T> = std::result::Result<T, FormError>;

/// Inline status of the video link field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum VideoFieldStatus {
    /// Nothing to show
    Hidden,
    /// Link accepted; shows the URL that will be embedded
    Valid {
        /// Processed embed URL
        embed_url: String,
    },
    /// Link rejected
    Invalid {
        /// Message for the operator
        error: String,
    },
}

impl VideoFieldStatus {
    /// Whether the form may be submitted with this status
    pub fn allows_save(&self) -> bool {
        !matches!(self, VideoFieldStatus::Invalid { .. })
    }
}

/// Live status for the video field while the operator types
///
/// Blank input and platforms without strict validation show nothing.
pub fn video_field_status(url: &str, platform: &VideoPlatform) -> VideoFieldStatus {
    let resolver = default_resolver();
    if url.trim().is_empty() || !resolver.policy(platform).is_strict() {
        return VideoFieldStatus::Hidden;
    }

    match resolver.resolve(url, platform).into_result() {
        Ok(embed_url) => VideoFieldStatus::Valid { embed_url },
        Err(error) => VideoFieldStatus::Invalid {
            error: error.to_string(),
        },
    }
}

/// Status badge for a row in the admin teacher and review lists
pub fn video_badge(reference: &VideoReference) -> VideoFieldStatus {
    match default_resolver().resolve_reference(reference).into_result() {
        Ok(embed_url) => VideoFieldStatus::Valid { embed_url },
        Err(error) => VideoFieldStatus::Invalid {
            error: error.to_string(),
        },
    }
}

/// Check that a section text key is one the site displays
pub fn check_content_key(section: &str, key: &str) -> Result<()> {
    let known = SECTION_KEYS
        .iter()
        .any(|(name, keys)| *name == section && keys.contains(&key));
    if known {
        Ok(())
    } else {
        Err(FormError::UnknownContentKey {
            section: section.to_string(),
            key: key.to_string(),
        })
    }
}

/// A file chosen for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// Original file name
    pub file_name: String,
    /// File contents
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// Create a new upload
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

fn required(field: &'static str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        Err(FormError::MissingField(field))
    } else {
        Ok(value.to_string())
    }
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Parse an `order_index` field; blank means 0
fn order_index(value: &str) -> Result<i32> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(0);
    }
    value
        .parse()
        .map_err(|_| FormError::InvalidNumber("order_index"))
}

/// Validate a video link for saving and return it as entered
fn video_link(url: &str, platform: &VideoPlatform) -> Result<String> {
    let url = required("video_url", url)?;
    let resolution = default_resolver().resolve(&url, platform);
    if let Some(error) = resolution.error() {
        return Err(error.clone().into());
    }
    Ok(url)
}

/// Teacher form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherForm {
    /// Full name
    pub name: String,
    /// Short biography
    pub bio: String,
    /// Link or iframe code
    pub video_url: String,
    /// Platform tag
    pub video_platform: String,
    /// Position in the list
    pub order_index: String,
}

impl TeacherForm {
    /// Validate into a backend payload
    pub fn into_input(self) -> Result<TeacherInput> {
        let video_platform = VideoPlatform::from_tag(&self.video_platform);
        Ok(TeacherInput {
            name: required("name", &self.name)?,
            bio: self.bio.trim().to_string(),
            video_url: video_link(&self.video_url, &video_platform)?,
            video_platform,
            order_index: order_index(&self.order_index)?,
        })
    }
}

/// Review form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewForm {
    /// Link or iframe code
    pub video_url: String,
    /// Platform tag
    pub video_platform: String,
    /// Position in the list
    pub order_index: String,
}

impl ReviewForm {
    /// Validate into a backend payload
    pub fn into_input(self) -> Result<ReviewInput> {
        let video_platform = VideoPlatform::from_tag(&self.video_platform);
        Ok(ReviewInput {
            video_url: video_link(&self.video_url, &video_platform)?,
            video_platform,
            order_index: order_index(&self.order_index)?,
        })
    }
}

/// Program card form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramCardForm {
    /// Card title
    pub title: String,
    /// Card text
    pub description: String,
    /// Inline SVG icon
    pub icon_svg: String,
    /// Position in the list
    pub order_index: String,
}

impl ProgramCardForm {
    /// Validate into a backend payload
    pub fn into_input(self) -> Result<ProgramCardInput> {
        Ok(ProgramCardInput {
            title: required("title", &self.title)?,
            description: self.description.trim().to_string(),
            icon_svg: optional(&self.icon_svg),
            order_index: order_index(&self.order_index)?,
        })
    }
}

/// Contact form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactForm {
    /// Contact type, set when creating
    pub kind: String,
    /// Label
    pub label: String,
    /// Displayed value
    pub value: String,
    /// Optional link
    pub url: String,
}

impl ContactForm {
    /// Validate into a backend payload
    pub fn into_input(self) -> Result<ContactInput> {
        Ok(ContactInput {
            kind: optional(&self.kind),
            label: required("label", &self.label)?,
            value: required("value", &self.value)?,
            url: optional(&self.url),
        })
    }
}

/// Company logo form; the image is uploaded separately
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyLogoForm {
    /// Company name
    pub name: String,
    /// Position in the list
    pub order_index: String,
}

impl CompanyLogoForm {
    /// Validate into a backend payload pointing at an uploaded image
    pub fn into_input(self, image_url: String) -> Result<CompanyLogoInput> {
        Ok(CompanyLogoInput {
            name: required("name", &self.name)?,
            image_url,
            order_index: order_index(&self.order_index)?,
        })
    }
}

/// Document form; the file is uploaded separately
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentForm {
    /// Document title
    pub title: String,
    /// Position in the list
    pub order_index: String,
}

impl DocumentForm {
    /// Validate into a backend payload; `file` is `(public_url, file_name)` of a new upload
    pub fn into_input(self, file: Option<(String, String)>) -> Result<DocumentInput> {
        let (file_url, file_name) = file.unzip();
        Ok(DocumentInput {
            title: required("title", &self.title)?,
            file_url,
            file_name,
            order_index: order_index(&self.order_index)?,
        })
    }
}
