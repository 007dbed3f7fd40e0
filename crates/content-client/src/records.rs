//! Typed records stored in the backend tables
//!
//! Every editable list on the site is a table whose rows carry an `id`,
//! optional timestamps and an `order_index` (contacts are ordered by type).

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use video_embed::{VideoPlatform, VideoReference};

/// A row type backed by a table
pub trait Record: DeserializeOwned + Serialize + Clone + Send + Sync + 'static {
    /// Table name
    const TABLE: &'static str;
    /// Column list reads are ordered by
    const ORDER_BY: &'static str;
    /// Payload sent on create and update
    type Input: Serialize + Send + Sync;

    /// Row id
    fn id(&self) -> &str;
}

macro_rules! impl_record {
    ($record:ty, $input:ty, $table:literal, $order:literal) => {
        impl Record for $record {
            const TABLE: &'static str = $table;
            const ORDER_BY: &'static str = $order;
            type Input = $input;

            fn id(&self) -> &str {
                &self.id
            }
        }
    };
}

// =============================================================================
// Site content
// =============================================================================

/// One `section.key = value` text entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteContentEntry {
    /// Section name (e.g., "hero")
    pub section: String,
    /// Key within the section (e.g., "title")
    pub key: String,
    /// Text value
    #[serde(default)]
    pub value: Option<String>,
    /// Last update time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl SiteContentEntry {
    /// Table holding site content entries
    pub const TABLE: &'static str = "site_content";
}

/// Site texts grouped by section and key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteContent {
    sections: HashMap<String, HashMap<String, String>>,
}

impl SiteContent {
    /// Group entries into sections; entries without a value are skipped
    pub fn from_entries(entries: impl IntoIterator<Item = SiteContentEntry>) -> Self {
        let mut content = Self::default();
        for entry in entries {
            if let Some(value) = entry.value {
                content.insert(entry.section, entry.key, value);
            }
        }
        content
    }

    /// Set a value
    pub fn insert(&mut self, section: impl Into<String>, key: impl Into<String>, value: impl Into<String>) {
        self.sections
            .entry(section.into())
            .or_default()
            .insert(key.into(), value.into());
    }

    /// Get a value
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|entries| entries.get(key))
            .map(String::as_str)
    }

    /// Get a value, treating empty strings as missing
    pub fn text(&self, section: &str, key: &str) -> Option<String> {
        self.get(section, key)
            .filter(|value| !value.trim().is_empty())
            .map(str::to_string)
    }

    /// Get all values of a section
    pub fn section(&self, section: &str) -> Option<&HashMap<String, String>> {
        self.sections.get(section)
    }

    /// Whether no entries are present
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

// =============================================================================
// Program cards
// =============================================================================

/// Card in the program section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramCard {
    /// Row id
    pub id: String,
    /// Card title
    pub title: String,
    /// Card text
    pub description: String,
    /// Inline SVG icon
    #[serde(default)]
    pub icon_svg: Option<String>,
    /// Position in the list
    pub order_index: i32,
    /// Creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Program card payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramCardInput {
    /// Card title
    pub title: String,
    /// Card text
    pub description: String,
    /// Inline SVG icon
    pub icon_svg: Option<String>,
    /// Position in the list
    pub order_index: i32,
}

impl_record!(ProgramCard, ProgramCardInput, "program_cards", "order_index");

// =============================================================================
// Teachers and reviews
// =============================================================================

/// Teacher card with an introduction video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    /// Row id
    pub id: String,
    /// Full name
    pub name: String,
    /// Short biography
    pub bio: String,
    /// Video link or embed markup as entered
    pub video_url: String,
    /// Platform of the video
    pub video_platform: VideoPlatform,
    /// Position in the list
    pub order_index: i32,
    /// Creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Teacher {
    /// The teacher's video reference
    pub fn video_reference(&self) -> VideoReference {
        VideoReference::new(self.video_platform.clone(), self.video_url.clone())
    }
}

/// Teacher payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherInput {
    /// Full name
    pub name: String,
    /// Short biography
    pub bio: String,
    /// Video link or embed markup
    pub video_url: String,
    /// Platform of the video
    pub video_platform: VideoPlatform,
    /// Position in the list
    pub order_index: i32,
}

impl_record!(Teacher, TeacherInput, "teachers", "order_index");

/// Student video review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Row id
    pub id: String,
    /// Video link or embed markup as entered
    pub video_url: String,
    /// Platform of the video
    pub video_platform: VideoPlatform,
    /// Position in the list
    pub order_index: i32,
    /// Creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Review {
    /// The review's video reference
    pub fn video_reference(&self) -> VideoReference {
        VideoReference::new(self.video_platform.clone(), self.video_url.clone())
    }
}

/// Review payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewInput {
    /// Video link or embed markup
    pub video_url: String,
    /// Platform of the video
    pub video_platform: VideoPlatform,
    /// Position in the list
    pub order_index: i32,
}

impl_record!(Review, ReviewInput, "reviews", "order_index");

// =============================================================================
// Contacts, logos, documents
// =============================================================================

/// Contact line (phone, email, address, messenger)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Row id
    pub id: String,
    /// Contact type (e.g., "phone", "email")
    #[serde(rename = "type")]
    pub kind: String,
    /// Label shown above the value
    pub label: String,
    /// Displayed value
    pub value: String,
    /// Optional link target
    #[serde(default)]
    pub url: Option<String>,
    /// Last update time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Contact payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInput {
    /// Contact type, only sent when creating
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Label shown above the value
    pub label: String,
    /// Displayed value
    pub value: String,
    /// Optional link target
    pub url: Option<String>,
}

impl_record!(Contact, ContactInput, "contacts", "type");

/// Partner company logo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyLogo {
    /// Row id
    pub id: String,
    /// Company name
    pub name: String,
    /// Public image URL
    pub image_url: String,
    /// Position in the list
    pub order_index: i32,
    /// Last update time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Company logo payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyLogoInput {
    /// Company name
    pub name: String,
    /// Public image URL
    pub image_url: String,
    /// Position in the list
    pub order_index: i32,
}

impl_record!(CompanyLogo, CompanyLogoInput, "company_logos", "order_index");

/// License or diploma document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Row id
    pub id: String,
    /// Document title
    pub title: String,
    /// Public file URL
    pub file_url: String,
    /// Original file name
    #[serde(default)]
    pub file_name: Option<String>,
    /// Position in the list
    pub order_index: i32,
    /// Last update time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Document payload
///
/// File fields are omitted on edits that keep the stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInput {
    /// Document title
    pub title: String,
    /// Public file URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    /// Original file name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Position in the list
    pub order_index: i32,
}

impl_record!(Document, DocumentInput, "documents", "order_index");

// =============================================================================
// Admin users
// =============================================================================

/// Admin panel account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
    /// Row id
    pub id: String,
    /// Login name
    pub username: String,
    /// Hex-encoded SHA-256 digest of the password
    #[serde(skip_serializing)]
    pub password_hash: String,
}

impl AdminUser {
    /// Table holding admin accounts
    pub const TABLE: &'static str = "admin_users";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(section: &str, key: &str, value: Option<&str>) -> SiteContentEntry {
        SiteContentEntry {
            section: section.to_string(),
            key: key.to_string(),
            value: value.map(str::to_string),
            updated_at: None,
        }
    }

    #[test]
    fn test_site_content_grouping() {
        let content = SiteContent::from_entries(vec![
            entry("hero", "title", Some("Learn with us")),
            entry("hero", "subtitle", Some("")),
            entry("teachers", "title", Some("Our teachers")),
            entry("footer", "copyright", None),
        ]);

        assert_eq!(content.get("hero", "title"), Some("Learn with us"));
        assert_eq!(content.get("hero", "subtitle"), Some(""));
        assert_eq!(content.text("hero", "subtitle"), None);
        assert_eq!(content.get("teachers", "title"), Some("Our teachers"));
        assert!(content.section("footer").is_none());
        assert_eq!(content.section("hero").map(|s| s.len()), Some(2));
    }

    #[test]
    fn test_site_content_serializes_as_map() {
        let mut content = SiteContent::default();
        content.insert("hero", "title", "Hello");
        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(json["hero"]["title"], "Hello");
    }

    #[test]
    fn test_teacher_deserialization() {
        let json = r#"{
            "id": "7f1c",
            "name": "Anna",
            "bio": "Ten years of teaching",
            "video_url": "https://youtu.be/dQw4w9WgXcQ",
            "video_platform": "youtube",
            "order_index": 1,
            "created_at": "2024-03-01T10:00:00+00:00",
            "updated_at": null
        }"#;

        let teacher: Teacher = serde_json::from_str(json).unwrap();
        assert_eq!(teacher.id(), "7f1c");
        assert_eq!(teacher.video_platform, VideoPlatform::YouTube);
        assert!(teacher.created_at.is_some());
        assert_eq!(teacher.video_reference().raw_input, "https://youtu.be/dQw4w9WgXcQ");
    }

    #[test]
    fn test_contact_type_rename() {
        let contact: Contact = serde_json::from_str(
            r#"{"id":"1","type":"phone","label":"Phone","value":"+7 900 000-00-00","url":"tel:+79000000000"}"#,
        )
        .unwrap();
        assert_eq!(contact.kind, "phone");

        let input = ContactInput {
            kind: None,
            label: "Email".into(),
            value: "hello@example.com".into(),
            url: None,
        };
        let json = serde_json::to_value(&input).unwrap();
        assert!(json.get("type").is_none());
        assert!(json["url"].is_null());
    }

    #[test]
    fn test_document_input_keeps_file_on_edit() {
        let input = DocumentInput {
            title: "License".into(),
            file_url: None,
            file_name: None,
            order_index: 2,
        };
        let json = serde_json::to_value(&input).unwrap();
        assert!(json.get("file_url").is_none());
        assert!(json.get("file_name").is_none());
    }

    #[test]
    fn test_admin_user_hash_not_serialized() {
        let user = AdminUser {
            id: "1".into(),
            username: "admin".into(),
            password_hash: "abc".into(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("abc"));
    }

    #[test]
    fn test_record_tables() {
        assert_eq!(Teacher::TABLE, "teachers");
        assert_eq!(Review::TABLE, "reviews");
        assert_eq!(Contact::ORDER_BY, "type");
        assert_eq!(Document::ORDER_BY, "order_index");
        assert_eq!(CompanyLogo::TABLE, "company_logos");
        assert_eq!(ProgramCard::TABLE, "program_cards");
    }
}
