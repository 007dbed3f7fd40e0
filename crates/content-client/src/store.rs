//! Storage seams used by the admin panel and the public page
//!
//! The traits here describe the hosted backend at the level the site needs it:
//! ordered table CRUD, grouped site texts, object uploads with public URLs,
//! and the admin credential lookup.

use crate::records::{
    AdminUser, CompanyLogo, Contact, Document, ProgramCard, Record, Review, SiteContent,
    SiteContentEntry, Teacher,
};
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bucket holding site images (hero, logos)
pub const IMAGES_BUCKET: &str = "images";

/// Bucket holding downloadable documents
pub const DOCUMENTS_BUCKET: &str = "documents";

/// Cache lifetime requested for uploaded objects, in seconds
pub const UPLOAD_CACHE_SECONDS: u32 = 3600;

/// CRUD access to the rows of one table
#[async_trait]
pub trait Table<R: Record>: Send + Sync {
    /// All rows, ordered by [`Record::ORDER_BY`]
    async fn list(&self) -> Result<Vec<R>>;

    /// Insert a row and return it
    async fn create(&self, input: &R::Input) -> Result<R>;

    /// Update a row by id and return it
    async fn update(&self, id: &str, input: &R::Input) -> Result<R>;

    /// Delete a row by id
    async fn delete(&self, id: &str) -> Result<()>;
}

/// Access to the `section.key = value` site texts
#[async_trait]
pub trait SiteContentStore: Send + Sync {
    /// All texts grouped by section
    async fn site_content(&self) -> Result<SiteContent>;

    /// Insert or replace one text
    async fn update_site_content(
        &self,
        section: &str,
        key: &str,
        value: &str,
    ) -> Result<SiteContentEntry>;
}

/// An uploaded object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    /// Object path inside its bucket
    pub path: String,
    /// Publicly reachable URL
    pub public_url: String,
}

/// Object storage with public URLs
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload bytes under `name`; existing objects are not overwritten
    async fn upload(
        &self,
        bucket: &str,
        name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject>;

    /// Public URL of an object
    fn public_url(&self, bucket: &str, path: &str) -> String;

    /// Remove objects
    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<()>;
}

/// Admin account lookup
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find an admin account by login name
    async fn find_admin(&self, username: &str) -> Result<Option<AdminUser>>;
}

/// Everything the admin panel and the public page read and write
pub trait ContentBackend:
    Table<ProgramCard>
    + Table<Teacher>
    + Table<Review>
    + Table<Contact>
    + Table<CompanyLogo>
    + Table<Document>
    + SiteContentStore
    + ObjectStorage
{
}

impl<T> ContentBackend for T where
    T: Table<ProgramCard>
        + Table<Teacher>
        + Table<Review>
        + Table<Contact>
        + Table<CompanyLogo>
        + Table<Document>
        + SiteContentStore
        + ObjectStorage
{
}

/// File extension as the original name spells it (the whole name when it has no dot)
pub fn file_extension(file_name: &str) -> &str {
    file_name.rsplit('.').next().unwrap_or(file_name)
}

/// Unique object name: `<prefix>-<millis>.<ext>`, or `<millis>.<ext>` without a prefix
pub fn object_name(prefix: Option<&str>, file_name: &str, now: DateTime<Utc>) -> String {
    let millis = now.timestamp_millis();
    let extension = file_extension(file_name);
    match prefix {
        Some(prefix) => format!("{}-{}.{}", prefix, millis, extension),
        None => format!("{}.{}", millis, extension),
    }
}

/// Content type guessed from a file name
pub fn content_type_for(file_name: &str) -> &'static str {
    match file_extension(file_name).to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

/// Upload an image to the images bucket as `<prefix>-<millis>.<ext>`
pub async fn upload_image<S>(storage: &S, file_name: &str, bytes: Vec<u8>, prefix: &str) -> Result<StoredObject>
where
    S: ObjectStorage + ?Sized,
{
    let name = object_name(Some(prefix), file_name, Utc::now());
    storage
        .upload(IMAGES_BUCKET, &name, bytes, content_type_for(file_name))
        .await
}

/// Upload a document to the documents bucket as `<millis>.<ext>`
pub async fn upload_document<S>(storage: &S, file_name: &str, bytes: Vec<u8>) -> Result<StoredObject>
where
    S: ObjectStorage + ?Sized,
{
    let name = object_name(None, file_name, Utc::now());
    storage
        .upload(DOCUMENTS_BUCKET, &name, bytes, content_type_for(file_name))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("photo.final.PNG"), "PNG");
        assert_eq!(file_extension("license.pdf"), "pdf");
        assert_eq!(file_extension("README"), "README");
    }

    #[test]
    fn test_object_name() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(object_name(Some("hero"), "banner.jpg", now), "hero-1700000000123.jpg");
        assert_eq!(object_name(None, "license.pdf", now), "1700000000123.pdf");
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("a.JPG"), "image/jpeg");
        assert_eq!(content_type_for("logo.svg"), "image/svg+xml");
        assert_eq!(content_type_for("scan.pdf"), "application/pdf");
        assert_eq!(content_type_for("archive.zip"), "application/octet-stream");
    }
}
