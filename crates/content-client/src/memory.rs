//! In-memory content store
//!
//! Mirrors the hosted backend closely enough for local previews and tests:
//! rows are kept as JSON objects, updates merge the sent fields into the stored
//! row, and uploads refuse to overwrite an existing object.

use crate::records::{AdminUser, Record, SiteContent, SiteContentEntry};
use crate::store::{CredentialStore, ObjectStorage, SiteContentStore, StoredObject, Table};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use tokio::sync::RwLock;

const DEFAULT_BASE_URL: &str = "http://localhost:54321";

#[derive(Debug, Clone)]
struct StoredFile {
    bytes: Vec<u8>,
    content_type: String,
}

/// Content store that keeps everything in process memory
#[derive(Debug)]
pub struct MemoryStore {
    base_url: String,
    next_id: AtomicU64,
    tables: RwLock<HashMap<&'static str, Vec<Map<String, Value>>>>,
    site_content: RwLock<Vec<SiteContentEntry>>,
    objects: RwLock<HashMap<String, HashMap<String, StoredFile>>>,
    admins: Vec<AdminUser>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            next_id: AtomicU64::new(1),
            tables: RwLock::new(HashMap::new()),
            site_content: RwLock::new(Vec::new()),
            objects: RwLock::new(HashMap::new()),
            admins: Vec::new(),
        }
    }

    /// Set the base URL public object URLs are built from
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Add an admin account
    pub fn with_admin(mut self, user: AdminUser) -> Self {
        self.admins.push(user);
        self
    }

    /// Bytes and content type of a stored object
    pub async fn object(&self, bucket: &str, path: &str) -> Option<(Vec<u8>, String)> {
        self.objects
            .read()
            .await
            .get(bucket)
            .and_then(|files| files.get(path))
            .map(|file| (file.bytes.clone(), file.content_type.clone()))
    }

    /// Number of objects in a bucket
    pub async fn object_count(&self, bucket: &str) -> usize {
        self.objects
            .read()
            .await
            .get(bucket)
            .map_or(0, HashMap::len)
    }

    fn allocate_id(&self) -> String {
        self.next_id.fetch_add(1, AtomicOrdering::Relaxed).to_string()
    }

    fn to_object<T: serde::Serialize>(input: &T) -> Result<Map<String, Value>> {
        match serde_json::to_value(input)? {
            Value::Object(object) => Ok(object),
            _ => Err(Error::InvalidInput("payload must be a JSON object".into())),
        }
    }

    fn decode<R: Record>(row: &Map<String, Value>) -> Result<R> {
        serde_json::from_value(Value::Object(row.clone()))
            .map_err(|e| Error::InvalidInput(format!("{}: {}", R::TABLE, e)))
    }
}

/// Order JSON values the way the database orders a column
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Null) | None, Some(Value::Null) | None) => Ordering::Equal,
        // Nulls sort last
        (Some(Value::Null) | None, _) => Ordering::Greater,
        (_, Some(Value::Null) | None) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl<R: Record> Table<R> for MemoryStore {
    async fn list(&self) -> Result<Vec<R>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<&Map<String, Value>> =
            tables.get(R::TABLE).map(|rows| rows.iter().collect()).unwrap_or_default();
        rows.sort_by(|a, b| compare_values(a.get(R::ORDER_BY), b.get(R::ORDER_BY)));
        rows.into_iter().map(Self::decode::<R>).collect()
    }

    async fn create(&self, input: &R::Input) -> Result<R> {
        let mut row = Self::to_object(input)?;
        row.insert("id".into(), Value::String(self.allocate_id()));
        row.insert("created_at".into(), Value::String(Utc::now().to_rfc3339()));

        let record = Self::decode::<R>(&row)?;
        self.tables.write().await.entry(R::TABLE).or_default().push(row);
        tracing::debug!(table = R::TABLE, id = record.id(), "memory row created");
        Ok(record)
    }

    async fn update(&self, id: &str, input: &R::Input) -> Result<R> {
        let changes = Self::to_object(input)?;
        let mut tables = self.tables.write().await;
        let row = tables
            .get_mut(R::TABLE)
            .and_then(|rows| {
                rows.iter_mut()
                    .find(|row| row.get("id").and_then(Value::as_str) == Some(id))
            })
            .ok_or_else(|| Error::NotFound(format!("{}/{}", R::TABLE, id)))?;

        let mut merged = row.clone();
        merged.extend(changes);
        merged.insert("updated_at".into(), Value::String(Utc::now().to_rfc3339()));
        let record = Self::decode::<R>(&merged)?;
        *row = merged;
        Ok(record)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        if let Some(rows) = self.tables.write().await.get_mut(R::TABLE) {
            rows.retain(|row| row.get("id").and_then(Value::as_str) != Some(id));
        }
        Ok(())
    }
}

#[async_trait]
impl SiteContentStore for MemoryStore {
    async fn site_content(&self) -> Result<SiteContent> {
        Ok(SiteContent::from_entries(self.site_content.read().await.clone()))
    }

    async fn update_site_content(
        &self,
        section: &str,
        key: &str,
        value: &str,
    ) -> Result<SiteContentEntry> {
        let entry = SiteContentEntry {
            section: section.to_string(),
            key: key.to_string(),
            value: Some(value.to_string()),
            updated_at: Some(Utc::now()),
        };

        let mut entries = self.site_content.write().await;
        match entries
            .iter_mut()
            .find(|existing| existing.section == section && existing.key == key)
        {
            Some(existing) => *existing = entry.clone(),
            None => entries.push(entry.clone()),
        }
        Ok(entry)
    }
}

#[async_trait]
impl ObjectStorage for MemoryStore {
    async fn upload(
        &self,
        bucket: &str,
        name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject> {
        let mut objects = self.objects.write().await;
        let files = objects.entry(bucket.to_string()).or_default();
        if files.contains_key(name) {
            return Err(Error::Api {
                status: 409,
                message: "The resource already exists".into(),
            });
        }

        files.insert(
            name.to_string(),
            StoredFile {
                bytes,
                content_type: content_type.to_string(),
            },
        );

        Ok(StoredObject {
            path: name.to_string(),
            public_url: self.public_url(bucket, name),
        })
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, bucket, path)
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<()> {
        if let Some(files) = self.objects.write().await.get_mut(bucket) {
            for path in paths {
                files.remove(path);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_admin(&self, username: &str) -> Result<Option<AdminUser>> {
        Ok(self
            .admins
            .iter()
            .find(|user| user.username == username)
            .cloned())
    }
}
