//! REST implementation of the storage seams
//!
//! Tables are reached through PostgREST (`/rest/v1/<table>`), files through the
//! storage API (`/storage/v1/object/<bucket>/<name>`).

use crate::config::ContentClientConfig;
use crate::records::{AdminUser, Record, SiteContent, SiteContentEntry};
use crate::rest::{RestClient, RestRequest};
use crate::store::{
    CredentialStore, ObjectStorage, SiteContentStore, StoredObject, Table, UPLOAD_CACHE_SECONDS,
};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

const RETURN_REPRESENTATION: &str = "return=representation";

/// Content store backed by the hosted REST API
#[derive(Debug, Clone)]
pub struct RestContentStore {
    client: RestClient,
}

impl RestContentStore {
    /// Create a store from a client configuration
    pub fn new(config: ContentClientConfig) -> Result<Self> {
        Ok(Self {
            client: RestClient::new(config)?,
        })
    }

    /// Create a store around an existing client
    pub fn with_client(client: RestClient) -> Self {
        Self { client }
    }

    /// Get the underlying client
    pub fn client(&self) -> &RestClient {
        &self.client
    }

    fn table_path(table: &str) -> String {
        format!("rest/v1/{}", table)
    }

    /// Serialize an update payload and stamp `updated_at`
    fn stamped<T: Serialize>(input: &T) -> Result<Value> {
        let mut value = serde_json::to_value(input)?;
        let object = value
            .as_object_mut()
            .ok_or_else(|| Error::InvalidInput("update payload must be a JSON object".into()))?;
        object.insert("updated_at".into(), Value::String(Utc::now().to_rfc3339()));
        Ok(value)
    }

    fn first_row<R>(rows: Vec<R>, what: &str) -> Result<R> {
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(what.to_string()))
    }
}

#[async_trait]
impl<R: Record> Table<R> for RestContentStore {
    async fn list(&self) -> Result<Vec<R>> {
        let request = RestRequest::get(Self::table_path(R::TABLE))
            .param("select", "*")
            .param("order", R::ORDER_BY);
        let rows: Vec<R> = self.client.execute_with_retry(&request).await?.data;
        Ok(rows)
    }

    async fn create(&self, input: &R::Input) -> Result<R> {
        let request = RestRequest::post(Self::table_path(R::TABLE))
            .header("Prefer", RETURN_REPRESENTATION)
            .json_body(input)?;
        let rows: Vec<R> = self.client.execute(&request).await?.data;
        let row = Self::first_row(rows, R::TABLE)?;
        tracing::info!(table = R::TABLE, id = row.id(), "row created");
        Ok(row)
    }

    async fn update(&self, id: &str, input: &R::Input) -> Result<R> {
        let request = RestRequest::patch(Self::table_path(R::TABLE))
            .param("id", format!("eq.{}", id))
            .header("Prefer", RETURN_REPRESENTATION)
            .json_body(&Self::stamped(input)?)?;
        let rows: Vec<R> = self.client.execute(&request).await?.data;
        let row = Self::first_row(rows, &format!("{} {}", R::TABLE, id))?;
        tracing::info!(table = R::TABLE, id, "row updated");
        Ok(row)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let request = RestRequest::delete(Self::table_path(R::TABLE)).param("id", format!("eq.{}", id));
        self.client.execute_raw(&request).await?;
        tracing::info!(table = R::TABLE, id, "row deleted");
        Ok(())
    }
}

#[async_trait]
impl SiteContentStore for RestContentStore {
    async fn site_content(&self) -> Result<SiteContent> {
        let request = RestRequest::get(Self::table_path(SiteContentEntry::TABLE)).param("select", "*");
        let entries: Vec<SiteContentEntry> = self.client.execute_with_retry(&request).await?.data;
        Ok(SiteContent::from_entries(entries))
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
        let request = RestRequest::post(Self::table_path(SiteContentEntry::TABLE))
            .param("on_conflict", "section,key")
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json_body(&entry)?;
        let rows: Vec<SiteContentEntry> = self.client.execute(&request).await?.data;
        let saved = Self::first_row(rows, &format!("{}.{}", section, key))?;
        tracing::info!(section, key, "site content updated");
        Ok(saved)
    }
}

#[async_trait]
impl ObjectStorage for RestContentStore {
    async fn upload(
        &self,
        bucket: &str,
        name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject> {
        let size = bytes.len();
        let request = RestRequest::post(format!("storage/v1/object/{}/{}", bucket, name))
            .header("cache-control", format!("max-age={}", UPLOAD_CACHE_SECONDS))
            .header("x-upsert", "false")
            .body(bytes, content_type);
        self.client.execute_raw(&request).await?;

        tracing::info!(bucket, name, size, "object uploaded");
        Ok(StoredObject {
            path: name.to_string(),
            public_url: self.public_url(bucket, name),
        })
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        self.client
            .url_for(&format!("storage/v1/object/public/{}/{}", bucket, path))
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let request = RestRequest::delete(format!("storage/v1/object/{}", bucket))
            .json_body(&serde_json::json!({ "prefixes": paths }))?;
        self.client.execute_raw(&request).await?;
        tracing::info!(bucket, count = paths.len(), "objects removed");
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for RestContentStore {
    async fn find_admin(&self, username: &str) -> Result<Option<AdminUser>> {
        let request = RestRequest::get(Self::table_path(AdminUser::TABLE))
            .param("select", "*")
            .param("username", format!("eq.{}", username))
            .param("limit", "1");
        let rows: Vec<AdminUser> = self.client.execute(&request).await?.data;
        Ok(rows.into_iter().next())
    }
}
