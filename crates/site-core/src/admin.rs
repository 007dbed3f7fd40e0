//! Admin panel operations
//!
//! Each operation validates a submitted form, performs the uploads it needs and
//! writes the resulting rows through a [`ContentBackend`].

use crate::forms::{
    self, CompanyLogoForm, ContactForm, DocumentForm, FormError, ProgramCardForm, ReviewForm,
    TeacherForm, UploadFile,
};
use content_client::store::{upload_document, upload_image};
use content_client::{
    CompanyLogo, Contact, ContentBackend, Document, ProgramCard, Record, Review, SiteContentEntry,
    StoredObject, Table, Teacher,
};
use std::sync::Arc;
use thiserror::Error;

/// Upload name prefix for the hero image
const HERO_IMAGE_PREFIX: &str = "hero";

/// Upload name prefix for the site logo and partner logos
const LOGO_PREFIX: &str = "logo";

/// Admin operation error types
#[derive(Debug, Error)]
pub enum AdminError {
    /// The submitted form is invalid
    #[error(transparent)]
    Form(#[from] FormError),

    /// The backend rejected the operation
    #[error("Backend error: {0}")]
    Backend(#[from] content_client::Error),
}

/// Result type for admin operations
pub type Result<T> = std::result::Result<T, AdminError>;

/// Admin panel over a content backend
pub struct AdminPanel<S: ContentBackend> {
    store: Arc<S>,
}

impl<S: ContentBackend> Clone for AdminPanel<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: ContentBackend> AdminPanel<S> {
    /// Create a panel over a store
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Create a row when `id` is `None`, update it otherwise
    async fn save_record<R>(&self, id: Option<&str>, input: R::Input) -> Result<R>
    where
        R: Record,
        S: Table<R>,
    {
        let record = match id {
            Some(id) => Table::<R>::update(&*self.store, id, &input).await?,
            None => Table::<R>::create(&*self.store, &input).await?,
        };
        tracing::info!(
            table = R::TABLE,
            id = record.id(),
            created = id.is_none(),
            "record saved"
        );
        Ok(record)
    }

    async fn delete_record<R>(&self, id: &str) -> Result<()>
    where
        R: Record,
        S: Table<R>,
    {
        Table::<R>::delete(&*self.store, id).await?;
        tracing::info!(table = R::TABLE, id = %id, "record deleted");
        Ok(())
    }

    // =========================================================================
    // Teachers and reviews
    // =========================================================================

    /// Save a teacher; the video link must resolve for its platform
    pub async fn save_teacher(&self, id: Option<&str>, form: TeacherForm) -> Result<Teacher> {
        let input = form.into_input()?;
        self.save_record(id, input).await
    }

    /// Delete a teacher
    pub async fn delete_teacher(&self, id: &str) -> Result<()> {
        self.delete_record::<Teacher>(id).await
    }

    /// Save a review; the video link must resolve for its platform
    pub async fn save_review(&self, id: Option<&str>, form: ReviewForm) -> Result<Review> {
        let input = form.into_input()?;
        self.save_record(id, input).await
    }

    /// Delete a review
    pub async fn delete_review(&self, id: &str) -> Result<()> {
        self.delete_record::<Review>(id).await
    }

    // =========================================================================
    // Program cards and contacts
    // =========================================================================

    /// Save a program card
    pub async fn save_program_card(
        &self,
        id: Option<&str>,
        form: ProgramCardForm,
    ) -> Result<ProgramCard> {
        let input = form.into_input()?;
        self.save_record(id, input).await
    }

    /// Delete a program card
    pub async fn delete_program_card(&self, id: &str) -> Result<()> {
        self.delete_record::<ProgramCard>(id).await
    }

    /// Save a contact; new contacts need a type
    pub async fn save_contact(&self, id: Option<&str>, form: ContactForm) -> Result<Contact> {
        let input = form.into_input()?;
        if id.is_none() && input.kind.is_none() {
            return Err(FormError::MissingField("type").into());
        }
        self.save_record(id, input).await
    }

    /// Delete a contact
    pub async fn delete_contact(&self, id: &str) -> Result<()> {
        self.delete_record::<Contact>(id).await
    }

    // =========================================================================
    // Section texts and images
    // =========================================================================

    /// Update texts of one section; every key is checked before anything is written
    pub async fn update_texts(
        &self,
        section: &str,
        values: &[(&str, &str)],
    ) -> Result<Vec<SiteContentEntry>> {
        for (key, _) in values {
            forms::check_content_key(section, key)?;
        }

        let mut entries = Vec::with_capacity(values.len());
        for (key, value) in values {
            entries.push(self.store.update_site_content(section, key, value).await?);
        }
        tracing::info!(section = %section, count = entries.len(), "section texts updated");
        Ok(entries)
    }

    /// Upload a new hero image and point `hero.hero_image_url` at it
    pub async fn upload_hero_image(&self, file: UploadFile) -> Result<StoredObject> {
        self.upload_section_image(file, HERO_IMAGE_PREFIX, "hero_image_url")
            .await
    }

    /// Upload a new site logo and point `hero.logo_url` at it
    pub async fn upload_site_logo(&self, file: UploadFile) -> Result<StoredObject> {
        self.upload_section_image(file, LOGO_PREFIX, "logo_url").await
    }

    async fn upload_section_image(
        &self,
        file: UploadFile,
        prefix: &str,
        key: &str,
    ) -> Result<StoredObject> {
        let stored = upload_image(&*self.store, &file.file_name, file.bytes, prefix).await?;
        self.store
            .update_site_content("hero", key, &stored.public_url)
            .await?;
        tracing::info!(key = %key, path = %stored.path, "hero image replaced");
        Ok(stored)
    }

    // =========================================================================
    // Company logos and documents
    // =========================================================================

    /// Upload a partner logo and create its row
    pub async fn add_company_logo(
        &self,
        form: CompanyLogoForm,
        file: Option<UploadFile>,
    ) -> Result<CompanyLogo> {
        let file = file.ok_or(FormError::MissingFile)?;
        // Reject a bad form before anything is uploaded
        form.clone().into_input(String::new())?;

        let stored = upload_image(&*self.store, &file.file_name, file.bytes, LOGO_PREFIX).await?;
        let input = form.into_input(stored.public_url)?;
        self.save_record(None, input).await
    }

    /// Delete a partner logo row
    pub async fn delete_company_logo(&self, id: &str) -> Result<()> {
        self.delete_record::<CompanyLogo>(id).await
    }

    /// Save a document
    ///
    /// New documents need a file. Edits without a file keep the stored one.
    pub async fn save_document(
        &self,
        id: Option<&str>,
        form: DocumentForm,
        file: Option<UploadFile>,
    ) -> Result<Document> {
        if id.is_none() && file.is_none() {
            return Err(FormError::MissingFile.into());
        }
        form.clone().into_input(None)?;

        let uploaded = match file {
            Some(file) => {
                let stored = upload_document(&*self.store, &file.file_name, file.bytes).await?;
                Some((stored.public_url, file.file_name))
            }
            None => None,
        };

        let input = form.into_input(uploaded)?;
        self.save_record(id, input).await
    }

    /// Delete a document row
    pub async fn delete_document(&self, id: &str) -> Result<()> {
        self.delete_record::<Document>(id).await
    }
}
