//! Public page assembly
//!
//! The marketing page is built from the site texts and the ordered lists in
//! the backend. Every stored video reference goes through the shared resolver;
//! references that do not resolve become an "unavailable" placeholder.

use content_client::{
    CompanyLogo, Contact, ContentBackend, Document, ProgramCard, Review, SiteContent,
    SiteContentStore, Table, Teacher,
};
use serde::Serialize;
use url::Url;
use video_embed::{default_resolver, VideoReference};

/// Placeholder text shown instead of a video that cannot be embedded
pub const VIDEO_UNAVAILABLE: &str = "Ошибка загрузки видео";

/// Frame title of a student review video
pub const REVIEW_FRAME_TITLE: &str = "Отзыв студента";

/// Icon used for program cards without their own
pub const DEFAULT_PROGRAM_ICON: &str = r#"<svg width="48" height="48" viewBox="0 0 48 48" fill="none"><circle cx="24" cy="24" r="20" stroke="currentColor" stroke-width="2"/></svg>"#;

/// Query parameters added while a video is playing
const PLAYBACK_PARAMS: [&str; 2] = ["autoplay", "mute"];

// =============================================================================
// View types
// =============================================================================

/// An embedded video or its placeholder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VideoFrame {
    /// Playable iframe
    Embed {
        /// Iframe source
        src: String,
        /// Accessible iframe title
        title: String,
    },
    /// The reference could not be resolved
    Unavailable {
        /// Text shown in place of the video
        message: String,
    },
}

impl VideoFrame {
    /// Resolve a stored reference into a frame
    pub fn for_reference(reference: &VideoReference, title: impl Into<String>) -> Self {
        match default_resolver().resolve_reference(reference).into_result() {
            Ok(src) => VideoFrame::Embed {
                src,
                title: title.into(),
            },
            Err(error) => {
                tracing::warn!(
                    platform = %reference.platform,
                    error = %error,
                    "stored video link cannot be embedded"
                );
                VideoFrame::Unavailable {
                    message: VIDEO_UNAVAILABLE.to_string(),
                }
            }
        }
    }

    /// Whether the frame is playable
    pub fn is_embed(&self) -> bool {
        matches!(self, VideoFrame::Embed { .. })
    }
}

/// Title and subtitle of a section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SectionHeading {
    /// Section title
    pub title: Option<String>,
    /// Section subtitle
    pub subtitle: Option<String>,
}

impl SectionHeading {
    fn from_content(content: &SiteContent, section: &str) -> Self {
        Self {
            title: content.text(section, "title"),
            subtitle: content.text(section, "subtitle"),
        }
    }
}

/// Hero block at the top of the page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HeroView {
    /// Headline
    pub title: Option<String>,
    /// Text under the headline
    pub subtitle: Option<String>,
    /// Background image
    pub image_url: Option<String>,
    /// Site logo
    pub logo_url: Option<String>,
}

/// Program card
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramCardView {
    /// Card title
    pub title: String,
    /// Card text
    pub description: String,
    /// Inline SVG icon
    pub icon_svg: String,
}

/// Program section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgramView {
    /// Heading
    pub heading: SectionHeading,
    /// Cards in display order
    pub cards: Vec<ProgramCardView>,
}

/// Teacher slide
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeacherCard {
    /// Full name
    pub name: String,
    /// Short biography
    pub bio: String,
    /// Introduction video
    pub video: VideoFrame,
}

/// Teachers section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeachersView {
    /// Heading
    pub heading: SectionHeading,
    /// Slides in display order
    pub cards: Vec<TeacherCard>,
}

/// Partner logo
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogoView {
    /// Company name
    pub name: String,
    /// Image URL
    pub image_url: String,
}

/// Reviews section with partner logos
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReviewsView {
    /// Section title
    pub title: Option<String>,
    /// Title above the logos
    pub logos_title: Option<String>,
    /// Review videos in display order
    pub videos: Vec<VideoFrame>,
    /// Partner logos in display order
    pub logos: Vec<LogoView>,
}

/// Downloadable document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentLink {
    /// Document title
    pub title: String,
    /// File URL
    pub url: String,
}

/// Documents section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentsView {
    /// Section title
    pub title: Option<String>,
    /// Section text
    pub text: Option<String>,
    /// Label of the button opening the list
    pub button_text: Option<String>,
    /// Documents in display order
    pub items: Vec<DocumentLink>,
}

/// Call-to-action block with messenger buttons
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CtaView {
    /// Heading
    pub heading: SectionHeading,
    /// WhatsApp button target
    pub whatsapp_url: Option<String>,
    /// Telegram button target
    pub telegram_url: Option<String>,
}

/// Contact line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactView {
    /// Label
    pub label: String,
    /// Displayed value
    pub value: String,
    /// Link target; the value is shown as plain text without one
    pub link: Option<String>,
}

/// Contacts section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactsView {
    /// Section title
    pub title: Option<String>,
    /// Contact lines ordered by type
    pub items: Vec<ContactView>,
}

/// Everything the page is built from
#[derive(Debug, Clone, Default)]
pub struct PageData {
    /// Site texts
    pub content: SiteContent,
    /// Program cards
    pub program_cards: Vec<ProgramCard>,
    /// Teachers
    pub teachers: Vec<Teacher>,
    /// Reviews
    pub reviews: Vec<Review>,
    /// Partner logos
    pub company_logos: Vec<CompanyLogo>,
    /// Documents
    pub documents: Vec<Document>,
    /// Contacts
    pub contacts: Vec<Contact>,
}

/// The assembled public page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageView {
    /// Hero block
    pub hero: HeroView,
    /// Program section
    pub program: ProgramView,
    /// Teachers section
    pub teachers: TeachersView,
    /// Reviews section
    pub reviews: ReviewsView,
    /// Documents section
    pub documents: DocumentsView,
    /// Call-to-action block
    pub cta: CtaView,
    /// Contacts section
    pub contacts: ContactsView,
    /// Footer copyright line
    pub footer_copyright: Option<String>,
}

// =============================================================================
// Assembly
// =============================================================================

fn contact_url<'a>(contacts: &'a [Contact], kind: &str) -> Option<&'a String> {
    contacts
        .iter()
        .find(|contact| contact.kind == kind)
        .and_then(|contact| contact.url.as_ref())
}

impl PageView {
    /// Build the page from fetched data
    pub fn assemble(data: &PageData) -> Self {
        let content = &data.content;

        let hero = HeroView {
            title: content.text("hero", "title"),
            subtitle: content.text("hero", "subtitle"),
            image_url: content.text("hero", "hero_image_url"),
            logo_url: content.text("hero", "logo_url"),
        };

        let program = ProgramView {
            heading: SectionHeading::from_content(content, "program"),
            cards: data
                .program_cards
                .iter()
                .map(|card| ProgramCardView {
                    title: card.title.clone(),
                    description: card.description.clone(),
                    icon_svg: card
                        .icon_svg
                        .clone()
                        .filter(|svg| !svg.trim().is_empty())
                        .unwrap_or_else(|| DEFAULT_PROGRAM_ICON.to_string()),
                })
                .collect(),
        };

        let teachers = TeachersView {
            heading: SectionHeading::from_content(content, "teachers"),
            cards: data
                .teachers
                .iter()
                .map(|teacher| TeacherCard {
                    name: teacher.name.clone(),
                    bio: teacher.bio.clone(),
                    video: VideoFrame::for_reference(
                        &teacher.video_reference(),
                        format!("Видео преподавателя {}", teacher.name),
                    ),
                })
                .collect(),
        };

        let reviews = ReviewsView {
            title: content.text("reviews", "title"),
            logos_title: content.text("reviews", "logos_title"),
            videos: data
                .reviews
                .iter()
                .map(|review| VideoFrame::for_reference(&review.video_reference(), REVIEW_FRAME_TITLE))
                .collect(),
            logos: data
                .company_logos
                .iter()
                .map(|logo| LogoView {
                    name: logo.name.clone(),
                    image_url: logo.image_url.clone(),
                })
                .collect(),
        };

        let documents = DocumentsView {
            title: content.text("documents", "title"),
            text: content.text("documents", "text"),
            button_text: content.text("documents", "button_text"),
            items: data
                .documents
                .iter()
                .map(|document| DocumentLink {
                    title: document.title.clone(),
                    url: document.file_url.clone(),
                })
                .collect(),
        };

        let cta = CtaView {
            heading: SectionHeading::from_content(content, "cta"),
            whatsapp_url: contact_url(&data.contacts, "whatsapp").cloned(),
            telegram_url: contact_url(&data.contacts, "telegram").cloned(),
        };

        let contacts = ContactsView {
            title: content.text("contacts", "title"),
            items: data
                .contacts
                .iter()
                .map(|contact| ContactView {
                    label: contact.label.clone(),
                    value: contact.value.clone(),
                    link: contact.url.clone().filter(|url| !url.is_empty()),
                })
                .collect(),
        };

        Self {
            hero,
            program,
            teachers,
            reviews,
            documents,
            cta,
            contacts,
            footer_copyright: content.text("footer", "copyright"),
        }
    }
}

/// Fetch everything the page needs concurrently
pub async fn fetch_page_data<S: ContentBackend + ?Sized>(store: &S) -> content_client::Result<PageData> {
    let (content, program_cards, teachers, reviews, company_logos, documents, contacts) = tokio::try_join!(
        SiteContentStore::site_content(store),
        Table::<ProgramCard>::list(store),
        Table::<Teacher>::list(store),
        Table::<Review>::list(store),
        Table::<CompanyLogo>::list(store),
        Table::<Document>::list(store),
        Table::<Contact>::list(store),
    )?;

    Ok(PageData {
        content,
        program_cards,
        teachers,
        reviews,
        company_logos,
        documents,
        contacts,
    })
}

/// Fetch and assemble the public page
pub async fn load_page<S: ContentBackend + ?Sized>(store: &S) -> content_client::Result<PageView> {
    let data = fetch_page_data(store).await?;
    let page = PageView::assemble(&data);
    tracing::debug!(
        teachers = page.teachers.cards.len(),
        reviews = page.reviews.videos.len(),
        "page assembled"
    );
    Ok(page)
}

// =============================================================================
// Playback
// =============================================================================

/// Raw query segments other than the playback parameters, joined back with `&`
///
/// Works on the encoded text so the kept segments reach the browser byte for byte.
fn strip_playback_query(query: &str) -> Option<String> {
    let kept: Vec<&str> = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let name = pair.split('=').next().unwrap_or_default();
            !PLAYBACK_PARAMS.contains(&name)
        })
        .collect();
    (!kept.is_empty()).then(|| kept.join("&"))
}

fn without_playback_params(url: &mut Url) {
    let kept = url.query().and_then(strip_playback_query);
    url.set_query(kept.as_deref());
}

fn playback_params(muted: bool) -> &'static str {
    if muted {
        "autoplay=1&mute=1"
    } else {
        "autoplay=1"
    }
}

/// Start playback of an embed: adds `autoplay=1`, and `mute=1` when muted
///
/// Used on hover (muted) and on tap (with sound).
pub fn with_autoplay(src: &str, muted: bool) -> String {
    let params = playback_params(muted);
    match Url::parse(src) {
        Ok(mut url) => {
            without_playback_params(&mut url);
            let query = match url.query() {
                Some(kept) => format!("{}&{}", kept, params),
                None => params.to_string(),
            };
            url.set_query(Some(query.as_str()));
            url.into()
        }
        Err(_) => {
            let stopped = stop_playback(src);
            let separator = if stopped.contains('?') { '&' } else { '?' };
            format!("{}{}{}", stopped, separator, params)
        }
    }
}

/// Stop playback of an embed by removing the playback parameters
///
/// The rest of the query is kept; VK embeds need their `oid`, `id` and `hash`.
pub fn stop_playback(src: &str) -> String {
    match Url::parse(src) {
        Ok(mut url) => {
            without_playback_params(&mut url);
            url.into()
        }
        Err(_) => match src.split_once('?') {
            Some((base, query)) => match strip_playback_query(query) {
                Some(kept) => format!("{}?{}", base, kept),
                None => base.to_string(),
            },
            None => src.to_string(),
        },
    }
}
