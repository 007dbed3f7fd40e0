//! Site flow integration tests
//!
//! End-to-end: an operator signs in, edits content through the admin panel,
//! and the public page is assembled from the same store.

use academy_site::{AdminPanel, AuthService, MemoryStore};
use content_client::AdminUser;
use site_core::auth::password_digest;
use site_core::forms::{DocumentForm, ReviewForm, TeacherForm};
use site_core::{load_page, stop_playback, with_autoplay, AdminError, FormError, UploadFile, VideoFrame};
use std::sync::Arc;
use video_embed::EmbedError;

const VK_LINK: &str =
    "https://vkvideo.ru/video_ext.php?oid=-157301945&id=456239025&hash=0998d1d02641da56";

fn store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new().with_admin(AdminUser {
        id: "admin-1".into(),
        username: "admin".into(),
        password_hash: password_digest("correct horse"),
    }))
}

fn teacher_form(name: &str, video_url: &str, platform: &str, order: &str) -> TeacherForm {
    TeacherForm {
        name: name.into(),
        bio: format!("{} teaches conversation", name),
        video_url: video_url.into(),
        video_platform: platform.into(),
        order_index: order.into(),
    }
}

/// Operator session, edits, and the page that results
#[tokio::test]
async fn test_admin_edits_show_on_page() {
    let store = store();
    let auth = AuthService::new(Arc::clone(&store));
    let session = auth.sign_in("admin", "correct horse").await.unwrap();
    assert_eq!(auth.current_user(&session.token).await.unwrap().username, "admin");

    let admin = AdminPanel::new(Arc::clone(&store));

    // Pasted iframe markup is stored as entered and resolved on the page
    let markup = format!(r#"<iframe src="{}" width="640" height="360"></iframe>"#, VK_LINK);
    admin
        .save_teacher(None, teacher_form("Boris", &markup, "vk", "2"))
        .await
        .unwrap();
    admin
        .save_teacher(None, teacher_form("Anna", "youtu.be/dQw4w9WgXcQ", "youtube", "1"))
        .await
        .unwrap();
    admin
        .save_review(
            None,
            ReviewForm {
                video_url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42".into(),
                video_platform: "youtube".into(),
                order_index: "1".into(),
            },
        )
        .await
        .unwrap();
    admin
        .update_texts("teachers", &[("title", "Our teachers")])
        .await
        .unwrap();
    let hero = admin
        .upload_hero_image(UploadFile::new("hero.webp", vec![1, 2, 3]))
        .await
        .unwrap();

    let page = load_page(&*store).await.unwrap();

    assert_eq!(page.hero.image_url.as_deref(), Some(hero.public_url.as_str()));
    assert_eq!(page.teachers.heading.title.as_deref(), Some("Our teachers"));

    let names: Vec<_> = page.teachers.cards.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Anna", "Boris"]);
    assert_eq!(
        page.teachers.cards[0].video,
        VideoFrame::Embed {
            src: "https://www.youtube.com/embed/dQw4w9WgXcQ".into(),
            title: "Видео преподавателя Anna".into(),
        }
    );
    match &page.teachers.cards[1].video {
        VideoFrame::Embed { src, .. } => {
            assert_eq!(src, &format!("{}&hd=2", VK_LINK));
            let playing = with_autoplay(src, true);
            assert!(playing.ends_with("&autoplay=1&mute=1"));
            assert_eq!(&stop_playback(&playing), src);
        }
        other => panic!("expected an embed, got {:?}", other),
    }
    assert!(page.reviews.videos[0].is_embed());

    auth.sign_out(&session.token).await;
    assert!(auth.current_user(&session.token).await.is_err());
}

/// A VK link without its hash never reaches the store
#[tokio::test]
async fn test_rejected_vk_link_is_not_published() {
    let store = store();
    let admin = AdminPanel::new(Arc::clone(&store));

    let err = admin
        .save_teacher(
            None,
            teacher_form("Clara", "https://vkvideo.ru/video_ext.php?oid=-1&id=2", "vk", "1"),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AdminError::Form(FormError::Video(EmbedError::MissingHashParameter))
    ));

    let page = load_page(&*store).await.unwrap();
    assert!(page.teachers.cards.is_empty());
}

/// Documents keep their file when only the title changes
#[tokio::test]
async fn test_document_edit_keeps_download_link() {
    let store = store();
    let admin = AdminPanel::new(Arc::clone(&store));

    let created = admin
        .save_document(
            None,
            DocumentForm {
                title: "License".into(),
                order_index: "1".into(),
            },
            Some(UploadFile::new("license.pdf", b"%PDF-1.7".to_vec())),
        )
        .await
        .unwrap();
    admin
        .save_document(
            Some(&created.id),
            DocumentForm {
                title: "Education license".into(),
                order_index: "1".into(),
            },
            None,
        )
        .await
        .unwrap();

    let page = load_page(&*store).await.unwrap();
    assert_eq!(page.documents.items.len(), 1);
    assert_eq!(page.documents.items[0].title, "Education license");
    assert_eq!(page.documents.items[0].url, created.file_url);
}
