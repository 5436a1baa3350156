//! External blog intake
//!
//! Accepts finished posts from outside tools (API-key gated at the route),
//! uploads an optional cover image and inserts the post.

use anyhow::Context;
use chrono::{Datelike, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::common::utils::clip_text;
use crate::domains::content::models::{
    unique_slug, BlogPost, BlogPostSource, ContentStatus, NewBlogPost, SlugScope,
};
use crate::kernel::BaseImageStore;

/// Largest accepted cover image
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

const EXCERPT_LIMIT: usize = 220;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalPostInput {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub status: Option<ContentStatus>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
}

/// An uploaded file as received from the request
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Uploaded file must be an image, got {0}")]
    NotAnImage(String),

    #[error("Image exceeds the {} MiB limit", MAX_IMAGE_BYTES / (1024 * 1024))]
    ImageTooLarge,

    #[error("Image storage is not configured")]
    StorageUnavailable,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Resolve the upload's content type, falling back to the file name.
fn resolve_content_type(upload: &ImageUpload) -> String {
    upload
        .content_type
        .as_deref()
        .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty() && ct != "application/octet-stream")
        .or_else(|| {
            upload
                .file_name
                .as_deref()
                .and_then(|name| mime_guess::from_path(name).first())
                .map(|mime| mime.essence_str().to_string())
        })
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

fn extension_for(content_type: &str, file_name: Option<&str>) -> String {
    match content_type {
        "image/jpeg" => return "jpg".to_string(),
        "image/png" => return "png".to_string(),
        "image/webp" => return "webp".to_string(),
        "image/gif" => return "gif".to_string(),
        _ => {}
    }

    file_name
        .and_then(|name| std::path::Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()) && ext.len() <= 5)
        .or_else(|| {
            mime_guess::get_mime_extensions_str(content_type)
                .and_then(|exts| exts.first())
                .map(|ext| ext.to_string())
        })
        .unwrap_or_else(|| "img".to_string())
}

/// Storage path for a cover image: `blog/<yyyy>/<mm>/<uuid>.<ext>`
pub fn image_path(extension: &str) -> String {
    let now = Utc::now();
    format!(
        "blog/{:04}/{:02}/{}.{}",
        now.year(),
        now.month(),
        Uuid::new_v4(),
        extension
    )
}

/// Check an upload and work out where it goes. Returns `(path, content_type)`.
pub fn validate_upload(upload: &ImageUpload) -> Result<(String, String), IntakeError> {
    let content_type = resolve_content_type(upload);
    if !content_type.starts_with("image/") {
        return Err(IntakeError::NotAnImage(content_type));
    }
    if upload.bytes.len() > MAX_IMAGE_BYTES {
        return Err(IntakeError::ImageTooLarge);
    }

    let ext = extension_for(&content_type, upload.file_name.as_deref());
    Ok((image_path(&ext), content_type))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Create a blog post from an external tool.
///
/// Status defaults to published. An uploaded image replaces any
/// `cover_image_url` in the input.
pub async fn create_external_post(
    input: ExternalPostInput,
    image: Option<ImageUpload>,
    store: Option<&dyn BaseImageStore>,
    pool: &PgPool,
) -> Result<BlogPost, IntakeError> {
    let title = input.title.trim().to_string();
    if title.is_empty() {
        return Err(IntakeError::MissingField("title"));
    }
    let body = input.body.trim().to_string();
    if body.is_empty() {
        return Err(IntakeError::MissingField("body"));
    }

    let mut cover_image_url = non_empty(input.cover_image_url);
    if let Some(upload) = image.filter(|u| !u.bytes.is_empty()) {
        let (path, content_type) = validate_upload(&upload)?;
        let store = store.ok_or(IntakeError::StorageUnavailable)?;
        let url = store
            .upload(&path, &content_type, upload.bytes)
            .await
            .context("Failed to upload cover image")?;
        cover_image_url = Some(url);
    }

    let excerpt = non_empty(input.excerpt).or_else(|| {
        let first_paragraph = body.split("\n\n").next().unwrap_or(&body);
        Some(clip_text(first_paragraph, EXCERPT_LIMIT))
    });
    let status = input.status.unwrap_or(ContentStatus::Published);
    let slug_source = non_empty(input.slug).unwrap_or_else(|| title.clone());

    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    let slug = unique_slug(SlugScope::BlogPost, &slug_source, &mut *tx).await?;
    let post = BlogPost::create(
        NewBlogPost::builder()
            .title(title)
            .slug(slug)
            .body(body)
            .status(status)
            .excerpt(excerpt)
            .cover_image_url(cover_image_url)
            .source(BlogPostSource::External)
            .build(),
        &mut *tx,
    )
    .await?;
    tx.commit().await.context("Failed to commit blog post")?;

    info!(post_id = %post.id, slug = %post.slug, "External blog post created");
    Ok(post)
}
