//! Test fixtures for creating test data.
//!
//! These fixtures use the model methods directly to create test data.

use anyhow::Result;
use site_api::common::{PhotoAlbumId, PhotoId};
use site_api::domains::content::models::{BlogPost, ContentStatus, NewBlogPost};
use site_api::domains::generation::models::{GenerationPayload, NewGenerationJob};
use site_api::domains::generation::{GenerationJob, TargetType};
use site_api::domains::photos::{NewPhoto, Photo, PhotoAlbum};
use sqlx::PgPool;

pub async fn create_album(pool: &PgPool) -> Result<PhotoAlbumId> {
    let album = PhotoAlbum::create("Spring jobs", "upload", pool).await?;
    Ok(album.id)
}

pub async fn create_photo(pool: &PgPool, album_id: PhotoAlbumId, caption: &str) -> Result<Photo> {
    Photo::create(
        NewPhoto::builder()
            .album_id(album_id)
            .image_url(format!("https://cdn.test/{}.jpg", PhotoId::new()))
            .source_caption(Some(caption.to_string()))
            .build(),
        pool,
    )
    .await
}

/// `count` photos in one album, captioned "Photo 1".."Photo n" style descriptions
pub async fn create_photos(pool: &PgPool, count: usize) -> Result<Vec<Photo>> {
    let album_id = create_album(pool).await?;
    let mut photos = Vec::with_capacity(count);
    for i in 0..count {
        photos.push(create_photo(pool, album_id, &format!("Poured concrete slab, section {}", i + 1)).await?);
    }
    Ok(photos)
}

pub async fn enqueue_job(pool: &PgPool, photo_ids: &[PhotoId]) -> Result<GenerationJob> {
    enqueue_job_with(pool, TargetType::BlogPost, photo_ids, GenerationPayload::default()).await
}

pub async fn enqueue_job_with(
    pool: &PgPool,
    target: TargetType,
    photo_ids: &[PhotoId],
    payload: GenerationPayload,
) -> Result<GenerationJob> {
    GenerationJob::enqueue(
        NewGenerationJob::builder()
            .target_type(target)
            .photo_ids(photo_ids.to_vec())
            .payload(payload)
            .build(),
        pool,
    )
    .await
}

/// Published blog post linked to the given photos
pub async fn publish_post_with_photos(
    pool: &PgPool,
    slug: &str,
    photo_ids: &[PhotoId],
) -> Result<BlogPost> {
    let mut tx = pool.begin().await?;
    let post = BlogPost::create(
        NewBlogPost::builder()
            .title(format!("Post {}", slug))
            .slug(slug.to_string())
            .body("A finished driveway.".to_string())
            .status(ContentStatus::Published)
            .build(),
        &mut *tx,
    )
    .await?;
    BlogPost::link_photos(post.id, photo_ids, &mut *tx).await?;
    tx.commit().await?;
    Ok(post)
}
