use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use typed_builder::TypedBuilder;

use crate::common::{PhotoAlbumId, PhotoId};

/// An imported job photo. Only the caption is editable after import.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Photo {
    pub id: PhotoId,
    pub album_id: PhotoAlbumId,
    pub image_url: String,
    pub alt_text: Option<String>,
    pub source_caption: Option<String>,
    pub source_taken_at: Option<DateTime<Utc>>,
    pub batch_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Photo plus whether published content already uses it
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PhotoListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub photo: Photo,
    pub posted: bool,
}

/// Which photos the selection screen shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoView {
    /// Not yet used by any published post or listing
    #[default]
    Ready,
    /// Everything, with the posted flag
    All,
    /// Only the posted bin
    Posted,
}

impl PhotoView {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhotoView::Ready => "ready",
            PhotoView::All => "all",
            PhotoView::Posted => "posted",
        }
    }
}

impl std::str::FromStr for PhotoView {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ready" => Ok(PhotoView::Ready),
            "all" | "expanded" => Ok(PhotoView::All),
            "posted" => Ok(PhotoView::Posted),
            _ => Err(anyhow::anyhow!("Invalid photo view: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PhotoFilter {
    pub album_id: Option<PhotoAlbumId>,
    pub batch_key: Option<String>,
}

/// Input for importing a photo
#[derive(Debug, Clone, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct NewPhoto {
    pub album_id: PhotoAlbumId,
    pub image_url: String,
    #[builder(default)]
    pub alt_text: Option<String>,
    #[builder(default)]
    pub source_caption: Option<String>,
    #[builder(default)]
    pub source_taken_at: Option<DateTime<Utc>>,
    #[builder(default)]
    pub batch_key: Option<String>,
}

// =============================================================================
// Photo Queries
// =============================================================================

impl Photo {
    pub async fn create(input: NewPhoto, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO photos (id, album_id, image_url, alt_text, source_caption, source_taken_at, batch_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(PhotoId::new())
        .bind(input.album_id)
        .bind(input.image_url)
        .bind(input.alt_text)
        .bind(input.source_caption)
        .bind(input.source_taken_at)
        .bind(input.batch_key)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Load photos in the order of `ids`. Unknown ids are skipped.
    pub async fn find_by_ids(ids: &[PhotoId], pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT p.*
            FROM photos p
            JOIN UNNEST($1::uuid[]) WITH ORDINALITY AS req(id, ord) ON req.id = p.id
            ORDER BY req.ord
            "#,
        )
        .bind(ids)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Photos for the selection screen, newest first.
    ///
    /// A photo counts as posted once a published blog post or job listing links it.
    pub async fn list(
        view: PhotoView,
        filter: &PhotoFilter,
        limit: i64,
        pool: &PgPool,
    ) -> Result<Vec<PhotoListing>> {
        sqlx::query_as::<_, PhotoListing>(
            r#"
            SELECT *
            FROM (
                SELECT p.*,
                       (EXISTS (
                           SELECT 1
                           FROM blog_post_photos bpp
                           JOIN blog_posts bp ON bp.id = bpp.blog_post_id
                           WHERE bpp.photo_id = p.id AND bp.status = 'published'
                       ) OR EXISTS (
                           SELECT 1
                           FROM job_listing_photos jlp
                           JOIN job_listings jl ON jl.id = jlp.job_listing_id
                           WHERE jlp.photo_id = p.id AND jl.status = 'published'
                       )) AS posted
                FROM photos p
                WHERE ($1::uuid IS NULL OR p.album_id = $1)
                  AND ($2::text IS NULL OR p.batch_key = $2)
            ) listed
            WHERE CASE $3
                WHEN 'ready' THEN NOT posted
                WHEN 'posted' THEN posted
                ELSE TRUE
            END
            ORDER BY source_taken_at DESC NULLS LAST, created_at DESC
            LIMIT $4
            "#,
        )
        .bind(filter.album_id)
        .bind(filter.batch_key.as_deref())
        .bind(view.as_str())
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Replace the caption. A blank caption clears it.
    pub async fn update_caption(
        id: PhotoId,
        caption: Option<&str>,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let caption = caption.map(str::trim).filter(|c| !c.is_empty());
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE photos
            SET source_caption = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(caption)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Caption used for prompts: the source caption, else the alt text
    pub fn caption(&self) -> Option<&str> {
        self.source_caption
            .as_deref()
            .or(self.alt_text.as_deref())
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_view_parsing() {
        assert_eq!("ready".parse::<PhotoView>().unwrap(), PhotoView::Ready);
        assert_eq!("expanded".parse::<PhotoView>().unwrap(), PhotoView::All);
        assert_eq!("posted".parse::<PhotoView>().unwrap(), PhotoView::Posted);
        assert!("archived".parse::<PhotoView>().is_err());
        assert_eq!(PhotoView::default(), PhotoView::Ready);
    }
}
