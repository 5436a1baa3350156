use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use typed_builder::TypedBuilder;

use super::{BlogPostSource, ContentStatus, PublishedPage};
use crate::common::{BlogPostId, PhotoId};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BlogPost {
    pub id: BlogPostId,
    pub title: String,
    pub slug: String,
    pub status: ContentStatus,
    pub excerpt: Option<String>,
    pub body: String,
    pub cover_image_url: Option<String>,
    pub source: BlogPostSource,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for inserting a blog post. The slug must already be probed.
#[derive(Debug, Clone, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct NewBlogPost {
    pub title: String,
    pub slug: String,
    pub body: String,
    #[builder(default)]
    pub status: ContentStatus,
    #[builder(default)]
    pub excerpt: Option<String>,
    #[builder(default)]
    pub cover_image_url: Option<String>,
    #[builder(default)]
    pub source: BlogPostSource,
}

// =============================================================================
// Blog Post Queries
// =============================================================================

impl BlogPost {
    /// Insert a post; `published_at` is stamped when it goes in published
    pub async fn create(input: NewBlogPost, conn: &mut PgConnection) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO blog_posts (id, title, slug, status, excerpt, body, cover_image_url, source, published_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, CASE WHEN $4 = 'published'::content_status THEN NOW() END)
            RETURNING *
            "#,
        )
        .bind(BlogPostId::new())
        .bind(input.title)
        .bind(input.slug)
        .bind(input.status)
        .bind(input.excerpt)
        .bind(input.body)
        .bind(input.cover_image_url)
        .bind(input.source)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    /// Link photos in selection order (position starts at 0)
    pub async fn link_photos(
        id: BlogPostId,
        photo_ids: &[PhotoId],
        conn: &mut PgConnection,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO blog_post_photos (blog_post_id, photo_id, position)
            SELECT $1, linked.photo_id, (linked.ord - 1)::int
            FROM UNNEST($2::uuid[]) WITH ORDINALITY AS linked(photo_id, ord)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(id)
        .bind(photo_ids)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn find_by_id(id: BlogPostId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM blog_posts WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Linked photo ids in position order
    pub async fn photo_ids(id: BlogPostId, pool: &PgPool) -> Result<Vec<PhotoId>> {
        sqlx::query_scalar::<_, PhotoId>(
            "SELECT photo_id FROM blog_post_photos WHERE blog_post_id = $1 ORDER BY position",
        )
        .bind(id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Published posts for the sitemap, most recently published first
    pub async fn list_published(pool: &PgPool) -> Result<Vec<PublishedPage>> {
        sqlx::query_as::<_, PublishedPage>(
            r#"
            SELECT slug, updated_at
            FROM blog_posts
            WHERE status = 'published'
            ORDER BY published_at DESC NULLS LAST, created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
