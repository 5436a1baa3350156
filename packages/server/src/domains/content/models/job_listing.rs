use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use typed_builder::TypedBuilder;

use super::{ContentStatus, PublishedPage};
use crate::common::{JobListingId, PhotoId};

/// A permanent gallery entry for a finished job
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct JobListing {
    pub id: JobListingId,
    pub title: String,
    pub slug: String,
    pub status: ContentStatus,
    pub description: String,
    pub service: Option<String>,
    pub location: Option<String>,
    pub cover_image_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct NewJobListing {
    pub title: String,
    pub slug: String,
    pub description: String,
    #[builder(default)]
    pub status: ContentStatus,
    #[builder(default)]
    pub service: Option<String>,
    #[builder(default)]
    pub location: Option<String>,
    #[builder(default)]
    pub cover_image_url: Option<String>,
}

impl JobListing {
    pub async fn create(input: NewJobListing, conn: &mut PgConnection) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO job_listings (id, title, slug, status, description, service, location, cover_image_url, published_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, CASE WHEN $4 = 'published'::content_status THEN NOW() END)
            RETURNING *
            "#,
        )
        .bind(JobListingId::new())
        .bind(input.title)
        .bind(input.slug)
        .bind(input.status)
        .bind(input.description)
        .bind(input.service)
        .bind(input.location)
        .bind(input.cover_image_url)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn link_photos(
        id: JobListingId,
        photo_ids: &[PhotoId],
        conn: &mut PgConnection,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO job_listing_photos (job_listing_id, photo_id, position)
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

    pub async fn find_by_id(id: JobListingId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM job_listings WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn photo_ids(id: JobListingId, pool: &PgPool) -> Result<Vec<PhotoId>> {
        sqlx::query_scalar::<_, PhotoId>(
            "SELECT photo_id FROM job_listing_photos WHERE job_listing_id = $1 ORDER BY position",
        )
        .bind(id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn list_published(pool: &PgPool) -> Result<Vec<PublishedPage>> {
        sqlx::query_as::<_, PublishedPage>(
            r#"
            SELECT slug, updated_at
            FROM job_listings
            WHERE status = 'published'
            ORDER BY published_at DESC NULLS LAST, created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
