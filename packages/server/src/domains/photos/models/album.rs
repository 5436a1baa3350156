use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::PhotoAlbumId;

/// An import batch of photos grouped by where they came from
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PhotoAlbum {
    pub id: PhotoAlbumId,
    pub title: String,
    pub source: String, // 'upload', 'drive', 'phone_sync'
    pub created_at: DateTime<Utc>,
}

impl PhotoAlbum {
    pub async fn create(title: &str, source: &str, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO photo_albums (id, title, source) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(PhotoAlbumId::new())
        .bind(title)
        .bind(source)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }
}
