//! Slug probing against the content tables.

use anyhow::Result;
use sqlx::PgConnection;
use tracing::warn;

use crate::common::utils::{slug_candidate, slugify, timestamped_slug, MAX_SLUG_ATTEMPTS};

/// Table a slug has to be unique in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlugScope {
    BlogPost,
    JobListing,
}

impl SlugScope {
    fn exists_query(&self) -> &'static str {
        match self {
            SlugScope::BlogPost => "SELECT EXISTS(SELECT 1 FROM blog_posts WHERE slug = $1)",
            SlugScope::JobListing => "SELECT EXISTS(SELECT 1 FROM job_listings WHERE slug = $1)",
        }
    }
}

pub async fn slug_taken(scope: SlugScope, slug: &str, conn: &mut PgConnection) -> Result<bool> {
    sqlx::query_scalar::<_, bool>(scope.exists_query())
        .bind(slug)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
}

/// First free slug among `base`, `base-2`, ... `base-20`, else `base-<unix millis>`.
///
/// Best effort only: the unique index still rejects a racing insert.
pub async fn unique_slug(scope: SlugScope, source: &str, conn: &mut PgConnection) -> Result<String> {
    let base = slugify(source);

    for attempt in 1..=MAX_SLUG_ATTEMPTS {
        let candidate = slug_candidate(&base, attempt);
        if !slug_taken(scope, &candidate, &mut *conn).await? {
            return Ok(candidate);
        }
    }

    let fallback = timestamped_slug(&base);
    warn!(base = %base, slug = %fallback, "Slug probing exhausted, using timestamp suffix");
    Ok(fallback)
}
