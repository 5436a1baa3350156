//! Completion recording
//!
//! The content row, its photo links and the job's completion commit together,
//! so a job never ends up `processing` next to content it already produced.

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::info;

use crate::common::{LockToken, PhotoId};
use crate::domains::content::models::{
    unique_slug, BlogPost, ContentStatus, JobListing, NewBlogPost, NewJobListing, SlugScope,
};
use crate::domains::generation::models::{GenerationJob, JobResult, TargetType};
use crate::domains::generation::output::GeneratedDraft;

/// Insert the content for a claimed job and mark the job completed.
///
/// Fails, rolling everything back, if `token` no longer holds the job.
pub async fn persist_draft(
    job: &GenerationJob,
    token: LockToken,
    draft: &GeneratedDraft,
    photo_ids: &[PhotoId],
    cover_image_url: Option<&str>,
    pool: &PgPool,
) -> Result<JobResult> {
    let payload = job.request();
    let status = if payload.publish {
        ContentStatus::Published
    } else {
        ContentStatus::Draft
    };

    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = match job.target_type {
        TargetType::BlogPost => {
            let slug = unique_slug(SlugScope::BlogPost, &draft.title, &mut *tx).await?;
            let post = BlogPost::create(
                NewBlogPost::builder()
                    .title(draft.title.clone())
                    .slug(slug)
                    .body(draft.body.clone())
                    .status(status)
                    .excerpt(Some(draft.excerpt.clone()))
                    .cover_image_url(cover_image_url.map(String::from))
                    .build(),
                &mut *tx,
            )
            .await
            .context("Failed to insert blog post")?;
            BlogPost::link_photos(post.id, photo_ids, &mut *tx).await?;

            JobResult {
                result_id: post.id.into_uuid(),
                result_slug: post.slug,
            }
        }
        TargetType::JobListing => {
            let slug = unique_slug(SlugScope::JobListing, &draft.title, &mut *tx).await?;
            let listing = JobListing::create(
                NewJobListing::builder()
                    .title(draft.title.clone())
                    .slug(slug)
                    .description(draft.body.clone())
                    .status(status)
                    .service(payload.service.clone())
                    .location(payload.location.clone())
                    .cover_image_url(cover_image_url.map(String::from))
                    .build(),
                &mut *tx,
            )
            .await
            .context("Failed to insert job listing")?;
            JobListing::link_photos(listing.id, photo_ids, &mut *tx).await?;

            JobResult {
                result_id: listing.id.into_uuid(),
                result_slug: listing.slug,
            }
        }
    };

    let completed = GenerationJob::mark_completed(job.id, token, &result, &mut *tx).await?;
    if !completed {
        anyhow::bail!("Job {} is no longer held by this worker", job.id);
    }

    tx.commit().await.context("Failed to commit generated content")?;

    info!(
        job_id = %job.id,
        result_id = %result.result_id,
        slug = %result.result_slug,
        "Generated content saved"
    );
    Ok(result)
}
