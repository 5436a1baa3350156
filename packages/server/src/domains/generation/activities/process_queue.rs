//! Queue worker
//!
//! Claims a batch with a fresh lock token and runs each job inline, one after
//! another. Failures are recorded on the row; nothing retries on its own.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::common::LockToken;
use crate::domains::generation::activities::generate::generate_draft;
use crate::domains::generation::activities::persist::persist_draft;
use crate::domains::generation::models::{GenerationJob, JobResult};
use crate::domains::generation::prompt::select_lead_photo;
use crate::domains::photos::Photo;
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessSummary {
    pub claimed: usize,
    pub completed: usize,
    pub failed: usize,
    /// Stale `processing` rows released before claiming
    pub recovered: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed(JobResult),
    Failed(String),
}

async fn execute(deps: &ServerDeps, job: &GenerationJob, token: LockToken) -> Result<JobResult> {
    let photos = Photo::find_by_ids(&job.photo_ids, &deps.db_pool)
        .await
        .context("Failed to load photos")?;
    if photos.is_empty() {
        anyhow::bail!("None of the selected photos exist anymore");
    }
    if photos.len() < job.photo_ids.len() {
        warn!(
            job_id = %job.id,
            requested = job.photo_ids.len(),
            found = photos.len(),
            "Some selected photos are missing"
        );
    }

    let payload = job.request();
    let draft = generate_draft(
        deps.ai.as_ref(),
        job.target_type,
        &payload,
        job.prompt_override.as_deref(),
        &photos,
    )
    .await?;

    let cover = select_lead_photo(&photos).map(|p| p.image_url.as_str());
    let photo_ids: Vec<_> = photos.iter().map(|p| p.id).collect();
    persist_draft(job, token, &draft, &photo_ids, cover, &deps.db_pool).await
}

/// Run one claimed job to completion or failure.
pub async fn run_job(deps: &ServerDeps, job: &GenerationJob, token: LockToken) -> JobOutcome {
    info!(job_id = %job.id, attempt = job.attempts, target = ?job.target_type, "Processing job");

    match execute(deps, job, token).await {
        Ok(result) => JobOutcome::Completed(result),
        Err(e) => {
            let message = format!("{:#}", e);
            error!(job_id = %job.id, error = %message, "Job failed");
            match GenerationJob::mark_failed(job.id, token, &message, &deps.db_pool).await {
                Ok(true) => {}
                Ok(false) => warn!(job_id = %job.id, "Job no longer held, failure not recorded"),
                Err(e) => error!(job_id = %job.id, error = %e, "Failed to record job failure"),
            }
            JobOutcome::Failed(message)
        }
    }
}

/// Claim up to `limit` queued jobs and process them sequentially.
pub async fn process_queued(deps: &ServerDeps, limit: i64) -> Result<ProcessSummary> {
    let cutoff = chrono::Utc::now() - deps.queue.stale_after;
    let recovered = GenerationJob::recover_stale(cutoff, &deps.db_pool)
        .await
        .context("Failed to recover stale jobs")?;
    if recovered > 0 {
        warn!(recovered, "Released stale processing jobs");
    }

    let token = LockToken::new();
    let jobs = GenerationJob::claim_batch(token, limit.max(1), &deps.db_pool)
        .await
        .context("Failed to claim jobs")?;

    let mut summary = ProcessSummary {
        claimed: jobs.len(),
        recovered,
        ..Default::default()
    };
    if jobs.is_empty() {
        return Ok(summary);
    }
    info!(lock_token = %token, claimed = jobs.len(), "Claimed generation jobs");

    for job in &jobs {
        match run_job(deps, job, token).await {
            JobOutcome::Completed(_) => summary.completed += 1,
            JobOutcome::Failed(_) => summary.failed += 1,
        }
    }

    info!(
        claimed = summary.claimed,
        completed = summary.completed,
        failed = summary.failed,
        "Queue pass finished"
    );
    Ok(summary)
}
