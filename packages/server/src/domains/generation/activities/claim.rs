//! Claim step
//!
//! A row belongs to the caller only if its own conditional update flipped it.
//! There is no in-process lock, lease renewal or heartbeat.

use anyhow::Result;
use sqlx::PgPool;
use tracing::debug;

use crate::common::LockToken;
use crate::domains::generation::models::GenerationJob;

/// Try to claim each candidate in order; returns the rows this call won.
pub async fn claim_candidates(
    candidates: &[GenerationJob],
    token: LockToken,
    pool: &PgPool,
) -> Result<Vec<GenerationJob>> {
    let mut claimed = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        match GenerationJob::claim(candidate.id, token, pool).await? {
            Some(job) => claimed.push(job),
            None => debug!(job_id = %candidate.id, "Job already claimed elsewhere, skipping"),
        }
    }

    Ok(claimed)
}
