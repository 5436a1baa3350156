//! Generation job queue rows.
//!
//! Ownership of a row is decided by conditional updates only: a worker owns a
//! job while `status = 'processing'` and `lock_token` is the token it stamped.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use typed_builder::TypedBuilder;
use uuid::Uuid;

use crate::common::utils::truncate_chars;
use crate::common::{AdminUserId, GenerationJobId, LockToken, PhotoId};

/// Longest error message stored on a failed job
pub const MAX_ERROR_LEN: usize = 500;

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "generation_job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Queued,
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "generation_target_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    BlogPost,
    JobListing,
}

impl TargetType {
    pub fn label(&self) -> &'static str {
        match self {
            TargetType::BlogPost => "blog post",
            TargetType::JobListing => "job gallery listing",
        }
    }
}

impl std::str::FromStr for TargetType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "blog_post" | "blog" => Ok(TargetType::BlogPost),
            "job_listing" | "listing" => Ok(TargetType::JobListing),
            _ => Err(anyhow::anyhow!("Unknown target type: {}", s)),
        }
    }
}

/// The free-form part of a generation request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Publish the result immediately instead of saving a draft
    #[serde(default)]
    pub publish: bool,
}

/// Reference to the content a completed job produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    pub result_id: Uuid,
    pub result_slug: String,
}

// ============================================================================
// Job Model
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct GenerationJob {
    pub id: GenerationJobId,
    pub status: JobStatus,
    pub target_type: TargetType,
    pub requested_by: Option<AdminUserId>,
    pub photo_ids: Vec<PhotoId>,
    pub payload: serde_json::Value,
    pub prompt_override: Option<String>,
    pub attempts: i32,
    pub max_attempts: i32,
    #[serde(skip_serializing)]
    pub lock_token: Option<LockToken>,
    pub result_id: Option<Uuid>,
    pub result_slug: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct NewGenerationJob {
    pub target_type: TargetType,
    pub photo_ids: Vec<PhotoId>,
    #[builder(default)]
    pub requested_by: Option<AdminUserId>,
    #[builder(default)]
    pub payload: GenerationPayload,
    #[builder(default)]
    pub prompt_override: Option<String>,
    #[builder(default = 3)]
    pub max_attempts: i32,
}

impl GenerationJob {
    /// Typed view of the payload; malformed payloads read as empty
    pub fn request(&self) -> GenerationPayload {
        serde_json::from_value(self.payload.clone()).unwrap_or_default()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, JobStatus::Completed | JobStatus::Failed)
    }

    // ========================================================================
    // Queue operations
    // ========================================================================

    pub async fn enqueue(input: NewGenerationJob, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO generation_jobs (
                id, status, target_type, requested_by, photo_ids, payload, prompt_override, max_attempts
            )
            VALUES ($1, 'queued', $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(GenerationJobId::new())
        .bind(input.target_type)
        .bind(input.requested_by)
        .bind(input.photo_ids)
        .bind(serde_json::to_value(&input.payload)?)
        .bind(input.prompt_override)
        .bind(input.max_attempts.max(1))
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Queued rows, oldest first
    pub async fn list_queued(limit: i64, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM generation_jobs
            WHERE status = 'queued'
            ORDER BY created_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Flip one row `queued -> processing`.
    ///
    /// Returns the row only if this call performed the transition.
    pub async fn claim(id: GenerationJobId, token: LockToken, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE generation_jobs
            SET status = 'processing',
                attempts = attempts + 1,
                lock_token = $2,
                started_at = NOW(),
                updated_at = NOW(),
                error_message = NULL
            WHERE id = $1
              AND status = 'queued'
              AND attempts < max_attempts
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(token)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Claim up to `limit` queued rows in one statement, oldest first.
    ///
    /// Rows locked by a concurrent claim are skipped, not waited on.
    pub async fn claim_batch(token: LockToken, limit: i64, pool: &PgPool) -> Result<Vec<Self>> {
        let mut jobs = sqlx::query_as::<_, Self>(
            r#"
            UPDATE generation_jobs AS j
            SET status = 'processing',
                attempts = j.attempts + 1,
                lock_token = $1,
                started_at = NOW(),
                updated_at = NOW(),
                error_message = NULL
            FROM (
                SELECT id FROM generation_jobs
                WHERE status = 'queued' AND attempts < max_attempts
                ORDER BY created_at ASC
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            ) candidates
            WHERE j.id = candidates.id AND j.status = 'queued'
            RETURNING j.*
            "#,
        )
        .bind(token)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        jobs.sort_by_key(|job| job.created_at);
        Ok(jobs)
    }

    /// Mark completed while `token` still holds the row. Returns false if it doesn't.
    pub async fn mark_completed(
        id: GenerationJobId,
        token: LockToken,
        result: &JobResult,
        conn: &mut PgConnection,
    ) -> Result<bool> {
        let updated = sqlx::query(
            r#"
            UPDATE generation_jobs
            SET status = 'completed',
                result_id = $3,
                result_slug = $4,
                error_message = NULL,
                completed_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND lock_token = $2 AND status = 'processing'
            "#,
        )
        .bind(id)
        .bind(token)
        .bind(result.result_id)
        .bind(&result.result_slug)
        .execute(conn)
        .await?;

        Ok(updated.rows_affected() == 1)
    }

    /// Mark failed while `token` still holds the row, storing a truncated error.
    pub async fn mark_failed(
        id: GenerationJobId,
        token: LockToken,
        error: &str,
        pool: &PgPool,
    ) -> Result<bool> {
        let updated = sqlx::query(
            r#"
            UPDATE generation_jobs
            SET status = 'failed',
                error_message = $3,
                completed_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND lock_token = $2 AND status = 'processing'
            "#,
        )
        .bind(id)
        .bind(token)
        .bind(truncate_chars(error, MAX_ERROR_LEN))
        .execute(pool)
        .await?;

        Ok(updated.rows_affected() == 1)
    }

    /// Human re-queue of a failed job; grants at least one more attempt.
    pub async fn requeue(id: GenerationJobId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE generation_jobs
            SET status = 'queued',
                max_attempts = GREATEST(max_attempts, attempts + 1),
                lock_token = NULL,
                error_message = NULL,
                started_at = NULL,
                completed_at = NULL,
                updated_at = NOW()
            WHERE id = $1 AND status = 'failed'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Release rows stuck in `processing` since before `older_than`.
    ///
    /// Rows with attempts left go back to the queue; the rest fail.
    /// Returns the number of rows touched.
    pub async fn recover_stale(older_than: DateTime<Utc>, pool: &PgPool) -> Result<u64> {
        let updated = sqlx::query(
            r#"
            UPDATE generation_jobs
            SET status = CASE
                    WHEN attempts < max_attempts THEN 'queued'::generation_job_status
                    ELSE 'failed'::generation_job_status
                END,
                error_message = CASE
                    WHEN attempts < max_attempts THEN error_message
                    ELSE 'timed out while processing'
                END,
                completed_at = CASE WHEN attempts < max_attempts THEN NULL ELSE NOW() END,
                lock_token = NULL,
                updated_at = NOW()
            WHERE status = 'processing' AND started_at < $1
            "#,
        )
        .bind(older_than)
        .execute(pool)
        .await?;

        Ok(updated.rows_affected())
    }

    // ========================================================================
    // Polling
    // ========================================================================

    pub async fn find_by_id(id: GenerationJobId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM generation_jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Most recent jobs first
    pub async fn list_recent(limit: i64, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM generation_jobs ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Row count per status; statuses with no rows are omitted
    pub async fn status_counts(pool: &PgPool) -> Result<Vec<(JobStatus, i64)>> {
        sqlx::query_as::<_, (JobStatus, i64)>(
            "SELECT status, COUNT(*) FROM generation_jobs GROUP BY status ORDER BY status",
        )
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_defaults() {
        let payload: GenerationPayload = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(payload, GenerationPayload::default());
        assert!(!payload.publish);
    }

    #[test]
    fn test_payload_skips_empty_fields() {
        let payload = GenerationPayload {
            service: Some("Deck building".into()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({"service": "Deck building", "publish": false})
        );
    }

    #[test]
    fn test_target_type_parsing() {
        assert_eq!("blog_post".parse::<TargetType>().unwrap(), TargetType::BlogPost);
        assert_eq!("listing".parse::<TargetType>().unwrap(), TargetType::JobListing);
        assert!("newsletter".parse::<TargetType>().is_err());
    }
}
