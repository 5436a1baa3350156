//! Admin generation endpoints.

use anyhow::Context;
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::common::GenerationJobId;
use crate::domains::generation::activities::{
    process_queued, request_generation, GenerationSelection, ProcessSummary,
};
use crate::domains::generation::{GenerationJob, JobStatus};
use crate::server::app::AppState;
use crate::server::error::{ApiError, ApiResult};
use crate::server::middleware::{RequireAdmin, WorkerAccess, WorkerCaller};

const DEFAULT_JOB_LIMIT: i64 = 50;
const MAX_JOB_LIMIT: i64 = 200;

/// POST /api/generation
pub async fn create_generation_handler(
    Extension(state): Extension<AppState>,
    RequireAdmin(user): RequireAdmin,
    Json(selection): Json<GenerationSelection>,
) -> ApiResult<(StatusCode, Json<GenerationJob>)> {
    let job = request_generation(user.user_id, selection, &state.deps).await?;

    // Queued rows are accepted for later; inline runs report their outcome
    let status = match job.status {
        JobStatus::Queued | JobStatus::Processing => StatusCode::ACCEPTED,
        JobStatus::Completed | JobStatus::Failed => StatusCode::CREATED,
    };
    Ok((status, Json(job)))
}

#[derive(Debug, Deserialize)]
pub struct JobListQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<GenerationJob>,
}

/// GET /api/generation/jobs
pub async fn list_jobs_handler(
    Extension(state): Extension<AppState>,
    RequireAdmin(_user): RequireAdmin,
    Query(query): Query<JobListQuery>,
) -> ApiResult<Json<JobListResponse>> {
    let limit = query.limit.unwrap_or(DEFAULT_JOB_LIMIT).clamp(1, MAX_JOB_LIMIT);
    let jobs = GenerationJob::list_recent(limit, &state.deps.db_pool)
        .await
        .context("Failed to list generation jobs")?;
    Ok(Json(JobListResponse { jobs }))
}

/// GET /api/generation/jobs/:id
pub async fn get_job_handler(
    Extension(state): Extension<AppState>,
    RequireAdmin(_user): RequireAdmin,
    Path(id): Path<GenerationJobId>,
) -> ApiResult<Json<GenerationJob>> {
    GenerationJob::find_by_id(id, &state.deps.db_pool)
        .await
        .context("Failed to load generation job")?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Generation job {} not found", id)))
}

/// POST /api/generation/jobs/:id/requeue
pub async fn requeue_job_handler(
    Extension(state): Extension<AppState>,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<GenerationJobId>,
) -> ApiResult<Json<GenerationJob>> {
    let pool = &state.deps.db_pool;
    if let Some(job) = GenerationJob::requeue(id, pool)
        .await
        .context("Failed to requeue generation job")?
    {
        tracing::info!(job_id = %id, requested_by = %user.user_id, "Job requeued");
        return Ok(Json(job));
    }

    match GenerationJob::find_by_id(id, pool).await? {
        Some(job) => Err(ApiError::Conflict(format!(
            "Only failed jobs can be requeued (job is {:?})",
            job.status
        ))),
        None => Err(ApiError::NotFound(format!("Generation job {} not found", id))),
    }
}

#[derive(Debug, Deserialize)]
pub struct ProcessQuery {
    pub limit: Option<i64>,
}

/// POST /api/generation/process
pub async fn process_queue_handler(
    Extension(state): Extension<AppState>,
    WorkerAccess(caller): WorkerAccess,
    Query(query): Query<ProcessQuery>,
) -> ApiResult<Json<ProcessSummary>> {
    let limit = query
        .limit
        .unwrap_or(state.deps.queue.batch_size)
        .clamp(1, MAX_JOB_LIMIT);

    match &caller {
        WorkerCaller::Scheduler => tracing::debug!(limit, "Queue pass triggered by worker"),
        WorkerCaller::Admin(user) => {
            tracing::info!(limit, requested_by = %user.user_id, "Queue pass triggered by admin")
        }
    }

    let summary = process_queued(&state.deps, limit).await?;
    Ok(Json(summary))
}
