use std::time::Duration;

use axum::{extract::Extension, http::StatusCode, Json};
use serde::Serialize;
use sqlx::PgPool;

use crate::domains::generation::{GenerationJob, JobStatus};
use crate::server::app::AppState;

const DB_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    database: DatabaseProbe,
    connection_pool: PoolStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    queue: Option<QueueDepth>,
}

#[derive(Serialize)]
pub struct DatabaseProbe {
    ok: bool,
    latency_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
pub struct PoolStats {
    size: u32,
    idle_connections: usize,
    max_connections: u32,
}

/// Rows per non-terminal status, plus failures awaiting a human requeue.
#[derive(Serialize, Default, Debug, PartialEq)]
pub struct QueueDepth {
    queued: i64,
    processing: i64,
    failed: i64,
}

impl QueueDepth {
    fn from_counts(counts: Vec<(JobStatus, i64)>) -> Self {
        counts
            .into_iter()
            .fold(Self::default(), |mut depth, (status, n)| {
                match status {
                    JobStatus::Queued => depth.queued = n,
                    JobStatus::Processing => depth.processing = n,
                    JobStatus::Failed => depth.failed = n,
                    JobStatus::Completed => {}
                }
                depth
            })
    }
}

async fn probe_database(pool: &PgPool) -> DatabaseProbe {
    let started = std::time::Instant::now();
    let outcome = tokio::time::timeout(DB_PROBE_TIMEOUT, sqlx::query("SELECT 1").execute(pool)).await;
    let latency_ms = started.elapsed().as_millis();

    let error = match outcome {
        Ok(Ok(_)) => None,
        Ok(Err(e)) => Some(format!("Query failed: {}", e)),
        Err(_) => Some(format!("Query timeout (>{}s)", DB_PROBE_TIMEOUT.as_secs())),
    };

    DatabaseProbe {
        ok: error.is_none(),
        latency_ms,
        error,
    }
}

/// Database connectivity, pool utilization and generation queue depth.
///
/// Only the database probe decides the status code; a failed queue count
/// just omits the `queue` section.
pub async fn health_handler(
    Extension(state): Extension<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let pool = &state.deps.db_pool;
    let database = probe_database(pool).await;

    let connection_pool = PoolStats {
        size: pool.size(),
        idle_connections: pool.num_idle(),
        max_connections: pool.options().get_max_connections(),
    };

    let queue = if database.ok {
        match GenerationJob::status_counts(pool).await {
            Ok(counts) => Some(QueueDepth::from_counts(counts)),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to count generation jobs");
                None
            }
        }
    } else {
        None
    };

    let (code, status) = if database.ok {
        (StatusCode::OK, "healthy")
    } else {
        tracing::error!(error = ?database.error, "Health check failed");
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };

    (
        code,
        Json(HealthResponse {
            status,
            database,
            connection_pool,
            queue,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_jobs_do_not_count_toward_depth() {
        let depth = QueueDepth::from_counts(vec![
            (JobStatus::Queued, 4),
            (JobStatus::Completed, 40),
            (JobStatus::Failed, 1),
        ]);
        assert_eq!(
            depth,
            QueueDepth {
                queued: 4,
                processing: 0,
                failed: 1,
            }
        );
    }
}
