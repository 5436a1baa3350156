//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! The queue worker can be driven two ways: the protected HTTP trigger or
//! this in-process schedule. Both call the same `process_queued` pass.
//!
//! ```text
//! Scheduler (WORKER_CRON)
//!     │
//!     └─► process_queued(batch_size)
//!             ├─► recover_stale()
//!             └─► claim_batch() → run each job inline
//! ```

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::domains::generation::activities::process_queued;
use crate::kernel::ServerDeps;

/// Start the queue worker on the given cron schedule (six fields, seconds first)
pub async fn start_scheduler(deps: ServerDeps, schedule: &str) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let queue_deps = deps.clone();
    let queue_job = Job::new_async(schedule, move |_uuid, _lock| {
        let deps = queue_deps.clone();
        Box::pin(async move {
            if let Err(e) = run_queue_pass(&deps).await {
                tracing::error!("Generation queue task failed: {:#}", e);
            }
        })
    })?;

    scheduler.add(queue_job).await?;
    scheduler.start().await?;

    tracing::info!(schedule, "Scheduled tasks started (generation queue worker)");
    Ok(scheduler)
}

async fn run_queue_pass(deps: &ServerDeps) -> Result<()> {
    let summary = process_queued(deps, deps.queue.batch_size).await?;
    if summary.claimed > 0 || summary.recovered > 0 {
        tracing::info!(
            claimed = summary.claimed,
            completed = summary.completed,
            failed = summary.failed,
            recovered = summary.recovered,
            "Scheduled queue pass complete"
        );
    }
    Ok(())
}
