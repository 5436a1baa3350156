//! Queue table semantics: claiming, completion/failure recording, requeue and
//! stale recovery.

mod common;

use crate::common::{create_photos, enqueue_job, TestHarness};
use chrono::{Duration, Utc};
use site_api::common::LockToken;
use site_api::domains::generation::models::{JobResult, MAX_ERROR_LEN};
use site_api::domains::generation::{GenerationJob, JobStatus};
use test_context::test_context;
use uuid::Uuid;

#[test_context(TestHarness)]
#[tokio::test]
async fn second_claim_of_same_row_gets_nothing(ctx: &TestHarness) {
    let photos = create_photos(&ctx.db_pool, 1).await.unwrap();
    let job = enqueue_job(&ctx.db_pool, &[photos[0].id]).await.unwrap();

    let first = GenerationJob::claim(job.id, LockToken::new(), &ctx.db_pool)
        .await
        .unwrap();
    let second = GenerationJob::claim(job.id, LockToken::new(), &ctx.db_pool)
        .await
        .unwrap();

    let claimed = first.expect("first claim should win");
    assert_eq!(claimed.status, JobStatus::Processing);
    assert_eq!(claimed.attempts, 1);
    assert!(claimed.started_at.is_some());
    assert!(second.is_none());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn concurrent_batch_claims_never_share_a_row(ctx: &TestHarness) {
    let photos = create_photos(&ctx.db_pool, 1).await.unwrap();
    for _ in 0..6 {
        enqueue_job(&ctx.db_pool, &[photos[0].id]).await.unwrap();
    }

    let (a, b) = tokio::join!(
        GenerationJob::claim_batch(LockToken::new(), 4, &ctx.db_pool),
        GenerationJob::claim_batch(LockToken::new(), 4, &ctx.db_pool),
    );
    let a = a.unwrap();
    let b = b.unwrap();

    for job in &a {
        assert!(b.iter().all(|other| other.id != job.id));
    }
    let left = GenerationJob::list_queued(10, &ctx.db_pool).await.unwrap();
    assert_eq!(a.len() + b.len() + left.len(), 6);
    assert!(a.len() <= 4 && b.len() <= 4);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn claim_batch_takes_oldest_first(ctx: &TestHarness) {
    let photos = create_photos(&ctx.db_pool, 1).await.unwrap();
    let first = enqueue_job(&ctx.db_pool, &[photos[0].id]).await.unwrap();
    let second = enqueue_job(&ctx.db_pool, &[photos[0].id]).await.unwrap();
    enqueue_job(&ctx.db_pool, &[photos[0].id]).await.unwrap();

    let claimed = GenerationJob::claim_batch(LockToken::new(), 2, &ctx.db_pool)
        .await
        .unwrap();

    let ids: Vec<_> = claimed.iter().map(|j| j.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);

    let remaining = GenerationJob::list_queued(10, &ctx.db_pool).await.unwrap();
    assert_eq!(remaining.len(), 1);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn completion_requires_the_claiming_token(ctx: &TestHarness) {
    let photos = create_photos(&ctx.db_pool, 1).await.unwrap();
    let job = enqueue_job(&ctx.db_pool, &[photos[0].id]).await.unwrap();
    let token = LockToken::new();
    GenerationJob::claim(job.id, token, &ctx.db_pool)
        .await
        .unwrap()
        .unwrap();

    let result = JobResult {
        result_id: Uuid::new_v4(),
        result_slug: "new-driveway".to_string(),
    };

    let mut conn = ctx.db_pool.acquire().await.unwrap();
    let foreign = GenerationJob::mark_completed(job.id, LockToken::new(), &result, &mut *conn)
        .await
        .unwrap();
    assert!(!foreign);

    let owned = GenerationJob::mark_completed(job.id, token, &result, &mut *conn)
        .await
        .unwrap();
    assert!(owned);
    drop(conn);

    let done = GenerationJob::find_by_id(job.id, &ctx.db_pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(done.status, JobStatus::Completed);
    assert_eq!(done.result_slug.as_deref(), Some("new-driveway"));
    assert!(done.completed_at.is_some());
    assert!(done.is_terminal());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn failure_message_is_truncated(ctx: &TestHarness) {
    let photos = create_photos(&ctx.db_pool, 1).await.unwrap();
    let job = enqueue_job(&ctx.db_pool, &[photos[0].id]).await.unwrap();
    let token = LockToken::new();
    GenerationJob::claim(job.id, token, &ctx.db_pool)
        .await
        .unwrap()
        .unwrap();

    let long_error = "x".repeat(MAX_ERROR_LEN * 3);
    assert!(GenerationJob::mark_failed(job.id, token, &long_error, &ctx.db_pool)
        .await
        .unwrap());

    let failed = GenerationJob::find_by_id(job.id, &ctx.db_pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(failed.status, JobStatus::Failed);
    let stored = failed.error_message.unwrap();
    assert!(stored.chars().count() <= MAX_ERROR_LEN);
    assert!(stored.starts_with("xxx"));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn failed_jobs_stay_failed_until_requeued(ctx: &TestHarness) {
    let photos = create_photos(&ctx.db_pool, 1).await.unwrap();
    let job = enqueue_job(&ctx.db_pool, &[photos[0].id]).await.unwrap();
    let token = LockToken::new();
    GenerationJob::claim(job.id, token, &ctx.db_pool)
        .await
        .unwrap()
        .unwrap();
    GenerationJob::mark_failed(job.id, token, "boom", &ctx.db_pool)
        .await
        .unwrap();

    // Nothing picks a failed row up on its own
    let claimed = GenerationJob::claim_batch(LockToken::new(), 10, &ctx.db_pool)
        .await
        .unwrap();
    assert!(claimed.is_empty());

    let requeued = GenerationJob::requeue(job.id, &ctx.db_pool)
        .await
        .unwrap()
        .expect("failed job should requeue");
    assert_eq!(requeued.status, JobStatus::Queued);
    assert!(requeued.error_message.is_none());
    assert!(requeued.lock_token.is_none());
    assert!(requeued.max_attempts > requeued.attempts);

    // Only failed rows can be requeued
    assert!(GenerationJob::requeue(job.id, &ctx.db_pool)
        .await
        .unwrap()
        .is_none());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn requeue_grants_an_attempt_past_the_budget(ctx: &TestHarness) {
    let photos = create_photos(&ctx.db_pool, 1).await.unwrap();
    let job = enqueue_job(&ctx.db_pool, &[photos[0].id]).await.unwrap();

    // Burn every attempt
    for _ in 0..job.max_attempts {
        let token = LockToken::new();
        GenerationJob::claim(job.id, token, &ctx.db_pool)
            .await
            .unwrap()
            .unwrap();
        GenerationJob::mark_failed(job.id, token, "still broken", &ctx.db_pool)
            .await
            .unwrap();
        GenerationJob::requeue(job.id, &ctx.db_pool).await.unwrap();
    }

    let job = GenerationJob::find_by_id(job.id, &ctx.db_pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(job.status, JobStatus::Queued);
    assert!(GenerationJob::claim(job.id, LockToken::new(), &ctx.db_pool)
        .await
        .unwrap()
        .is_some());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn stale_processing_rows_are_recovered(ctx: &TestHarness) {
    let photos = create_photos(&ctx.db_pool, 1).await.unwrap();
    let retryable = enqueue_job(&ctx.db_pool, &[photos[0].id]).await.unwrap();
    let exhausted = enqueue_job(&ctx.db_pool, &[photos[0].id]).await.unwrap();
    let fresh = enqueue_job(&ctx.db_pool, &[photos[0].id]).await.unwrap();

    for job in [&retryable, &exhausted, &fresh] {
        GenerationJob::claim(job.id, LockToken::new(), &ctx.db_pool)
            .await
            .unwrap()
            .unwrap();
    }

    sqlx::query(
        "UPDATE generation_jobs SET started_at = NOW() - INTERVAL '1 hour' WHERE id = ANY($1)",
    )
    .bind(vec![retryable.id, exhausted.id])
    .execute(&ctx.db_pool)
    .await
    .unwrap();
    sqlx::query("UPDATE generation_jobs SET max_attempts = attempts WHERE id = $1")
        .bind(exhausted.id)
        .execute(&ctx.db_pool)
        .await
        .unwrap();

    let recovered = GenerationJob::recover_stale(Utc::now() - Duration::minutes(15), &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(recovered, 2);

    let load = |id| GenerationJob::find_by_id(id, &ctx.db_pool);
    let retryable = load(retryable.id).await.unwrap().unwrap();
    let exhausted = load(exhausted.id).await.unwrap().unwrap();
    let fresh = load(fresh.id).await.unwrap().unwrap();

    assert_eq!(retryable.status, JobStatus::Queued);
    assert!(retryable.lock_token.is_none());
    assert_eq!(exhausted.status, JobStatus::Failed);
    assert_eq!(exhausted.error_message.as_deref(), Some("timed out while processing"));
    assert_eq!(fresh.status, JobStatus::Processing);
}
