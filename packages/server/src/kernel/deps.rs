//! Server dependencies for activities (using traits for testability)
//!
//! This module provides the central dependency container shared by the HTTP
//! handlers, the queue worker and the scheduler. External services sit behind
//! trait objects so tests can swap in the mocks from `test_dependencies`.

use sqlx::PgPool;
use std::sync::Arc;

use crate::domains::auth::JwtService;
use crate::kernel::{BaseImageStore, BaseVisionAI};

/// Queue tuning knobs
#[derive(Debug, Clone)]
pub struct QueueSettings {
    /// Rows claimed per worker invocation
    pub batch_size: i64,
    /// Attempts granted to a new job
    pub max_attempts: i32,
    /// `processing` rows older than this are released
    pub stale_after: chrono::Duration,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            batch_size: 5,
            max_attempts: 3,
            stale_after: chrono::Duration::minutes(15),
        }
    }
}

/// Server dependencies accessible to activities
#[derive(Clone)]
pub struct ServerDeps {
    pub db_pool: PgPool,
    /// Vision completions for the generation step
    pub ai: Arc<dyn BaseVisionAI>,
    /// Cover image uploads; None when storage isn't configured
    pub image_store: Option<Arc<dyn BaseImageStore>>,
    /// JWT service for admin token verification
    pub jwt_service: Arc<JwtService>,
    pub queue: QueueSettings,
}

impl ServerDeps {
    pub fn new(
        db_pool: PgPool,
        ai: Arc<dyn BaseVisionAI>,
        image_store: Option<Arc<dyn BaseImageStore>>,
        jwt_service: Arc<JwtService>,
        queue: QueueSettings,
    ) -> Self {
        Self {
            db_pool,
            ai,
            image_store,
            jwt_service,
            queue,
        }
    }
}
