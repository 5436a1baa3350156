//! Generation domain - turns a photo selection into a blog post or job listing
//!
//! Flow:
//!
//! ```text
//! POST /api/generation ─► request_generation() ─► generation_jobs (queued)
//!
//! worker (HTTP or cron) ─► claim_batch() ─► generate_draft() ─► persist_draft()
//!                                                │                  │
//!                                                ▼                  ▼
//!                                         vision completion   content + links
//!                                      (one image-less retry)  + job completed
//! ```

pub mod activities;
pub mod fallback;
pub mod models;
pub mod output;
pub mod prompt;

pub use models::{GenerationJob, GenerationPayload, JobStatus, TargetType};
