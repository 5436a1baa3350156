//! Generation domain activities - entry-point business logic
//!
//! Called from the HTTP handlers and the scheduler.

pub mod claim;
pub mod generate;
pub mod persist;
pub mod process_queue;
pub mod request_generation;

pub use claim::claim_candidates;
pub use generate::generate_draft;
pub use persist::persist_draft;
pub use process_queue::{process_queued, run_job, JobOutcome, ProcessSummary};
pub use request_generation::{
    request_generation, validate_selection, GenerationSelection, SelectionError, MAX_SELECTION,
};
