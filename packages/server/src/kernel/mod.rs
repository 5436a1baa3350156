//! Kernel module - server infrastructure and dependencies.

pub mod ai;
pub mod deps;
pub mod scheduled_tasks;
pub mod storage;
pub mod test_dependencies;
pub mod traits;

pub use ai::OpenAIVision;
pub use deps::{QueueSettings, ServerDeps};
pub use storage::HostedImageStore;
pub use traits::*;
