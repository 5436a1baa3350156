pub mod generation_job;

pub use generation_job::{
    GenerationJob, GenerationPayload, JobResult, JobStatus, NewGenerationJob, TargetType,
    MAX_ERROR_LEN,
};
