//! Content domain activities - entry-point business logic

pub mod external_post;

pub use external_post::{
    create_external_post, ExternalPostInput, ImageUpload, IntakeError, MAX_IMAGE_BYTES,
};
