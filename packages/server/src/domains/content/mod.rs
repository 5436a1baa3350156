//! Content domain - blog posts, job listings and their photo links

pub mod activities;
pub mod models;

pub use models::{BlogPost, ContentStatus, JobListing};
