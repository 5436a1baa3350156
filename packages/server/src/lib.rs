// Contractor site API
//
// Backend for the marketing site: a Postgres-backed queue that turns job
// photos into blog posts and gallery listings, the admin endpoints around it,
// external blog intake and the dynamic sitemap.
//
// Business logic is organized per-domain in domains/*/activities/

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
