// Business domains
pub mod auth;
pub mod content;
pub mod generation;
pub mod photos;
pub mod sitemap;
