//! Sitemap domain - static marketing pages plus published content

pub mod builder;
pub mod static_routes;

pub use builder::{build_sitemap, load_sitemap, SitemapEntry};
pub use static_routes::{StaticRoute, STATIC_ROUTES};
