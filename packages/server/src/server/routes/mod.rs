// HTTP routes
pub mod blog;
pub mod generation;
pub mod health;
pub mod photos;
pub mod sitemap;

pub use blog::*;
pub use generation::*;
pub use health::*;
pub use photos::*;
pub use sitemap::*;
