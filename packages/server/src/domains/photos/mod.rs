//! Photos domain - imported job photos and the selection views over them

pub mod models;

pub use models::{NewPhoto, Photo, PhotoAlbum, PhotoFilter, PhotoListing, PhotoView};
