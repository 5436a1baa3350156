pub mod album;
pub mod photo;

pub use album::PhotoAlbum;
pub use photo::{NewPhoto, Photo, PhotoFilter, PhotoListing, PhotoView};
