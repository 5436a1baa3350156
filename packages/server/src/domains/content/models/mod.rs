pub mod blog_post;
pub mod job_listing;
pub mod slug;
pub mod status;

pub use blog_post::{BlogPost, NewBlogPost};
pub use job_listing::{JobListing, NewJobListing};
pub use slug::{unique_slug, SlugScope};
pub use status::{BlogPostSource, ContentStatus, PublishedPage};
