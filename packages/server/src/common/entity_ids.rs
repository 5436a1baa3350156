//! Typed ID definitions for all domain entities.

pub use super::id::{Id, V4, V7};

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for admin users (identities from the hosted auth backend).
pub struct AdminUser;

/// Marker type for photo albums (import batches grouped by source).
pub struct PhotoAlbum;

/// Marker type for job photos.
pub struct Photo;

/// Marker type for blog posts.
pub struct BlogPost;

/// Marker type for permanent job gallery listings.
pub struct JobListing;

/// Marker type for queued generation requests.
pub struct GenerationJob;

/// Marker type for the token a worker invocation stamps on the rows it claims.
pub struct ClaimLock;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

pub type AdminUserId = Id<AdminUser>;

pub type PhotoAlbumId = Id<PhotoAlbum>;

pub type PhotoId = Id<Photo>;

pub type BlogPostId = Id<BlogPost>;

pub type JobListingId = Id<JobListing>;

pub type GenerationJobId = Id<GenerationJob>;

/// Lock tokens are random so two invocations never mint the same one.
pub type LockToken = Id<ClaimLock, V4>;
