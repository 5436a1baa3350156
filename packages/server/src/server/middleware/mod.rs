// HTTP middleware
pub mod api_key;
pub mod ip_extractor;
pub mod jwt_auth;

pub use api_key::*;
pub use ip_extractor::*;
pub use jwt_auth::*;
