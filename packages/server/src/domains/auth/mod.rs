//! Auth domain - verifies tokens issued by the hosted auth backend
//!
//! Login (OTP) happens in the hosted backend. This service checks the token
//! signature and then gates access on the `admin_users` table.

pub mod jwt;
pub mod models;

pub use jwt::{Claims, JwtService};
pub use models::AdminUser;
