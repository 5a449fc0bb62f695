//! Admin authentication
//!
//! Handles:
//! - Email/password sign-in against configured admin credentials
//! - Session management
//! - Authentication extractor for admin routes

mod middleware;
mod routes;
pub mod session;

pub use middleware::CurrentUser;
pub use routes::auth_router;
pub use session::{Session, create_session_token, verify_session_token};
