//! Authentication middleware and request guards

pub mod rate_limit;
pub mod user_auth;

pub use user_auth::UserIdentity;
