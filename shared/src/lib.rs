//! Shared types for SpendShred
//!
//! Error codes, the API response envelope and the subscription domain
//! models used by the server and its API clients.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};
