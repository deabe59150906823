//! Business services used by the API handlers

pub mod scan;
pub mod stats;
