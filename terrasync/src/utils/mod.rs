//! Utility modules for terrasync.

pub mod errors;
pub mod logger;

pub use errors::{Result, SyncError};
