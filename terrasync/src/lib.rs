//! TerraSync library
//!
//! Mirrors a scenery repository published over HTTP onto local disk. Each
//! repository directory carries a `.dirindex` manifest listing its children
//! with their SHA-1 hashes; only what differs is downloaded.

pub mod config;
pub mod fs;
pub mod manifest;
pub mod sync;
pub mod transfer;
pub mod utils;
pub mod vpath;

// Re-export commonly used types
pub use config::Config;
pub use sync::{Mode, SyncOptions, SyncOutcome, TerraSync};
pub use utils::errors::SyncError;
pub use utils::Result;
pub use vpath::{MutableVirtualPath, VirtualPath, VirtualPathLike};
