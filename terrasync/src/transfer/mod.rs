//! Content transport: how repository files reach the local machine.
//!
//! The engine only talks to the [`Transport`] trait, so the synchronization
//! logic can run against the real HTTP server ([`http::HttpTransport`]) or a
//! fixed in-memory repository ([`memory::MemoryTransport`]).

pub mod http;
pub mod memory;
pub mod progress;
pub mod retry;

use crate::utils::Result;
use crate::vpath::VirtualPath;
use std::path::Path;
use tokio::io::AsyncRead;

pub use http::{Credentials, HttpOptions, HttpTransport};
pub use memory::MemoryTransport;
pub use progress::TransferStats;
pub use retry::RetryPolicy;

/// Readable handle on a response body.
pub type ByteReader = Box<dyn AsyncRead + Send + Unpin>;

/// One request at a time; implementations retry transient failures themselves.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Fetch `path` and hand back the body without storing it.
    async fn get(&mut self, path: &VirtualPath) -> Result<ByteReader>;

    /// Fetch `path` into `destination`, replacing any existing file only
    /// once the whole body has been received. Returns the number of bytes
    /// written.
    async fn download(&mut self, path: &VirtualPath, destination: &Path) -> Result<u64>;
}
