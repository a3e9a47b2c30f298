//! Fixed in-memory repository, for tests and dry runs.

use super::{ByteReader, Transport};
use crate::utils::errors::NetworkError;
use crate::utils::Result;
use crate::vpath::VirtualPath;
use bytes::Bytes;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

/// Serves a map of virtual paths to contents and remembers every request.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    files: HashMap<VirtualPath, Bytes>,
    gets: Vec<VirtualPath>,
    downloads: Vec<VirtualPath>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the contents served at `path`.
    pub fn insert(&mut self, path: &str, contents: impl Into<Bytes>) -> &mut Self {
        self.files.insert(VirtualPath::new(path), contents.into());
        self
    }

    pub fn remove(&mut self, path: &str) -> Option<Bytes> {
        self.files.remove(&VirtualPath::new(path))
    }

    /// Paths fetched with [`Transport::get`], in order.
    pub fn gets(&self) -> &[VirtualPath] {
        &self.gets
    }

    /// Paths fetched with [`Transport::download`], in order.
    pub fn downloads(&self) -> &[VirtualPath] {
        &self.downloads
    }

    fn lookup(&self, path: &VirtualPath) -> Result<Bytes> {
        self.files.get(path).cloned().ok_or_else(|| {
            NetworkError::Status {
                url: path.to_string(),
                status: 404,
            }
            .into()
        })
    }
}

impl Transport for MemoryTransport {
    async fn get(&mut self, path: &VirtualPath) -> Result<ByteReader> {
        self.gets.push(path.clone());
        let contents = self.lookup(path)?;
        Ok(Box::new(Cursor::new(contents)))
    }

    async fn download(&mut self, path: &VirtualPath, destination: &Path) -> Result<u64> {
        self.downloads.push(path.clone());
        let contents = self.lookup(path)?;
        tokio::fs::write(destination, &contents).await?;
        Ok(contents.len() as u64)
    }
}
