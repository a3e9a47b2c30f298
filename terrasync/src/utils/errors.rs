//! Error types for the TerraSync engine.

use crate::vpath::VirtualPath;
use std::fmt;
use thiserror::Error;

/// Boxed cause of a transient transport failure.
pub type TransientCause = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Invalid .dirindex file for '{path}': {source}")]
    InvalidManifest {
        path: VirtualPath,
        #[source]
        source: ManifestError,
    },

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Unsupported URL scheme '{0}' (only http and https are supported)")]
    UnsupportedScheme(String),

    #[error("{0}")]
    User(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid download boundaries: {0}")]
    InvalidBoundaries(#[from] BoundaryError),

    #[error("Invalid virtual path: {0}")]
    InvalidPath(#[from] VirtualPathError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the content transport.
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("after {retries} retries for URL {url}: {source}")]
    RetriesExhausted {
        url: String,
        retries: u32,
        #[source]
        source: TransientCause,
    },

    #[error("got HTTP status {status} for URL {url}")]
    Status { url: String, status: u16 },
}

/// Reasons a `.dirindex` file is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManifestError {
    #[error("no 'path' line")]
    MissingPath,

    #[error("line {line}: invalid path '{path}'")]
    InvalidPath { line: usize, path: String },

    #[error("line {line}: invalid {kind} name '{name}'")]
    InvalidName {
        line: usize,
        kind: EntryKind,
        name: String,
    },

    #[error("line {line}: missing '{field}' field")]
    MissingField { line: usize, field: &'static str },

    #[error("line {line}: '{field}' must be an integer, got '{value}'")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("line {line}: '{value}' is not a SHA-1 hex digest")]
    InvalidHash { line: usize, value: String },

    #[error("declares path '{declared}' but was fetched for '{expected}'")]
    UnexpectedPath { declared: String, expected: String },

    #[error("not valid UTF-8")]
    NotUtf8,
}

/// Kinds of child entries a manifest can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Directory,
    File,
    Tarball,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntryKind::Directory => "directory",
            EntryKind::File => "file",
            EntryKind::Tarball => "tarball",
        })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VirtualPathError {
    #[error("'{prefix}' is not a prefix of '{path}'")]
    NotAPrefix { path: String, prefix: String },

    #[error("'{0}' has an empty name")]
    EmptyName(String),

    #[error("invalid suffix '{0}'")]
    InvalidSuffix(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundaryError {
    #[error("top ({top}) cannot be less than bottom ({bottom})")]
    Inverted { top: f64, bottom: f64 },

    #[error("latitude {0} is outside [-90, 90]")]
    Latitude(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    Longitude(f64),

    #[error("right ({right}) is less than left ({left}) without crossing the antimeridian")]
    BadWrap { left: f64, right: f64 },
}

pub type Result<T> = std::result::Result<T, SyncError>;
