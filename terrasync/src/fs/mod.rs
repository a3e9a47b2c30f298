//! Local filesystem helpers: content hashing and directory handling.

pub mod hash;
pub mod tree;

pub use hash::ContentHash;
