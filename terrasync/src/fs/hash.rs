//! SHA-1 content hashes, as declared in `.dirindex` files.
//!
//! Hashing always streams fixed-size chunks so that large scenery files
//! never have to fit in memory.

use sha1::{Digest, Sha1};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Chunk size used when streaming data through the hasher (64KB).
const HASH_CHUNK_SIZE: usize = 64 * 1024;

/// A SHA-1 digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 20]);

impl ContentHash {
    /// Hash an in-memory buffer.
    pub fn of(data: &[u8]) -> Self {
        Self::from_digest(&Sha1::digest(data))
    }

    fn from_digest(digest: &[u8]) -> Self {
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(digest);
        Self(bytes)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for ContentHash {
    type Err = hex::FromHexError;

    /// Parse a 40-character hex digest (either case).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

/// Hash everything readable from `reader`.
pub async fn hash_reader<R>(reader: &mut R) -> std::io::Result<ContentHash>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut hasher = Sha1::new();
    let mut buffer = vec![0u8; HASH_CHUNK_SIZE];

    loop {
        let n = reader.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(ContentHash::from_digest(&hasher.finalize()))
}

/// Hash the contents of a local file.
pub async fn hash_file(path: &Path) -> std::io::Result<ContentHash> {
    let mut file = tokio::fs::File::open(path).await?;
    hash_reader(&mut file).await
}
