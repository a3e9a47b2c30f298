//! Parser for `.dirindex` manifest files.
//!
//! Each repository directory carries a `.dirindex` file describing what the
//! server expects to find in it:
//!
//! ```text
//! version:1
//! path:Objects/w010n50
//! d:w003n51:<sha1-hex>
//! f:w003n51.stg:<sha1-hex>:<size>
//! t:w003n51.txz:<sha1-hex>:<size>
//! # comment
//! ```
//!
//! Parsing is a single pass over the lines. Unknown leading tokens and blank
//! lines are ignored; the `version`, `path`, `d`, `f` and `t` lines are
//! strictly positional.

use crate::fs::ContentHash;
use crate::utils::errors::{EntryKind, ManifestError};
use crate::vpath::{VirtualPath, VirtualPathLike};
use std::str::FromStr;

/// File name of the manifest inside every repository directory.
pub const DIRINDEX: &str = ".dirindex";

/// A subdirectory declared by a manifest (`d:` line).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    /// Hash of the subdirectory's own `.dirindex` file
    pub hash: ContentHash,
}

/// A file or tarball declared by a manifest (`f:` and `t:` lines).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub hash: ContentHash,
    pub size: u64,
}

/// Parsed contents of one `.dirindex` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub version: u32,
    /// Directory described by this manifest, relative to the repository root
    pub path: VirtualPath,
    pub directories: Vec<DirectoryEntry>,
    pub files: Vec<FileEntry>,
    pub tarballs: Vec<FileEntry>,
}

impl Manifest {
    pub fn parse(contents: &str) -> Result<Self, ManifestError> {
        let mut version = 0;
        let mut path = None;
        let mut directories = Vec::new();
        let mut files = Vec::new();
        let mut tarballs = Vec::new();

        for (index, raw_line) in contents.lines().enumerate() {
            let line_no = index + 1;
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let tokens: Vec<&str> = line.split(':').collect();
            let fields = Fields {
                tokens: &tokens,
                line: line_no,
            };

            match tokens[0] {
                "version" => {
                    version = parse_number(fields.get(1, "version")?, "version", line_no)?;
                }
                "path" => {
                    path = Some(parse_path(fields.get(1, "path")?, line_no)?);
                }
                "d" => {
                    directories.push(DirectoryEntry {
                        name: parse_name(fields.get(1, "name")?, EntryKind::Directory, line_no)?,
                        hash: parse_hash(fields.get(2, "hash")?, line_no)?,
                    });
                }
                "f" => files.push(parse_file_entry(&fields, EntryKind::File)?),
                "t" => tarballs.push(parse_file_entry(&fields, EntryKind::Tarball)?),
                _ => {}
            }
        }

        Ok(Self {
            version,
            path: path.ok_or(ManifestError::MissingPath)?,
            directories,
            files,
            tarballs,
        })
    }

    /// Files and tarballs, in declaration order (files first).
    pub fn file_entries(&self) -> impl Iterator<Item = &FileEntry> {
        self.files.iter().chain(self.tarballs.iter())
    }

    pub fn declares_file(&self, name: &str) -> bool {
        self.file_entries().any(|f| f.name == name)
    }

    pub fn declares_directory(&self, name: &str) -> bool {
        self.directories.iter().any(|d| d.name == name)
    }

    /// Ensure the manifest describes the directory it was fetched for.
    pub fn check_path(&self, expected: &VirtualPath) -> Result<(), ManifestError> {
        if self.path == *expected {
            Ok(())
        } else {
            Err(ManifestError::UnexpectedPath {
                declared: self.path.as_relative().to_string(),
                expected: expected.as_relative().to_string(),
            })
        }
    }
}

/// Positional access to the colon-separated tokens of one line.
struct Fields<'a> {
    tokens: &'a [&'a str],
    line: usize,
}

impl<'a> Fields<'a> {
    fn get(&self, index: usize, field: &'static str) -> Result<&'a str, ManifestError> {
        self.tokens
            .get(index)
            .copied()
            .ok_or(ManifestError::MissingField {
                line: self.line,
                field,
            })
    }
}

fn parse_file_entry(fields: &Fields<'_>, kind: EntryKind) -> Result<FileEntry, ManifestError> {
    Ok(FileEntry {
        name: parse_name(fields.get(1, "name")?, kind, fields.line)?,
        hash: parse_hash(fields.get(2, "hash")?, fields.line)?,
        size: parse_number(fields.get(3, "size")?, "size", fields.line)?,
    })
}

fn parse_name(name: &str, kind: EntryKind, line: usize) -> Result<String, ManifestError> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(ManifestError::InvalidName {
            line,
            kind,
            name: name.to_string(),
        });
    }
    Ok(name.to_string())
}

fn parse_path(raw: &str, line: usize) -> Result<VirtualPath, ManifestError> {
    if raw.starts_with('/') || raw.contains('\\') || raw.split('/').any(|c| c == "..") {
        return Err(ManifestError::InvalidPath {
            line,
            path: raw.to_string(),
        });
    }
    Ok(VirtualPath::new(raw))
}

fn parse_hash(raw: &str, line: usize) -> Result<ContentHash, ManifestError> {
    raw.parse().map_err(|_| ManifestError::InvalidHash {
        line,
        value: raw.to_string(),
    })
}

fn parse_number<T: FromStr>(raw: &str, field: &'static str, line: usize) -> Result<T, ManifestError> {
    raw.parse().map_err(|_| ManifestError::InvalidNumber {
        line,
        field,
        value: raw.to_string(),
    })
}
