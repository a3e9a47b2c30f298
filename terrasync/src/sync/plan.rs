//! Decisions taken during a directory walk, free of any I/O.
//!
//! The engine gathers local facts (does the file exist, what is its hash,
//! what does the directory contain) and asks this module what to do next.

use crate::fs::tree::{LocalEntry, LocalKind};
use crate::fs::ContentHash;
use crate::manifest::{Manifest, DIRINDEX};
use crate::sync::boundaries::{name_to_coordinate, DownloadBoundaries};
use crate::sync::report::Report;
use crate::vpath::{VirtualPath, VirtualPathLike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Main mode of operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Read-only comparison, stops at the first discrepancy
    Check,
    /// Download and (optionally) delete until the local copy matches
    #[default]
    Sync,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Check => "check",
            Mode::Sync => "sync",
        })
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "check" => Ok(Mode::Check),
            "sync" => Ok(Mode::Sync),
            other => Err(format!("unknown mode '{other}' (expected 'check' or 'sync')")),
        }
    }
}

/// A difference between the local copy and what the server declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discrepancy {
    MissingDirIndex,
    MismatchingDirIndexHash,
    MissingFile,
    MismatchingFileHash,
    OrphanFile,
    OrphanDirectory,
}

impl Discrepancy {
    /// Human-readable reason, used when check mode stops.
    pub fn explain(&self, path: &VirtualPath) -> String {
        match self {
            Discrepancy::MissingDirIndex => {
                format!(".dirindex file '{path}' is missing locally")
            }
            Discrepancy::MismatchingDirIndexHash => format!(
                ".dirindex file '{path}' doesn't have the hash it should have according to the server"
            ),
            Discrepancy::MissingFile => {
                format!("file '{path}' is present on the server but missing locally")
            }
            Discrepancy::MismatchingFileHash => format!(
                "file '{path}' doesn't have the hash given in the .dirindex file of its containing directory"
            ),
            Discrepancy::OrphanFile => {
                format!("file '{path}' was found locally but is not present on the server")
            }
            Discrepancy::OrphanDirectory => {
                format!("directory '{path}' was found locally but is not present on the server")
            }
        }
    }

    /// File this discrepancy into the matching report category.
    pub fn record(&self, report: &mut Report, path: VirtualPath) {
        match self {
            Discrepancy::MissingDirIndex => report.add_missing_dir_index(path),
            Discrepancy::MismatchingDirIndexHash => report.add_dir_index_with_mismatching_hash(path),
            Discrepancy::MissingFile => report.add_missing_file(path),
            Discrepancy::MismatchingFileHash => report.add_file_with_mismatching_hash(path),
            Discrepancy::OrphanFile => report.add_orphan_file(path),
            Discrepancy::OrphanDirectory => report.add_orphan_dir(path),
        }
    }
}

/// Next step for a directory whose boundaries check passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryStep {
    /// Local `.dirindex` matches; walk its children unless in quick mode
    UpToDate { descend: bool },
    /// Fetch a fresh `.dirindex` (sync mode)
    Refresh(Discrepancy),
    /// Stop the run (check mode)
    Abort(Discrepancy),
}

/// What is found at the local path of a declared file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalFile {
    Missing,
    /// A directory sits where the server has a file
    Directory,
    Present(ContentHash),
}

/// Next step for a declared file or tarball.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStep {
    UpToDate,
    Fetch {
        discrepancy: Discrepancy,
        /// A local directory must be removed first
        clear_directory: bool,
    },
    Abort(Discrepancy),
}

/// Local entry not declared by the directory's manifest.
#[derive(Debug, Clone, Copy)]
pub struct Orphan<'a> {
    pub entry: &'a LocalEntry,
    pub discrepancy: Discrepancy,
}

/// Whether the directory at `path` is a bucket outside `boundaries`.
///
/// A bucket whose parent is itself a bucket is an inner (1°) bucket; any
/// other bucket is an outer (10°) one.
pub fn outside_boundaries(path: &VirtualPath, boundaries: Option<&DownloadBoundaries>) -> bool {
    let Some(boundaries) = boundaries else {
        return false;
    };
    let Some(coord) = name_to_coordinate(path.name()) else {
        return false;
    };

    let is_outer_bucket = name_to_coordinate(path.parent().name()).is_none();
    !boundaries.is_inside(coord, is_outer_bucket)
}

pub fn manifest_discrepancy(local: Option<&ContentHash>, declared: &ContentHash) -> Option<Discrepancy> {
    match local {
        None => Some(Discrepancy::MissingDirIndex),
        Some(hash) if hash != declared => Some(Discrepancy::MismatchingDirIndexHash),
        Some(_) => None,
    }
}

pub fn plan_directory(
    mode: Mode,
    quick: bool,
    local: Option<&ContentHash>,
    declared: &ContentHash,
) -> DirectoryStep {
    match (manifest_discrepancy(local, declared), mode) {
        (None, _) => DirectoryStep::UpToDate { descend: !quick },
        (Some(discrepancy), Mode::Sync) => DirectoryStep::Refresh(discrepancy),
        (Some(discrepancy), Mode::Check) => DirectoryStep::Abort(discrepancy),
    }
}

pub fn file_discrepancy(local: &LocalFile, declared: &ContentHash) -> Option<Discrepancy> {
    match local {
        LocalFile::Missing | LocalFile::Directory => Some(Discrepancy::MissingFile),
        LocalFile::Present(hash) if hash != declared => Some(Discrepancy::MismatchingFileHash),
        LocalFile::Present(_) => None,
    }
}

pub fn plan_file(mode: Mode, local: &LocalFile, declared: &ContentHash) -> FileStep {
    match (file_discrepancy(local, declared), mode) {
        (None, _) => FileStep::UpToDate,
        (Some(discrepancy), Mode::Sync) => FileStep::Fetch {
            discrepancy,
            clear_directory: *local == LocalFile::Directory,
        },
        (Some(discrepancy), Mode::Check) => FileStep::Abort(discrepancy),
    }
}

/// Local children that `manifest` does not declare, in listing order.
///
/// The `.dirindex` file itself is never an orphan.
pub fn find_orphans<'a>(manifest: &Manifest, listing: &'a [LocalEntry]) -> Vec<Orphan<'a>> {
    listing
        .iter()
        .filter_map(|entry| {
            let discrepancy = match entry.kind {
                LocalKind::File if entry.name == DIRINDEX => return None,
                LocalKind::File if manifest.declares_file(&entry.name) => return None,
                LocalKind::Directory if manifest.declares_directory(&entry.name) => return None,
                LocalKind::File => Discrepancy::OrphanFile,
                LocalKind::Directory => Discrepancy::OrphanDirectory,
            };
            Some(Orphan { entry, discrepancy })
        })
        .collect()
}
