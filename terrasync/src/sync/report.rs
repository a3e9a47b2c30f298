//! Findings accumulated during one synchronization run.

use crate::vpath::VirtualPath;
use std::collections::BTreeSet;
use std::fmt;

/// Categorised sets of virtual paths, filled while walking the tree.
///
/// Entries record what needed attention when it was visited; in sync mode
/// most of them have been fixed by the time the run ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub dirs_with_missing_index: BTreeSet<VirtualPath>,
    pub dirs_with_mismatching_index_hash: BTreeSet<VirtualPath>,
    pub missing_files: BTreeSet<VirtualPath>,
    pub files_with_mismatching_hash: BTreeSet<VirtualPath>,
    pub dirs_skipped_due_to_boundaries: BTreeSet<VirtualPath>,
    pub orphan_files: BTreeSet<VirtualPath>,
    pub orphan_dirs: BTreeSet<VirtualPath>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_missing_dir_index(&mut self, dir: VirtualPath) {
        self.dirs_with_missing_index.insert(dir);
    }

    pub fn add_dir_index_with_mismatching_hash(&mut self, dir: VirtualPath) {
        self.dirs_with_mismatching_index_hash.insert(dir);
    }

    pub fn add_missing_file(&mut self, path: VirtualPath) {
        self.missing_files.insert(path);
    }

    pub fn add_file_with_mismatching_hash(&mut self, path: VirtualPath) {
        self.files_with_mismatching_hash.insert(path);
    }

    pub fn add_skipped_due_to_boundaries(&mut self, dir: VirtualPath) {
        self.dirs_skipped_due_to_boundaries.insert(dir);
    }

    pub fn add_orphan_file(&mut self, path: VirtualPath) {
        self.orphan_files.insert(path);
    }

    pub fn add_orphan_dir(&mut self, dir: VirtualPath) {
        self.orphan_dirs.insert(dir);
    }

    /// True when no category has any entry.
    pub fn is_empty(&self) -> bool {
        self.sections().iter().all(|(_, set)| set.is_empty())
    }

    fn sections(&self) -> [(&'static str, &BTreeSet<VirtualPath>); 7] {
        [
            ("Directories with missing index", &self.dirs_with_missing_index),
            (
                "Directories whose .dirindex file had a mismatching hash",
                &self.dirs_with_mismatching_index_hash,
            ),
            ("Missing files", &self.missing_files),
            ("Files with a mismatching hash", &self.files_with_mismatching_hash),
            (
                "Directories skipped because of the specified boundaries",
                &self.dirs_skipped_due_to_boundaries,
            ),
            ("Orphan files", &self.orphan_files),
            ("Orphan directories", &self.orphan_dirs),
        ]
    }

    /// One heading per category, followed by its sorted paths or `none`.
    pub fn summary(&self) -> String {
        let mut out = Vec::new();
        for (heading, paths) in self.sections() {
            if paths.is_empty() {
                out.push(format!("{heading}: none"));
            } else {
                let mut section = format!("{heading}:\n");
                for path in paths {
                    section.push_str(&format!("  {path}\n"));
                }
                out.push(section);
            }
        }
        out.join("\n")
    }
}

impl fmt::Display for Report {
    /// Full report with its title, as printed at the end of a run.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = format!("{} report", env!("CARGO_PKG_NAME"));
        writeln!(f, "{title}")?;
        writeln!(f, "{}", "=".repeat(title.len()))?;
        writeln!(f)?;
        write!(f, "{}", self.summary())
    }
}
