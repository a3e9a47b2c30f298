//! Recursive walk of the repository, driven by `.dirindex` manifests.
//!
//! Starting from one directory, the engine compares the local `.dirindex`
//! with the hash its parent declares. Only directories whose manifest changed
//! (or everything, outside quick mode) are walked further. Inside a directory
//! files and tarballs are handled first, then subdirectories, then local
//! entries the manifest does not declare.
//!
//! In sync mode every discrepancy is repaired on the spot. In check mode
//! nothing is written and the walk stops at the first discrepancy.

use crate::fs::hash::{hash_file, hash_reader};
use crate::fs::tree::{self, LocalKind, LocalNode};
use crate::fs::ContentHash;
use crate::manifest::{Manifest, DIRINDEX};
use crate::sync::boundaries::DownloadBoundaries;
use crate::sync::plan::{self, Discrepancy, DirectoryStep, FileStep, LocalFile, Mode, Orphan};
use crate::sync::report::Report;
use crate::transfer::{TransferStats, Transport};
use crate::utils::errors::ManifestError;
use crate::utils::{Result, SyncError};
use crate::vpath::{VirtualPath, VirtualPathLike};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub mode: Mode,
    /// Trust directories whose `.dirindex` hash already matches
    pub quick: bool,
    /// Delete local entries the server does not declare (sync mode only)
    pub remove_orphans: bool,
    /// Skip bucket directories outside this rectangle
    pub boundaries: Option<DownloadBoundaries>,
}

/// First discrepancy met in check mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckFailure {
    pub discrepancy: Discrepancy,
    pub path: VirtualPath,
}

impl CheckFailure {
    pub fn explain(&self) -> String {
        self.discrepancy.explain(&self.path)
    }
}

impl fmt::Display for CheckFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.explain())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The walk reached its end: local copy in sync (sync mode) or
    /// identical to the server (check mode)
    Completed,
    /// Check mode found a difference and stopped
    MismatchFound(CheckFailure),
}

/// Why the walk stopped early.
enum Stop {
    Mismatch(CheckFailure),
    Failed(SyncError),
}

impl From<SyncError> for Stop {
    fn from(err: SyncError) -> Self {
        Stop::Failed(err)
    }
}

impl From<std::io::Error> for Stop {
    fn from(err: std::io::Error) -> Self {
        Stop::Failed(SyncError::Io(err))
    }
}

type Flow = std::result::Result<(), Stop>;

/// Mirrors a repository into a local directory through a [`Transport`].
pub struct TerraSync<T> {
    transport: T,
    target: PathBuf,
    options: SyncOptions,
    report: Report,
    stats: TransferStats,
}

impl<T: Transport> TerraSync<T> {
    /// `target` is made absolute once, here.
    pub fn new(transport: T, target: impl AsRef<Path>, options: SyncOptions) -> Result<Self> {
        let target = std::path::absolute(target.as_ref())?;
        Ok(Self {
            transport,
            target,
            options,
            report: Report::new(),
            stats: TransferStats::new(),
        })
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn stats(&self) -> &TransferStats {
        &self.stats
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Synchronize (or check) the repository directory `start` and
    /// everything below it.
    ///
    /// The hash of `start`'s `.dirindex` is taken from the server itself,
    /// so the starting directory is always compared against the live copy.
    pub async fn run(&mut self, start: &VirtualPath) -> Result<SyncOutcome> {
        if start.parts().contains(&"..") {
            return Err(SyncError::User(format!(
                "refusing to process '{}': '..' components are not allowed",
                start
            )));
        }

        info!(
            "Starting {} of '{}' into {}",
            self.options.mode,
            start,
            self.target.display()
        );

        let mut reader = self.transport.get(&(start / DIRINDEX)).await?;
        let declared = hash_reader(&mut reader).await?;
        drop(reader);

        match self.visit_directory(start.clone(), declared).await {
            Ok(()) => {
                info!("Finished: {}", self.stats.summary());
                Ok(SyncOutcome::Completed)
            }
            Err(Stop::Mismatch(failure)) => Ok(SyncOutcome::MismatchFound(failure)),
            Err(Stop::Failed(err)) => Err(err),
        }
    }

    fn local_path(&self, path: &VirtualPath) -> PathBuf {
        let mut local = self.target.clone();
        for part in path.parts().into_iter().skip(1) {
            local.push(part);
        }
        local
    }

    async fn visit_directory(&mut self, path: VirtualPath, declared: ContentHash) -> Flow {
        if plan::outside_boundaries(&path, self.options.boundaries.as_ref()) {
            debug!("Skipping '{}': outside the download boundaries", path);
            self.report.add_skipped_due_to_boundaries(path);
            return Ok(());
        }

        info!("Processing '{}'...", path);

        let local_dir = self.local_path(&path);
        let local_index = local_dir.join(DIRINDEX);
        let has_index = tree::probe(&local_dir)? == LocalNode::Directory
            && tree::probe(&local_index)? == LocalNode::File;
        let local_hash = if has_index {
            Some(hash_file(&local_index).await?)
        } else {
            None
        };

        match plan::plan_directory(self.options.mode, self.options.quick, local_hash.as_ref(), &declared) {
            DirectoryStep::UpToDate { descend: false } => {
                debug!("'{}' is up to date, not descending", path);
                Ok(())
            }
            DirectoryStep::UpToDate { descend: true } => {
                let manifest = self.read_manifest(&path, &local_index).await?;
                self.process_children(&path, &local_dir, &manifest).await
            }
            DirectoryStep::Refresh(discrepancy) => {
                discrepancy.record(&mut self.report, path.clone());
                self.ensure_directory(&local_dir)?;

                let written = self.transport.download(&(&path / DIRINDEX), &local_index).await?;
                self.stats.record_manifest(written);

                let fetched = hash_file(&local_index).await?;
                if fetched != declared {
                    warn!(
                        "'{}' has hash {} but {} was declared for it",
                        &path / DIRINDEX,
                        fetched,
                        declared
                    );
                }

                let manifest = self.read_manifest(&path, &local_index).await?;
                self.process_children(&path, &local_dir, &manifest).await
            }
            DirectoryStep::Abort(discrepancy) => {
                discrepancy.record(&mut self.report, path.clone());
                Err(Stop::Mismatch(CheckFailure {
                    discrepancy,
                    path: &path / DIRINDEX,
                }))
            }
        }
    }

    async fn read_manifest(&self, path: &VirtualPath, file: &Path) -> Result<Manifest> {
        let bytes = tokio::fs::read(file).await?;

        std::str::from_utf8(&bytes)
            .map_err(|_| ManifestError::NotUtf8)
            .and_then(Manifest::parse)
            .and_then(|manifest| manifest.check_path(path).map(|()| manifest))
            .map_err(|source| SyncError::InvalidManifest {
                path: path.clone(),
                source,
            })
    }

    /// Make sure `dir` is a directory, replacing a plain file if needed.
    fn ensure_directory(&self, dir: &Path) -> Result<()> {
        match tree::probe(dir)? {
            LocalNode::Directory => {}
            LocalNode::File => {
                info!("Replacing file {} with a directory", dir.display());
                std::fs::remove_file(dir)?;
                std::fs::create_dir_all(dir)?;
            }
            LocalNode::Absent => std::fs::create_dir_all(dir)?,
        }
        Ok(())
    }

    async fn process_children(&mut self, path: &VirtualPath, local_dir: &Path, manifest: &Manifest) -> Flow {
        for entry in manifest.file_entries() {
            self.visit_file(path / entry.name.as_str(), &entry.hash).await?;
        }

        for entry in &manifest.directories {
            Box::pin(self.visit_directory(path / entry.name.as_str(), entry.hash)).await?;
        }

        let listing = tree::list_directory(local_dir)?;
        for orphan in plan::find_orphans(manifest, &listing) {
            let orphan_path = path / orphan.entry.name.as_str();
            orphan.discrepancy.record(&mut self.report, orphan_path.clone());

            match self.options.mode {
                Mode::Check => {
                    return Err(Stop::Mismatch(CheckFailure {
                        discrepancy: orphan.discrepancy,
                        path: orphan_path,
                    }));
                }
                Mode::Sync if self.options.remove_orphans => {
                    self.remove_orphan(&orphan, &orphan_path)?;
                }
                Mode::Sync => debug!("Keeping orphan '{}'", orphan_path),
            }
        }

        Ok(())
    }

    async fn visit_file(&mut self, path: VirtualPath, declared: &ContentHash) -> Flow {
        let local = self.local_path(&path);
        let state = match tree::probe(&local)? {
            LocalNode::Absent => LocalFile::Missing,
            LocalNode::Directory => LocalFile::Directory,
            LocalNode::File => LocalFile::Present(hash_file(&local).await?),
        };

        match plan::plan_file(self.options.mode, &state, declared) {
            FileStep::UpToDate => Ok(()),
            FileStep::Fetch {
                discrepancy,
                clear_directory,
            } => {
                discrepancy.record(&mut self.report, path.clone());
                if clear_directory {
                    info!("Removing directory {} to make room for a file", local.display());
                    tree::remove_directory_tree(&self.target, &local)?;
                }

                info!("Downloading '{}'", path);
                let written = self.transport.download(&path, &local).await?;
                self.stats.record_file(written);
                Ok(())
            }
            FileStep::Abort(discrepancy) => {
                discrepancy.record(&mut self.report, path.clone());
                Err(Stop::Mismatch(CheckFailure { discrepancy, path }))
            }
        }
    }

    fn remove_orphan(&mut self, orphan: &Orphan<'_>, path: &VirtualPath) -> Result<()> {
        match orphan.entry.kind {
            LocalKind::File => {
                warn!("Removing orphan file '{}'", path);
                std::fs::remove_file(&orphan.entry.path)?;
            }
            LocalKind::Directory => {
                warn!("Removing orphan directory '{}'", path);
                tree::remove_directory_tree(&self.target, &orphan.entry.path)?;
            }
        }
        self.stats.record_removal();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::MemoryTransport;
    use crate::utils::errors::{ManifestError, NetworkError};
    use std::fs;
    use tempfile::TempDir;

    const A: &str = "alpha contents";
    const B: &str = "bravo contents";

    fn hash(data: &str) -> ContentHash {
        ContentHash::of(data.as_bytes())
    }

    /// Repository with `/A` and `/sub/B`.
    fn remote() -> MemoryTransport {
        let sub_index = format!("version:1\npath:sub\nf:B:{}:{}\n", hash(B), B.len());
        let root_index = format!(
            "version:1\npath:\nf:A:{}:{}\nd:sub:{}\n",
            hash(A),
            A.len(),
            hash(&sub_index)
        );

        let mut transport = MemoryTransport::new();
        transport
            .insert("/.dirindex", root_index)
            .insert("/A", A)
            .insert("/sub/.dirindex", sub_index)
            .insert("/sub/B", B);
        transport
    }

    fn options(mode: Mode) -> SyncOptions {
        SyncOptions {
            mode,
            ..SyncOptions::default()
        }
    }

    async fn run(transport: MemoryTransport, target: &Path, options: SyncOptions) -> (Result<SyncOutcome>, TerraSync<MemoryTransport>) {
        let mut sync = TerraSync::new(transport, target, options).unwrap();
        let outcome = sync.run(&VirtualPath::root()).await;
        (outcome, sync)
    }

    /// Populate `target` with a full copy of `remote()`.
    async fn mirror(target: &Path) {
        let (outcome, _) = run(remote(), target, options(Mode::Sync)).await;
        assert_eq!(outcome.unwrap(), SyncOutcome::Completed);
    }

    #[tokio::test]
    async fn test_sync_into_empty_directory() {
        let temp = TempDir::new().unwrap();
        let (outcome, sync) = run(remote(), temp.path(), options(Mode::Sync)).await;

        assert_eq!(outcome.unwrap(), SyncOutcome::Completed);
        assert_eq!(fs::read_to_string(temp.path().join("A")).unwrap(), A);
        assert_eq!(fs::read_to_string(temp.path().join("sub/B")).unwrap(), B);
        assert!(temp.path().join(".dirindex").is_file());
        assert!(temp.path().join("sub/.dirindex").is_file());

        let report = sync.report();
        assert!(report.dirs_with_missing_index.contains(&VirtualPath::root()));
        assert!(report.dirs_with_missing_index.contains(&VirtualPath::new("/sub")));
        assert!(report.missing_files.contains(&VirtualPath::new("/A")));
        assert!(report.missing_files.contains(&VirtualPath::new("/sub/B")));

        assert_eq!(sync.stats().files_downloaded, 2);
        assert_eq!(sync.stats().manifests_downloaded, 2);
    }

    #[tokio::test]
    async fn test_second_sync_downloads_nothing() {
        let temp = TempDir::new().unwrap();
        mirror(temp.path()).await;

        let (outcome, sync) = run(remote(), temp.path(), options(Mode::Sync)).await;
        assert_eq!(outcome.unwrap(), SyncOutcome::Completed);
        assert!(sync.transport().downloads().is_empty());
        assert_eq!(sync.transport().gets(), &[VirtualPath::new("/.dirindex")]);
        assert!(sync.report().is_empty());
    }

    #[tokio::test]
    async fn test_check_clean_copy() {
        let temp = TempDir::new().unwrap();
        mirror(temp.path()).await;

        let (outcome, sync) = run(remote(), temp.path(), options(Mode::Check)).await;
        assert_eq!(outcome.unwrap(), SyncOutcome::Completed);
        assert!(sync.transport().downloads().is_empty());
    }

    #[tokio::test]
    async fn test_check_stops_at_first_mismatch() {
        let temp = TempDir::new().unwrap();
        mirror(temp.path()).await;
        fs::write(temp.path().join("A"), "stale").unwrap();
        // would be reported too if the walk went on to /sub
        fs::remove_file(temp.path().join("sub/.dirindex")).unwrap();

        let (outcome, sync) = run(remote(), temp.path(), options(Mode::Check)).await;
        let failure = match outcome.unwrap() {
            SyncOutcome::MismatchFound(failure) => failure,
            other => panic!("expected a mismatch, got {other:?}"),
        };

        assert_eq!(failure.discrepancy, Discrepancy::MismatchingFileHash);
        assert_eq!(failure.path, VirtualPath::new("/A"));
        assert!(failure.explain().contains("'/A'"));

        assert!(sync.report().dirs_with_missing_index.is_empty());
        assert!(sync.transport().downloads().is_empty());
        assert_eq!(fs::read_to_string(temp.path().join("A")).unwrap(), "stale");
    }

    #[tokio::test]
    async fn test_check_missing_local_copy() {
        let temp = TempDir::new().unwrap();
        let (outcome, sync) = run(remote(), temp.path(), options(Mode::Check)).await;

        assert_eq!(
            outcome.unwrap(),
            SyncOutcome::MismatchFound(CheckFailure {
                discrepancy: Discrepancy::MissingDirIndex,
                path: VirtualPath::new("/.dirindex"),
            })
        );
        assert!(sync.report().dirs_with_missing_index.contains(&VirtualPath::root()));
        assert!(!temp.path().join(".dirindex").exists());
    }

    #[tokio::test]
    async fn test_sync_repairs_modified_file() {
        let temp = TempDir::new().unwrap();
        mirror(temp.path()).await;
        fs::write(temp.path().join("sub/B"), "corrupted").unwrap();

        let (outcome, sync) = run(remote(), temp.path(), options(Mode::Sync)).await;
        assert_eq!(outcome.unwrap(), SyncOutcome::Completed);
        assert_eq!(fs::read_to_string(temp.path().join("sub/B")).unwrap(), B);
        assert!(sync
            .report()
            .files_with_mismatching_hash
            .contains(&VirtualPath::new("/sub/B")));
        assert_eq!(sync.transport().downloads(), &[VirtualPath::new("/sub/B")]);
    }

    #[tokio::test]
    async fn test_orphan_file_removed_when_asked() {
        let temp = TempDir::new().unwrap();
        mirror(temp.path()).await;
        fs::write(temp.path().join("C"), "local only").unwrap();

        let opts = SyncOptions {
            remove_orphans: true,
            ..options(Mode::Sync)
        };
        let (outcome, sync) = run(remote(), temp.path(), opts).await;

        assert_eq!(outcome.unwrap(), SyncOutcome::Completed);
        assert!(!temp.path().join("C").exists());
        assert!(sync.report().orphan_files.contains(&VirtualPath::new("/C")));
        assert_eq!(sync.stats().orphans_removed, 1);
    }

    #[tokio::test]
    async fn test_orphan_file_kept_by_default() {
        let temp = TempDir::new().unwrap();
        mirror(temp.path()).await;
        fs::write(temp.path().join("C"), "local only").unwrap();

        let (outcome, sync) = run(remote(), temp.path(), options(Mode::Sync)).await;

        assert_eq!(outcome.unwrap(), SyncOutcome::Completed);
        assert!(temp.path().join("C").exists());
        assert!(sync.report().orphan_files.contains(&VirtualPath::new("/C")));
        assert_eq!(sync.stats().orphans_removed, 0);
    }

    #[tokio::test]
    async fn test_check_reports_orphan() {
        let temp = TempDir::new().unwrap();
        mirror(temp.path()).await;
        fs::write(temp.path().join("C"), "local only").unwrap();

        let (outcome, _) = run(remote(), temp.path(), options(Mode::Check)).await;
        assert_eq!(
            outcome.unwrap(),
            SyncOutcome::MismatchFound(CheckFailure {
                discrepancy: Discrepancy::OrphanFile,
                path: VirtualPath::new("/C"),
            })
        );
        assert!(temp.path().join("C").exists());
    }

    #[tokio::test]
    async fn test_orphan_directory_removal_is_guarded() {
        let temp = TempDir::new().unwrap();
        mirror(temp.path()).await;

        let old = temp.path().join("old");
        fs::create_dir_all(old.join("deep")).unwrap();
        fs::write(old.join(".dirindex"), "version:1\npath:old\n").unwrap();
        fs::write(old.join("deep/file"), "x").unwrap();

        let opts = SyncOptions {
            remove_orphans: true,
            ..options(Mode::Sync)
        };
        let (outcome, sync) = run(remote(), temp.path(), opts.clone()).await;
        assert_eq!(outcome.unwrap(), SyncOutcome::Completed);
        assert!(!old.exists());
        assert!(sync.report().orphan_dirs.contains(&VirtualPath::new("/old")));

        // never populated by a sync: left alone, and the run fails
        let foreign = temp.path().join("foreign");
        fs::create_dir(&foreign).unwrap();
        let (outcome, _) = run(remote(), temp.path(), opts).await;
        assert!(matches!(outcome, Err(SyncError::User(_))));
        assert!(foreign.exists());
    }

    #[tokio::test]
    async fn test_quick_mode_trusts_matching_index() {
        let temp = TempDir::new().unwrap();
        mirror(temp.path()).await;
        fs::remove_file(temp.path().join("A")).unwrap();

        let opts = SyncOptions {
            quick: true,
            ..options(Mode::Sync)
        };
        let (outcome, sync) = run(remote(), temp.path(), opts).await;
        assert_eq!(outcome.unwrap(), SyncOutcome::Completed);
        assert!(!temp.path().join("A").exists());
        assert!(sync.transport().downloads().is_empty());

        // a full pass notices
        let (outcome, sync) = run(remote(), temp.path(), options(Mode::Sync)).await;
        assert_eq!(outcome.unwrap(), SyncOutcome::Completed);
        assert!(temp.path().join("A").exists());
        assert!(sync.report().missing_files.contains(&VirtualPath::new("/A")));
    }

    #[tokio::test]
    async fn test_buckets_outside_boundaries_are_skipped() {
        let west_index = "version:1\npath:Terrain/w010n50\n".to_string();
        let east_index = "version:1\npath:Terrain/e100n30\n".to_string();
        let terrain_index = format!(
            "version:1\npath:Terrain\nd:w010n50:{}\nd:e100n30:{}\n",
            hash(&west_index),
            hash(&east_index)
        );
        let root_index = format!("version:1\npath:\nd:Terrain:{}\n", hash(&terrain_index));

        let mut transport = MemoryTransport::new();
        transport
            .insert("/.dirindex", root_index)
            .insert("/Terrain/.dirindex", terrain_index)
            .insert("/Terrain/w010n50/.dirindex", west_index)
            .insert("/Terrain/e100n30/.dirindex", east_index);

        let temp = TempDir::new().unwrap();
        let opts = SyncOptions {
            boundaries: Some(DownloadBoundaries::new(55.0, -5.0, 50.0, 0.0).unwrap()),
            ..options(Mode::Sync)
        };
        let (outcome, sync) = run(transport, temp.path(), opts).await;

        assert_eq!(outcome.unwrap(), SyncOutcome::Completed);
        assert!(temp.path().join("Terrain/w010n50/.dirindex").is_file());
        assert!(!temp.path().join("Terrain/e100n30").exists());
        assert_eq!(
            sync.report()
                .dirs_skipped_due_to_boundaries
                .iter()
                .collect::<Vec<_>>(),
            vec![&VirtualPath::new("/Terrain/e100n30")]
        );
    }

    #[tokio::test]
    async fn test_file_and_directory_swap_places() {
        let temp = TempDir::new().unwrap();
        // a file where the server has directory "sub"
        fs::write(temp.path().join("sub"), "in the way").unwrap();
        // a synced directory where the server has file "A"
        fs::create_dir(temp.path().join("A")).unwrap();
        fs::write(temp.path().join("A/.dirindex"), "version:1\npath:A\n").unwrap();

        let (outcome, _) = run(remote(), temp.path(), options(Mode::Sync)).await;
        assert_eq!(outcome.unwrap(), SyncOutcome::Completed);
        assert_eq!(fs::read_to_string(temp.path().join("A")).unwrap(), A);
        assert_eq!(fs::read_to_string(temp.path().join("sub/B")).unwrap(), B);
    }

    #[tokio::test]
    async fn test_sync_from_subdirectory() {
        let temp = TempDir::new().unwrap();
        let mut sync = TerraSync::new(remote(), temp.path(), options(Mode::Sync)).unwrap();
        let outcome = sync.run(&VirtualPath::new("/sub")).await.unwrap();

        assert_eq!(outcome, SyncOutcome::Completed);
        assert_eq!(fs::read_to_string(temp.path().join("sub/B")).unwrap(), B);
        assert!(!temp.path().join("A").exists());
        assert!(!temp.path().join(".dirindex").exists());
    }

    #[tokio::test]
    async fn test_parent_components_are_refused() {
        let temp = TempDir::new().unwrap();
        let mut sync = TerraSync::new(remote(), temp.path(), options(Mode::Sync)).unwrap();
        let err = sync.run(&VirtualPath::new("/sub/../..")).await.unwrap_err();
        assert!(matches!(err, SyncError::User(_)));
        assert!(sync.transport().gets().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_manifest_aborts() {
        let root_index = format!("version:1\npath:\nf:../escape:{}:1\n", hash("x"));
        let mut transport = MemoryTransport::new();
        transport.insert("/.dirindex", root_index);

        let temp = TempDir::new().unwrap();
        let (outcome, _) = run(transport, temp.path(), options(Mode::Sync)).await;
        match outcome {
            Err(SyncError::InvalidManifest { path, source }) => {
                assert!(path.is_root());
                assert!(matches!(source, ManifestError::InvalidName { .. }));
            }
            other => panic!("expected an invalid manifest, got {other:?}"),
        }
        assert!(!temp.path().join("escape").exists());
    }

    #[tokio::test]
    async fn test_manifest_for_wrong_directory_aborts() {
        let mut transport = remote();
        let wrong = "version:1\npath:elsewhere\n".to_string();
        let root_index = format!("version:1\npath:\nd:sub:{}\n", hash(&wrong));
        transport.insert("/.dirindex", root_index).insert("/sub/.dirindex", wrong);

        let temp = TempDir::new().unwrap();
        let (outcome, _) = run(transport, temp.path(), options(Mode::Sync)).await;
        assert!(matches!(
            outcome,
            Err(SyncError::InvalidManifest {
                source: ManifestError::UnexpectedPath { .. },
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_non_utf8_manifest_aborts() {
        let mut root_index = format!("version:1\npath:\nf:A:{}:{}\n", hash(A), A.len()).into_bytes();
        root_index.extend_from_slice(b"f:caf\xe9:0000000000000000000000000000000000000000:1\n");
        let mut transport = remote();
        transport.insert("/.dirindex", root_index);

        let temp = TempDir::new().unwrap();
        let (outcome, sync) = run(transport, temp.path(), options(Mode::Sync)).await;
        match outcome {
            Err(SyncError::InvalidManifest { path, source }) => {
                assert!(path.is_root());
                assert_eq!(source, ManifestError::NotUtf8);
            }
            other => panic!("expected an invalid manifest, got {other:?}"),
        }
        assert_eq!(sync.stats().files_downloaded, 0);
        assert!(!temp.path().join("A").exists());
    }

    #[tokio::test]
    async fn test_missing_remote_file_is_an_error() {
        let mut transport = remote();
        transport.remove("/sub/B");

        let temp = TempDir::new().unwrap();
        let (outcome, _) = run(transport, temp.path(), options(Mode::Sync)).await;
        assert!(matches!(
            outcome,
            Err(SyncError::Network(NetworkError::Status { status: 404, .. }))
        ));
        // work done before the failure stays on disk
        assert!(temp.path().join("A").is_file());
    }
}
