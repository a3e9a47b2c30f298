//! Download counters for a synchronization run.

use std::time::{Duration, Instant};

/// What a run fetched from the server and removed locally.
#[derive(Debug, Clone)]
pub struct TransferStats {
    start_time: Instant,

    /// `.dirindex` files written to disk
    pub manifests_downloaded: usize,

    /// Regular files and tarballs written to disk
    pub files_downloaded: usize,

    /// Body bytes written, manifests included
    pub bytes_downloaded: u64,

    /// Orphan files and directories deleted
    pub orphans_removed: usize,
}

impl TransferStats {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            manifests_downloaded: 0,
            files_downloaded: 0,
            bytes_downloaded: 0,
            orphans_removed: 0,
        }
    }

    pub fn record_manifest(&mut self, bytes: u64) {
        self.manifests_downloaded += 1;
        self.bytes_downloaded += bytes;
    }

    pub fn record_file(&mut self, bytes: u64) {
        self.files_downloaded += 1;
        self.bytes_downloaded += bytes;
    }

    pub fn record_removal(&mut self) {
        self.orphans_removed += 1;
    }

    /// Total number of downloads, manifests included.
    pub fn downloads(&self) -> usize {
        self.manifests_downloaded + self.files_downloaded
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average speed since the run started
    pub fn average_speed(&self) -> u64 {
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            (self.bytes_downloaded as f64 / elapsed) as u64
        } else {
            0
        }
    }

    /// One-line summary for the end-of-run log.
    pub fn summary(&self) -> String {
        format!(
            "{} files and {} .dirindex files downloaded ({}, {}), {} orphans removed in {}",
            self.files_downloaded,
            self.manifests_downloaded,
            format_bytes(self.bytes_downloaded),
            format_speed(self.average_speed()),
            self.orphans_removed,
            format_duration(self.elapsed().as_secs())
        )
    }
}

impl Default for TransferStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Format bytes as human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}

pub fn format_speed(bytes_per_second: u64) -> String {
    format!("{}/s", format_bytes(bytes_per_second))
}

pub fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    }
}
