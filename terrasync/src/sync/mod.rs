//! Repository walk: geographic filtering, decisions, the engine and its report.

pub mod boundaries;
pub mod engine;
pub mod plan;
pub mod report;

pub use boundaries::DownloadBoundaries;
pub use engine::{CheckFailure, SyncOptions, SyncOutcome, TerraSync};
pub use plan::{Discrepancy, Mode};
pub use report::Report;
