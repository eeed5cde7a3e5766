//! pathscan: filtered recursive directory scanning over a threaded stage pipeline

pub mod engine;
pub mod pipeline;
pub mod types;
pub mod utils;
pub mod workers;

/// Re-export types for API
pub use types::*;

pub use pipeline::{Orchestrator, ScanStream, ScanSummary, Topology};
pub use workers::{CountingSink, EntrySink};

use std::path::Path;

/// Result alias used by public pathscan API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Scan `root` with `rules` and collect every admitted entry (the root itself included).
///
/// Convenience over [`Orchestrator::stream`]; use the stream directly to avoid holding the
/// whole tree in memory.
pub fn scan_dir(root: &Path, rules: &[FilterRule]) -> Result<Vec<Entry>> {
    let mut stream = Orchestrator::new(root, rules)?.stream()?;
    let entries: Vec<Entry> = stream.by_ref().collect();
    stream.finish()?;
    Ok(entries)
}
