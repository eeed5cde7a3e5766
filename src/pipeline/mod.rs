//! Pipeline wiring: the shared state table, a launched pipeline, and the orchestrator.

pub mod context;
pub mod orchestrator;
pub mod state;

pub use context::ScanSummary;
pub use orchestrator::{Orchestrator, ScanStream, Topology};
pub use state::{ComponentStatus, PipelineState};
