// file: src/pipeline/mod.rs
// description: refresh pipeline and batch classification exports
// reference: pipeline orchestration

pub mod batch;
mod orchestrator;
mod stats;

pub use batch::{classify_directory, scan_html_files};
pub use orchestrator::RefreshPipeline;
pub use stats::CycleStats;
