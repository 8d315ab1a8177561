// file: src/store/mod.rs
// description: ttl document store with change log and disk snapshots
// reference: internal module structure

pub mod clock;
mod disk;
pub mod document_store;
pub mod snapshot;
mod state;

pub use clock::{Clock, ManualClock, SystemClock};
pub use document_store::DocumentStore;
pub use snapshot::{RestoreOutcome, SnapshotDir};
