// Scan passes over the mirrored page: full, incremental, re-annotate.

pub mod orchestrator;
pub mod watcher;

pub use orchestrator::{ScanKind, ScanSummary};
pub use watcher::MutationWatcher;
