// Mirrored page model: arena DOM, selectors, classification, annotation.

pub mod annotate;
pub mod classify;
pub mod dom;
pub mod locate;
pub mod overlay;
pub mod selector;
pub mod snapshot;

pub use classify::PageMode;
pub use dom::{Child, Document, NodeId};
pub use locate::{Candidate, ScanSelectors};
pub use selector::Selector;
pub use snapshot::{SnapshotChild, SnapshotNode};
