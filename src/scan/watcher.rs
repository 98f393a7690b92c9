// Growth watcher. A freshly loaded platform page churns for a moment, so
// the watcher arms only after a settle delay; the token handshake keeps a
// timer from a superseded page load from arming it late.

use crate::page::dom::{Document, NodeId};
use crate::page::locate;
use crate::page::ScanSelectors;

#[derive(Debug, Default)]
pub struct MutationWatcher {
    armed: bool,
    cycle: u64,
}

impl MutationWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new arming cycle and return its token. Any previous arming
    /// is cancelled.
    pub fn schedule(&mut self) -> u64 {
        self.armed = false;
        self.cycle += 1;
        self.cycle
    }

    /// Complete the cycle the token belongs to. A stale token is a no-op.
    /// Returns whether the watcher is armed afterwards.
    pub fn arm(&mut self, token: u64) -> bool {
        if token == self.cycle {
            self.armed = true;
        }
        self.armed
    }

    pub fn disarm(&mut self) {
        self.armed = false;
        self.cycle += 1;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Whether an appended batch is worth an incremental pass.
    pub fn batch_is_relevant(
        doc: &Document,
        added: &[NodeId],
        selectors: &ScanSelectors,
    ) -> bool {
        added
            .iter()
            .any(|&node| locate::subtree_has_cards(doc, node, selectors))
    }
}
