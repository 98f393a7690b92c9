// JSON DOM snapshots: the wire form of a captured page. The content side
// serializes the subtree it cares about; we rebuild it into a Document.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::page::dom::{Document, NodeId};

/// One element in a snapshot tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub tag: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SnapshotChild>,
}

/// Snapshot children are plain strings for text runs, objects for elements.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotChild {
    Text(String),
    Node(SnapshotNode),
}

impl Document {
    /// Build a fresh document from a snapshot tree.
    pub fn from_snapshot(root: &SnapshotNode) -> Document {
        let mut doc = Document::with_root(&root.tag);
        let root_id = doc.root();
        for (name, value) in &root.attrs {
            doc.set_attr(root_id, name, value);
        }
        for child in &root.children {
            append_child(&mut doc, root_id, child);
        }
        doc
    }

    /// Graft a snapshot subtree under `parent`, returning the new element.
    /// Used for growth batches; existing NodeIds stay valid.
    pub fn append_snapshot(&mut self, parent: NodeId, node: &SnapshotNode) -> NodeId {
        let id = self.create_element(&node.tag);
        for (name, value) in &node.attrs {
            self.set_attr(id, name, value);
        }
        self.append_child(parent, id);
        for child in &node.children {
            append_child(self, id, child);
        }
        id
    }
}

fn append_child(doc: &mut Document, parent: NodeId, child: &SnapshotChild) {
    match child {
        SnapshotChild::Text(text) => doc.append_text(parent, text),
        SnapshotChild::Node(node) => {
            doc.append_snapshot(parent, node);
        }
    }
}

/// Load a snapshot from a JSON file on disk.
pub fn load_snapshot(path: &Path) -> Result<SnapshotNode> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse snapshot file {}", path.display()))
}
