// The floating status notice a scan pass writes progress into. One element
// per document, created on first use and toggled through its style attr.

use crate::page::dom::{Document, NodeId};
use crate::page::selector::Selector;

pub const STATUS_ID: &str = "yt-ratioed-status";
pub const STATUS_CLASS: &str = "yt-ratioed-status";

/// Show a status message, creating the notice element if needed.
pub fn show_status(doc: &mut Document, message: &str) -> NodeId {
    let status = match find_status(doc) {
        Some(found) => found,
        None => {
            let created = doc.create_element("div");
            doc.set_attr(created, "id", STATUS_ID);
            doc.set_attr(created, "class", STATUS_CLASS);
            let root = doc.root();
            doc.append_child(root, created);
            created
        }
    };
    doc.set_text(status, message);
    doc.set_attr(status, "style", "display: block");
    status
}

/// Replace the text of an existing notice, or show a fresh one.
pub fn update_status(doc: &mut Document, message: &str) {
    match find_status(doc) {
        Some(status) => {
            doc.set_text(status, message);
        }
        None => {
            show_status(doc, message);
        }
    }
}

/// Hide the notice. The element stays in the tree.
pub fn hide_status(doc: &mut Document) {
    if let Some(status) = find_status(doc) {
        doc.set_attr(status, "style", "display: none");
    }
}

pub fn status_text(doc: &Document) -> Option<String> {
    find_status(doc).map(|status| doc.text_content(status))
}

pub fn status_visible(doc: &Document) -> bool {
    find_status(doc).is_some_and(|status| doc.attr(status, "style") == Some("display: block"))
}

fn find_status(doc: &Document) -> Option<NodeId> {
    doc.find_first(&Selector::parse(&format!("#{STATUS_ID}")))
}
