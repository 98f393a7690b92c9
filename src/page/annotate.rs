// Title annotation and exact restoration.
//
// The original title text is stashed in an attribute before any rewrite, so
// a restore puts back exactly what was there. Re-annotation paths restore
// first; stacking a second prefix onto an already-marked title is a bug.

use crate::page::dom::{Child, Document, NodeId};
use crate::page::selector::Selector;
use crate::ratio::RatioDisplay;

pub const MARKER_ATTR: &str = "data-yt-ratioed";
pub const ORIGINAL_TITLE_ATTR: &str = "data-original-title";
pub const OVERLAY_CLASS: &str = "yt-ratioed-overlay";

/// First title element inside `container` per the candidate list.
pub fn find_title(doc: &Document, container: NodeId, candidates: &[Selector]) -> Option<NodeId> {
    candidates
        .iter()
        .find_map(|s| doc.find_within(container, s))
}

/// Write a ratio prefix into a title element and mark it. Returns false if
/// the element already carries the marker.
///
/// Titles with child elements get their first inner span (or div) rewritten
/// instead of the top element, matching how platform and Google titles nest
/// their text.
pub fn annotate_title(
    doc: &mut Document,
    title: NodeId,
    display: &RatioDisplay,
    tooltip: &str,
) -> bool {
    if doc.attr(title, MARKER_ATTR) == Some("true") {
        return false;
    }

    let original = doc.text_content(title);
    doc.set_attr(title, ORIGINAL_TITLE_ATTR, &original);

    if doc.child_element_count(title) > 0 {
        let span = Selector::parse("span");
        let div = Selector::parse("div");
        let inner = doc
            .find_within(title, &span)
            .or_else(|| doc.find_within(title, &div));
        match inner {
            Some(inner) => {
                let inner_text = doc.text_content(inner);
                let prefix = prefix_span(doc, display);
                doc.replace_children(inner, vec![Child::Element(prefix), Child::Text(inner_text)]);
            }
            None => {
                let prefix = prefix_span(doc, display);
                doc.insert_first(title, prefix);
            }
        }
    } else {
        let prefix = prefix_span(doc, display);
        doc.replace_children(title, vec![Child::Element(prefix), Child::Text(original)]);
    }

    doc.set_attr(title, MARKER_ATTR, "true");
    doc.set_attr(title, "title", tooltip);
    true
}

fn prefix_span(doc: &mut Document, display: &RatioDisplay) -> NodeId {
    let span = doc.create_element("span");
    doc.set_attr(span, "class", display.tier.css_class());
    doc.append_text(span, &display.prefix);
    span
}

/// Put a single title back to its pre-annotation text and strip the
/// bookkeeping attributes.
pub fn restore_title(doc: &mut Document, title: NodeId) {
    if let Some(original) = doc.attr(title, ORIGINAL_TITLE_ATTR).map(str::to_string) {
        doc.replace_children(title, vec![Child::Text(original)]);
    }
    doc.remove_attr(title, MARKER_ATTR);
    doc.remove_attr(title, ORIGINAL_TITLE_ATTR);
    doc.remove_attr(title, "title");
}

/// Restore every marked title and drop every overlay element. Returns how
/// many titles were restored.
pub fn restore_all(doc: &mut Document) -> usize {
    let marked_selector = Selector::parse(&format!(r#"[{MARKER_ATTR}="true"]"#));
    let marked = doc.query_all(&marked_selector);
    for &title in &marked {
        restore_title(doc, title);
    }
    let overlay_selector = Selector::parse(&format!(".{OVERLAY_CLASS}"));
    for overlay in doc.query_all(&overlay_selector) {
        doc.detach(overlay);
    }
    marked.len()
}

/// Whether a card subtree already carries an annotation, checking both the
/// marker attribute and leftover overlays from older passes.
pub fn is_processed(doc: &Document, container: NodeId) -> bool {
    let marker = Selector::parse(&format!("[{MARKER_ATTR}]"));
    if doc.matches(container, &marker) || doc.find_within(container, &marker).is_some() {
        return true;
    }
    let overlay = Selector::parse(&format!(".{OVERLAY_CLASS}"));
    doc.find_within(container, &overlay).is_some()
}
