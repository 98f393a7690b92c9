// Small CSS-style selector engine covering what the scan pipeline needs:
// tags, #id, .class, attribute tests ([name], [name="v"], [name*="v"]),
// and whitespace for descendant chains. Parsing is total; junk input just
// produces a selector that matches nothing useful.

use crate::page::dom::{Document, NodeId};

#[derive(Debug, Clone)]
pub struct Selector {
    raw: String,
    parts: Vec<Compound>,
}

#[derive(Debug, Clone, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
}

#[derive(Debug, Clone)]
struct AttrTest {
    name: String,
    op: AttrOp,
}

#[derive(Debug, Clone)]
enum AttrOp {
    Present,
    Equals(String),
    Contains(String),
}

impl Selector {
    pub fn parse(input: &str) -> Selector {
        Selector {
            raw: input.to_string(),
            parts: input.split_whitespace().map(parse_compound).collect(),
        }
    }

    pub fn parse_list(inputs: &[&str]) -> Vec<Selector> {
        inputs.iter().map(|s| Selector::parse(s)).collect()
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Match against one element. Descendant chains are resolved right to
    /// left through the ancestor walk; two-part chains are the deepest the
    /// scan selectors go, so the greedy walk is exact.
    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        let Some((target, ancestors)) = self.parts.split_last() else {
            return false;
        };
        if !target.matches(doc, id) {
            return false;
        }
        let mut cursor = doc.parent(id);
        'chain: for compound in ancestors.iter().rev() {
            while let Some(node) = cursor {
                cursor = doc.parent(node);
                if compound.matches(doc, node) {
                    continue 'chain;
                }
            }
            return false;
        }
        true
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl Compound {
    fn matches(&self, doc: &Document, id: NodeId) -> bool {
        if let Some(tag) = &self.tag {
            if doc.tag(id) != tag {
                return false;
            }
        }
        if let Some(want) = &self.id {
            if doc.attr(id, "id") != Some(want.as_str()) {
                return false;
            }
        }
        if self.classes.iter().any(|c| !doc.has_class(id, c)) {
            return false;
        }
        for test in &self.attrs {
            let value = doc.attr(id, &test.name);
            let ok = match &test.op {
                AttrOp::Present => value.is_some(),
                AttrOp::Equals(want) => value == Some(want.as_str()),
                AttrOp::Contains(want) => value.is_some_and(|v| v.contains(want.as_str())),
            };
            if !ok {
                return false;
            }
        }
        true
    }
}

fn parse_compound(token: &str) -> Compound {
    let chars: Vec<char> = token.chars().collect();
    let mut compound = Compound::default();
    let mut i = 0;

    let tag_end = chars
        .iter()
        .position(|c| matches!(c, '#' | '.' | '['))
        .unwrap_or(chars.len());
    if tag_end > 0 {
        let tag: String = chars[..tag_end].iter().collect();
        compound.tag = Some(tag.to_ascii_lowercase());
        i = tag_end;
    }

    while i < chars.len() {
        match chars[i] {
            '#' => {
                let (name, next) = read_name(&chars, i + 1);
                compound.id = Some(name);
                i = next;
            }
            '.' => {
                let (name, next) = read_name(&chars, i + 1);
                compound.classes.push(name);
                i = next;
            }
            '[' => {
                let close = chars[i + 1..]
                    .iter()
                    .position(|&c| c == ']')
                    .map(|p| i + 1 + p)
                    .unwrap_or(chars.len());
                let inner: String = chars[i + 1..close].iter().collect();
                compound.attrs.push(parse_attr(&inner));
                i = close.saturating_add(1);
            }
            _ => i += 1,
        }
    }
    compound
}

fn read_name(chars: &[char], start: usize) -> (String, usize) {
    let mut end = start;
    while end < chars.len() && !matches!(chars[end], '#' | '.' | '[') {
        end += 1;
    }
    (chars[start..end].iter().collect(), end)
}

fn parse_attr(inner: &str) -> AttrTest {
    if let Some((name, value)) = inner.split_once("*=") {
        AttrTest {
            name: name.to_string(),
            op: AttrOp::Contains(unquote(value)),
        }
    } else if let Some((name, value)) = inner.split_once('=') {
        AttrTest {
            name: name.to_string(),
            op: AttrOp::Equals(unquote(value)),
        }
    } else {
        AttrTest {
            name: inner.to_string(),
            op: AttrOp::Present,
        }
    }
}

fn unquote(value: &str) -> String {
    value
        .trim_matches('"')
        .trim_matches('\'')
        .to_string()
}
