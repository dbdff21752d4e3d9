//! A small CSS selector subset.
//!
//! Supported: type (`img`), class (`.product`), id (`#contact`), attribute
//! presence and equality (`[data-en]`, `[href="#a"]`), the descendant
//! combinator and comma-separated lists. Unsupported syntax is skipped.

use super::{Document, NodeId};

#[derive(Debug, Clone, Default, PartialEq)]
struct AttrMatch {
    name: String,
    value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrMatch>,
}

/// A parsed selector list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selector {
    /// Each alternative is a descendant chain, outermost compound first.
    alternatives: Vec<Vec<Compound>>,
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn take_ident(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !is_ident_char(c)).unwrap_or(s.len());
    (&s[..end], &s[end..])
}

/// Splits on `sep` outside of `[...]` groups.
fn split_outside_brackets(s: &str, sep: impl Fn(char) -> bool) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            c if depth == 0 && sep(c) => {
                parts.push(&s[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts.into_iter().filter(|p| !p.trim().is_empty()).collect()
}

fn parse_compound(s: &str) -> Compound {
    let mut compound = Compound::default();
    let mut rest = s;
    while let Some(c) = rest.chars().next() {
        match c {
            '.' => {
                let (ident, tail) = take_ident(&rest[1..]);
                if !ident.is_empty() {
                    compound.classes.push(ident.to_string());
                }
                rest = tail;
            }
            '#' => {
                let (ident, tail) = take_ident(&rest[1..]);
                if !ident.is_empty() {
                    compound.id = Some(ident.to_string());
                }
                rest = tail;
            }
            '[' => {
                let end = rest.find(']').unwrap_or(rest.len());
                let inner = &rest[1..end];
                let attr = match inner.split_once('=') {
                    Some((name, value)) => AttrMatch {
                        name: name.trim().to_ascii_lowercase(),
                        value: Some(value.trim().trim_matches(['"', '\'']).to_string()),
                    },
                    None => AttrMatch {
                        name: inner.trim().to_ascii_lowercase(),
                        value: None,
                    },
                };
                if !attr.name.is_empty() {
                    compound.attrs.push(attr);
                }
                rest = rest.get(end + 1..).unwrap_or("");
            }
            c if is_ident_char(c) => {
                let (ident, tail) = take_ident(rest);
                compound.tag = Some(ident.to_ascii_lowercase());
                rest = tail;
            }
            c => rest = &rest[c.len_utf8()..],
        }
    }
    compound
}

impl Selector {
    /// Parses a selector list. Never fails; unknown syntax is ignored.
    pub fn new(source: &str) -> Self {
        let alternatives = split_outside_brackets(source, |c| c == ',')
            .into_iter()
            .map(|complex| {
                split_outside_brackets(complex, char::is_whitespace)
                    .into_iter()
                    .map(parse_compound)
                    .collect::<Vec<_>>()
            })
            .filter(|chain| !chain.is_empty())
            .collect();
        Self { alternatives }
    }

    /// Joins several selector strings into one list, preserving their order.
    pub fn list(sources: &[&str]) -> Self {
        Self::new(&sources.join(","))
    }

    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.alternatives
            .iter()
            .any(|chain| chain_matches(doc, node, chain))
    }
}

fn compound_matches(doc: &Document, node: NodeId, compound: &Compound) -> bool {
    let Some(element) = doc.element(node) else {
        return false;
    };
    if let Some(tag) = &compound.tag {
        if element.name != *tag {
            return false;
        }
    }
    if let Some(id) = &compound.id {
        if element.attr("id") != Some(id.as_str()) {
            return false;
        }
    }
    if !compound.classes.iter().all(|c| element.has_class(c)) {
        return false;
    }
    compound.attrs.iter().all(|a| match (&a.value, element.attr(&a.name)) {
        (None, Some(_)) => true,
        (Some(expected), Some(actual)) => expected == actual,
        _ => false,
    })
}

fn chain_matches(doc: &Document, node: NodeId, chain: &[Compound]) -> bool {
    let Some((last, ancestors)) = chain.split_last() else {
        return false;
    };
    if !compound_matches(doc, node, last) {
        return false;
    }
    let mut current = doc.parent(node);
    for compound in ancestors.iter().rev() {
        loop {
            match current {
                Some(n) if compound_matches(doc, n, compound) => {
                    current = doc.parent(n);
                    break;
                }
                Some(n) => current = doc.parent(n),
                None => return false,
            }
        }
    }
    true
}
