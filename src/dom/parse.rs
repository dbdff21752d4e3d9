//! Tolerant HTML parser.
//!
//! Handles the markup the storefront actually ships: elements, quoted and
//! unquoted attributes, void elements, raw-text elements, comments and the
//! doctype. Malformed input never fails; stray end tags are ignored and
//! unclosed elements are closed at end of input.

use super::{Document, NodeData, NodeId};

pub(super) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

pub(super) const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Decodes the character references the page uses.
pub(super) fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        let decoded = rest.find(';').and_then(|end| {
            let name = &rest[1..end];
            let c = match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" | "#39" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => name
                    .strip_prefix("#x")
                    .or_else(|| name.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| name.strip_prefix('#').and_then(|d| d.parse().ok()))
                    .and_then(char::from_u32),
            };
            c.map(|c| (c, end + 1))
        });
        match decoded {
            Some((c, len)) => {
                out.push(c);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

struct StartTag {
    name: String,
    attrs: Vec<(String, String)>,
    self_closing: bool,
}

/// Parses a start tag; `s` begins right after `<`. Returns the tag and the
/// number of bytes consumed.
fn parse_start_tag(s: &str) -> (StartTag, usize) {
    let name_end = s
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .unwrap_or(s.len());
    let mut tag = StartTag {
        name: s[..name_end].to_ascii_lowercase(),
        attrs: Vec::new(),
        self_closing: false,
    };
    let mut rest = &s[name_end..];

    loop {
        rest = rest.trim_start();
        if let Some(tail) = rest.strip_prefix("/>") {
            tag.self_closing = true;
            rest = tail;
            break;
        }
        if let Some(tail) = rest.strip_prefix('>') {
            rest = tail;
            break;
        }
        if rest.is_empty() {
            break;
        }

        let attr_end = rest
            .find(|c: char| c.is_whitespace() || c == '=' || c == '>' || c == '/')
            .unwrap_or(rest.len());
        if attr_end == 0 {
            // Stray '/' or '='.
            rest = &rest[1..];
            continue;
        }
        let attr_name = rest[..attr_end].to_ascii_lowercase();
        rest = rest[attr_end..].trim_start();

        let mut value = String::new();
        if let Some(tail) = rest.strip_prefix('=') {
            let tail = tail.trim_start();
            match tail.chars().next() {
                Some(quote @ ('"' | '\'')) => {
                    let body = &tail[1..];
                    let end = body.find(quote).unwrap_or(body.len());
                    value = decode_entities(&body[..end]);
                    rest = body.get(end + 1..).unwrap_or("");
                }
                _ => {
                    let end = tail
                        .find(|c: char| c.is_whitespace() || c == '>')
                        .unwrap_or(tail.len());
                    value = decode_entities(&tail[..end]);
                    rest = &tail[end..];
                }
            }
        }
        if !tag.attrs.iter().any(|(k, _)| *k == attr_name) {
            tag.attrs.push((attr_name, value));
        }
    }

    (tag, s.len() - rest.len())
}

impl Document {
    /// Parses HTML markup into a document.
    pub fn parse(html: &str) -> Self {
        let mut doc = Document::new();
        let mut stack: Vec<NodeId> = vec![doc.root()];
        let mut rest = html;

        while !rest.is_empty() {
            let current = *stack.last().unwrap_or(&doc.root());

            if let Some(after) = rest.strip_prefix("<!--") {
                let end = after.find("-->").unwrap_or(after.len());
                let comment = doc.push(NodeData::Comment(after[..end].to_string()));
                doc.append_child(current, comment);
                rest = after.get(end + 3..).unwrap_or("");
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                let end = rest.find('>').unwrap_or(rest.len());
                let inner = rest[2..end].trim();
                if inner
                    .get(..7)
                    .is_some_and(|p| p.eq_ignore_ascii_case("doctype"))
                {
                    let doctype = doc.push(NodeData::Doctype(inner.to_string()));
                    doc.append_child(current, doctype);
                }
                rest = rest.get(end + 1..).unwrap_or("");
            } else if let Some(after) = rest.strip_prefix("</") {
                let end = after.find('>').unwrap_or(after.len());
                let name = after[..end].trim().to_ascii_lowercase();
                if let Some(pos) = stack
                    .iter()
                    .rposition(|n| doc.tag_name(*n) == Some(name.as_str()))
                {
                    stack.truncate(pos.max(1));
                }
                rest = after.get(end + 1..).unwrap_or("");
            } else if rest.starts_with('<')
                && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic())
            {
                let (tag, consumed) = parse_start_tag(&rest[1..]);
                rest = &rest[1 + consumed..];

                let node = doc.create_element(&tag.name);
                for (k, v) in &tag.attrs {
                    doc.set_attr(node, k, v);
                }
                doc.append_child(current, node);

                if RAW_TEXT_ELEMENTS.contains(&tag.name.as_str()) && !tag.self_closing {
                    let closing = format!("</{}", tag.name);
                    let end = rest
                        .to_ascii_lowercase()
                        .find(&closing)
                        .unwrap_or(rest.len());
                    if end > 0 {
                        let text = doc.create_text(&rest[..end]);
                        doc.append_child(node, text);
                    }
                    rest = &rest[end..];
                    let close_end = rest.find('>').map(|i| i + 1).unwrap_or(rest.len());
                    rest = &rest[close_end..];
                } else if !tag.self_closing && !VOID_ELEMENTS.contains(&tag.name.as_str()) {
                    stack.push(node);
                }
            } else {
                let first = rest.chars().next().map(char::len_utf8).unwrap_or(1);
                let end = rest[first..]
                    .find('<')
                    .map(|i| i + first)
                    .unwrap_or(rest.len());
                let text = decode_entities(&rest[..end]);
                let node = doc.create_text(&text);
                doc.append_child(current, node);
                rest = &rest[end..];
            }
        }

        doc
    }
}
