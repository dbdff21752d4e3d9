//! HTML serialization.

use super::parse::{RAW_TEXT_ELEMENTS, VOID_ELEMENTS};
use super::{Document, NodeData, NodeId};

fn escape_text(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}

fn escape_attr(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}

impl Document {
    /// Serializes the whole document back to HTML.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for child in self.children(self.root()) {
            self.write_node(*child, false, &mut out);
        }
        out
    }

    /// Serializes a single node and its subtree.
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_node(node, false, &mut out);
        out
    }

    fn write_node(&self, node: NodeId, raw: bool, out: &mut String) {
        match self.data(node) {
            NodeData::Document => {
                for child in self.children(node) {
                    self.write_node(*child, false, out);
                }
            }
            NodeData::Doctype(d) => {
                out.push_str("<!");
                out.push_str(d);
                out.push('>');
            }
            NodeData::Comment(c) => {
                out.push_str("<!--");
                out.push_str(c);
                out.push_str("-->");
            }
            NodeData::Text(t) if raw => out.push_str(t),
            NodeData::Text(t) => escape_text(t, out),
            NodeData::Element(element) => {
                out.push('<');
                out.push_str(&element.name);
                for (k, v) in &element.attrs {
                    out.push(' ');
                    out.push_str(k);
                    out.push_str("=\"");
                    escape_attr(v, out);
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&element.name.as_str()) {
                    return;
                }
                let raw = RAW_TEXT_ELEMENTS.contains(&element.name.as_str());
                for child in self.children(node) {
                    self.write_node(*child, raw, out);
                }
                out.push_str("</");
                out.push_str(&element.name);
                out.push('>');
            }
        }
    }
}
