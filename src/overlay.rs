//! Paints saved texts, images and colors onto the page.
//!
//! Every function here is idempotent: applying the same config twice leaves
//! the document exactly as applying it once.

use crate::dom::{Document, NodeId, Selector};
use crate::identity::IdentityTable;
use crate::markup::COLOR_STYLE_ID;
use crate::models::{Language, Palette, SiteConfig, TextEntry};

/// Writes a saved entry onto one text element and shows the value for
/// `lang`, falling back to the element's cached text for that language.
pub fn apply_text(doc: &mut Document, node: NodeId, entry: &TextEntry, lang: Language) {
    if let Some(ar) = entry.get(Language::Ar) {
        doc.set_dataset(node, "ar", ar);
    }
    if let Some(en) = entry.get(Language::En) {
        doc.set_dataset(node, "en", en);
    }
    let shown = entry
        .get(lang)
        .or_else(|| doc.dataset(node, lang.code()).filter(|v| !v.is_empty()))
        .map(str::to_string)
        .unwrap_or_else(|| doc.text_content(node));
    doc.set_text_content(node, &shown);
}

/// Applies every saved text entry whose element is present.
pub fn apply_texts(doc: &mut Document, identities: &IdentityTable, config: &SiteConfig, lang: Language) {
    for (node, id) in identities.texts() {
        if let Some(entry) = config.texts.get(id) {
            apply_text(doc, node, entry, lang);
        }
    }
}

/// The inline-style property carrying an element's image.
fn image_property(doc: &Document, node: NodeId) -> Option<&'static str> {
    if doc.tag_name(node) == Some("img") {
        None
    } else if doc.has_class(node, "slide") {
        Some("--bg")
    } else {
        Some("--img")
    }
}

/// Locates `<prop>:url('<value>')` (with an optional trailing `;`) in a
/// style string. Returns the byte range of the declaration and the value.
fn find_url_declaration<'a>(style: &'a str, prop: &str) -> Option<(usize, usize, &'a str)> {
    let mut from = 0;
    while let Some(offset) = style[from..].find(prop) {
        let start = from + offset;
        let after = style[start + prop.len()..].trim_start();
        let Some(after) = after.strip_prefix(':') else {
            from = start + prop.len();
            continue;
        };
        let after = after.trim_start();
        let Some(value_and_rest) = after.strip_prefix("url('") else {
            from = start + prop.len();
            continue;
        };
        let value_start = style.len() - value_and_rest.len();
        // Data URLs carry `;` so the value only ends at the closing `')`.
        let close = value_and_rest.find("')")?;
        let value = &value_and_rest[..close];
        let mut end = value_start + close + 2;
        let tail = &style[end..];
        let trimmed = tail.trim_start();
        if trimmed.starts_with(';') {
            end += tail.len() - trimmed.len() + 1;
        }
        return Some((start, end, value));
    }
    None
}

/// Reads the `url('…')` value of a custom property from an inline style.
pub fn style_url(style: &str, prop: &str) -> Option<String> {
    find_url_declaration(style, prop).map(|(_, _, value)| value.to_string())
}

/// Removes a `url('…')` declaration from an inline style.
pub fn strip_style_url(style: &str, prop: &str) -> String {
    match find_url_declaration(style, prop) {
        Some((start, end, _)) => {
            let mut out = String::with_capacity(style.len());
            out.push_str(style[..start].trim_end());
            let rest = style[end..].trim_start();
            if !out.is_empty() && !rest.is_empty() {
                out.push(' ');
            }
            out.push_str(rest);
            out
        }
        None => style.trim().to_string(),
    }
}

/// Replaces (or adds) a `url('…')` declaration in an inline style.
pub fn set_style_url(style: &str, prop: &str, value: &str) -> String {
    let cleaned = strip_style_url(style, prop);
    let declaration = format!("{}:url('{}');", prop, value);
    if cleaned.is_empty() {
        declaration
    } else {
        format!("{} {}", cleaned, declaration)
    }
}

/// Current image source of an image-bearing element.
pub fn image_source(doc: &Document, node: NodeId) -> Option<String> {
    match image_property(doc, node) {
        None => doc.attr(node, "src").map(str::to_string),
        Some(prop) => style_url(doc.attr(node, "style").unwrap_or_default(), prop),
    }
}

/// Shows `src` on an image-bearing element.
pub fn set_image_source(doc: &mut Document, node: NodeId, src: &str) {
    match image_property(doc, node) {
        None => doc.set_attr(node, "src", src),
        Some(prop) => {
            let style = set_style_url(doc.attr(node, "style").unwrap_or_default(), prop, src);
            doc.set_attr(node, "style", &style);
        }
    }
}

/// Blanks an image-bearing element.
pub fn clear_image_source(doc: &mut Document, node: NodeId) {
    match image_property(doc, node) {
        None => doc.remove_attr(node, "src"),
        Some(prop) => {
            let style = strip_style_url(doc.attr(node, "style").unwrap_or_default(), prop);
            if style.is_empty() {
                doc.remove_attr(node, "style");
            } else {
                doc.set_attr(node, "style", &style);
            }
        }
    }
}

pub fn apply_images(doc: &mut Document, identities: &IdentityTable, config: &SiteConfig) {
    for (node, id) in identities.images() {
        if let Some(src) = config.images.get(id).filter(|s| !s.is_empty()) {
            set_image_source(doc, node, src);
        }
    }
}

/// Regenerates the injected color stylesheet from the whole palette.
pub fn apply_colors(doc: &mut Document, palette: &Palette) {
    let style = match doc.element_by_id(COLOR_STYLE_ID) {
        Some(style) => style,
        None => {
            let style = doc.create_element_with("style", &[("id", COLOR_STYLE_ID)]);
            let parent = doc
                .head()
                .or_else(|| doc.body())
                .unwrap_or_else(|| doc.root());
            doc.append_child(parent, style);
            style
        }
    };
    doc.set_text_content(style, &palette.to_css());
}

/// Applies texts, images and colors in that order.
pub fn apply_all(doc: &mut Document, identities: &IdentityTable, config: &SiteConfig, lang: Language) {
    apply_texts(doc, identities, config, lang);
    apply_images(doc, identities, config);
    apply_colors(doc, &config.colors);
}

/// Number of injected color stylesheets on the page.
pub fn color_style_blocks(doc: &Document) -> usize {
    doc.select(&Selector::new(&format!("style#{}", COLOR_STYLE_ID)))
        .len()
}
