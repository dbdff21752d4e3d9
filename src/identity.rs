//! Stable element identities.
//!
//! Every editable element gets an id that overlays and edits refer to:
//!
//! - text elements: `t1`, `t2`, … in document order over [`TEXT_SELECTORS`]
//! - image elements: `i1`, `i2`, … over [`IMAGE_SELECTORS`], counted separately
//! - sections: the element's `id`, else a random token
//! - products: `<section-id>::<ordinal>` at first assignment
//!
//! Text and image elements inside a materialized section, card, footer link
//! or product are numbered within that element's scope instead
//! (`product:p1/t1`), so adding or deleting structure never shifts the ids
//! of anything else.
//!
//! Assignment is incremental: ids already known for attached elements are
//! never changed, and counters only move forward within a session.

use std::collections::HashMap;
use uuid::Uuid;

use crate::dom::{Document, NodeId, Selector};
use crate::markup::{self, IMAGE_SELECTORS, SCOPE_KEY, TEXT_SELECTORS};

const TEXT_ID_KEY: &str = "template-text-id";
const IMAGE_ID_KEY: &str = "template-image-id";
const SECTION_ID_KEY: &str = "section-id";
const PRODUCT_ID_KEY: &str = "product-id";

/// Counts of ids handed out by one assignment pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AssignReport {
    pub texts: usize,
    pub images: usize,
    pub sections: usize,
    pub products: usize,
}

impl AssignReport {
    pub fn is_empty(&self) -> bool {
        *self == AssignReport::default()
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    text: usize,
    image: usize,
}

#[derive(Debug, Clone, Copy)]
enum Kind {
    Text,
    Image,
}

impl Kind {
    fn prefix(&self) -> char {
        match self {
            Kind::Text => 't',
            Kind::Image => 'i',
        }
    }
}

/// Element → id table for one page session.
#[derive(Debug, Default, Clone)]
pub struct IdentityTable {
    texts: Vec<(NodeId, String)>,
    images: Vec<(NodeId, String)>,
    sections: Vec<(NodeId, String)>,
    products: Vec<(NodeId, String)>,
    global: Counters,
    scoped: HashMap<String, Counters>,
}

fn lookup(entries: &[(NodeId, String)], node: NodeId) -> Option<&str> {
    entries
        .iter()
        .find(|(n, _)| *n == node)
        .map(|(_, id)| id.as_str())
}

fn reverse(entries: &[(NodeId, String)], id: &str) -> Option<NodeId> {
    entries.iter().find(|(_, i)| i == id).map(|(n, _)| *n)
}

fn random_token() -> String {
    let token = Uuid::new_v4().simple().to_string();
    format!("section-{}", &token[..8])
}

impl IdentityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns ids to every editable element that does not have one yet.
    pub fn assign(&mut self, doc: &mut Document) -> AssignReport {
        self.prune(doc);
        let mut report = AssignReport::default();

        for section in doc.select(&Selector::new(markup::SECTION)) {
            if lookup(&self.sections, section).is_some() {
                continue;
            }
            let id = markup::section_id_of(doc, section)
                .map(str::to_string)
                .unwrap_or_else(random_token);
            doc.set_dataset(section, SECTION_ID_KEY, &id);
            self.sections.push((section, id));
            report.sections += 1;
        }

        let product_selector = Selector::new(markup::PRODUCT);
        for (section, section_id) in self.sections.clone() {
            let products = doc.select_within(section, &product_selector);
            for (ordinal, product) in products.into_iter().enumerate() {
                if lookup(&self.products, product).is_some() {
                    continue;
                }
                let id = doc
                    .dataset(product, PRODUCT_ID_KEY)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("{}::{}", section_id, ordinal + 1));
                doc.set_dataset(product, PRODUCT_ID_KEY, &id);
                self.products.push((product, id));
                report.products += 1;
            }
        }

        let panel = Selector::new(markup::EDITOR_PANEL);
        for node in doc.select(&Selector::list(TEXT_SELECTORS)) {
            if lookup(&self.texts, node).is_some() || doc.closest(node, &panel).is_some() {
                continue;
            }
            let id = self.adopt_or_next(doc, node, Kind::Text);
            doc.set_dataset(node, TEXT_ID_KEY, &id);
            if doc.dataset(node, "ar").is_none() {
                let original = doc.text_content(node).trim().to_string();
                if !original.is_empty() {
                    doc.set_dataset(node, "ar", &original);
                }
            }
            self.texts.push((node, id));
            report.texts += 1;
        }

        for node in doc.select(&Selector::list(IMAGE_SELECTORS)) {
            if lookup(&self.images, node).is_some() || doc.closest(node, &panel).is_some() {
                continue;
            }
            let id = self.adopt_or_next(doc, node, Kind::Image);
            doc.set_dataset(node, IMAGE_ID_KEY, &id);
            self.images.push((node, id));
            report.images += 1;
        }

        if !report.is_empty() {
            tracing::debug!(
                texts = report.texts,
                images = report.images,
                sections = report.sections,
                products = report.products,
                "assigned element ids"
            );
        }
        report
    }

    /// Drops entries for elements no longer in the document.
    fn prune(&mut self, doc: &Document) {
        for entries in [
            &mut self.texts,
            &mut self.images,
            &mut self.sections,
            &mut self.products,
        ] {
            entries.retain(|(node, _)| doc.is_attached(*node));
        }
    }

    /// Keeps an id already written on the element (a previously rendered
    /// page) or hands out the next one for the element's scope.
    fn adopt_or_next(&mut self, doc: &Document, node: NodeId, kind: Kind) -> String {
        let key = match kind {
            Kind::Text => TEXT_ID_KEY,
            Kind::Image => IMAGE_ID_KEY,
        };
        if let Some(existing) = doc.dataset(node, key).filter(|id| !id.is_empty()) {
            let existing = existing.to_string();
            self.observe(&existing, kind);
            return existing;
        }

        let scope = doc
            .closest(node, &Selector::new(&format!("[data-{}]", SCOPE_KEY)))
            .and_then(|root| doc.dataset(root, SCOPE_KEY))
            .map(str::to_string);
        let counters = match &scope {
            Some(scope) => self.scoped.entry(scope.clone()).or_default(),
            None => &mut self.global,
        };
        let next = match kind {
            Kind::Text => {
                counters.text += 1;
                counters.text
            }
            Kind::Image => {
                counters.image += 1;
                counters.image
            }
        };
        match scope {
            Some(scope) => format!("{}/{}{}", scope, kind.prefix(), next),
            None => format!("{}{}", kind.prefix(), next),
        }
    }

    /// Moves counters past an adopted id so it is never handed out again.
    fn observe(&mut self, id: &str, kind: Kind) {
        let (scope, local) = match id.rsplit_once('/') {
            Some((scope, local)) => (Some(scope), local),
            None => (None, id),
        };
        let Some(n) = local
            .strip_prefix(kind.prefix())
            .and_then(|n| n.parse::<usize>().ok())
        else {
            return;
        };
        let counters = match scope {
            Some(scope) => self.scoped.entry(scope.to_string()).or_default(),
            None => &mut self.global,
        };
        let slot = match kind {
            Kind::Text => &mut counters.text,
            Kind::Image => &mut counters.image,
        };
        *slot = (*slot).max(n);
    }

    pub fn text_id(&self, node: NodeId) -> Option<&str> {
        lookup(&self.texts, node)
    }

    pub fn image_id(&self, node: NodeId) -> Option<&str> {
        lookup(&self.images, node)
    }

    pub fn section_id(&self, node: NodeId) -> Option<&str> {
        lookup(&self.sections, node)
    }

    pub fn product_id(&self, node: NodeId) -> Option<&str> {
        lookup(&self.products, node)
    }

    pub fn text_node(&self, id: &str) -> Option<NodeId> {
        reverse(&self.texts, id)
    }

    pub fn image_node(&self, id: &str) -> Option<NodeId> {
        reverse(&self.images, id)
    }

    pub fn section_node(&self, id: &str) -> Option<NodeId> {
        reverse(&self.sections, id)
    }

    pub fn product_node(&self, id: &str) -> Option<NodeId> {
        reverse(&self.products, id)
    }

    /// Text elements in assignment order.
    pub fn texts(&self) -> impl Iterator<Item = (NodeId, &str)> {
        self.texts.iter().map(|(n, id)| (*n, id.as_str()))
    }

    /// Image elements in assignment order.
    pub fn images(&self) -> impl Iterator<Item = (NodeId, &str)> {
        self.images.iter().map(|(n, id)| (*n, id.as_str()))
    }

    pub fn sections(&self) -> impl Iterator<Item = (NodeId, &str)> {
        self.sections.iter().map(|(n, id)| (*n, id.as_str()))
    }

    pub fn products(&self) -> impl Iterator<Item = (NodeId, &str)> {
        self.products.iter().map(|(n, id)| (*n, id.as_str()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::markup::build_product;
    use crate::models::{Language, ProductDef};

    pub(crate) const PAGE: &str = include_str!("../fixtures/storefront.html");

    fn assigned() -> (Document, IdentityTable) {
        let mut doc = Document::parse(PAGE);
        let mut table = IdentityTable::new();
        table.assign(&mut doc);
        (doc, table)
    }

    #[test]
    fn test_text_ids_follow_document_order() {
        let (doc, table) = assigned();
        let t1 = table.text_node("t1").unwrap();
        assert!(doc.has_class(t1, "logo__title"));
        let t2 = table.text_node("t2").unwrap();
        assert!(doc.has_class(t2, "logo__subtitle"));
        let t3 = table.text_node("t3").unwrap();
        assert_eq!(doc.attr(t3, "href"), Some("#home"));
        assert_eq!(doc.dataset(t1, "template-text-id"), Some("t1"));
    }

    #[test]
    fn test_image_ids_are_numbered_independently() {
        let (doc, table) = assigned();
        let i1 = table.image_node("i1").unwrap();
        assert_eq!(doc.tag_name(i1), Some("img"));
        let i2 = table.image_node("i2").unwrap();
        assert!(doc.has_class(i2, "slide"));
        assert_eq!(table.images().count(), 12);
    }

    #[test]
    fn test_original_text_is_cached_as_arabic() {
        let (doc, table) = assigned();
        let t1 = table.text_node("t1").unwrap();
        assert_eq!(doc.dataset(t1, "ar"), Some("عمران الخليج"));
        assert_eq!(doc.dataset(t1, "en"), Some("Imran Gulf"));
    }

    #[test]
    fn test_section_and_product_ids() {
        let (doc, table) = assigned();
        let black = table.section_node("black-structure").unwrap();
        assert_eq!(doc.attr(black, "id"), Some("black-structure"));

        let product = table.product_node("black-structure::2").unwrap();
        let h3 = doc.select_first_within(product, &Selector::new("h3")).unwrap();
        assert_eq!(doc.text_content(h3), "نافذة");
        assert!(table.product_node("white-structure::2").is_some());
        assert!(table.product_node("white-structure::3").is_none());
    }

    #[test]
    fn test_reassign_is_stable() {
        let (mut doc, mut table) = assigned();
        let before: Vec<_> = table.texts().map(|(n, id)| (n, id.to_string())).collect();

        let report = table.assign(&mut doc);
        assert!(report.is_empty());
        let after: Vec<_> = table.texts().map(|(n, id)| (n, id.to_string())).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_new_elements_get_scoped_ids_without_disturbing_others() {
        let (mut doc, mut table) = assigned();
        let last_before = table.text_node("t38").unwrap();

        let grid = doc
            .select_first(&Selector::new("#black-structure .grid--products"))
            .unwrap();
        let def = ProductDef {
            id: "p1".into(),
            section_id: "black-structure".into(),
            name_ar: "درابزين".into(),
            name_en: "Railing".into(),
            image: String::new(),
        };
        let product = build_product(&mut doc, &def, Language::Ar);
        doc.append_child(grid, product);

        let report = table.assign(&mut doc);
        assert_eq!(report.texts, 2);
        assert_eq!(report.images, 1);
        assert_eq!(report.products, 1);
        assert_eq!(table.text_node("t38"), Some(last_before));
        assert!(table.text_node("product:p1/t1").is_some());
        assert!(table.image_node("product:p1/i1").is_some());
        assert_eq!(table.product_id(product), Some("p1"));
    }

    #[test]
    fn test_removed_elements_are_pruned() {
        let (mut doc, mut table) = assigned();
        let product = table.product_node("black-structure::1").unwrap();
        doc.detach(product);
        table.assign(&mut doc);

        assert!(table.product_node("black-structure::1").is_none());
        // Surviving products keep their original ordinals.
        assert!(table.product_node("black-structure::2").is_some());
        assert!(table.text_node("t17").is_none());
        assert!(table.text_node("t19").is_some());
    }

    #[test]
    fn test_adopts_ids_from_rendered_markup() {
        let (doc, _) = assigned();
        let mut reparsed = Document::parse(&doc.to_html());
        let mut table = IdentityTable::new();
        table.assign(&mut reparsed);

        let t5 = table.text_node("t5").unwrap();
        assert_eq!(reparsed.attr(t5, "href"), Some("#contact"));
        assert_eq!(table.texts().count(), 38);
    }

    #[test]
    fn test_editor_panel_is_excluded() {
        let mut doc = Document::parse(
            r#"<div class="template-editor-panel"><div class="footer"><p>x</p></div></div><div class="footer"><p>y</p></div>"#,
        );
        let mut table = IdentityTable::new();
        table.assign(&mut doc);
        let t1 = table.text_node("t1").unwrap();
        assert_eq!(doc.text_content(t1), "y");
        assert!(table.text_node("t2").is_none());
    }
}
