//! Brings the page's shape in line with the structure lists of a config.

use crate::dom::{Document, NodeId, Selector};
use crate::identity::{AssignReport, IdentityTable};
use crate::markup::{self, CARD_GRID, CONTACT_ID, FOOTER_SECTIONS, PRODUCT_GRID};
use crate::models::{Language, Structure};

/// What one reconcile pass changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub sections_removed: usize,
    pub products_removed: usize,
    pub sections_added: usize,
    pub products_added: usize,
    /// Added products whose section is not on the page.
    pub products_skipped: Vec<String>,
    pub assigned: AssignReport,
}

impl ReconcileReport {
    pub fn changed_shape(&self) -> bool {
        self.sections_removed + self.products_removed + self.sections_added + self.products_added
            > 0
    }
}

/// Removes a section together with its index card and footer link.
/// Returns whether anything was on the page.
pub fn remove_section_elements(doc: &mut Document, id: &str) -> bool {
    let nodes = [
        markup::find_section(doc, id),
        markup::find_card(doc, id),
        markup::find_footer_link(doc, id),
    ];
    let mut removed = false;
    for node in nodes.into_iter().flatten() {
        doc.detach(node);
        removed = true;
    }
    removed
}

fn insertion_parent(doc: &Document) -> NodeId {
    doc.select_first(&Selector::new("main"))
        .or_else(|| doc.body())
        .unwrap_or_else(|| doc.root())
}

/// Applies the structure lists in a fixed order: section removals, product
/// removals, section additions (with card and footer link), product
/// additions, then identity assignment for whatever appeared.
///
/// Running it again with the same structure changes nothing.
pub fn reconcile(
    doc: &mut Document,
    structure: &Structure,
    identities: &mut IdentityTable,
    lang: Language,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    for id in &structure.removed_sections {
        if remove_section_elements(doc, id) {
            report.sections_removed += 1;
        }
    }

    for id in &structure.removed_products {
        if let Some(product) = markup::find_product(doc, id) {
            doc.detach(product);
            report.products_removed += 1;
        }
    }

    for def in &structure.added_sections {
        if structure.removed_sections.contains(&def.id) {
            continue;
        }
        if markup::find_section(doc, &def.id).is_none() {
            let section = markup::build_section(doc, def, lang);
            let inserted = match doc.element_by_id(CONTACT_ID) {
                Some(contact) => doc.insert_before(contact, section),
                None => false,
            };
            if !inserted {
                let parent = insertion_parent(doc);
                doc.append_child(parent, section);
            }
            report.sections_added += 1;
        }
        if markup::find_card(doc, &def.id).is_none() {
            if let Some(grid) = doc.select_first(&Selector::new(CARD_GRID)) {
                let card = markup::build_card(doc, def, lang);
                doc.append_child(grid, card);
            }
        }
        if markup::find_footer_link(doc, &def.id).is_none() {
            if let Some(list) = doc.select_first(&Selector::new(FOOTER_SECTIONS)) {
                let item = markup::build_footer_link(doc, def, lang);
                doc.append_child(list, item);
            }
        }
    }

    let grid_selector = Selector::new(PRODUCT_GRID);
    for def in &structure.added_products {
        if structure.removed_products.contains(&def.id)
            || markup::find_product(doc, &def.id).is_some()
        {
            continue;
        }
        let grid = if structure.removed_sections.contains(&def.section_id) {
            None
        } else {
            markup::find_section(doc, &def.section_id)
                .and_then(|section| doc.select_first_within(section, &grid_selector))
        };
        match grid {
            Some(grid) => {
                let product = markup::build_product(doc, def, lang);
                doc.append_child(grid, product);
                report.products_added += 1;
            }
            None => report.products_skipped.push(def.id.clone()),
        }
    }

    report.assigned = identities.assign(doc);

    tracing::debug!(
        sections_removed = report.sections_removed,
        products_removed = report.products_removed,
        sections_added = report.sections_added,
        products_added = report.products_added,
        skipped = report.products_skipped.len(),
        "reconciled page structure"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::tests::PAGE;
    use crate::models::{ProductDef, SectionDef};

    fn page() -> (Document, IdentityTable) {
        let mut doc = Document::parse(PAGE);
        let mut identities = IdentityTable::new();
        identities.assign(&mut doc);
        (doc, identities)
    }

    fn product(id: &str, section_id: &str) -> ProductDef {
        ProductDef {
            id: id.to_string(),
            section_id: section_id.to_string(),
            name_ar: "منتج".to_string(),
            name_en: "Product".to_string(),
            image: "p.jpg".to_string(),
        }
    }

    fn glass() -> SectionDef {
        SectionDef::new("glass", "زجاج")
            .with_title_en("Glass")
            .with_banner("glass.jpg")
    }

    fn count(doc: &Document, selector: &str) -> usize {
        doc.select(&Selector::new(selector)).len()
    }

    #[test]
    fn test_materializes_section_card_and_footer_link() {
        let (mut doc, mut identities) = page();
        let mut structure = Structure::default();
        structure.add_section(glass());
        structure.add_product(product("p1", "glass"));

        let report = reconcile(&mut doc, &structure, &mut identities, Language::Ar);
        assert_eq!(report.sections_added, 1);
        assert_eq!(report.products_added, 1);
        assert!(report.products_skipped.is_empty());

        let section = markup::find_section(&doc, "glass").unwrap();
        let contact = doc.element_by_id("contact").unwrap();
        let main = doc.parent(contact).unwrap();
        let siblings = doc.children(main);
        let section_at = siblings.iter().position(|n| *n == section).unwrap();
        assert_eq!(siblings[section_at + 1], contact);

        assert!(markup::find_card(&doc, "glass").is_some());
        assert!(markup::find_footer_link(&doc, "glass").is_some());
        assert!(identities.product_node("p1").is_some());
        assert!(identities.section_node("glass").is_some());
        assert!(identities.text_node("section:glass/t1").is_some());
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let (mut doc, mut identities) = page();
        let mut structure = Structure::default();
        structure.add_section(glass());
        structure.add_product(product("p1", "glass"));
        structure.add_product(product("p2", "black-structure"));
        structure.remove_section("white-structure");
        structure.remove_product("black-structure::3");

        reconcile(&mut doc, &structure, &mut identities, Language::Ar);
        let once = doc.to_html();
        let report = reconcile(&mut doc, &structure, &mut identities, Language::Ar);

        assert!(!report.changed_shape());
        assert!(report.assigned.is_empty());
        assert_eq!(doc.to_html(), once);
        assert_eq!(count(&doc, ".catalog"), 2);
        assert_eq!(count(&doc, ".product"), 4);
    }

    #[test]
    fn test_removal_is_sticky_over_addition() {
        let (mut doc, mut identities) = page();
        let structure = Structure {
            added_sections: vec![SectionDef::new("s1", "قسم")],
            added_products: vec![product("p9", "s1")],
            removed_sections: ["s1".to_string()].into_iter().collect(),
            removed_products: Default::default(),
        };

        let report = reconcile(&mut doc, &structure, &mut identities, Language::Ar);
        assert!(markup::find_section(&doc, "s1").is_none());
        assert!(markup::find_card(&doc, "s1").is_none());
        assert_eq!(report.products_skipped, vec!["p9"]);
    }

    #[test]
    fn test_removing_pristine_section_cascades() {
        let (mut doc, mut identities) = page();
        let mut structure = Structure::default();
        structure.remove_section("white-structure");

        let report = reconcile(&mut doc, &structure, &mut identities, Language::Ar);
        assert_eq!(report.sections_removed, 1);
        assert!(markup::find_section(&doc, "white-structure").is_none());
        assert!(markup::find_card(&doc, "white-structure").is_none());
        assert!(markup::find_footer_link(&doc, "white-structure").is_none());
        assert_eq!(count(&doc, ".footer li"), 1);
        assert!(identities.product_node("white-structure::1").is_none());
    }

    #[test]
    fn test_product_for_missing_section_is_skipped() {
        let (mut doc, mut identities) = page();
        let mut structure = Structure::default();
        structure.add_product(product("p1", "nowhere"));

        let report = reconcile(&mut doc, &structure, &mut identities, Language::Ar);
        assert_eq!(report.products_added, 0);
        assert_eq!(report.products_skipped, vec!["p1"]);
        assert!(markup::find_product(&doc, "p1").is_none());
    }

    #[test]
    fn test_materialized_text_uses_active_language() {
        let (mut doc, mut identities) = page();
        let mut structure = Structure::default();
        structure.add_section(glass());

        reconcile(&mut doc, &structure, &mut identities, Language::En);
        let heading = identities.text_node("section:glass/t1").unwrap();
        assert_eq!(doc.text_content(heading), "Glass");
        assert_eq!(doc.dataset(heading, "ar"), Some("زجاج"));
    }

    #[test]
    fn test_section_falls_back_to_main_without_contact() {
        let mut doc = Document::parse("<html><body><main><p>x</p></main></body></html>");
        let mut identities = IdentityTable::new();
        let mut structure = Structure::default();
        structure.add_section(glass());

        reconcile(&mut doc, &structure, &mut identities, Language::Ar);
        let main = doc.select_first(&Selector::new("main")).unwrap();
        let section = markup::find_section(&doc, "glass").unwrap();
        assert_eq!(doc.parent(section), Some(main));
        assert_eq!(doc.children(main).last(), Some(&section));
    }
}
