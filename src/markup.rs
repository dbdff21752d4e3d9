//! Storefront markup conventions.
//!
//! Selectors the editor relies on and builders for the elements the
//! structural reconciler materializes. Built elements carry the same classes
//! and bilingual `data-ar`/`data-en` attributes as the hand-written page, so
//! the language switcher and overlays treat them identically.

use crate::dom::{Document, NodeId, Selector};
use crate::models::{Language, ProductDef, SectionDef};

/// Editable text elements, in priority order.
pub const TEXT_SELECTORS: &[&str] = &[
    ".logo__title",
    ".logo__subtitle",
    ".nav__links a",
    ".mobile-nav a",
    ".slide h1",
    ".slide p",
    ".slide .btn",
    ".section__head h2",
    ".section__all",
    ".grid--cards h3",
    ".product h3",
    ".product button",
    ".contact__card h3",
    ".contact__card p",
    ".contact__card .btn",
    ".login__hint",
    ".about",
    ".footer h3",
    ".footer h4",
    ".footer p",
    ".footer li a",
    ".footer__bottom",
];

/// Editable image elements, in priority order.
pub const IMAGE_SELECTORS: &[&str] = &[
    ".logo img",
    ".slide",
    ".card__img",
    ".section-banner img",
    ".product__img",
];

/// Elements a click in image or clear-image mode resolves to.
pub const IMAGE_TARGET: &str = ".product__img, .card__img, .section-banner img, .logo img, .slide";

/// The developer panel; nothing inside it is ever editable.
pub const EDITOR_PANEL: &str = ".template-editor-panel";

pub const SECTION: &str = ".catalog";
pub const PRODUCT: &str = ".product";
pub const PRODUCT_GRID: &str = ".grid--products";
pub const CARD_GRID: &str = ".grid--cards";
pub const CARD: &str = ".grid--cards .card";
pub const FOOTER_SECTIONS: &str = ".footer__sections";
pub const FOOTER_LINK: &str = ".footer a";
pub const CONTACT_ID: &str = "contact";
pub const COLOR_STYLE_ID: &str = "template-custom-colors";

/// Marks the root of a materialized element; ids inside it are scoped to it.
pub const SCOPE_KEY: &str = "template-scope";

const VIEW_ALL_AR: &str = "عرض الكل";
const VIEW_ALL_EN: &str = "View all";
const ORDER_AR: &str = "اطلب الآن";
const ORDER_EN: &str = "Order now";

fn pick<'a>(lang: Language, ar: &'a str, en: &'a str) -> &'a str {
    match lang {
        Language::En if !en.is_empty() => en,
        _ => ar,
    }
}

/// Appends an element carrying bilingual text.
fn bilingual(
    doc: &mut Document,
    parent: NodeId,
    name: &str,
    attrs: &[(&str, &str)],
    (ar, en): (&str, &str),
    lang: Language,
) -> NodeId {
    let node = doc.create_element_with(name, attrs);
    doc.set_dataset(node, "ar", ar);
    doc.set_dataset(node, "en", en);
    doc.set_text_content(node, pick(lang, ar, en));
    doc.append_child(parent, node);
    node
}

fn url_style(property: &str, src: &str) -> String {
    if src.is_empty() {
        String::new()
    } else {
        format!("{}:url('{}');", property, src)
    }
}

/// `<section class="section catalog">` with banner, heading, "view all"
/// link and an empty product grid.
pub fn build_section(doc: &mut Document, def: &SectionDef, lang: Language) -> NodeId {
    let scope = format!("section:{}", def.id);
    let section = doc.create_element_with(
        "section",
        &[
            ("class", "section catalog"),
            ("id", def.id.as_str()),
            ("data-section-id", def.id.as_str()),
            ("data-template-scope", scope.as_str()),
        ],
    );

    let banner = doc.create_element_with("div", &[("class", "section-banner")]);
    let img = doc.create_element_with("img", &[("alt", def.title_ar.as_str())]);
    if !def.banner.is_empty() {
        doc.set_attr(img, "src", &def.banner);
    }
    doc.append_child(banner, img);
    doc.append_child(section, banner);

    let head = doc.create_element_with("div", &[("class", "section__head")]);
    doc.append_child(section, head);
    bilingual(doc, head, "h2", &[], (def.title_ar.as_str(), def.title_en.as_str()), lang);
    let href = format!("#{}", def.id);
    bilingual(
        doc,
        head,
        "a",
        &[("class", "section__all"), ("href", href.as_str())],
        (VIEW_ALL_AR, VIEW_ALL_EN),
        lang,
    );

    let grid = doc.create_element_with("div", &[("class", "grid grid--products")]);
    doc.append_child(section, grid);
    section
}

/// Index card linking to a section.
pub fn build_card(doc: &mut Document, def: &SectionDef, lang: Language) -> NodeId {
    let scope = format!("card:{}", def.id);
    let href = format!("#{}", def.id);
    let card = doc.create_element_with(
        "a",
        &[
            ("class", "card"),
            ("href", href.as_str()),
            ("data-template-scope", scope.as_str()),
        ],
    );
    let style = url_style("--img", def.card_image_or_banner());
    let img = doc.create_element_with("div", &[("class", "card__img")]);
    if !style.is_empty() {
        doc.set_attr(img, "style", &style);
    }
    doc.append_child(card, img);
    bilingual(doc, card, "h3", &[], (def.title_ar.as_str(), def.title_en.as_str()), lang);
    card
}

/// Footer list item linking to a section.
pub fn build_footer_link(doc: &mut Document, def: &SectionDef, lang: Language) -> NodeId {
    let scope = format!("footer:{}", def.id);
    let href = format!("#{}", def.id);
    let item = doc.create_element_with("li", &[("data-template-scope", scope.as_str())]);
    bilingual(
        doc,
        item,
        "a",
        &[("href", href.as_str())],
        (def.title_ar.as_str(), def.title_en.as_str()),
        lang,
    );
    item
}

/// Product tile for a section's grid.
pub fn build_product(doc: &mut Document, def: &ProductDef, lang: Language) -> NodeId {
    let scope = format!("product:{}", def.id);
    let product = doc.create_element_with(
        "article",
        &[
            ("class", "product"),
            ("data-product-id", def.id.as_str()),
            ("data-template-scope", scope.as_str()),
        ],
    );
    let style = url_style("--img", &def.image);
    let img = doc.create_element_with("div", &[("class", "product__img")]);
    if !style.is_empty() {
        doc.set_attr(img, "style", &style);
    }
    doc.append_child(product, img);
    bilingual(doc, product, "h3", &[], (def.name_ar.as_str(), def.name_en.as_str()), lang);
    bilingual(
        doc,
        product,
        "button",
        &[("type", "button")],
        (ORDER_AR, ORDER_EN),
        lang,
    );
    product
}

/// The id a section element is known by.
pub fn section_id_of(doc: &Document, section: NodeId) -> Option<&str> {
    doc.dataset(section, "section-id")
        .or_else(|| doc.attr(section, "id"))
        .filter(|id| !id.is_empty())
}

pub fn find_section(doc: &Document, id: &str) -> Option<NodeId> {
    doc.select(&Selector::new(SECTION))
        .into_iter()
        .find(|n| section_id_of(doc, *n) == Some(id))
}

pub fn find_product(doc: &Document, id: &str) -> Option<NodeId> {
    doc.select(&Selector::new(PRODUCT))
        .into_iter()
        .find(|n| doc.dataset(*n, "product-id") == Some(id))
}

pub fn find_card(doc: &Document, id: &str) -> Option<NodeId> {
    let href = format!("#{}", id);
    doc.select(&Selector::new(CARD))
        .into_iter()
        .find(|n| doc.attr(*n, "href") == Some(href.as_str()))
}

/// The footer entry for a section: its `<li>` when the link sits in one.
pub fn find_footer_link(doc: &Document, id: &str) -> Option<NodeId> {
    let href = format!("#{}", id);
    let link = doc
        .select(&Selector::new(FOOTER_LINK))
        .into_iter()
        .find(|n| doc.attr(*n, "href") == Some(href.as_str()))?;
    match doc.parent(link) {
        Some(parent) if doc.tag_name(parent) == Some("li") => Some(parent),
        _ => Some(link),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section_def() -> SectionDef {
        SectionDef::new("glass", "زجاج")
            .with_title_en("Glass")
            .with_banner("glass.jpg")
    }

    #[test]
    fn test_build_section_shape() {
        let mut doc = Document::parse("<main></main>");
        let main = doc.select_first(&Selector::new("main")).unwrap();
        let section = build_section(&mut doc, &section_def(), Language::Ar);
        doc.append_child(main, section);

        assert_eq!(find_section(&doc, "glass"), Some(section));
        let h2 = doc.select_first(&Selector::new(".section__head h2")).unwrap();
        assert_eq!(doc.text_content(h2), "زجاج");
        assert_eq!(doc.dataset(h2, "en"), Some("Glass"));
        let img = doc.select_first(&Selector::new(".section-banner img")).unwrap();
        assert_eq!(doc.attr(img, "src"), Some("glass.jpg"));
        assert!(doc.select_first(&Selector::new(".catalog .grid--products")).is_some());
    }

    #[test]
    fn test_card_falls_back_to_banner() {
        let mut doc = Document::parse("<div></div>");
        let card = build_card(&mut doc, &section_def(), Language::En);
        let img = doc.children(card)[0];
        assert_eq!(doc.attr(img, "style"), Some("--img:url('glass.jpg');"));

        let own = build_card(&mut doc, &section_def().with_card_image("card.jpg"), Language::En);
        let img = doc.children(own)[0];
        assert_eq!(doc.attr(img, "style"), Some("--img:url('card.jpg');"));
    }

    #[test]
    fn test_build_product_uses_active_language() {
        let mut doc = Document::parse("<div class=\"grid--products\"></div>");
        let grid = doc.select_first(&Selector::new(PRODUCT_GRID)).unwrap();
        let def = ProductDef {
            id: "p1".into(),
            section_id: "glass".into(),
            name_ar: "مرآة".into(),
            name_en: "Mirror".into(),
            image: "m.jpg".into(),
        };
        let product = build_product(&mut doc, &def, Language::En);
        doc.append_child(grid, product);

        let h3 = doc.select_first(&Selector::new(".product h3")).unwrap();
        assert_eq!(doc.text_content(h3), "Mirror");
        let img = doc.select_first(&Selector::new(".product__img")).unwrap();
        assert_eq!(doc.attr(img, "style"), Some("--img:url('m.jpg');"));
        assert_eq!(find_product(&doc, "p1"), Some(product));
    }

    #[test]
    fn test_find_footer_link_returns_list_item() {
        let doc = Document::parse(
            r##"<footer class="footer"><ul class="footer__sections"><li><a href="#glass">x</a></li></ul></footer>"##,
        );
        let li = find_footer_link(&doc, "glass").unwrap();
        assert_eq!(doc.tag_name(li), Some("li"));
        assert!(find_footer_link(&doc, "other").is_none());
    }
}
