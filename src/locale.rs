//! Page language switching.

use crate::dom::{Document, Selector};
use crate::models::Language;

/// The language the page currently displays, read from `<html lang>`.
pub fn current_language(doc: &Document) -> Language {
    Language::from_lang_attr(
        doc.document_element()
            .and_then(|html| doc.attr(html, "lang")),
    )
}

/// Switches the page to `lang`: root `lang`/`dir`, the active language
/// button, every `data-en` element and every translated placeholder.
///
/// Arabic values are captured from the markup the first time an element is
/// switched, so switching back restores them.
pub fn switch_language(doc: &mut Document, lang: Language) {
    if let Some(html) = doc.document_element() {
        doc.set_attr(html, "lang", lang.code());
        doc.set_attr(html, "dir", lang.dir());
    }

    for button in doc.select(&Selector::new(".lang")) {
        let active = doc.dataset(button, "lang") == Some(lang.code());
        doc.toggle_class(button, "is-active", active);
    }

    for node in doc.select(&Selector::new("[data-en]")) {
        if doc.dataset(node, "ar").map_or(true, str::is_empty) {
            let original = doc.text_content(node);
            doc.set_dataset(node, "ar", &original);
        }
        let key = match lang {
            Language::En => "en",
            Language::Ar => "ar",
        };
        let text = doc.dataset(node, key).unwrap_or_default().to_string();
        doc.set_text_content(node, &text);
    }

    for input in doc.select(&Selector::new("[data-placeholder-en]")) {
        if doc.dataset(input, "placeholder-ar").map_or(true, str::is_empty) {
            let original = doc.attr(input, "placeholder").unwrap_or_default().to_string();
            doc.set_dataset(input, "placeholder-ar", &original);
        }
        let key = match lang {
            Language::En => "placeholder-en",
            Language::Ar => "placeholder-ar",
        };
        let placeholder = doc.dataset(input, key).unwrap_or_default().to_string();
        doc.set_attr(input, "placeholder", &placeholder);
    }

    tracing::debug!(lang = lang.code(), "switched page language");
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = include_str!("../fixtures/storefront.html");

    #[test]
    fn test_current_language_defaults_to_arabic() {
        let doc = Document::parse("<html><body></body></html>");
        assert_eq!(current_language(&doc), Language::Ar);
        let doc = Document::parse(PAGE);
        assert_eq!(current_language(&doc), Language::Ar);
    }

    #[test]
    fn test_switch_to_english_and_back() {
        let mut doc = Document::parse(PAGE);
        switch_language(&mut doc, Language::En);

        let html = doc.document_element().unwrap();
        assert_eq!(doc.attr(html, "lang"), Some("en"));
        assert_eq!(doc.attr(html, "dir"), Some("ltr"));
        assert_eq!(current_language(&doc), Language::En);

        let title = doc.select_first(&Selector::new(".logo__title")).unwrap();
        assert_eq!(doc.text_content(title), "Imran Gulf");
        let input = doc.select_first(&Selector::new("input")).unwrap();
        assert_eq!(doc.attr(input, "placeholder"), Some("Your name"));
        let en_button = doc.select_first(&Selector::new(r#".lang[data-lang="en"]"#)).unwrap();
        assert!(doc.has_class(en_button, "is-active"));

        switch_language(&mut doc, Language::Ar);
        assert_eq!(doc.text_content(title), "عمران الخليج");
        assert_eq!(doc.attr(input, "placeholder"), Some("اسمك"));
        assert!(!doc.has_class(en_button, "is-active"));
        assert_eq!(doc.attr(html, "dir"), Some("rtl"));
    }
}
