use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// A section added through the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionDef {
    pub id: String,
    pub title_ar: String,
    pub title_en: String,
    pub banner: String,
    pub card_image: String,
}

impl SectionDef {
    pub fn new(id: impl Into<String>, title_ar: impl Into<String>) -> Self {
        let title_ar = title_ar.into();
        Self {
            id: id.into(),
            title_en: title_ar.clone(),
            title_ar,
            banner: String::new(),
            card_image: String::new(),
        }
    }

    pub fn with_title_en(mut self, title_en: impl Into<String>) -> Self {
        self.title_en = title_en.into();
        self
    }

    pub fn with_banner(mut self, banner: impl Into<String>) -> Self {
        self.banner = banner.into();
        self
    }

    /// Image shown on the section's index card; the banner when none is set.
    pub fn card_image_or_banner(&self) -> &str {
        if self.card_image.is_empty() {
            &self.banner
        } else {
            &self.card_image
        }
    }

    pub fn with_card_image(mut self, card_image: impl Into<String>) -> Self {
        self.card_image = card_image.into();
        self
    }

    fn from_value(raw: &Value) -> Option<Self> {
        let id = str_field(raw, "id").filter(|id| !id.trim().is_empty())?;
        let title_ar = str_field(raw, "titleAr").unwrap_or_default();
        let title_en = str_field(raw, "titleEn").unwrap_or_default();
        let banner = str_field(raw, "banner").unwrap_or_default();
        let card_image = str_field(raw, "cardImage").unwrap_or_default();
        Some(Self {
            id,
            title_ar,
            title_en,
            banner,
            card_image,
        })
    }
}

/// A product added through the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDef {
    pub id: String,
    pub section_id: String,
    pub name_ar: String,
    pub name_en: String,
    pub image: String,
}

impl ProductDef {
    fn from_value(raw: &Value) -> Option<Self> {
        let id = str_field(raw, "id").filter(|id| !id.trim().is_empty())?;
        let section_id = str_field(raw, "sectionId").filter(|s| !s.trim().is_empty())?;
        Some(Self {
            id,
            section_id,
            name_ar: str_field(raw, "nameAr").unwrap_or_default(),
            name_en: str_field(raw, "nameEn").unwrap_or_default(),
            image: str_field(raw, "image").unwrap_or_default(),
        })
    }
}

fn str_field(raw: &Value, key: &str) -> Option<String> {
    raw.get(key).and_then(Value::as_str).map(str::to_string)
}

fn id_set(raw: Option<&Value>) -> BTreeSet<String> {
    raw.and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Structural add/remove lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Structure {
    pub added_sections: Vec<SectionDef>,
    pub added_products: Vec<ProductDef>,
    pub removed_sections: BTreeSet<String>,
    pub removed_products: BTreeSet<String>,
}

impl Structure {
    /// Builds the structure lists from an arbitrary decoded object.
    pub fn from_value(raw: &Value) -> Self {
        let list = |key: &str| {
            raw.get(key)
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default()
        };
        let mut structure = Self {
            added_sections: list("addedSections")
                .iter()
                .filter_map(SectionDef::from_value)
                .collect(),
            added_products: list("addedProducts")
                .iter()
                .filter_map(ProductDef::from_value)
                .collect(),
            removed_sections: id_set(raw.get("removedSections")),
            removed_products: id_set(raw.get("removedProducts")),
        };
        structure.settle();
        structure
    }

    /// Drops duplicate definitions (first wins) and anything listed as removed.
    pub fn settle(&mut self) {
        let mut seen = BTreeSet::new();
        let removed = &self.removed_sections;
        self.added_sections
            .retain(|s| !removed.contains(&s.id) && seen.insert(s.id.clone()));

        let mut seen = BTreeSet::new();
        let removed = &self.removed_products;
        self.added_products
            .retain(|p| !removed.contains(&p.id) && seen.insert(p.id.clone()));
    }

    /// Union by id; the local definition wins when both sides carry one.
    pub fn union(remote: &Structure, local: &Structure) -> Structure {
        let mut merged = remote.clone();
        for section in &local.added_sections {
            match merged
                .added_sections
                .iter_mut()
                .find(|s| s.id == section.id)
            {
                Some(existing) => *existing = section.clone(),
                None => merged.added_sections.push(section.clone()),
            }
        }
        for product in &local.added_products {
            match merged
                .added_products
                .iter_mut()
                .find(|p| p.id == product.id)
            {
                Some(existing) => *existing = product.clone(),
                None => merged.added_products.push(product.clone()),
            }
        }
        merged
            .removed_sections
            .extend(local.removed_sections.iter().cloned());
        merged
            .removed_products
            .extend(local.removed_products.iter().cloned());
        merged.settle();
        merged
    }

    pub fn added_section(&self, id: &str) -> Option<&SectionDef> {
        self.added_sections.iter().find(|s| s.id == id)
    }

    /// Records a new section, lifting any earlier removal of the same id.
    pub fn add_section(&mut self, section: SectionDef) {
        self.removed_sections.remove(&section.id);
        self.added_sections.retain(|s| s.id != section.id);
        self.added_sections.push(section);
    }

    /// Records a section removal, purging its added definition and every
    /// added product that belonged to it. Returns the purged product ids.
    pub fn remove_section(&mut self, id: &str) -> Vec<String> {
        self.added_sections.retain(|s| s.id != id);
        let purged: Vec<String> = self
            .added_products
            .iter()
            .filter(|p| p.section_id == id)
            .map(|p| p.id.clone())
            .collect();
        self.added_products.retain(|p| p.section_id != id);
        self.removed_sections.insert(id.to_string());
        purged
    }

    /// Records a new product, lifting any earlier removal of the same id.
    pub fn add_product(&mut self, product: ProductDef) {
        self.removed_products.remove(&product.id);
        self.added_products.retain(|p| p.id != product.id);
        self.added_products.push(product);
    }

    pub fn remove_product(&mut self, id: &str) {
        self.added_products.retain(|p| p.id != id);
        self.removed_products.insert(id.to_string());
    }
}
