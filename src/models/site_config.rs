//! The root edit set: every override the developer can make to the page.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::color::Palette;
use super::language::Language;
use super::structure::Structure;

/// Saved text for one element, per language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub en: Option<String>,
}

impl TextEntry {
    /// The saved value for `lang`; empty strings count as unset.
    pub fn get(&self, lang: Language) -> Option<&str> {
        let value = match lang {
            Language::Ar => self.ar.as_deref(),
            Language::En => self.en.as_deref(),
        };
        value.filter(|v| !v.is_empty())
    }

    pub fn set(&mut self, lang: Language, value: impl Into<String>) {
        let slot = match lang {
            Language::Ar => &mut self.ar,
            Language::En => &mut self.en,
        };
        *slot = Some(value.into());
    }

    fn from_value(raw: &Value) -> Option<Self> {
        match raw {
            // Older exports stored a bare string for the page's own language.
            Value::String(s) => Some(Self {
                ar: Some(s.clone()),
                en: None,
            }),
            Value::Object(map) => Some(Self {
                ar: map.get("ar").and_then(Value::as_str).map(str::to_string),
                en: map.get("en").and_then(Value::as_str).map(str::to_string),
            }),
            _ => None,
        }
    }
}

/// All overridable page state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub texts: BTreeMap<String, TextEntry>,
    pub images: BTreeMap<String, String>,
    pub colors: Palette,
    pub structure: Structure,
}

impl SiteConfig {
    /// Coerces any decoded value into a complete config. Missing or
    /// malformed fields fall back to their defaults; this never fails.
    pub fn normalize(raw: &Value) -> SiteConfig {
        let Some(map) = raw.as_object() else {
            return SiteConfig::default();
        };

        let texts = map
            .get("texts")
            .and_then(Value::as_object)
            .map(|texts| {
                texts
                    .iter()
                    .filter_map(|(k, v)| TextEntry::from_value(v).map(|e| (k.clone(), e)))
                    .collect()
            })
            .unwrap_or_default();

        let images = map
            .get("images")
            .and_then(Value::as_object)
            .map(|images| {
                images
                    .iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        // Older shapes kept the structure lists at the top level.
        let structure = match map.get("structure") {
            Some(structure) if structure.is_object() => Structure::from_value(structure),
            _ => Structure::from_value(raw),
        };

        SiteConfig {
            texts,
            images,
            colors: Palette::from_value(map.get("colors")),
            structure,
        }
    }

    /// Parses a JSON document and normalizes it.
    pub fn from_json(json: &str) -> Result<SiteConfig, serde_json::Error> {
        let raw: Value = serde_json::from_str(json)?;
        Ok(SiteConfig::normalize(&raw))
    }

    /// Merges a published snapshot with local edits. Texts and images take
    /// the local entry per key, colors take locally customized roles, and
    /// structure lists are unioned with removals subtracted from additions.
    pub fn merge(remote: &SiteConfig, local: &SiteConfig) -> SiteConfig {
        let mut texts = remote.texts.clone();
        texts.extend(local.texts.iter().map(|(k, v)| (k.clone(), v.clone())));

        let mut images = remote.images.clone();
        images.extend(local.images.iter().map(|(k, v)| (k.clone(), v.clone())));

        SiteConfig {
            texts,
            images,
            colors: Palette::merge(&remote.colors, &local.colors),
            structure: Structure::union(&remote.structure, &local.structure),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
