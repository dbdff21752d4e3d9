use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// The fixed set of overridable color roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorRole {
    BackgroundLight,
    Brand,
    BrandMid,
    BrandDark,
    BackgroundDark,
    CardDark,
}

impl ColorRole {
    pub const ALL: [ColorRole; 6] = [
        ColorRole::BackgroundLight,
        ColorRole::Brand,
        ColorRole::BrandMid,
        ColorRole::BrandDark,
        ColorRole::BackgroundDark,
        ColorRole::CardDark,
    ];

    /// Key used in the persisted config.
    pub fn key(&self) -> &'static str {
        match self {
            ColorRole::BackgroundLight => "lightBg",
            ColorRole::Brand => "brand",
            ColorRole::BrandMid => "brandMid",
            ColorRole::BrandDark => "brandDark",
            ColorRole::BackgroundDark => "darkBg",
            ColorRole::CardDark => "darkCard",
        }
    }

    /// Human-facing role name.
    pub fn name(&self) -> &'static str {
        match self {
            ColorRole::BackgroundLight => "background-light",
            ColorRole::Brand => "brand",
            ColorRole::BrandMid => "brand-mid",
            ColorRole::BrandDark => "brand-dark",
            ColorRole::BackgroundDark => "background-dark",
            ColorRole::CardDark => "card-dark",
        }
    }
}

impl fmt::Display for ColorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ColorRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColorRole::ALL
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(s) || r.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<_> = ColorRole::ALL.iter().map(|r| r.name()).collect();
                format!("Invalid color role: {}. Use one of: {}", s, names.join(", "))
            })
    }
}

/// A total color map: every role always has a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Palette {
    pub light_bg: String,
    pub brand: String,
    pub brand_mid: String,
    pub brand_dark: String,
    pub dark_bg: String,
    pub dark_card: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            light_bg: "#d8f0ef".to_string(),
            brand: "#1e66f5".to_string(),
            brand_mid: "#2f8bff".to_string(),
            brand_dark: "#0f4ecf".to_string(),
            dark_bg: "#072c54".to_string(),
            dark_card: "#0b355f".to_string(),
        }
    }
}

impl Palette {
    pub fn get(&self, role: ColorRole) -> &str {
        match role {
            ColorRole::BackgroundLight => &self.light_bg,
            ColorRole::Brand => &self.brand,
            ColorRole::BrandMid => &self.brand_mid,
            ColorRole::BrandDark => &self.brand_dark,
            ColorRole::BackgroundDark => &self.dark_bg,
            ColorRole::CardDark => &self.dark_card,
        }
    }

    pub fn set(&mut self, role: ColorRole, value: impl Into<String>) {
        let slot = match role {
            ColorRole::BackgroundLight => &mut self.light_bg,
            ColorRole::Brand => &mut self.brand,
            ColorRole::BrandMid => &mut self.brand_mid,
            ColorRole::BrandDark => &mut self.brand_dark,
            ColorRole::BackgroundDark => &mut self.dark_bg,
            ColorRole::CardDark => &mut self.dark_card,
        };
        *slot = value.into();
    }

    /// Builds a palette from an arbitrary decoded value, backfilling every
    /// missing or non-string role with its default.
    pub fn from_value(raw: Option<&Value>) -> Self {
        let mut palette = Palette::default();
        if let Some(map) = raw.and_then(Value::as_object) {
            for role in ColorRole::ALL {
                if let Some(value) = map.get(role.key()).and_then(Value::as_str) {
                    if !value.trim().is_empty() {
                        palette.set(role, value);
                    }
                }
            }
        }
        palette
    }

    /// Per role, a value customized locally wins; otherwise the remote value
    /// applies.
    pub fn merge(remote: &Palette, local: &Palette) -> Palette {
        let defaults = Palette::default();
        let mut merged = remote.clone();
        for role in ColorRole::ALL {
            if local.get(role) != defaults.get(role) {
                merged.set(role, local.get(role));
            }
        }
        merged
    }

    /// Renders the injected stylesheet for the light and dark themes.
    pub fn to_css(&self) -> String {
        format!(
            "
:root {{
  --bg: {light_bg};
  --brand: {brand};
  --brand-dark: {brand_dark};
  --brand-gradient: linear-gradient(135deg, {brand} 0%, {brand_mid} 45%, {brand_dark} 100%);
}}
body.theme-dark {{
  --bg: {dark_bg};
  --card: {dark_card};
}}
",
            light_bg = self.light_bg,
            brand = self.brand,
            brand_mid = self.brand_mid,
            brand_dark = self.brand_dark,
            dark_bg = self.dark_bg,
            dark_card = self.dark_card,
        )
    }
}
