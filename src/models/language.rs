use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Display language of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ar,
    En,
}

impl Language {
    /// Reads the `lang` attribute of the root element; anything but `en` is Arabic.
    pub fn from_lang_attr(value: Option<&str>) -> Self {
        match value {
            Some("en") => Language::En,
            _ => Language::Ar,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::Ar => "ar",
            Language::En => "en",
        }
    }

    /// Text direction for the `dir` attribute.
    pub fn dir(&self) -> &'static str {
        match self {
            Language::Ar => "rtl",
            Language::En => "ltr",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ar" | "arabic" => Ok(Language::Ar),
            "en" | "english" => Ok(Language::En),
            _ => Err(format!("Invalid language: {}. Use ar or en", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_lang_attr_defaults_to_arabic() {
        assert_eq!(Language::from_lang_attr(Some("en")), Language::En);
        assert_eq!(Language::from_lang_attr(Some("ar")), Language::Ar);
        assert_eq!(Language::from_lang_attr(Some("fr")), Language::Ar);
        assert_eq!(Language::from_lang_attr(None), Language::Ar);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("EN".parse::<Language>().unwrap(), Language::En);
        assert_eq!("arabic".parse::<Language>().unwrap(), Language::Ar);
        assert!("de".parse::<Language>().is_err());
    }
}
