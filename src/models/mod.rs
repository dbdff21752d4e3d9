mod color;
mod language;
mod site_config;
mod structure;

pub use color::{ColorRole, Palette};
pub use language::Language;
pub use site_config::{SiteConfig, TextEntry};
pub use structure::{ProductDef, SectionDef, Structure};
