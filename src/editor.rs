//! The developer editing session.
//!
//! An [`Editor`] owns the page, the merged config and the store. Every
//! mutation is reflected on the page immediately and persisted in full.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use rand::Rng;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::dom::{Document, NodeId, Selector};
use crate::identity::IdentityTable;
use crate::locale;
use crate::markup::{self, EDITOR_PANEL, IMAGE_TARGET};
use crate::models::{ColorRole, Language, ProductDef, SectionDef, SiteConfig};
use crate::overlay;
use crate::reconcile::{self, ReconcileReport};
use crate::store::{ConfigStore, StoreError};

/// File name offered for exported configs.
pub const EXPORT_FILE_NAME: &str = "template-config.json";

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Arabic title is required")]
    EmptyTitle,

    #[error("Arabic name is required")]
    EmptyName,

    #[error("A section with id '{0}' already exists")]
    DuplicateSection(String),

    #[error("Section not found: {0}")]
    UnknownSection(String),

    #[error("Product not found: {0}")]
    UnknownProduct(String),

    #[error("No editable element with id '{0}'")]
    UnknownElement(String),

    #[error("Color value is required")]
    EmptyColor,

    #[error("Not an image file: {}", .0.display())]
    NotAnImage(PathBuf),

    #[error("Invalid config file: {0}")]
    InvalidImport(String),

    #[error("Failed to read {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The active editing mode; at most one is on at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    #[default]
    None,
    Text,
    Image,
    Delete,
    ClearImage,
}

impl EditMode {
    /// Body class shown while the mode is active.
    fn body_class(&self) -> Option<&'static str> {
        match self {
            EditMode::None => None,
            EditMode::Text => Some("template-text-edit"),
            EditMode::Image => Some("template-image-edit"),
            EditMode::Delete => Some("template-delete-edit"),
            EditMode::ClearImage => Some("template-clear-image-edit"),
        }
    }

    const ALL: [EditMode; 5] = [
        EditMode::None,
        EditMode::Text,
        EditMode::Image,
        EditMode::Delete,
        EditMode::ClearImage,
    ];
}

impl fmt::Display for EditMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EditMode::None => "none",
            EditMode::Text => "text",
            EditMode::Image => "image",
            EditMode::Delete => "delete",
            EditMode::ClearImage => "clear-image",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for EditMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EditMode::ALL
            .into_iter()
            .find(|m| m.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "Invalid mode: {}. Use none, text, image, delete or clear-image",
                    s
                )
            })
    }
}

/// What a click in the current mode asks of the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Nothing editable was hit, or no mode is armed.
    Ignored,
    /// The product was removed and the change persisted.
    ProductRemoved(String),
    /// The section should be removed once the user confirms; call
    /// [`Editor::remove_section`] to proceed.
    ConfirmSectionRemoval(String),
    /// The image entry was deleted and the image blanked.
    ImageCleared(String),
    /// Ask the user for an image file, then call [`Editor::replace_image`].
    PickImage(String),
}

/// Input for [`Editor::create_section`].
#[derive(Debug, Clone, Default)]
pub struct NewSection {
    pub id: Option<String>,
    pub title_ar: String,
    pub title_en: Option<String>,
    pub banner: String,
    pub card_image: Option<String>,
}

/// Input for [`Editor::create_product`].
#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    pub section_id: String,
    pub name_ar: String,
    pub name_en: Option<String>,
    pub image: String,
}

/// Lowercase ASCII slug: runs of anything else become a single `-`.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    for c in value.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// Product id from the current time plus a random suffix.
fn generate_product_id() -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let millis = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
    let mut rng = rand::rng();
    let suffix: String = (0..4)
        .map(|_| DIGITS[rng.random_range(0..DIGITS.len())] as char)
        .collect();
    format!("p{}{}", to_base36(millis), suffix)
}

fn image_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "avif" => "image/avif",
        "bmp" => "image/bmp",
        "ico" => "image/x-icon",
        _ => return None,
    };
    Some(mime)
}

/// Reads an image file into a `data:` URL.
pub async fn read_image_file(path: &Path) -> Result<String, EditorError> {
    let mime = image_mime(path).ok_or_else(|| EditorError::NotAnImage(path.to_path_buf()))?;
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| EditorError::Io(path.to_path_buf(), e))?;
    Ok(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
}

pub struct Editor {
    page: Document,
    pristine: Document,
    remote: SiteConfig,
    config: SiteConfig,
    identities: IdentityTable,
    store: ConfigStore,
    mode: EditMode,
    focused: Option<NodeId>,
}

impl Editor {
    /// Loads local and published edits, then builds the page from
    /// `pristine`.
    pub async fn open(pristine: Document, store: ConfigStore) -> Editor {
        let local = store.load_local();
        let remote = store.load_remote().await;
        Editor::new(pristine, store, remote, local)
    }

    /// Builds a session from already loaded configs.
    pub fn new(pristine: Document, store: ConfigStore, remote: SiteConfig, local: SiteConfig) -> Editor {
        let config = SiteConfig::merge(&remote, &local);
        let mut editor = Editor {
            page: pristine.clone(),
            pristine,
            remote,
            config,
            identities: IdentityTable::new(),
            store,
            mode: EditMode::None,
            focused: None,
        };
        editor.rebuild();
        editor
    }

    /// Rebuilds the page from the pristine markup and the current config,
    /// the way a page reload would.
    fn rebuild(&mut self) {
        self.page = self.pristine.clone();
        self.identities = IdentityTable::new();
        self.focused = None;
        self.identities.assign(&mut self.page);

        let lang = self.language();
        let report = reconcile::reconcile(
            &mut self.page,
            &self.config.structure,
            &mut self.identities,
            lang,
        );
        if report.changed_shape() {
            tracing::debug!(
                removed = report.sections_removed + report.products_removed,
                added = report.sections_added + report.products_added,
                "applied saved structure"
            );
        }
        overlay::apply_all(&mut self.page, &self.identities, &self.config, lang);
        self.apply_mode_markers();
    }

    /// Reconciles structure, then paints texts and images onto whatever
    /// the reconcile pass added.
    fn reshape(&mut self) -> ReconcileReport {
        let lang = self.language();
        let report = reconcile::reconcile(
            &mut self.page,
            &self.config.structure,
            &mut self.identities,
            lang,
        );
        overlay::apply_texts(&mut self.page, &self.identities, &self.config, lang);
        overlay::apply_images(&mut self.page, &self.identities, &self.config);
        self.apply_mode_markers();
        report
    }

    fn persist(&self) -> Result<(), EditorError> {
        self.store.save(&self.config)?;
        tracing::debug!("persisted local edits");
        Ok(())
    }

    pub fn page(&self) -> &Document {
        &self.page
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// The published snapshot this session was built on.
    pub fn remote(&self) -> &SiteConfig {
        &self.remote
    }

    pub fn identities(&self) -> &IdentityTable {
        &self.identities
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn language(&self) -> Language {
        locale::current_language(&self.page)
    }

    /// The rendered page.
    pub fn render(&self) -> String {
        self.page.to_html()
    }

    /// Element for a text id.
    pub fn text_element(&self, id: &str) -> Result<NodeId, EditorError> {
        self.identities
            .text_node(id)
            .ok_or_else(|| EditorError::UnknownElement(id.to_string()))
    }

    /// Element for an image id.
    pub fn image_element(&self, id: &str) -> Result<NodeId, EditorError> {
        self.identities
            .image_node(id)
            .ok_or_else(|| EditorError::UnknownElement(id.to_string()))
    }

    // ------------------------------------------------------------------
    // Modes
    // ------------------------------------------------------------------

    fn apply_mode_markers(&mut self) {
        if let Some(body) = self.page.body() {
            for mode in EditMode::ALL {
                if let Some(class) = mode.body_class() {
                    self.page.toggle_class(body, class, mode == self.mode);
                }
            }
        }
        let editable = match self.mode {
            EditMode::Text => Some("true"),
            _ if self.page.select_first(&Selector::new("[contenteditable]")).is_some() => {
                Some("false")
            }
            _ => None,
        };
        if let Some(editable) = editable {
            let nodes: Vec<NodeId> = self.identities.texts().map(|(n, _)| n).collect();
            for node in nodes {
                self.page.set_attr(node, "contenteditable", editable);
            }
        }
    }

    /// Switches mode. Leaving text mode commits the focused element first.
    pub fn set_mode(&mut self, mode: EditMode) -> Result<(), EditorError> {
        if self.mode == mode {
            return Ok(());
        }
        if self.mode == EditMode::Text {
            self.blur()?;
        }
        self.mode = mode;
        self.apply_mode_markers();
        tracing::debug!(mode = %mode, "edit mode changed");
        Ok(())
    }

    /// Turns `mode` on, or off when it is already on.
    pub fn toggle_mode(&mut self, mode: EditMode) -> Result<(), EditorError> {
        if self.mode == mode {
            self.set_mode(EditMode::None)
        } else {
            self.set_mode(mode)
        }
    }

    // ------------------------------------------------------------------
    // Text
    // ------------------------------------------------------------------

    /// Focuses a text element. Returns whether it is editable.
    pub fn focus(&mut self, node: NodeId) -> bool {
        if self.mode != EditMode::Text || self.identities.text_id(node).is_none() {
            return false;
        }
        self.focused = Some(node);
        true
    }

    /// Replaces the content of the focused element, as typing would.
    pub fn input(&mut self, text: &str) -> bool {
        match self.focused {
            Some(node) => {
                self.page.set_text_content(node, text);
                true
            }
            None => false,
        }
    }

    /// Loses focus: in text mode the focused element's content is saved.
    /// Returns the text id that was committed.
    pub fn blur(&mut self) -> Result<Option<String>, EditorError> {
        let Some(node) = self.focused.take() else {
            return Ok(None);
        };
        if self.mode != EditMode::Text {
            return Ok(None);
        }
        self.commit_text(node).map(Some)
    }

    fn commit_text(&mut self, node: NodeId) -> Result<String, EditorError> {
        let id = self
            .identities
            .text_id(node)
            .map(str::to_string)
            .ok_or_else(|| EditorError::UnknownElement(format!("{:?}", node)))?;
        let lang = self.language();
        let value = self.page.text_content(node).trim().to_string();

        self.config
            .texts
            .entry(id.clone())
            .or_default()
            .set(lang, value.clone());
        self.page.set_dataset(node, lang.code(), &value);
        self.persist()?;
        tracing::info!(id = %id, lang = %lang, "saved text");
        Ok(id)
    }

    /// Sets the text of an element in the active language in one step.
    pub fn edit_text(&mut self, id: &str, value: &str) -> Result<(), EditorError> {
        let node = self.text_element(id)?;
        self.page.set_text_content(node, value.trim());
        self.commit_text(node)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Clicks
    // ------------------------------------------------------------------

    /// Handles a click on `node` according to the active mode.
    pub fn click(&mut self, node: NodeId) -> Result<ClickOutcome, EditorError> {
        if self.page.closest(node, &Selector::new(EDITOR_PANEL)).is_some() {
            return Ok(ClickOutcome::Ignored);
        }
        match self.mode {
            EditMode::Delete => {
                if let Some(product) = self.page.closest(node, &Selector::new(markup::PRODUCT)) {
                    if let Some(id) = self.product_id_of(product) {
                        self.remove_product(&id)?;
                        return Ok(ClickOutcome::ProductRemoved(id));
                    }
                }
                let section = self.page.closest(node, &Selector::new(markup::SECTION));
                Ok(section
                    .and_then(|s| markup::section_id_of(&self.page, s))
                    .map(|id| ClickOutcome::ConfirmSectionRemoval(id.to_string()))
                    .unwrap_or(ClickOutcome::Ignored))
            }
            EditMode::ClearImage => match self.image_target(node) {
                Some(id) => {
                    self.clear_image(&id)?;
                    Ok(ClickOutcome::ImageCleared(id))
                }
                None => Ok(ClickOutcome::Ignored),
            },
            EditMode::Image => Ok(self
                .image_target(node)
                .map(ClickOutcome::PickImage)
                .unwrap_or(ClickOutcome::Ignored)),
            EditMode::Text | EditMode::None => Ok(ClickOutcome::Ignored),
        }
    }

    fn product_id_of(&self, product: NodeId) -> Option<String> {
        self.identities
            .product_id(product)
            .or_else(|| self.page.dataset(product, "product-id"))
            .map(str::to_string)
    }

    fn image_target(&self, node: NodeId) -> Option<String> {
        let target = self.page.closest(node, &Selector::new(IMAGE_TARGET))?;
        self.identities.image_id(target).map(str::to_string)
    }

    // ------------------------------------------------------------------
    // Images
    // ------------------------------------------------------------------

    pub fn replace_image(&mut self, id: &str, src: &str) -> Result<(), EditorError> {
        let node = self.image_element(id)?;
        overlay::set_image_source(&mut self.page, node, src);
        self.config.images.insert(id.to_string(), src.to_string());
        self.persist()?;
        tracing::info!(id = %id, bytes = src.len(), "replaced image");
        Ok(())
    }

    /// Reads `path` and shows it on the image element `id`.
    pub async fn replace_image_from_file(&mut self, id: &str, path: &Path) -> Result<(), EditorError> {
        self.image_element(id)?;
        let src = read_image_file(path).await?;
        self.replace_image(id, &src)
    }

    pub fn clear_image(&mut self, id: &str) -> Result<(), EditorError> {
        let node = self.image_element(id)?;
        overlay::clear_image_source(&mut self.page, node);
        self.config.images.remove(id);
        self.persist()?;
        tracing::info!(id = %id, "cleared image");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    pub fn remove_product(&mut self, id: &str) -> Result<(), EditorError> {
        let node = self
            .identities
            .product_node(id)
            .or_else(|| markup::find_product(&self.page, id));
        let known = self.config.structure.added_products.iter().any(|p| p.id == id);
        if node.is_none() && !known {
            return Err(EditorError::UnknownProduct(id.to_string()));
        }

        self.config.structure.remove_product(id);
        if let Some(node) = node {
            self.page.detach(node);
        }
        self.identities.assign(&mut self.page);
        self.persist()?;
        tracing::info!(id = %id, "removed product");
        Ok(())
    }

    /// Removes a section with its card, footer link and added products.
    pub fn remove_section(&mut self, id: &str) -> Result<(), EditorError> {
        let on_page = markup::find_section(&self.page, id).is_some();
        if !on_page && self.config.structure.added_section(id).is_none() {
            return Err(EditorError::UnknownSection(id.to_string()));
        }

        let purged = self.config.structure.remove_section(id);
        reconcile::remove_section_elements(&mut self.page, id);
        self.identities.assign(&mut self.page);
        self.persist()?;
        tracing::info!(id = %id, purged_products = purged.len(), "removed section");
        Ok(())
    }

    /// Adds a section and returns its id.
    pub fn create_section(&mut self, input: NewSection) -> Result<String, EditorError> {
        let title_ar = input.title_ar.trim();
        if title_ar.is_empty() {
            return Err(EditorError::EmptyTitle);
        }
        let title_en = input
            .title_en
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(title_ar);

        let explicit = input.id.as_deref().map(str::trim).filter(|id| !id.is_empty());
        let mut id = slugify(explicit.unwrap_or(title_en));
        if id.is_empty() {
            // Titles without any ASCII letters or digits.
            let token = uuid::Uuid::new_v4().simple().to_string();
            id = format!("section-{}", &token[..8]);
        }
        // Any element id counts: sections are found through their anchors.
        if markup::find_section(&self.page, &id).is_some()
            || self.page.element_by_id(&id).is_some()
            || self.config.structure.added_section(&id).is_some()
        {
            return Err(EditorError::DuplicateSection(id));
        }

        let mut def = SectionDef::new(&id, title_ar)
            .with_title_en(title_en)
            .with_banner(input.banner.trim());
        if let Some(card) = input.card_image.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            def = def.with_card_image(card);
        }

        self.config.structure.add_section(def);
        self.reshape();
        self.persist()?;
        tracing::info!(id = %id, "created section");
        Ok(id)
    }

    /// Adds a product to a section on the page and returns its id.
    pub fn create_product(&mut self, input: NewProduct) -> Result<String, EditorError> {
        let name_ar = input.name_ar.trim();
        if name_ar.is_empty() {
            return Err(EditorError::EmptyName);
        }
        let section_id = input.section_id.trim();
        if markup::find_section(&self.page, section_id).is_none() {
            return Err(EditorError::UnknownSection(section_id.to_string()));
        }
        let name_en = input
            .name_en
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(name_ar);

        let id = generate_product_id();
        self.config.structure.add_product(ProductDef {
            id: id.clone(),
            section_id: section_id.to_string(),
            name_ar: name_ar.to_string(),
            name_en: name_en.to_string(),
            image: input.image.trim().to_string(),
        });
        self.reshape();
        self.persist()?;
        tracing::info!(id = %id, section = %section_id, "created product");
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Colors and language
    // ------------------------------------------------------------------

    pub fn set_color(&mut self, role: ColorRole, value: &str) -> Result<(), EditorError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(EditorError::EmptyColor);
        }
        self.config.colors.set(role, value);
        overlay::apply_colors(&mut self.page, &self.config.colors);
        self.persist()?;
        tracing::info!(role = %role, value = %value, "changed color");
        Ok(())
    }

    /// Switches the page language and repaints saved texts.
    pub fn set_language(&mut self, lang: Language) {
        locale::switch_language(&mut self.page, lang);
        overlay::apply_texts(&mut self.page, &self.identities, &self.config, lang);
    }

    // ------------------------------------------------------------------
    // Import, export, reset
    // ------------------------------------------------------------------

    /// The whole config as pretty JSON.
    pub fn export_config(&self) -> Result<String, EditorError> {
        Ok(self.config.to_json_pretty()?)
    }

    /// Replaces the local edits with an exported file and rebuilds the
    /// page. A malformed file changes nothing.
    pub fn import_config(&mut self, contents: &[u8]) -> Result<(), EditorError> {
        let text =
            std::str::from_utf8(contents).map_err(|e| EditorError::InvalidImport(e.to_string()))?;
        let raw: Value =
            serde_json::from_str(text).map_err(|e| EditorError::InvalidImport(e.to_string()))?;
        if !raw.is_object() {
            return Err(EditorError::InvalidImport(
                "expected a JSON object".to_string(),
            ));
        }
        let imported = SiteConfig::normalize(&raw);

        self.store.save(&imported)?;
        self.config = SiteConfig::merge(&self.remote, &imported);
        self.rebuild();
        tracing::info!("imported config");
        Ok(())
    }

    /// Drops every local edit and rebuilds from the published snapshot.
    pub fn reset(&mut self) -> Result<(), EditorError> {
        self.store.clear_local()?;
        self.config = self.remote.clone();
        self.rebuild();
        tracing::info!("reset local edits");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::tests::PAGE;
    use crate::models::TextEntry;
    use crate::store::{LocalStorage, RemoteSource, STORAGE_KEY};
    use tempfile::TempDir;

    fn setup() -> (Editor, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = ConfigStore::new(LocalStorage::new(temp_dir.path()), RemoteSource::Disabled);
        let editor = Editor::new(
            Document::parse(PAGE),
            store,
            SiteConfig::default(),
            SiteConfig::default(),
        );
        (editor, temp_dir)
    }

    fn select(editor: &Editor, selector: &str) -> NodeId {
        editor.page().select_first(&Selector::new(selector)).unwrap()
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("  Glass & Mirrors "), "glass-mirrors");
        assert_eq!(slugify("Kitchen--2024"), "kitchen-2024");
        assert_eq!(slugify("زجاج"), "");
    }

    #[test]
    fn test_generated_product_ids_are_distinct() {
        let a = generate_product_id();
        let b = generate_product_id();
        assert!(a.starts_with('p'));
        assert_ne!(a, b);
    }

    #[test]
    fn test_mode_parse_and_display() {
        assert_eq!("clear-image".parse::<EditMode>().unwrap(), EditMode::ClearImage);
        assert_eq!(EditMode::Delete.to_string(), "delete");
        assert!("paint".parse::<EditMode>().is_err());
    }

    #[test]
    fn test_modes_are_exclusive() {
        let (mut editor, _temp) = setup();
        let body = editor.page().body().unwrap();

        editor.set_mode(EditMode::Image).unwrap();
        assert!(editor.page().has_class(body, "template-image-edit"));
        editor.set_mode(EditMode::Delete).unwrap();
        assert!(!editor.page().has_class(body, "template-image-edit"));
        assert!(editor.page().has_class(body, "template-delete-edit"));

        editor.toggle_mode(EditMode::Delete).unwrap();
        assert_eq!(editor.mode(), EditMode::None);
        assert!(!editor.page().has_class(body, "template-delete-edit"));
    }

    #[test]
    fn test_text_mode_blur_saves_active_language() {
        let (mut editor, _temp) = setup();
        editor.set_mode(EditMode::Text).unwrap();
        let t1 = editor.text_element("t1").unwrap();
        assert_eq!(editor.page().attr(t1, "contenteditable"), Some("true"));

        assert!(editor.focus(t1));
        editor.input("  عمران الجديد ");
        assert_eq!(editor.blur().unwrap().as_deref(), Some("t1"));

        let entry = &editor.config().texts["t1"];
        assert_eq!(entry.ar.as_deref(), Some("عمران الجديد"));
        assert_eq!(entry.en, None);
        assert_eq!(editor.page().dataset(t1, "ar"), Some("عمران الجديد"));
        assert_eq!(editor.store().load_local().texts["t1"], entry.clone());
    }

    #[test]
    fn test_leaving_text_mode_commits_focused_element() {
        let (mut editor, _temp) = setup();
        editor.set_mode(EditMode::Text).unwrap();
        editor.set_language(Language::En);
        let t3 = editor.text_element("t3").unwrap();
        editor.focus(t3);
        editor.input("Start");

        editor.set_mode(EditMode::None).unwrap();
        assert_eq!(editor.config().texts["t3"].en.as_deref(), Some("Start"));
        assert_eq!(editor.config().texts["t3"].ar, None);
        assert_eq!(editor.page().attr(t3, "contenteditable"), Some("false"));
    }

    #[test]
    fn test_blur_outside_text_mode_is_ignored() {
        let (mut editor, _temp) = setup();
        let t1 = editor.text_element("t1").unwrap();
        assert!(!editor.focus(t1));
        assert_eq!(editor.blur().unwrap(), None);
        assert!(editor.config().texts.is_empty());
    }

    #[test]
    fn test_language_switch_keeps_both_values() {
        let (mut editor, _temp) = setup();
        editor.edit_text("t1", "عمران").unwrap();
        editor.set_language(Language::En);
        editor.edit_text("t1", "Omran").unwrap();

        let t1 = editor.text_element("t1").unwrap();
        assert_eq!(editor.page().text_content(t1), "Omran");
        editor.set_language(Language::Ar);
        assert_eq!(editor.page().text_content(t1), "عمران");
        assert_eq!(
            editor.config().texts["t1"],
            TextEntry {
                ar: Some("عمران".to_string()),
                en: Some("Omran".to_string()),
            }
        );
    }

    #[test]
    fn test_untouched_text_falls_back_in_both_languages() {
        let (mut editor, _temp) = setup();
        let t2 = editor.text_element("t2").unwrap();
        editor.set_language(Language::En);
        assert_eq!(editor.page().text_content(t2), "Aluminium & Glass");
        editor.set_language(Language::Ar);
        assert_eq!(editor.page().text_content(t2), "ألمنيوم وزجاج");
    }

    #[test]
    fn test_image_click_requests_pick_then_replace() {
        let (mut editor, _temp) = setup();
        editor.set_mode(EditMode::Image).unwrap();
        let card_title = select(&editor, ".grid--cards h3");
        assert_eq!(editor.click(card_title).unwrap(), ClickOutcome::Ignored);

        let logo = select(&editor, ".logo img");
        let outcome = editor.click(logo).unwrap();
        assert_eq!(outcome, ClickOutcome::PickImage("i1".to_string()));

        editor.replace_image("i1", "data:image/png;base64,AAAA").unwrap();
        assert_eq!(
            editor.page().attr(logo, "src"),
            Some("data:image/png;base64,AAAA")
        );
        assert_eq!(
            editor.store().load_local().images["i1"],
            "data:image/png;base64,AAAA"
        );
    }

    #[test]
    fn test_clear_image_mode() {
        let (mut editor, _temp) = setup();
        editor.replace_image("i4", "card.jpg").unwrap();
        editor.set_mode(EditMode::ClearImage).unwrap();

        let card_img = editor.image_element("i4").unwrap();
        let outcome = editor.click(card_img).unwrap();
        assert_eq!(outcome, ClickOutcome::ImageCleared("i4".to_string()));
        assert!(!editor.config().images.contains_key("i4"));
        assert_eq!(editor.page().attr(card_img, "style"), None);
    }

    #[tokio::test]
    async fn test_replace_image_from_file() {
        let (mut editor, temp) = setup();
        let path = temp.path().join("logo.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        editor.replace_image_from_file("i1", &path).await.unwrap();
        assert_eq!(editor.config().images["i1"], "data:image/png;base64,iVBORw==");

        let text = temp.path().join("notes.txt");
        std::fs::write(&text, "x").unwrap();
        assert!(matches!(
            editor.replace_image_from_file("i1", &text).await,
            Err(EditorError::NotAnImage(_))
        ));
    }

    #[test]
    fn test_create_then_delete_product() {
        let (mut editor, _temp) = setup();
        let id = editor
            .create_product(NewProduct {
                section_id: "black-structure".to_string(),
                name_ar: "درابزين".to_string(),
                name_en: Some("Railing".to_string()),
                image: "railing.jpg".to_string(),
            })
            .unwrap();

        let added = &editor.config().structure.added_products;
        assert_eq!(added.iter().filter(|p| p.id == id).count(), 1);
        assert!(markup::find_product(editor.page(), &id).is_some());
        assert_eq!(
            editor.page().select(&Selector::new(".product")).len(),
            6
        );

        editor.set_mode(EditMode::Delete).unwrap();
        let product = markup::find_product(editor.page(), &id).unwrap();
        let title = editor
            .page()
            .select_first_within(product, &Selector::new("h3"))
            .unwrap();
        assert_eq!(editor.click(title).unwrap(), ClickOutcome::ProductRemoved(id.clone()));

        let structure = &editor.config().structure;
        assert!(structure.added_products.iter().all(|p| p.id != id));
        assert!(structure.removed_products.contains(&id));
        assert!(markup::find_product(editor.page(), &id).is_none());
        assert_eq!(editor.store().load_local().structure, structure.clone());
    }

    #[test]
    fn test_create_product_requires_name_and_section() {
        let (mut editor, _temp) = setup();
        let blank = editor.create_product(NewProduct {
            section_id: "black-structure".to_string(),
            name_ar: "  ".to_string(),
            ..Default::default()
        });
        assert!(matches!(blank, Err(EditorError::EmptyName)));

        let orphan = editor.create_product(NewProduct {
            section_id: "nowhere".to_string(),
            name_ar: "باب".to_string(),
            ..Default::default()
        });
        assert!(matches!(orphan, Err(EditorError::UnknownSection(_))));
        assert_eq!(editor.config(), &SiteConfig::default());
    }

    #[test]
    fn test_create_section_and_reject_duplicate() {
        let (mut editor, _temp) = setup();
        let id = editor
            .create_section(NewSection {
                title_ar: "زجاج".to_string(),
                title_en: Some("Glass Works".to_string()),
                banner: "glass.jpg".to_string(),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(id, "glass-works");
        let def = editor.config().structure.added_section("glass-works").unwrap();
        assert_eq!(def.card_image, "");
        let card = markup::find_card(editor.page(), "glass-works").unwrap();
        let card_img = editor.page().children(card)[0];
        assert_eq!(
            editor.page().attr(card_img, "style"),
            Some("--img:url('glass.jpg');")
        );
        assert!(markup::find_footer_link(editor.page(), "glass-works").is_some());

        let duplicate = editor.create_section(NewSection {
            id: Some("Black Structure".to_string()),
            title_ar: "أسود".to_string(),
            ..Default::default()
        });
        assert!(matches!(duplicate, Err(EditorError::DuplicateSection(id)) if id == "black-structure"));

        let untitled = editor.create_section(NewSection::default());
        assert!(matches!(untitled, Err(EditorError::EmptyTitle)));
        assert_eq!(editor.config().structure.added_sections.len(), 1);
    }

    #[test]
    fn test_created_structure_is_editable_in_text_mode() {
        let (mut editor, _temp) = setup();
        editor.set_mode(EditMode::Text).unwrap();
        let section = editor
            .create_section(NewSection {
                title_ar: "زجاج".to_string(),
                title_en: Some("Glass".to_string()),
                ..Default::default()
            })
            .unwrap();
        let product = editor
            .create_product(NewProduct {
                section_id: section.clone(),
                name_ar: "مرآة".to_string(),
                ..Default::default()
            })
            .unwrap();

        let scoped: Vec<(NodeId, String)> = editor
            .identities()
            .texts()
            .filter(|(_, id)| id.contains(&section) || id.contains(&product))
            .map(|(node, id)| (node, id.to_string()))
            .collect();
        assert!(scoped.len() >= 4);
        for (node, id) in scoped {
            assert_eq!(
                editor.page().attr(node, "contenteditable"),
                Some("true"),
                "{} is not editable",
                id
            );
        }
    }

    #[test]
    fn test_section_id_cannot_reuse_page_anchor() {
        let (mut editor, _temp) = setup();
        let result = editor.create_section(NewSection {
            title_ar: "تواصل".to_string(),
            title_en: Some("Contact".to_string()),
            ..Default::default()
        });

        assert!(matches!(result, Err(EditorError::DuplicateSection(id)) if id == "contact"));
        assert!(editor.config().structure.added_sections.is_empty());
        assert_eq!(editor.page().select(&Selector::new("#contact")).len(), 1);
    }

    #[test]
    fn test_arabic_only_section_gets_generated_id() {
        let (mut editor, _temp) = setup();
        let id = editor
            .create_section(NewSection {
                title_ar: "مطابخ".to_string(),
                ..Default::default()
            })
            .unwrap();
        assert!(id.starts_with("section-"));
        let def = editor.config().structure.added_section(&id).unwrap();
        assert_eq!(def.title_en, "مطابخ");
    }

    #[test]
    fn test_delete_click_on_section_asks_for_confirmation() {
        let (mut editor, _temp) = setup();
        editor.set_mode(EditMode::Delete).unwrap();
        let heading = select(&editor, "#white-structure .section__head h2");

        let outcome = editor.click(heading).unwrap();
        assert_eq!(
            outcome,
            ClickOutcome::ConfirmSectionRemoval("white-structure".to_string())
        );
        assert!(markup::find_section(editor.page(), "white-structure").is_some());

        editor.remove_section("white-structure").unwrap();
        assert!(markup::find_section(editor.page(), "white-structure").is_none());
        assert!(markup::find_card(editor.page(), "white-structure").is_none());
        assert!(markup::find_footer_link(editor.page(), "white-structure").is_none());
        assert!(editor
            .config()
            .structure
            .removed_sections
            .contains("white-structure"));
    }

    #[test]
    fn test_remove_section_purges_added_products() {
        let (mut editor, _temp) = setup();
        let section = editor
            .create_section(NewSection {
                title_ar: "زجاج".to_string(),
                title_en: Some("Glass".to_string()),
                ..Default::default()
            })
            .unwrap();
        editor
            .create_product(NewProduct {
                section_id: section.clone(),
                name_ar: "مرآة".to_string(),
                ..Default::default()
            })
            .unwrap();

        editor.remove_section(&section).unwrap();
        let structure = &editor.config().structure;
        assert!(structure.added_sections.is_empty());
        assert!(structure.added_products.is_empty());
        assert!(matches!(
            editor.remove_section("never-existed"),
            Err(EditorError::UnknownSection(_))
        ));
    }

    #[test]
    fn test_set_color_regenerates_block() {
        let (mut editor, _temp) = setup();
        editor.set_color(ColorRole::Brand, "#ff0000").unwrap();
        let style = editor.page().element_by_id("template-custom-colors").unwrap();
        let first = editor.page().text_content(style);
        assert!(first.contains("--brand: #ff0000;"));

        overlay::apply_colors(&mut editor.page, &editor.config.colors);
        overlay::apply_colors(&mut editor.page, &editor.config.colors);
        assert_eq!(editor.page().text_content(style), first);
        assert!(matches!(
            editor.set_color(ColorRole::Brand, " "),
            Err(EditorError::EmptyColor)
        ));
    }

    #[test]
    fn test_malformed_import_changes_nothing() {
        let (mut editor, _temp) = setup();
        editor.edit_text("t1", "قبل").unwrap();
        let before = editor.config().clone();
        let stored = editor.store().local().get(STORAGE_KEY).unwrap();
        let html = editor.render();

        let cases: [&[u8]; 3] = [b"not json", b"[1,2,3]", &[0xff, 0xfe]];
        for bad in cases {
            let err = editor.import_config(bad).unwrap_err();
            assert!(matches!(err, EditorError::InvalidImport(_)));
        }
        assert_eq!(editor.config(), &before);
        assert_eq!(editor.store().local().get(STORAGE_KEY).unwrap(), stored);
        assert_eq!(editor.render(), html);
    }

    #[test]
    fn test_export_import_round_trip() {
        let (mut editor, _temp) = setup();
        editor.edit_text("t6", "عنوان").unwrap();
        editor.remove_section("white-structure").unwrap();
        let exported = editor.export_config().unwrap();

        let (mut other, _other_temp) = setup();
        other.import_config(exported.as_bytes()).unwrap();
        assert_eq!(other.config(), editor.config());
        assert_eq!(other.render(), editor.render());
    }

    #[test]
    fn test_reset_restores_remote_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let store = ConfigStore::new(LocalStorage::new(temp_dir.path()), RemoteSource::Disabled);
        let mut remote = SiteConfig::default();
        remote.texts.insert(
            "t1".to_string(),
            TextEntry {
                ar: Some("منشور".to_string()),
                en: None,
            },
        );
        let mut editor = Editor::new(Document::parse(PAGE), store, remote.clone(), SiteConfig::default());
        editor.edit_text("t1", "محلي").unwrap();
        editor.remove_section("black-structure").unwrap();

        editor.reset().unwrap();
        assert_eq!(editor.config(), &remote);
        assert_eq!(editor.store().load_local(), SiteConfig::default());
        let t1 = editor.text_element("t1").unwrap();
        assert_eq!(editor.page().text_content(t1), "منشور");
        assert!(markup::find_section(editor.page(), "black-structure").is_some());
    }

    #[tokio::test]
    async fn test_open_applies_published_and_local_edits() {
        let temp_dir = TempDir::new().unwrap();
        let published = temp_dir.path().join("site");
        std::fs::create_dir_all(&published).unwrap();
        std::fs::write(
            published.join("site-config.json"),
            r#"{"texts":{"t1":{"ar":"منشور"}},"structure":{"removedSections":["white-structure"]}}"#,
        )
        .unwrap();

        let store = ConfigStore::new(
            LocalStorage::new(temp_dir.path().join("local")),
            RemoteSource::File(published),
        );
        let mut local = SiteConfig::default();
        local.images.insert("i1".to_string(), "local-logo.png".to_string());
        store.save(&local).unwrap();

        let editor = Editor::open(Document::parse(PAGE), store).await;
        let t1 = editor.text_element("t1").unwrap();
        let i1 = editor.image_element("i1").unwrap();
        assert_eq!(editor.page().text_content(t1), "منشور");
        assert_eq!(editor.page().attr(i1, "src"), Some("local-logo.png"));
        assert!(markup::find_section(editor.page(), "white-structure").is_none());
        assert_eq!(overlay::color_style_blocks(editor.page()), 1);
    }
}
