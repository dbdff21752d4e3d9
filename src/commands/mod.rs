mod color;
mod config_cmd;
mod credentials;
mod image;
mod product;
mod publish;
mod render;
mod section;
mod text;

pub use color::ColorCommand;
pub use config_cmd::ConfigCommand;
pub use credentials::CredentialsCommand;
pub use image::ImageCommand;
pub use product::ProductCommand;
pub use publish::PublishCommand;
pub use render::RenderCommand;
pub use section::SectionCommand;
pub use text::TextCommand;

use clap::ValueEnum;
use std::io::{self, Write};

use crate::config::Settings;
use crate::dom::Document;
use crate::editor::Editor;
use crate::store::ConfigStore;

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Store for the configured storage directory and published config.
pub fn open_store(settings: &Settings) -> ConfigStore {
    ConfigStore::new(settings.local_storage(), settings.remote_source())
}

/// Opens an editing session on the configured page.
pub async fn open_editor(settings: &Settings) -> Result<Editor, Box<dyn std::error::Error>> {
    let path = &settings.page.value;
    let html = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| format!("Failed to read page '{}': {}", path.display(), e))?;
    Ok(Editor::open(Document::parse(&html), open_store(settings)).await)
}

/// Asks a `[y/N]` question on stdin.
fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

/// Shortens long values such as data URLs for listing.
fn preview(value: &str) -> String {
    const MAX: usize = 60;
    if value.chars().count() <= MAX {
        value.to_string()
    } else {
        let head: String = value.chars().take(MAX).collect();
        format!("{}… ({} bytes)", head, value.len())
    }
}
