use clap::Args;
use std::path::PathBuf;

use crate::editor::{EditMode, Editor};
use crate::models::Language;

/// Render the page with every saved edit applied
#[derive(Args)]
pub struct RenderCommand {
    /// Write the page here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Page language
    #[arg(long)]
    lang: Option<Language>,

    /// Render with an edit mode armed (text, image, delete, clear-image)
    #[arg(long)]
    mode: Option<EditMode>,
}

impl RenderCommand {
    pub async fn run(&self, editor: &mut Editor) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(lang) = self.lang {
            editor.set_language(lang);
        }
        if let Some(mode) = self.mode {
            editor.set_mode(mode)?;
        }

        let html = editor.render();
        match &self.output {
            Some(path) => {
                tokio::fs::write(path, html).await?;
                println!("Rendered page to {}", path.display());
            }
            None => print!("{}", html),
        }
        Ok(())
    }
}
