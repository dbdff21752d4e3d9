use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use super::{preview, OutputFormat};
use crate::editor::Editor;
use crate::overlay;

#[derive(Args)]
pub struct ImageCommand {
    #[command(subcommand)]
    pub command: ImageSubcommand,
}

#[derive(Subcommand)]
pub enum ImageSubcommand {
    /// List image elements with their ids
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Replace an image
    Set {
        /// Image id (e.g. i2)
        id: String,

        /// Image file to embed
        #[arg(long, conflicts_with = "url", required_unless_present = "url")]
        file: Option<PathBuf>,

        /// Image URL to reference
        #[arg(long)]
        url: Option<String>,
    },

    /// Remove an image override and blank the image
    Clear {
        /// Image id
        id: String,
    },
}

#[derive(Serialize)]
struct ImageRow<'a> {
    id: &'a str,
    source: Option<String>,
    edited: bool,
}

impl ImageCommand {
    pub async fn run(&self, editor: &mut Editor) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ImageSubcommand::List { format } => {
                let rows: Vec<ImageRow> = editor
                    .identities()
                    .images()
                    .map(|(node, id)| ImageRow {
                        id,
                        source: overlay::image_source(editor.page(), node),
                        edited: editor.config().images.contains_key(id),
                    })
                    .collect();

                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
                    OutputFormat::Text => {
                        for row in &rows {
                            let source = row.source.as_deref().map(preview).unwrap_or_default();
                            let edited = if row.edited { " *" } else { "" };
                            println!("{:<8} {}{}", row.id, source, edited);
                        }
                    }
                }
                Ok(())
            }

            ImageSubcommand::Set { id, file, url } => {
                match (file, url) {
                    (Some(path), _) => editor.replace_image_from_file(id, path).await?,
                    (None, Some(url)) => editor.replace_image(id, url.trim())?,
                    (None, None) => return Err("Either --file or --url is required".into()),
                }
                println!("Replaced image {}", id);
                Ok(())
            }

            ImageSubcommand::Clear { id } => {
                editor.clear_image(id)?;
                println!("Cleared image {}", id);
                Ok(())
            }
        }
    }
}
