use clap::{Args, Subcommand};
use serde::Serialize;

use super::{confirm, OutputFormat};
use crate::dom::Selector;
use crate::editor::{Editor, NewSection};

#[derive(Args)]
pub struct SectionCommand {
    #[command(subcommand)]
    pub command: SectionSubcommand,
}

#[derive(Subcommand)]
pub enum SectionSubcommand {
    /// List catalog sections on the page
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Add a catalog section
    Add {
        /// Arabic title
        #[arg(long)]
        title_ar: String,

        /// English title (defaults to the Arabic title)
        #[arg(long)]
        title_en: Option<String>,

        /// Explicit id (defaults to a slug of the English title)
        #[arg(long)]
        id: Option<String>,

        /// Banner image URL
        #[arg(long, default_value = "")]
        banner: String,

        /// Card image URL (defaults to the banner)
        #[arg(long)]
        card_image: Option<String>,
    },

    /// Remove a section with its card, footer link and added products
    Remove {
        /// Section id
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

#[derive(Serialize)]
struct SectionRow {
    id: String,
    title: String,
    products: usize,
    added: bool,
}

impl SectionCommand {
    pub fn run(&self, editor: &mut Editor) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            SectionSubcommand::List { format } => {
                let heading = Selector::new(".section__head h2");
                let product = Selector::new(crate::markup::PRODUCT);
                let page = editor.page();
                let rows: Vec<SectionRow> = editor
                    .identities()
                    .sections()
                    .map(|(node, id)| SectionRow {
                        id: id.to_string(),
                        title: page
                            .select_first_within(node, &heading)
                            .map(|h| page.text_content(h).trim().to_string())
                            .unwrap_or_default(),
                        products: page.select_within(node, &product).len(),
                        added: editor.config().structure.added_section(id).is_some(),
                    })
                    .collect();

                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
                    OutputFormat::Text => {
                        if rows.is_empty() {
                            println!("No sections found.");
                            return Ok(());
                        }
                        println!("{:<28} {:<8} TITLE", "ID", "ITEMS");
                        for row in &rows {
                            let added = if row.added { " (added)" } else { "" };
                            println!("{:<28} {:<8} {}{}", row.id, row.products, row.title, added);
                        }
                    }
                }
                Ok(())
            }

            SectionSubcommand::Add {
                title_ar,
                title_en,
                id,
                banner,
                card_image,
            } => {
                let id = editor.create_section(NewSection {
                    id: id.clone(),
                    title_ar: title_ar.clone(),
                    title_en: title_en.clone(),
                    banner: banner.clone(),
                    card_image: card_image.clone(),
                })?;
                println!("Created section: {}", id);
                Ok(())
            }

            SectionSubcommand::Remove { id, force } => {
                if !force && !confirm(&format!("Remove section '{}'?", id))? {
                    println!("Removal cancelled.");
                    return Ok(());
                }
                editor.remove_section(id)?;
                println!("Removed section: {}", id);
                Ok(())
            }
        }
    }
}
