use clap::{Args, Subcommand};
use serde::Serialize;

use super::OutputFormat;
use crate::dom::Selector;
use crate::editor::{Editor, NewProduct};
use crate::markup;

#[derive(Args)]
pub struct ProductCommand {
    #[command(subcommand)]
    pub command: ProductSubcommand,
}

#[derive(Subcommand)]
pub enum ProductSubcommand {
    /// List products on the page
    List {
        /// Only products of this section
        #[arg(long)]
        section: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Add a product to a section
    Add {
        /// Section id
        #[arg(long)]
        section: String,

        /// Arabic name
        #[arg(long)]
        name_ar: String,

        /// English name (defaults to the Arabic name)
        #[arg(long)]
        name_en: Option<String>,

        /// Image URL
        #[arg(long, default_value = "")]
        image: String,
    },

    /// Remove a product
    Remove {
        /// Product id
        id: String,
    },
}

#[derive(Serialize)]
struct ProductRow {
    id: String,
    section: String,
    name: String,
}

impl ProductCommand {
    pub fn run(&self, editor: &mut Editor) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ProductSubcommand::List { section, format } => {
                let title = Selector::new("h3");
                let section_selector = Selector::new(markup::SECTION);
                let page = editor.page();
                let rows: Vec<ProductRow> = editor
                    .identities()
                    .products()
                    .map(|(node, id)| ProductRow {
                        id: id.to_string(),
                        section: page
                            .closest(node, &section_selector)
                            .and_then(|s| markup::section_id_of(page, s))
                            .unwrap_or_default()
                            .to_string(),
                        name: page
                            .select_first_within(node, &title)
                            .map(|h| page.text_content(h).trim().to_string())
                            .unwrap_or_default(),
                    })
                    .filter(|row| section.as_ref().map_or(true, |s| &row.section == s))
                    .collect();

                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
                    OutputFormat::Text => {
                        if rows.is_empty() {
                            println!("No products found.");
                            return Ok(());
                        }
                        println!("{:<28} {:<24} NAME", "ID", "SECTION");
                        for row in &rows {
                            println!("{:<28} {:<24} {}", row.id, row.section, row.name);
                        }
                    }
                }
                Ok(())
            }

            ProductSubcommand::Add {
                section,
                name_ar,
                name_en,
                image,
            } => {
                let id = editor.create_product(NewProduct {
                    section_id: section.clone(),
                    name_ar: name_ar.clone(),
                    name_en: name_en.clone(),
                    image: image.clone(),
                })?;
                println!("Created product: {}", id);
                Ok(())
            }

            ProductSubcommand::Remove { id } => {
                editor.remove_product(id)?;
                println!("Removed product: {}", id);
                Ok(())
            }
        }
    }
}
