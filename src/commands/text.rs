use clap::{Args, Subcommand};
use serde::Serialize;

use super::OutputFormat;
use crate::editor::Editor;
use crate::models::Language;

#[derive(Args)]
pub struct TextCommand {
    #[command(subcommand)]
    pub command: TextSubcommand,
}

#[derive(Subcommand)]
pub enum TextSubcommand {
    /// List editable texts with their ids
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Set the text of an element
    Set {
        /// Text id (e.g. t3)
        id: String,

        /// New text
        value: String,

        /// Language the value is for (defaults to the page's current language).
        /// Only the text is saved; the page language itself is not persisted.
        #[arg(long)]
        lang: Option<Language>,
    },
}

#[derive(Serialize)]
struct TextRow<'a> {
    id: &'a str,
    shown: String,
    ar: Option<&'a str>,
    en: Option<&'a str>,
}

impl TextCommand {
    pub fn run(&self, editor: &mut Editor) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            TextSubcommand::List { format } => {
                let rows: Vec<TextRow> = editor
                    .identities()
                    .texts()
                    .map(|(node, id)| {
                        let entry = editor.config().texts.get(id);
                        TextRow {
                            id,
                            shown: editor.page().text_content(node).trim().to_string(),
                            ar: entry.and_then(|e| e.get(Language::Ar)),
                            en: entry.and_then(|e| e.get(Language::En)),
                        }
                    })
                    .collect();

                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
                    OutputFormat::Text => {
                        for row in &rows {
                            let edited = if row.ar.is_some() || row.en.is_some() {
                                " *"
                            } else {
                                ""
                            };
                            println!("{:<12} {}{}", row.id, row.shown, edited);
                        }
                    }
                }
                Ok(())
            }

            TextSubcommand::Set { id, value, lang } => {
                if let Some(lang) = lang {
                    editor.set_language(*lang);
                }
                editor.edit_text(id, value)?;
                println!("{}", saved_message(id, editor.language(), lang.is_some()));
                Ok(())
            }
        }
    }
}

fn saved_message(id: &str, lang: Language, lang_overridden: bool) -> String {
    if lang_overridden {
        format!("Saved {} ({} text; page language unchanged on disk)", id, lang)
    } else {
        format!("Saved {} ({})", id, lang)
    }
}
