use clap::{Args, Subcommand};
use std::path::PathBuf;

use super::{confirm, open_editor, OutputFormat};
use crate::config::Settings;
use crate::editor::EXPORT_FILE_NAME;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current settings
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Write the current site config to a file
    Export {
        /// Destination (use - for stdout)
        #[arg(long, short, default_value = EXPORT_FILE_NAME)]
        output: PathBuf,
    },

    /// Replace local edits with an exported site config
    Import {
        /// File to import
        file: PathBuf,
    },

    /// Discard every local edit
    Reset {
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl ConfigCommand {
    pub async fn run(&self, settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(settings)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if let Some(path) = &settings.config_file {
                            println!("Config file: {}", path.display());
                        } else {
                            println!(
                                "Config file: {} (not found)",
                                Settings::default_config_path().display()
                            );
                        }
                        println!();

                        println!("page: {}", settings.page.value.display());
                        println!("  source: {}", settings.page.source);
                        println!();

                        println!("storage_dir: {}", settings.storage_dir.value.display());
                        println!("  source: {}", settings.storage_dir.source);
                        println!();

                        println!(
                            "site_url: {}",
                            settings.site_url.value.as_deref().unwrap_or("(page directory)")
                        );
                        println!("  source: {}", settings.site_url.source);
                        println!();

                        println!(
                            "relay_url: {}",
                            settings.relay_url.value.as_deref().unwrap_or("(not set)")
                        );
                        println!("  source: {}", settings.relay_url.source);
                    }
                }
                Ok(())
            }

            ConfigSubcommand::Export { output } => {
                let editor = open_editor(settings).await?;
                let json = editor.export_config()?;
                if output.as_os_str() == "-" {
                    println!("{}", json);
                } else {
                    tokio::fs::write(output, json).await?;
                    println!("Exported config to {}", output.display());
                }
                Ok(())
            }

            ConfigSubcommand::Import { file } => {
                let contents = tokio::fs::read(file)
                    .await
                    .map_err(|e| format!("Failed to read '{}': {}", file.display(), e))?;
                let mut editor = open_editor(settings).await?;
                editor.import_config(&contents)?;
                println!("Imported config from {}", file.display());
                Ok(())
            }

            ConfigSubcommand::Reset { force } => {
                if !force && !confirm("Discard all local edits?")? {
                    println!("Reset cancelled.");
                    return Ok(());
                }
                let mut editor = open_editor(settings).await?;
                editor.reset()?;
                println!("Local edits cleared.");
                Ok(())
            }
        }
    }
}
