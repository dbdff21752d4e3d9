use clap::{Args, Subcommand};

use super::OutputFormat;
use crate::editor::Editor;
use crate::models::ColorRole;

#[derive(Args)]
pub struct ColorCommand {
    #[command(subcommand)]
    pub command: ColorSubcommand,
}

#[derive(Subcommand)]
pub enum ColorSubcommand {
    /// Show the palette
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Change one color role
    Set {
        /// Role (background-light, brand, brand-mid, brand-dark, background-dark, card-dark)
        role: ColorRole,

        /// CSS color value
        value: String,
    },
}

impl ColorCommand {
    pub fn run(&self, editor: &mut Editor) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ColorSubcommand::List { format } => {
                let palette = &editor.config().colors;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(palette)?),
                    OutputFormat::Text => {
                        for role in ColorRole::ALL {
                            println!("{:<18} {}", role, palette.get(role));
                        }
                    }
                }
                Ok(())
            }

            ColorSubcommand::Set { role, value } => {
                editor.set_color(*role, value)?;
                println!("Set {} to {}", role, value.trim());
                Ok(())
            }
        }
    }
}
