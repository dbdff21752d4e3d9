use clap::{Args, Subcommand};

use super::{open_store, OutputFormat};
use crate::config::Settings;
use crate::publish::PublishCredentials;

#[derive(Args)]
pub struct CredentialsCommand {
    #[command(subcommand)]
    pub command: CredentialsSubcommand,
}

#[derive(Subcommand)]
pub enum CredentialsSubcommand {
    /// Store publish credentials; omitted fields keep their saved value
    Set {
        /// Repository access token
        #[arg(long)]
        token: Option<String>,

        /// Repository owner
        #[arg(long)]
        owner: Option<String>,

        /// Repository name
        #[arg(long)]
        repo: Option<String>,

        /// Branch to publish to
        #[arg(long)]
        branch: Option<String>,

        /// Relay password
        #[arg(long)]
        password: Option<String>,
    },

    /// Show stored publish credentials
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        "(not set)".to_string()
    } else {
        let tail: String = secret
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("****{}", tail)
    }
}

/// Saved credentials with owner and repository backfilled from the site URL.
pub fn load_credentials(settings: &Settings) -> PublishCredentials {
    open_store(settings)
        .load_credentials()
        .with_site_defaults(settings.site_url.value.as_deref())
}

impl CredentialsCommand {
    pub fn run(&self, settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            CredentialsSubcommand::Set {
                token,
                owner,
                repo,
                branch,
                password,
            } => {
                let store = open_store(settings);
                let mut credentials = load_credentials(settings);
                let fields = [
                    (&mut credentials.token, token),
                    (&mut credentials.owner, owner),
                    (&mut credentials.repo, repo),
                    (&mut credentials.branch, branch),
                    (&mut credentials.password, password),
                ];
                for (slot, value) in fields {
                    if let Some(value) = value {
                        *slot = value.trim().to_string();
                    }
                }

                store.save_credentials(&credentials)?;
                println!("Saved publish credentials");
                Ok(())
            }

            CredentialsSubcommand::Show { format } => {
                let credentials = load_credentials(settings);
                let masked = PublishCredentials {
                    token: mask(&credentials.token),
                    password: mask(&credentials.password),
                    ..credentials
                };
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&masked)?),
                    OutputFormat::Text => {
                        println!("token:    {}", masked.token);
                        println!("owner:    {}", masked.owner);
                        println!("repo:     {}", masked.repo);
                        println!("branch:   {}", masked.branch);
                        println!("password: {}", masked.password);
                    }
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_keeps_last_four() {
        assert_eq!(mask(""), "(not set)");
        assert_eq!(mask("ghp_abcdef123"), "****f123");
        assert_eq!(mask("ab"), "****ab");
    }
}
