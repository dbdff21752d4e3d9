use clap::{Args, ValueEnum};

use super::credentials::load_credentials;
use crate::config::Settings;
use crate::editor::Editor;
use crate::publish::{GitHubContents, PublishTarget, Publisher, RelayClient};

#[derive(Clone, Copy, ValueEnum)]
pub enum Via {
    /// The password-protected relay service
    Relay,
    /// The repository contents API with a personal token
    Github,
}

/// Publish the current site config so every visitor sees it
#[derive(Args)]
pub struct PublishCommand {
    /// Publish path (defaults to relay when a relay URL is configured)
    #[arg(long, value_enum)]
    via: Option<Via>,

    /// Relay password (defaults to the stored one)
    #[arg(long)]
    password: Option<String>,
}

impl PublishCommand {
    fn target(&self, settings: &Settings) -> Result<PublishTarget, Box<dyn std::error::Error>> {
        let credentials = load_credentials(settings);
        let relay_url = settings.relay_url.value.as_deref();
        let via = self.via.unwrap_or(match relay_url {
            Some(_) => Via::Relay,
            None => Via::Github,
        });

        match via {
            Via::Relay => {
                let url = relay_url.ok_or("No relay URL configured (set STOREFRONT_RELAY_URL)")?;
                let password = self
                    .password
                    .clone()
                    .unwrap_or(credentials.password);
                if password.is_empty() {
                    return Err("Relay password is required".into());
                }
                Ok(PublishTarget::Relay(RelayClient::new(url, password)))
            }
            Via::Github => Ok(PublishTarget::GitHub(GitHubContents::new(
                &credentials.validate()?,
            ))),
        }
    }

    pub async fn run(
        &self,
        editor: &Editor,
        settings: &Settings,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let target = self.target(settings)?;
        Publisher::new().publish(&target, editor.config()).await?;
        println!("Published site config");
        Ok(())
    }
}
