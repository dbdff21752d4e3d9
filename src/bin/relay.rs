//! Storefront publish relay
//!
//! Receives `POST {password, config}` from the developer tools and commits
//! the config to the site repository with a token that stays on the server.
//!
//! # Configuration
//!
//! Environment variables:
//! - `DEVELOPER_PASSWORD`: Password the editor must send
//! - `GITHUB_OWNER`, `GITHUB_REPO`: Repository holding the site
//! - `GITHUB_BRANCH`: Branch to commit to (default: main)
//! - `CONFIG_PATH`: Path of the config file in the repository (default: site-config.json)
//! - `GITHUB_TOKEN`: Token with contents write access
//! - `GITHUB_API_URL`: API base (default: https://api.github.com)
//! - `RELAY_PORT`: Port to listen on (default: 8787)

use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront::relay::{self, RelaySettings};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront_relay=info,storefront=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!("Relay stopped: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = RelaySettings::from_env();
    if settings.password.is_none() {
        tracing::warn!("DEVELOPER_PASSWORD is not set; every publish will be rejected");
    }
    if settings.token.is_none() || settings.owner.is_none() || settings.repo.is_none() {
        tracing::warn!("GITHUB_OWNER, GITHUB_REPO or GITHUB_TOKEN is missing");
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    tracing::info!(
        "Publishing to {}/{} ({}) at {}",
        settings.owner.as_deref().unwrap_or("?"),
        settings.repo.as_deref().unwrap_or("?"),
        settings.branch,
        settings.config_path
    );

    let app = relay::router(settings).layer(TraceLayer::new_for_http());

    tracing::info!("Starting relay on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
