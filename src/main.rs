use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront::commands::{
    self, ColorCommand, ConfigCommand, CredentialsCommand, ImageCommand, ProductCommand,
    PublishCommand, RenderCommand, SectionCommand, TextCommand,
};
use storefront::config::Settings;

#[derive(Parser)]
#[command(name = "storefront")]
#[command(version)]
#[command(about = "Edit, preview and publish the storefront page content", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Storefront page to edit (overrides the configured one)
    #[arg(long, global = true)]
    page: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the edited page
    Render(RenderCommand),

    /// Edit texts
    Text(TextCommand),

    /// Replace or clear images
    Image(ImageCommand),

    /// Edit the color palette
    Color(ColorCommand),

    /// Add or remove catalog sections
    Section(SectionCommand),

    /// Add or remove products
    Product(ProductCommand),

    /// Manage settings and the saved site config
    Config(ConfigCommand),

    /// Manage publish credentials
    Credentials(CredentialsCommand),

    /// Publish the site config
    Publish(PublishCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let mut settings = Settings::load(cli.config)?;
    if let Some(page) = cli.page {
        settings.page.value = page;
    }

    match cli.command {
        Some(Commands::Config(cmd)) => cmd.run(&settings).await?,
        Some(Commands::Credentials(cmd)) => cmd.run(&settings)?,
        Some(command) => {
            let mut editor = commands::open_editor(&settings).await?;
            match command {
                Commands::Render(cmd) => cmd.run(&mut editor).await?,
                Commands::Text(cmd) => cmd.run(&mut editor)?,
                Commands::Image(cmd) => cmd.run(&mut editor).await?,
                Commands::Color(cmd) => cmd.run(&mut editor)?,
                Commands::Section(cmd) => cmd.run(&mut editor)?,
                Commands::Product(cmd) => cmd.run(&mut editor)?,
                Commands::Publish(cmd) => cmd.run(&editor, &settings).await?,
                Commands::Config(_) | Commands::Credentials(_) => {}
            }
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
