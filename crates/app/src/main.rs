//! Courtyard command line entry point.

use clap::Parser;
use courtyard::Client;
use courtyard::cli::{Cli, login_hint};
use courtyard_infrastructure::SettingsLoader;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let loader = match cli.config {
        Some(path) => SettingsLoader::new().with_file(path),
        None => SettingsLoader::new(),
    };
    let settings = loader.load()?;
    tracing::debug!(base_url = %settings.base_url, "Loaded settings");

    let client = Client::connect(settings)?;
    if let Err(error) = cli.command.run(&client).await {
        if let Some(hint) = login_hint(&error) {
            eprintln!("{hint}");
        }
        return Err(error.into());
    }

    Ok(())
}
