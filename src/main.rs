use models::{App, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cleanup;
mod cli;
mod config;
mod export;
mod ledger;
mod mailer;
mod mapping;
mod models;
mod submissions;

use config::{load_config, Config};
use tokio::signal;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let config = match load_config("config.yml").await {
        Ok(config) => config,
        Err(e) => {
            // Subscriber is not up yet at this point, so log to stderr.
            eprintln!("Failed to load config.yml: {e}. Using defaults.");
            Config::default()
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("contact_sync={}", config.logging.level).parse()?),
        )
        .init();

    tokio::fs::create_dir_all(&config.storage.csv_directory).await?;

    let app = App::new(config).await?;

    tokio::select! {
        result = app.run() => {
            result?;
        }
        _ = signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
