use clap::Parser;
use tracing_subscriber::EnvFilter;

use presux::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, BACKEND_URL, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("presux=info,tower_http=info")),
        )
        .init();

    let config = presux::config::config().clone();
    tracing::info!("Starting PresuX API in {:?} mode", config.environment);

    cli::run(Cli::parse(), config).await
}
