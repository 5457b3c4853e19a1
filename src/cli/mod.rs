use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::app::app;
use crate::auth::{AuthServiceClient, IdentityProvider};
use crate::config::{AppConfig, StoreBackend};
use crate::database::{MemoryStore, PgStore, Store};
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "presux")]
#[command(about = "PresuX API - small-business management backend")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Port to listen on (overrides PORT / PRESUX_PORT)")]
        port: Option<u16>,
    },

    #[command(about = "Apply database migrations to DATABASE_URL")]
    Migrate,

    #[command(about = "Print the effective configuration with secrets redacted")]
    Config,
}

pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => serve(config, port).await,
        Commands::Migrate => {
            let store = PgStore::connect(&config.database)
                .await
                .context("connecting to DATABASE_URL")?;
            store.migrate().await.context("applying migrations")?;
            println!("Migrations applied");
            Ok(())
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config.redacted())?);
            Ok(())
        }
    }
}

pub async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn Store>> {
    match config.database.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let store = PgStore::connect(&config.database)
                .await
                .context("connecting to DATABASE_URL")?;
            if config.database.run_migrations {
                store.migrate().await.context("applying migrations")?;
            }
            Ok(Arc::new(store))
        }
    }
}

async fn serve(mut config: AppConfig, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.server.port = port;
    }
    if config.auth_bypass() {
        tracing::warn!("DISABLE_AUTH is set: session gate decisions are skipped");
    }

    let store = build_store(&config).await?;
    let identity: Arc<dyn IdentityProvider> =
        Arc::new(AuthServiceClient::new(&config.backend).context("building identity service client")?);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, store, identity);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("PresuX API listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await?;
    Ok(())
}
