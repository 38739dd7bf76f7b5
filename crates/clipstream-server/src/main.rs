//! # Clipstream Server
//!
//! Binary that serves the account API: registration, login, token refresh,
//! logout and profile management.
//!
//! With `database.url = "memory://"` the server runs against an in-process
//! store and needs no PostgreSQL.

use clap::Parser;
use clipstream_api::{build_router, AppState};
use std::net::SocketAddr;

#[derive(Debug, Parser)]
#[command(name = "clipstream", version, about = "Clipstream account server")]
struct Cli {
    /// Config file (extension optional); missing files are skipped.
    #[arg(long, env = "CLIPSTREAM_CONFIG", default_value = "config")]
    config: String,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,

    /// Do not run database migrations on startup.
    #[arg(long)]
    skip_migrations: bool,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "clipstream=debug,tower_http=debug".into());

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.json_logs);

    // Load configuration
    let config = clipstream_common::config::load(&cli.config)?;

    tracing::info!("Starting Clipstream v{}", env!("CARGO_PKG_VERSION"));

    // Connect to the credential store
    let store = clipstream_db::connect(&config.database, !cli.skip_migrations).await?;

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    let router = build_router(AppState::new(store, config));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("REST API listening on http://{addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
