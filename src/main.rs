//! respkv - A Minimal RESP Key-Value Server
//!
//! This is the main entry point for the respkv server.
//! It reads configuration, sets up logging, binds the listener and runs
//! the accept loop until Ctrl+C.

use anyhow::Context;
use clap::Parser;
use respkv::config::Config;
use respkv::connection::ConnectionStats;
use respkv::server;
use respkv::storage::{ExpiryConfig, ExpirySweeper, StorageEngine};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn print_banner(config: &Config) {
    println!(
        r#"
respkv v{} - Minimal RESP Key-Value Server
──────────────────────────────────────────
Server started on {}
Ready to accept connections.

Use Ctrl+C to shutdown gracefully.
"#,
        respkv::VERSION,
        config.bind_address()
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Shared across all connections
    let storage = Arc::new(StorageEngine::new());
    info!("Storage engine initialized");

    let sweeper = config.sweep_interval().map(|interval| {
        ExpirySweeper::start(Arc::clone(&storage), ExpiryConfig::with_interval(interval))
    });

    let stats = Arc::new(ConnectionStats::new());

    let listener = TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address()))?;
    info!("Listening on {}", config.bind_address());

    print_banner(&config);

    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    server::run(listener, Arc::clone(&storage), Arc::clone(&stats), shutdown).await;

    if let Some(sweeper) = sweeper {
        sweeper.shutdown().await;
    }

    let storage_stats = storage.stats();
    info!(
        connections = stats.connections_accepted.load(Ordering::Relaxed),
        commands = stats.commands_processed.load(Ordering::Relaxed),
        keys = storage_stats.keys,
        expired = storage_stats.expired,
        "Server shutdown complete"
    );
    Ok(())
}
