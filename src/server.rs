//! TCP accept loop.
//!
//! Spawns one Tokio task per accepted connection. Every task gets a fresh
//! [`CommandHandler`] pointing at the same [`StorageEngine`].

use crate::commands::CommandHandler;
use crate::connection::{handle_connection, ConnectionStats};
use crate::storage::StorageEngine;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Accepts connections until `shutdown` completes.
///
/// Connections already running are not interrupted; they end when their
/// clients disconnect or the runtime shuts down.
pub async fn run(
    listener: TcpListener,
    storage: Arc<StorageEngine>,
    stats: Arc<ConnectionStats>,
    shutdown: impl Future<Output = ()>,
) {
    tokio::select! {
        _ = accept_loop(listener, storage, stats) => {}
        _ = shutdown => {
            info!("Shutdown signal received, no longer accepting connections");
        }
    }
}

async fn accept_loop(
    listener: TcpListener,
    storage: Arc<StorageEngine>,
    stats: Arc<ConnectionStats>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let handler = CommandHandler::new(Arc::clone(&storage));
                let stats = Arc::clone(&stats);

                tokio::spawn(handle_connection(stream, addr, handler, stats));
            }
            Err(e) => {
                error!(error = %e, "Failed to accept connection");
            }
        }
    }
}
