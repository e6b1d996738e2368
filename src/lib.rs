//! # respkv - A Minimal RESP Key-Value Server
//!
//! respkv is a small in-memory key-value server that speaks a subset of the
//! Redis Serialization Protocol (RESP). Any Redis client can talk to it for
//! `PING`, `ECHO`, `GET` and `SET` (with optional `PX` expiry).
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              respkv                                     │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │ TCP Server  │───>│ Connection  │───>│  Command    │                  │
//! │  │ (Listener)  │    │  Handler    │    │  Handler    │                  │
//! │  └─────────────┘    └──────┬──────┘    └──────┬──────┘                  │
//! │                            │                  │                         │
//! │                            ▼                  ▼                         │
//! │                     ┌─────────────┐    ┌──────────────────────────────┐ │
//! │                     │ RespDecoder │    │        StorageEngine         │ │
//! │                     │      │      │    │  64 RwLock shards + Clock    │ │
//! │                     │ Buffered    │    └──────────────────────────────┘ │
//! │                     │ Reader      │                   ▲                 │
//! │                     └─────────────┘                   │ (optional)      │
//! │                                             ┌─────────┴─────────┐       │
//! │                                             │   ExpirySweeper   │       │
//! │                                             └───────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use respkv::connection::ConnectionStats;
//! use respkv::server;
//! use respkv::storage::StorageEngine;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let storage = Arc::new(StorageEngine::new());
//!     let stats = Arc::new(ConnectionStats::new());
//!     let listener = TcpListener::bind("127.0.0.1:6379").await?;
//!
//!     server::run(listener, storage, stats, async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`protocol`]: Buffered reader, RESP decoder, and wire types
//! - [`storage`]: Sharded store with lazy expiry and an optional sweeper
//! - [`commands`]: Request classification and execution
//! - [`connection`]: Per-client request loop and statistics
//! - [`server`]: Accept loop
//! - [`config`]: Command-line and environment configuration
//!
//! ## Expiry
//!
//! `SET key value PX ms` stores an absolute deadline of `now + ms`. Reads
//! compare against the current time and treat a key at or past its deadline
//! as missing. Nothing has to run in the background for this to be correct;
//! the sweeper only reclaims memory held by keys nobody reads again.

pub mod commands;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod server;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::{Command, CommandHandler};
pub use config::Config;
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::{DecodeError, Reply, RespDecoder, RespValue};
pub use storage::{ExpiryConfig, ExpirySweeper, StorageEngine};

/// The default port respkv listens on (same as Redis)
pub const DEFAULT_PORT: u16 = 6379;

/// The default host respkv binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of respkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
