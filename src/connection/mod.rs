//! Connection Handler Module
//!
//! This module manages individual client connections. Each client
//! connection is handled by its own async task, which owns the decoder
//! and write buffer for that connection.
//!
//! ## Features
//!
//! - **Async I/O**: Works over any Tokio `AsyncRead + AsyncWrite` stream
//! - **Isolation**: A misbehaving client only ever ends its own connection
//! - **Statistics**: Tracks connection and command metrics
//!
//! ## Example
//!
//! ```ignore
//! use respkv::connection::{handle_connection, ConnectionStats};
//! use respkv::commands::CommandHandler;
//! use respkv::storage::StorageEngine;
//! use std::sync::Arc;
//!
//! let storage = Arc::new(StorageEngine::new());
//! let stats = Arc::new(ConnectionStats::new());
//!
//! // For each accepted connection...
//! let (stream, addr) = listener.accept().await?;
//! let handler = CommandHandler::new(Arc::clone(&storage));
//! tokio::spawn(handle_connection(stream, addr, handler, Arc::clone(&stats)));
//! ```

pub mod handler;

// Re-export commonly used types
pub use handler::{handle_connection, ConnectionError, ConnectionHandler, ConnectionStats};
