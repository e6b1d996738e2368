//! Command Handler Module
//!
//! This module is the command-dispatch layer of respkv. It receives decoded
//! RESP requests, classifies them, executes them against the storage engine,
//! and returns the reply to write back.
//!
//! ## Architecture
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌─────────────────┐
//! │  RespDecoder    │  (protocol module)
//! └────────┬────────┘
//!          │ RespValue
//!          ▼
//! ┌─────────────────┐
//! │ Command::parse  │  (this module)
//! │ CommandHandler  │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ StorageEngine   │  (storage module)
//! └─────────────────┘
//! ```
//!
//! ## Supported Commands
//!
//! - `PING`
//! - `ECHO message`
//! - `GET key`
//! - `SET key value [PX milliseconds]`

pub mod handler;

pub use handler::{Command, CommandError, CommandHandler};
