//! Storage Engine Module
//!
//! This module provides the keyed store for respkv: a thread-safe,
//! sharded key-value map with per-key expiry, plus an optional background
//! sweeper.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     StorageEngine                           │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐           │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │...64    │           │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ shards  │           │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘           │
//! └──────────────▲───────────────────────────▲──────────────────┘
//!                │                           │
//!       ┌────────┴────────┐        ┌─────────┴─────────┐
//!       │      Clock      │        │   ExpirySweeper   │
//!       │ (System/Manual) │        │   (opt-in task)   │
//!       └─────────────────┘        └───────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use respkv::storage::{ManualClock, StorageEngine};
//! use bytes::Bytes;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let clock = Arc::new(ManualClock::new(0));
//! let engine = StorageEngine::with_clock(clock.clone());
//!
//! engine.set(Bytes::from("session"), Bytes::from("token123"), Some(Duration::from_millis(100)));
//! assert!(engine.get(b"session").is_some());
//!
//! clock.advance(Duration::from_millis(100));
//! assert!(engine.get(b"session").is_none());
//! ```

pub mod clock;
pub mod engine;
pub mod expiry;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{Entry, StorageEngine, StorageStats};
pub use expiry::{ExpiryConfig, ExpirySweeper};
