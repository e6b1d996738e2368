//! RESP Protocol Implementation
//!
//! This module implements the subset of the Redis Serialization Protocol (RESP)
//! that respkv speaks.
//!
//! ## Overview
//!
//! RESP is a simple, binary-safe protocol. Requests arrive as simple strings,
//! bulk strings, or arrays of those; replies go out as simple strings, errors,
//! bulk strings, or the null bulk string.
//!
//! ## Modules
//!
//! - `reader`: Buffered reader with `read_exact` / `read_until` primitives
//! - `decoder`: Recursive decoder producing one `RespValue` per call
//! - `types`: The `RespValue` and `Reply` enums and their serialization
//!
//! ## Example
//!
//! ```ignore
//! use respkv::protocol::{RespDecoder, Reply};
//!
//! // Decoding requests from a socket
//! let mut decoder = RespDecoder::new(read_half);
//! let request = decoder.decode().await?;
//!
//! // Encoding responses
//! let bytes = Reply::pong().serialize();
//! ```

pub mod decoder;
pub mod reader;
pub mod types;

// Re-export commonly used types for convenience
pub use decoder::{DecodeError, DecodeResult, RespDecoder};
pub use reader::BufferedReader;
pub use types::{Reply, RespValue};
