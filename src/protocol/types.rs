//! RESP (Redis Serialization Protocol) Data Types
//!
//! This module defines the two value types that cross the wire:
//!
//! - [`RespValue`]: what a client sends, as produced by the decoder.
//! - [`Reply`]: what the server sends back.
//!
//! ## Protocol Format
//!
//! Each RESP type starts with a type prefix byte:
//! - `+` Simple String
//! - `-` Error
//! - `$` Bulk String
//! - `*` Array
//!
//! All types are terminated with CRLF (`\r\n`).
//!
//! ## Examples
//!
//! Simple String: `+OK\r\n`
//! Error: `-ERR Unknown Command\r\n`
//! Bulk String: `$5\r\nhello\r\n`
//! Array: `*2\r\n$3\r\nget\r\n$4\r\nname\r\n`
//! Null Bulk String: `$-1\r\n`

use bytes::Bytes;
use std::fmt;

/// The CRLF terminator used in RESP protocol
pub const CRLF: &[u8] = b"\r\n";

/// RESP protocol type prefixes
pub mod prefix {
    pub const SIMPLE_STRING: u8 = b'+';
    pub const ERROR: u8 = b'-';
    pub const BULK_STRING: u8 = b'$';
    pub const ARRAY: u8 = b'*';
}

/// A value decoded from a client request.
///
/// Requests only ever use these three shapes, so the dispatcher can match
/// on them exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    /// Opaque bytes terminated by CRLF. Never contains CRLF itself.
    /// Format: `+<bytes>\r\n`
    SimpleString(Bytes),

    /// Binary-safe bytes with an explicit length prefix.
    /// Format: `$<length>\r\n<data>\r\n`
    BulkString(Bytes),

    /// Ordered sequence of values, possibly nested.
    /// Format: `*<count>\r\n<element1><element2>...`
    Array(Vec<RespValue>),
}

impl RespValue {
    /// Creates a new simple string value.
    ///
    /// # Example
    /// ```
    /// use respkv::protocol::types::RespValue;
    /// let ping = RespValue::simple_string("ping");
    /// assert_eq!(ping.serialize(), b"+ping\r\n");
    /// ```
    pub fn simple_string(s: impl Into<Bytes>) -> Self {
        RespValue::SimpleString(s.into())
    }

    /// Creates a new bulk string value.
    pub fn bulk_string(data: impl Into<Bytes>) -> Self {
        RespValue::BulkString(data.into())
    }

    /// Creates an array value.
    pub fn array(values: Vec<RespValue>) -> Self {
        RespValue::Array(values)
    }

    /// Builds the array-of-bulk-strings form clients use to send commands.
    ///
    /// # Example
    /// ```
    /// use respkv::protocol::types::RespValue;
    /// let cmd = RespValue::command(["get", "name"]);
    /// assert_eq!(cmd.serialize(), b"*2\r\n$3\r\nget\r\n$4\r\nname\r\n");
    /// ```
    pub fn command<I, T>(parts: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Bytes>,
    {
        RespValue::Array(
            parts
                .into_iter()
                .map(|part| RespValue::BulkString(part.into()))
                .collect(),
        )
    }

    /// Serializes the value to its wire format.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_into(&mut buf);
        buf
    }

    /// Serializes the value into an existing buffer.
    pub fn serialize_into(&self, buf: &mut Vec<u8>) {
        match self {
            RespValue::SimpleString(s) => {
                buf.push(prefix::SIMPLE_STRING);
                buf.extend_from_slice(s);
                buf.extend_from_slice(CRLF);
            }
            RespValue::BulkString(data) => write_bulk(buf, data),
            RespValue::Array(values) => {
                buf.push(prefix::ARRAY);
                buf.extend_from_slice(values.len().to_string().as_bytes());
                buf.extend_from_slice(CRLF);
                for value in values {
                    value.serialize_into(buf);
                }
            }
        }
    }

    /// Consumes self and returns the payload of a SimpleString or BulkString.
    pub fn into_bytes(self) -> Option<Bytes> {
        match self {
            RespValue::SimpleString(b) | RespValue::BulkString(b) => Some(b),
            RespValue::Array(_) => None,
        }
    }
}

impl fmt::Display for RespValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RespValue::SimpleString(data) | RespValue::BulkString(data) => {
                write!(f, "\"{}\"", data.escape_ascii())
            }
            RespValue::Array(values) => {
                write!(f, "[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// A response sent back to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `+<bytes>\r\n`
    Simple(Bytes),

    /// `$<length>\r\n<bytes>\r\n`
    Bulk(Bytes),

    /// `-<message>\r\n`
    Error(String),

    /// Null bulk string, `$-1\r\n`
    Null,
}

impl Reply {
    /// Common response for successful writes
    pub fn ok() -> Self {
        Reply::Simple(Bytes::from_static(b"OK"))
    }

    /// Common response for PING
    pub fn pong() -> Self {
        Reply::Simple(Bytes::from_static(b"PONG"))
    }

    /// Creates a new error response.
    pub fn error(s: impl Into<String>) -> Self {
        Reply::Error(s.into())
    }

    /// Replies with `data` as a simple string.
    ///
    /// A simple string cannot carry CR or LF, so payloads containing either
    /// are sent as a bulk string instead.
    pub fn text(data: Bytes) -> Self {
        if data.iter().any(|&b| b == b'\r' || b == b'\n') {
            Reply::Bulk(data)
        } else {
            Reply::Simple(data)
        }
    }

    /// Serializes the reply to bytes for sending over the wire.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_into(&mut buf);
        buf
    }

    /// Serializes the reply into an existing buffer.
    pub fn serialize_into(&self, buf: &mut Vec<u8>) {
        match self {
            Reply::Simple(s) => {
                buf.push(prefix::SIMPLE_STRING);
                buf.extend_from_slice(s);
                buf.extend_from_slice(CRLF);
            }
            Reply::Bulk(data) => write_bulk(buf, data),
            Reply::Error(msg) => {
                buf.push(prefix::ERROR);
                buf.extend_from_slice(msg.as_bytes());
                buf.extend_from_slice(CRLF);
            }
            Reply::Null => {
                buf.push(prefix::BULK_STRING);
                buf.extend_from_slice(b"-1");
                buf.extend_from_slice(CRLF);
            }
        }
    }
}

fn write_bulk(buf: &mut Vec<u8>, data: &[u8]) {
    buf.push(prefix::BULK_STRING);
    buf.extend_from_slice(data.len().to_string().as_bytes());
    buf.extend_from_slice(CRLF);
    buf.extend_from_slice(data);
    buf.extend_from_slice(CRLF);
}
