//! Streaming RESP Decoder
//!
//! [`RespDecoder`] pulls exactly one RESP value at a time off a byte stream.
//! It reads a single type-tag byte and then dispatches on it:
//!
//! - `+` reads a line and yields a simple string
//! - `$` reads a length line, that many bytes, then an empty line
//! - `*` reads a count line and decodes that many values recursively
//!
//! All blocking happens inside the [`BufferedReader`]. When the peer hangs up
//! the decoder reports [`DecodeError::ConnectionClosed`], which callers treat
//! as the normal end of a session rather than as malformed input.
//!
//! ## Limits
//!
//! A malicious client controls every length on the wire, so the decoder
//! bounds what it is willing to trust:
//!
//! - bulk strings larger than [`MAX_BULK_SIZE`] are rejected up front
//! - arrays nested deeper than [`MAX_NESTING_DEPTH`] are rejected
//! - array storage grows with the elements that actually arrive, at most
//!   [`MAX_PREALLOC`] slots are reserved from the declared count

use crate::protocol::reader::BufferedReader;
use crate::protocol::types::{prefix, RespValue, CRLF};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Errors that can occur while decoding a request.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The peer closed the stream before a complete value arrived
    #[error("connection closed")]
    ConnectionClosed,

    /// Unknown type prefix byte
    #[error("unknown type byte: {0:#04x}")]
    UnknownPrefix(u8),

    /// A length or count line is not a base-10 integer
    #[error("invalid integer: {0:?}")]
    InvalidInteger(String),

    /// Bulk string length is negative
    #[error("invalid bulk string length: {0}")]
    InvalidBulkLength(i64),

    /// Array count is negative
    #[error("invalid array length: {0}")]
    InvalidArrayLength(i64),

    /// Declared bulk string length exceeds the allowed maximum
    #[error("message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: i64, max: usize },

    /// No CRLF found within the allowed line length
    #[error("line too long: no CRLF within {max} bytes")]
    LineTooLong { max: usize },

    /// Framing violation (missing CRLF, nesting too deep, ...)
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// I/O error on the underlying stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DecodeError {
    /// Returns true if the error was caused by malformed input, as opposed to
    /// the stream closing or failing.
    pub fn is_protocol_error(&self) -> bool {
        !matches!(self, DecodeError::ConnectionClosed | DecodeError::Io(_))
    }
}

/// Result type for decoding operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Maximum size for a single bulk string (512 MB, same as Redis)
pub const MAX_BULK_SIZE: usize = 512 * 1024 * 1024;

/// Maximum array nesting depth (prevent stack overflow)
pub const MAX_NESTING_DEPTH: usize = 32;

/// Upper bound on array slots reserved before elements arrive
pub const MAX_PREALLOC: usize = 1024;

type DecodeFuture<'a> = Pin<Box<dyn Future<Output = DecodeResult<RespValue>> + Send + 'a>>;

/// Decodes RESP values from a byte stream, one at a time.
///
/// # Example
///
/// ```
/// # tokio_test::block_on(async {
/// use respkv::protocol::{RespDecoder, RespValue};
///
/// let mut decoder = RespDecoder::new(&b"*2\r\n$4\r\necho\r\n$2\r\nhi\r\n"[..]);
/// let value = decoder.decode().await.unwrap();
/// assert_eq!(value, RespValue::command(["echo", "hi"]));
/// # });
/// ```
#[derive(Debug)]
pub struct RespDecoder<R> {
    reader: BufferedReader<R>,
}

impl<R: AsyncRead + Unpin + Send> RespDecoder<R> {
    /// Creates a decoder over a fresh buffered reader.
    pub fn new(stream: R) -> Self {
        Self {
            reader: BufferedReader::new(stream),
        }
    }

    /// Returns the underlying buffered reader.
    pub fn reader(&self) -> &BufferedReader<R> {
        &self.reader
    }

    /// Returns the underlying buffered reader mutably.
    pub fn reader_mut(&mut self) -> &mut BufferedReader<R> {
        &mut self.reader
    }

    /// Decodes the next complete value from the stream.
    pub async fn decode(&mut self) -> DecodeResult<RespValue> {
        self.decode_value(0).await
    }

    fn decode_value(&mut self, depth: usize) -> DecodeFuture<'_> {
        Box::pin(async move {
            if depth > MAX_NESTING_DEPTH {
                return Err(DecodeError::ProtocolError(format!(
                    "maximum nesting depth exceeded: {}",
                    MAX_NESTING_DEPTH
                )));
            }

            let tag = self.reader.read_exact(1).await?;
            match tag[0] {
                prefix::SIMPLE_STRING => self.decode_simple_string().await,
                prefix::BULK_STRING => self.decode_bulk_string().await,
                prefix::ARRAY => self.decode_array(depth).await,
                other => Err(DecodeError::UnknownPrefix(other)),
            }
        })
    }

    /// `+<string>\r\n`
    async fn decode_simple_string(&mut self) -> DecodeResult<RespValue> {
        let line = self.reader.read_until(CRLF).await?;
        Ok(RespValue::SimpleString(line))
    }

    /// `$<length>\r\n<data>\r\n`
    async fn decode_bulk_string(&mut self) -> DecodeResult<RespValue> {
        let length = self.read_integer_line().await?;
        if length < 0 {
            return Err(DecodeError::InvalidBulkLength(length));
        }

        let length = usize::try_from(length)
            .ok()
            .filter(|&len| len <= MAX_BULK_SIZE)
            .ok_or(DecodeError::MessageTooLarge {
                size: length,
                max: MAX_BULK_SIZE,
            })?;

        let data = self.reader.read_exact(length).await?;

        let trailer = self.reader.read_until(CRLF).await?;
        if !trailer.is_empty() {
            return Err(DecodeError::ProtocolError(
                "bulk string longer than declared length".to_string(),
            ));
        }

        Ok(RespValue::BulkString(data))
    }

    /// `*<count>\r\n<elements...>`
    async fn decode_array(&mut self, depth: usize) -> DecodeResult<RespValue> {
        let count = self.read_integer_line().await?;
        let count = usize::try_from(count).map_err(|_| DecodeError::InvalidArrayLength(count))?;

        let mut elements = Vec::with_capacity(count.min(MAX_PREALLOC));
        for _ in 0..count {
            elements.push(self.decode_value(depth + 1).await?);
        }

        Ok(RespValue::Array(elements))
    }

    async fn read_integer_line(&mut self) -> DecodeResult<i64> {
        let line = self.reader.read_until(CRLF).await?;
        parse_integer(&line)
    }
}

fn parse_integer(line: &[u8]) -> DecodeResult<i64> {
    std::str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| DecodeError::InvalidInteger(String::from_utf8_lossy(line).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    async fn decode_one(input: &[u8]) -> DecodeResult<RespValue> {
        RespDecoder::new(input).decode().await
    }

    #[tokio::test]
    async fn test_decode_simple_string() {
        let value = decode_one(b"+ping\r\n").await.unwrap();
        assert_eq!(value, RespValue::SimpleString(Bytes::from("ping")));
    }

    #[tokio::test]
    async fn test_decode_bulk_string() {
        let value = decode_one(b"$5\r\nhello\r\n").await.unwrap();
        assert_eq!(value, RespValue::BulkString(Bytes::from("hello")));
    }

    #[tokio::test]
    async fn test_decode_empty_bulk_string() {
        let value = decode_one(b"$0\r\n\r\n").await.unwrap();
        assert_eq!(value, RespValue::BulkString(Bytes::new()));
    }

    #[tokio::test]
    async fn test_decode_bulk_string_with_crlf_inside() {
        let value = decode_one(b"$6\r\na\r\nb\r\n\r\n").await.unwrap();
        assert_eq!(value, RespValue::BulkString(Bytes::from("a\r\nb\r\n")));
    }

    #[tokio::test]
    async fn test_decode_array() {
        let value = decode_one(b"*2\r\n$3\r\nget\r\n$3\r\nfoo\r\n")
            .await
            .unwrap();
        assert_eq!(value, RespValue::command(["get", "foo"]));
    }

    #[tokio::test]
    async fn test_decode_empty_array() {
        let value = decode_one(b"*0\r\n").await.unwrap();
        assert_eq!(value, RespValue::Array(vec![]));
    }

    #[tokio::test]
    async fn test_decode_nested_mixed_array() {
        let value = decode_one(b"*3\r\n+a\r\n*1\r\n$1\r\nb\r\n$0\r\n\r\n")
            .await
            .unwrap();
        assert_eq!(
            value,
            RespValue::Array(vec![
                RespValue::simple_string("a"),
                RespValue::Array(vec![RespValue::bulk_string("b")]),
                RespValue::bulk_string(""),
            ])
        );
    }

    #[tokio::test]
    async fn test_decode_sequential_values() {
        let mut decoder = RespDecoder::new(&b"+ping\r\n*1\r\n$4\r\nping\r\n"[..]);
        assert_eq!(
            decoder.decode().await.unwrap(),
            RespValue::simple_string("ping")
        );
        assert_eq!(
            decoder.decode().await.unwrap(),
            RespValue::command(["ping"])
        );
        assert!(matches!(
            decoder.decode().await,
            Err(DecodeError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_decode_across_reads() {
        let stream = tokio_test::io::Builder::new()
            .read(b"*2\r\n$4\r\nec")
            .read(b"ho\r\n$5\r")
            .read(b"\nhello\r\n")
            .build();
        let mut decoder = RespDecoder::new(stream);

        assert_eq!(
            decoder.decode().await.unwrap(),
            RespValue::command(["echo", "hello"])
        );
    }

    #[tokio::test]
    async fn test_connection_closed_before_tag() {
        let err = decode_one(b"").await.unwrap_err();
        assert!(matches!(err, DecodeError::ConnectionClosed));
        assert!(!err.is_protocol_error());
    }

    #[tokio::test]
    async fn test_connection_closed_mid_value() {
        let err = decode_one(b"*2\r\n$3\r\nget\r\n").await.unwrap_err();
        assert!(matches!(err, DecodeError::ConnectionClosed));

        let err = decode_one(b"$10\r\nshort").await.unwrap_err();
        assert!(matches!(err, DecodeError::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_unknown_prefix() {
        let err = decode_one(b":1000\r\n").await.unwrap_err();
        assert!(matches!(err, DecodeError::UnknownPrefix(b':')));
        assert!(err.is_protocol_error());
    }

    #[tokio::test]
    async fn test_invalid_integer() {
        let err = decode_one(b"$abc\r\n").await.unwrap_err();
        assert!(matches!(err, DecodeError::InvalidInteger(ref s) if s == "abc"));

        let err = decode_one(b"*\r\n").await.unwrap_err();
        assert!(matches!(err, DecodeError::InvalidInteger(_)));
    }

    #[tokio::test]
    async fn test_negative_lengths() {
        let err = decode_one(b"$-1\r\n").await.unwrap_err();
        assert!(matches!(err, DecodeError::InvalidBulkLength(-1)));

        let err = decode_one(b"*-1\r\n").await.unwrap_err();
        assert!(matches!(err, DecodeError::InvalidArrayLength(-1)));
    }

    #[tokio::test]
    async fn test_bulk_string_too_large() {
        let err = decode_one(b"$999999999999\r\n").await.unwrap_err();
        assert!(matches!(err, DecodeError::MessageTooLarge { .. }));
    }

    #[tokio::test]
    async fn test_bulk_string_framing_mismatch() {
        let err = decode_one(b"$3\r\nhello\r\n").await.unwrap_err();
        assert!(matches!(err, DecodeError::ProtocolError(_)));
    }

    #[tokio::test]
    async fn test_nesting_depth_limit() {
        let input = b"*1\r\n".repeat(MAX_NESTING_DEPTH + 2);
        let err = decode_one(&input).await.unwrap_err();
        assert!(matches!(err, DecodeError::ProtocolError(_)));
    }

    #[tokio::test]
    async fn test_nesting_within_limit() {
        let mut input = b"*1\r\n".repeat(MAX_NESTING_DEPTH);
        input.extend_from_slice(b"+x\r\n");
        assert!(decode_one(&input).await.is_ok());
    }

    #[tokio::test]
    async fn test_huge_declared_count_does_not_preallocate() {
        // Only one element ever arrives; the stream then closes.
        let err = decode_one(b"*4000000000\r\n+a\r\n").await.unwrap_err();
        assert!(matches!(err, DecodeError::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_roundtrip_binary_bulk_strings() {
        let binary: Vec<u8> = (0..=255u8).collect();
        let request = RespValue::Array(vec![
            RespValue::bulk_string("set"),
            RespValue::bulk_string("\r\n"),
            RespValue::bulk_string("\n\r\r\n$3\r\n*1"),
            RespValue::bulk_string(binary),
            RespValue::Array(vec![RespValue::bulk_string(""), RespValue::simple_string("ok")]),
        ]);

        let serialized = request.serialize();
        let decoded = decode_one(&serialized).await.unwrap();
        assert_eq!(decoded, request);
    }
}
