//! Buffered Reader
//!
//! TCP is a stream protocol: a single read may return half a command, or
//! several commands at once. [`BufferedReader`] hides that by accumulating
//! incoming bytes in a `BytesMut` and handing out exactly what the decoder
//! asks for.
//!
//! Both read primitives are all-or-nothing. They either return the requested
//! bytes or fail, most commonly with [`DecodeError::ConnectionClosed`] when the
//! peer hangs up before enough data arrived.

use crate::protocol::decoder::{DecodeError, DecodeResult};
use bytes::{Buf, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Initial buffer capacity
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Largest single reservation made while waiting for a long payload
const MAX_READ_CHUNK: usize = 64 * 1024;

/// Maximum number of bytes buffered while searching for a delimiter
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Wraps a byte stream and buffers everything read from it.
#[derive(Debug)]
pub struct BufferedReader<R> {
    inner: R,
    buffer: BytesMut,
    /// Bytes read from `inner` since the last call to `take_read_count`
    read_count: usize,
}

impl<R: AsyncRead + Unpin> BufferedReader<R> {
    /// Creates a reader with an empty buffer.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            read_count: 0,
        }
    }

    /// Returns exactly `n` bytes, reading from the stream until they are buffered.
    pub async fn read_exact(&mut self, n: usize) -> DecodeResult<Bytes> {
        while self.buffer.len() < n {
            let missing = n - self.buffer.len();
            self.fill(missing).await?;
        }

        Ok(self.buffer.split_to(n).freeze())
    }

    /// Returns every byte before the first `delimiter`, consuming the delimiter.
    pub async fn read_until(&mut self, delimiter: &[u8]) -> DecodeResult<Bytes> {
        if delimiter.is_empty() {
            return Ok(Bytes::new());
        }

        // Bytes before `searched` are known not to start a match.
        let mut searched = 0;
        loop {
            if let Some(pos) = find(&self.buffer[searched..], delimiter) {
                let line = self.buffer.split_to(searched + pos).freeze();
                self.buffer.advance(delimiter.len());
                return Ok(line);
            }

            if self.buffer.len() > MAX_LINE_LENGTH {
                return Err(DecodeError::LineTooLong {
                    max: MAX_LINE_LENGTH,
                });
            }

            searched = self.buffer.len().saturating_sub(delimiter.len() - 1);
            self.fill(INITIAL_BUFFER_SIZE).await?;
        }
    }

    /// Number of bytes buffered but not yet consumed.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Returns the number of bytes read from the stream since the previous call.
    pub fn take_read_count(&mut self) -> usize {
        std::mem::take(&mut self.read_count)
    }

    /// Performs one read from the stream into the buffer.
    async fn fill(&mut self, wanted: usize) -> DecodeResult<usize> {
        let spare = self.buffer.capacity() - self.buffer.len();
        if spare < wanted {
            self.buffer.reserve(wanted.min(MAX_READ_CHUNK));
        }

        let n = self.inner.read_buf(&mut self.buffer).await?;
        if n == 0 {
            return Err(DecodeError::ConnectionClosed);
        }

        self.read_count += n;
        Ok(n)
    }
}

#[inline]
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
