//! Connection Handler
//!
//! Runs the request loop for one client. Each accepted connection gets its
//! own task, its own [`RespDecoder`] and its own write buffer; only the
//! storage engine (behind the [`CommandHandler`]) is shared.
//!
//! ## Lifecycle
//!
//! ```text
//! 1. Connection accepted (server.rs)
//!        │
//!        ▼
//! 2. ConnectionHandler::run()
//!        │
//!        ▼
//! 3. ┌──────────────────────────────┐
//!    │  decode one request          │◄─┐
//!    │  execute via CommandHandler  │  │
//!    │  write reply                 │──┘
//!    └──────────────────────────────┘
//!        │
//!        ▼
//! 4. Peer closes (normal) / protocol error (reply, then close) / I/O error
//!        │
//!        ▼
//! 5. Handler task ends
//! ```
//!
//! After a framing error the byte stream cannot be resynchronized, so the
//! handler answers with a `-ERR Protocol error: ...` line and hangs up.

use crate::commands::CommandHandler;
use crate::protocol::{DecodeError, Reply, RespDecoder};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{split, AsyncRead, AsyncWrite, AsyncWriteExt, BufWriter, ReadHalf, WriteHalf};
use tracing::{debug, info, trace, warn};

/// Statistics for connection handling
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total number of connections accepted
    pub connections_accepted: AtomicU64,
    /// Currently active connections
    pub active_connections: AtomicU64,
    /// Total commands processed
    pub commands_processed: AtomicU64,
    /// Total bytes read
    pub bytes_read: AtomicU64,
    /// Total bytes written
    pub bytes_written: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn command_processed(&self) {
        self.commands_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written.fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// Handles a single client connection.
pub struct ConnectionHandler<S> {
    /// Request side of the stream
    decoder: RespDecoder<ReadHalf<S>>,

    /// Reply side of the stream
    writer: BufWriter<WriteHalf<S>>,

    /// Client's address (for logging)
    addr: SocketAddr,

    /// The command handler (shares the store with every other connection)
    command_handler: CommandHandler,

    /// Connection statistics (shared)
    stats: Arc<ConnectionStats>,
}

impl<S> ConnectionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Creates a new connection handler.
    ///
    /// # Arguments
    ///
    /// * `stream` - The byte stream for this connection
    /// * `addr` - The client's socket address
    /// * `command_handler` - The command handler for executing commands
    /// * `stats` - Shared connection statistics
    pub fn new(
        stream: S,
        addr: SocketAddr,
        command_handler: CommandHandler,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        stats.connection_opened();

        let (read_half, write_half) = split(stream);
        Self {
            decoder: RespDecoder::new(read_half),
            writer: BufWriter::new(write_half),
            addr,
            command_handler,
            stats,
        }
    }

    /// Runs the request loop until the client disconnects or an error occurs.
    ///
    /// A client closing the connection is the normal way for this to end and
    /// yields `Ok(())`.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        info!(client = %self.addr, "Client connected");

        let result = self.main_loop().await;

        match &result {
            Ok(()) => info!(client = %self.addr, "Client disconnected"),
            Err(e) if e.is_connection_reset() => {
                debug!(client = %self.addr, "Connection reset by client")
            }
            Err(e) => warn!(client = %self.addr, error = %e, "Connection closed with error"),
        }

        self.stats.connection_closed();
        result
    }

    /// The read-execute-respond loop.
    async fn main_loop(&mut self) -> Result<(), ConnectionError> {
        loop {
            let decoded = self.decoder.decode().await;
            self.stats
                .bytes_read(self.decoder.reader_mut().take_read_count());

            let request = match decoded {
                Ok(request) => request,
                Err(DecodeError::ConnectionClosed) => {
                    let pending = self.decoder.reader().buffered();
                    if pending > 0 {
                        debug!(
                            client = %self.addr,
                            pending,
                            "Client closed mid-request"
                        );
                    }
                    return Ok(());
                }
                Err(e) if e.is_protocol_error() => {
                    warn!(client = %self.addr, error = %e, "Protocol error");
                    self.send_reply(&Reply::error(format!("ERR Protocol error: {}", e)))
                        .await?;
                    return Err(ConnectionError::Decode(e));
                }
                Err(e) => return Err(ConnectionError::Decode(e)),
            };

            trace!(client = %self.addr, request = %request, "Received request");

            let reply = self.command_handler.execute(request);
            self.stats.command_processed();

            self.send_reply(&reply).await?;
        }
    }

    /// Sends a reply to the client.
    async fn send_reply(&mut self, reply: &Reply) -> Result<(), ConnectionError> {
        let bytes = reply.serialize();
        self.writer.write_all(&bytes).await?;
        self.writer.flush().await?;
        self.stats.bytes_written(bytes.len());
        trace!(client = %self.addr, bytes = bytes.len(), "Sent reply");
        Ok(())
    }
}

/// Errors that end a connection early.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// I/O error while writing a reply
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The request stream was malformed or failed
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

impl ConnectionError {
    /// Returns true if the peer reset the connection, on either side of the stream.
    pub fn is_connection_reset(&self) -> bool {
        let io_err = match self {
            ConnectionError::Io(e) | ConnectionError::Decode(DecodeError::Io(e)) => e,
            ConnectionError::Decode(_) => return false,
        };
        io_err.kind() == std::io::ErrorKind::ConnectionReset
    }
}

/// Handles a client connection to completion.
///
/// This is a convenience function that creates a ConnectionHandler
/// and runs it, logging anything other than a clean disconnect.
pub async fn handle_connection<S>(
    stream: S,
    addr: SocketAddr,
    command_handler: CommandHandler,
    stats: Arc<ConnectionStats>,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    let handler = ConnectionHandler::new(stream, addr, command_handler, stats);
    if let Err(e) = handler.run().await {
        debug!(client = %addr, error = %e, "Connection ended with error");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{ManualClock, StorageEngine};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, DuplexStream};
    use tokio::task::JoinHandle;

    struct TestConnection {
        client: DuplexStream,
        stats: Arc<ConnectionStats>,
        task: JoinHandle<Result<(), ConnectionError>>,
    }

    fn connect(storage: Arc<StorageEngine>) -> TestConnection {
        let (client, server) = tokio::io::duplex(4096);
        let stats = Arc::new(ConnectionStats::new());
        let addr: SocketAddr = "127.0.0.1:50000".parse().unwrap();

        let handler = ConnectionHandler::new(
            server,
            addr,
            CommandHandler::new(storage),
            Arc::clone(&stats),
        );
        let task = tokio::spawn(handler.run());

        TestConnection {
            client,
            stats,
            task,
        }
    }

    async fn roundtrip(client: &mut DuplexStream, request: &[u8], expected: &[u8]) {
        client.write_all(request).await.unwrap();
        let mut buf = vec![0u8; expected.len()];
        client.read_exact(&mut buf).await.unwrap();
        assert_eq!(
            buf,
            expected,
            "got {:?}",
            String::from_utf8_lossy(&buf)
        );
    }

    #[tokio::test]
    async fn test_ping_pong() {
        let mut conn = connect(Arc::new(StorageEngine::new()));

        roundtrip(&mut conn.client, b"*1\r\n$4\r\nping\r\n", b"+PONG\r\n").await;
        roundtrip(&mut conn.client, b"+ping\r\n", b"+PONG\r\n").await;
    }

    #[tokio::test]
    async fn test_echo_set_get() {
        let mut conn = connect(Arc::new(StorageEngine::new()));

        roundtrip(
            &mut conn.client,
            b"*2\r\n$4\r\necho\r\n$5\r\nhello\r\n",
            b"+hello\r\n",
        )
        .await;
        roundtrip(
            &mut conn.client,
            b"*3\r\n$3\r\nset\r\n$3\r\nfoo\r\n$3\r\nbar\r\n",
            b"+OK\r\n",
        )
        .await;
        roundtrip(
            &mut conn.client,
            b"*2\r\n$3\r\nget\r\n$3\r\nfoo\r\n",
            b"+bar\r\n",
        )
        .await;
        roundtrip(
            &mut conn.client,
            b"*2\r\n$3\r\nget\r\n$3\r\nbaz\r\n",
            b"$-1\r\n",
        )
        .await;
    }

    #[tokio::test]
    async fn test_set_px_then_expired() {
        let clock = Arc::new(ManualClock::new(0));
        let mut conn = connect(Arc::new(StorageEngine::with_clock(clock.clone())));

        roundtrip(
            &mut conn.client,
            b"*5\r\n$3\r\nset\r\n$3\r\nfoo\r\n$3\r\nbar\r\n$2\r\npx\r\n$2\r\n10\r\n",
            b"+OK\r\n",
        )
        .await;

        clock.advance(Duration::from_millis(20));

        roundtrip(
            &mut conn.client,
            b"*2\r\n$3\r\nget\r\n$3\r\nfoo\r\n",
            b"$-1\r\n",
        )
        .await;
    }

    #[tokio::test]
    async fn test_unknown_command_keeps_connection_open() {
        let mut conn = connect(Arc::new(StorageEngine::new()));

        roundtrip(
            &mut conn.client,
            b"*2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n",
            b"-ERR Unknown Command\r\n",
        )
        .await;
        roundtrip(
            &mut conn.client,
            b"*1\r\n$3\r\nget\r\n",
            b"-ERR Unknown Command\r\n",
        )
        .await;
        roundtrip(&mut conn.client, b"*1\r\n$4\r\nping\r\n", b"+PONG\r\n").await;
    }

    #[tokio::test]
    async fn test_request_split_across_writes() {
        let mut conn = connect(Arc::new(StorageEngine::new()));

        conn.client.write_all(b"*2\r\n$4\r\nec").await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        roundtrip(&mut conn.client, b"ho\r\n$2\r\nhi\r\n", b"+hi\r\n").await;
    }

    #[tokio::test]
    async fn test_back_to_back_requests() {
        let mut conn = connect(Arc::new(StorageEngine::new()));

        roundtrip(
            &mut conn.client,
            b"*3\r\n$3\r\nset\r\n$1\r\nk\r\n$1\r\nv\r\n*2\r\n$3\r\nget\r\n$1\r\nk\r\n",
            b"+OK\r\n+v\r\n",
        )
        .await;
    }

    #[tokio::test]
    async fn test_protocol_error_closes_connection() {
        let mut conn = connect(Arc::new(StorageEngine::new()));

        conn.client.write_all(b"!oops\r\n").await.unwrap();

        let mut response = Vec::new();
        conn.client.read_to_end(&mut response).await.unwrap();
        assert_eq!(
            String::from_utf8_lossy(&response),
            "-ERR Protocol error: unknown type byte: 0x21\r\n"
        );

        let result = conn.task.await.unwrap();
        assert!(matches!(
            result,
            Err(ConnectionError::Decode(DecodeError::UnknownPrefix(b'!')))
        ));
    }

    #[tokio::test]
    async fn test_client_close_ends_cleanly() {
        let mut conn = connect(Arc::new(StorageEngine::new()));

        roundtrip(&mut conn.client, b"+ping\r\n", b"+PONG\r\n").await;
        assert_eq!(conn.stats.active_connections.load(Ordering::Relaxed), 1);

        drop(conn.client);
        let result = conn.task.await.unwrap();
        assert!(result.is_ok());

        assert_eq!(conn.stats.connections_accepted.load(Ordering::Relaxed), 1);
        assert_eq!(conn.stats.active_connections.load(Ordering::Relaxed), 0);
        assert_eq!(conn.stats.commands_processed.load(Ordering::Relaxed), 1);
        assert_eq!(conn.stats.bytes_read.load(Ordering::Relaxed), 7);
        assert_eq!(conn.stats.bytes_written.load(Ordering::Relaxed), 7);
    }

    #[tokio::test]
    async fn test_close_mid_request_is_not_an_error() {
        let mut conn = connect(Arc::new(StorageEngine::new()));

        conn.client.write_all(b"*2\r\n$3\r\nget\r\n").await.unwrap();
        drop(conn.client);

        assert!(conn.task.await.unwrap().is_ok());
    }
}
