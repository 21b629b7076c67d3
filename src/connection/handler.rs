//! Per-Connection Loop
//!
//! One task per client. The task owns its socket and its read buffer; the
//! only thing it shares with other tasks is the [`CommandHandler`] (and
//! through it, the registry lock) plus the [`ConnectionStats`] counters.
//!
//! ## Cycle
//!
//! ```text
//!        ┌──────────────── read (<= max_request_size) ◄─────────────────┐
//!        │                                                                │
//!        ▼                                                                │
//!   split at '\n' ──► blank? skip ──► execute (lock held) ──► reply? ────┤
//!        │                                                                │
//!        └── unterminated tail ──► kept for the next read ───────────────┘
//! ```
//!
//! A line cut off at the end of a read is completed by the following read.
//! An unterminated tail is dispatched on its own only when the connection
//! has never sent a newline and the read came back short, or when the peer
//! closes. That covers clients that send one bare command per connection.
//! A single line longer than the read cap is dropped with an error reply.
//!
//! The task ends when the peer closes or the socket fails. Either way the
//! rest of the server is unaffected.

use crate::commands::CommandHandler;
use crate::protocol::{is_blank, next_frame, Frame, ParseError, Reply};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, info, trace, warn};

/// Default cap on a single read, in bytes
pub const DEFAULT_MAX_REQUEST_SIZE: usize = 1024;

/// Default cap on a reply line, in bytes (newline included)
pub const DEFAULT_MAX_REPLY_SIZE: usize = 512;

/// Fixed buffer sizes for one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionLimits {
    /// Largest number of bytes taken from the socket in one read
    pub max_request_size: usize,
    /// Reply lines are truncated to this many bytes
    pub max_reply_size: usize,
}

impl Default for ConnectionLimits {
    fn default() -> Self {
        Self {
            max_request_size: DEFAULT_MAX_REQUEST_SIZE,
            max_reply_size: DEFAULT_MAX_REPLY_SIZE,
        }
    }
}

/// Server-wide traffic counters, updated by every connection task.
#[derive(Debug, Default)]
pub struct ConnectionStats {
    accepted: AtomicU64,
    active: AtomicU64,
    messages: AtomicU64,
    bytes_in: AtomicU64,
    bytes_out: AtomicU64,
}

/// Point-in-time copy of [`ConnectionStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub accepted: u64,
    pub active: u64,
    pub messages: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            accepted: self.accepted.load(Ordering::Relaxed),
            active: self.active.load(Ordering::Relaxed),
            messages: self.messages.load(Ordering::Relaxed),
            bytes_in: self.bytes_in.load(Ordering::Relaxed),
            bytes_out: self.bytes_out.load(Ordering::Relaxed),
        }
    }

    fn opened(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
        self.active.fetch_add(1, Ordering::Relaxed);
    }

    fn closed(&self) {
        self.active.fetch_sub(1, Ordering::Relaxed);
    }

    fn dispatched(&self) {
        self.messages.fetch_add(1, Ordering::Relaxed);
    }

    fn received(&self, n: usize) {
        self.bytes_in.fetch_add(n as u64, Ordering::Relaxed);
    }

    fn sent(&self, n: usize) {
        self.bytes_out.fetch_add(n as u64, Ordering::Relaxed);
    }
}

/// Why a connection task stopped.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("socket error: {0}")]
    Io(#[from] io::Error),

    /// The peer closed its end (read returned zero bytes).
    #[error("peer closed the connection")]
    Closed,
}

impl ConnectionError {
    /// True for the ordinary ways a client goes away.
    fn is_hangup(&self) -> bool {
        match self {
            ConnectionError::Closed => true,
            ConnectionError::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::ConnectionReset | io::ErrorKind::BrokenPipe
            ),
        }
    }
}

/// What the pending bytes yielded.
enum Incoming {
    Line(Bytes),
    TooLong,
}

/// State of one client connection.
///
/// Generic over the stream so the loop can be driven by a mock in tests.
pub struct ConnectionHandler<S> {
    stream: BufWriter<S>,
    peer: SocketAddr,
    /// Received bytes not yet dispatched
    pending: BytesMut,
    /// The client has terminated at least one line with a newline
    line_framed: bool,
    /// The last read returned less than the cap
    short_read: bool,
    /// The peer closed its side
    eof: bool,
    /// Skipping the rest of an over-long line
    discarding: bool,
    commands: CommandHandler,
    limits: ConnectionLimits,
    stats: Arc<ConnectionStats>,
}

impl<S> ConnectionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(
        stream: S,
        peer: SocketAddr,
        commands: CommandHandler,
        limits: ConnectionLimits,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        stats.opened();

        Self {
            stream: BufWriter::new(stream),
            peer,
            pending: BytesMut::with_capacity(limits.max_request_size),
            line_framed: false,
            short_read: false,
            eof: false,
            discarding: false,
            commands,
            limits,
            stats,
        }
    }

    /// Serves the client until it leaves or the socket fails.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        info!(client = %self.peer, "Client connected");

        let result = self.serve().await;

        match &result {
            Err(e) if e.is_hangup() => info!(client = %self.peer, "Client disconnected"),
            Err(e) => warn!(client = %self.peer, error = %e, "Connection failed"),
            Ok(()) => {}
        }

        self.stats.closed();
        result
    }

    async fn serve(&mut self) -> Result<(), ConnectionError> {
        loop {
            self.dispatch_pending().await?;

            if !self.fill().await? {
                // A final unterminated line still gets executed.
                self.eof = true;
                self.dispatch_pending().await?;
                return Err(ConnectionError::Closed);
            }
        }
    }

    /// Executes every complete message currently buffered, in order.
    async fn dispatch_pending(&mut self) -> Result<(), ConnectionError> {
        while let Some(incoming) = self.take_message() {
            let reply = match incoming {
                Incoming::Line(message) => {
                    trace!(client = %self.peer, bytes = message.len(), "Dispatching message");
                    self.commands.execute(&message)
                }
                Incoming::TooLong => {
                    let err = ParseError::TooLong {
                        limit: self.limits.max_request_size,
                    };
                    warn!(client = %self.peer, error = %err, "Dropped over-long request");
                    Some(Reply::error(format!("ERR {}", err)))
                }
            };
            self.stats.dispatched();

            if let Some(reply) = reply {
                self.write_reply(&reply).await?;
            }
        }
        Ok(())
    }

    /// Pops the next non-blank message off the pending bytes.
    fn take_message(&mut self) -> Option<Incoming> {
        let cap = self.limits.max_request_size;
        loop {
            if self.discarding {
                match self.pending.iter().position(|&b| b == b'\n') {
                    Some(pos) => {
                        self.pending.advance(pos + 1);
                        self.discarding = false;
                        self.line_framed = true;
                    }
                    None => {
                        self.pending.clear();
                        return None;
                    }
                }
            }

            let tail_complete = self.eof || (self.short_read && !self.line_framed);
            match next_frame(&self.pending, cap, tail_complete)? {
                Frame::Message { len, consumed } => {
                    if consumed > len {
                        self.line_framed = true;
                    }
                    let mut frame = self.pending.split_to(consumed);
                    frame.truncate(len);
                    if !is_blank(&frame) {
                        return Some(Incoming::Line(frame.freeze()));
                    }
                }
                Frame::TooLong {
                    consumed,
                    terminated,
                } => {
                    self.pending.advance(consumed);
                    self.discarding = !terminated;
                    return Some(Incoming::TooLong);
                }
            }
        }
    }

    /// Reads at most `max_request_size` bytes. Returns false at end of stream.
    async fn fill(&mut self) -> Result<bool, ConnectionError> {
        let cap = self.limits.max_request_size;
        self.pending.reserve(cap);

        let mut window = (&mut self.pending).limit(cap);
        let n = self.stream.get_mut().read_buf(&mut window).await?;
        if n == 0 {
            return Ok(false);
        }

        self.short_read = n < cap;
        self.stats.received(n);
        trace!(client = %self.peer, bytes = n, "Read burst");
        Ok(true)
    }

    async fn write_reply(&mut self, reply: &Reply) -> Result<(), ConnectionError> {
        let line = reply.serialize_bounded(self.limits.max_reply_size);
        self.stream.write_all(&line).await?;
        self.stream.flush().await?;

        self.stats.sent(line.len());
        trace!(client = %self.peer, bytes = line.len(), "Sent reply");
        Ok(())
    }
}

/// Runs one connection to completion. The outcome is logged by
/// [`ConnectionHandler::run`].
pub async fn handle_connection<S>(
    stream: S,
    peer: SocketAddr,
    commands: CommandHandler,
    limits: ConnectionLimits,
    stats: Arc<ConnectionStats>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let result = ConnectionHandler::new(stream, peer, commands, limits, stats)
        .run()
        .await;
    if let Err(e) = result {
        debug!(client = %peer, error = %e, "Connection task finished");
    }
}
