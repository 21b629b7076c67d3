//! Async client for the ShelfKV line protocol.
//!
//! One client talks to one database. Write verbs (`hset`, `spush`, `qpush`,
//! `sadd`) do not wait for anything because the server sends nothing back on
//! success. The one exception is a write refused with `Table is full`. The
//! next read verb finds those lines ahead of its own reply, reads past them,
//! and returns [`ClientError::WriteRefused`] carrying its own reply.
//!
//! ## Example
//!
//! ```no_run
//! use shelfkv::client::Client;
//!
//! # async fn run() -> shelfkv::client::Result<()> {
//! let mut client = Client::connect("127.0.0.1:6379", "siteDB").await?;
//! client.hset("linksHashtable", "abc123", "https://example.com").await?;
//! let target = client.hget("linksHashtable", "abc123").await?;
//! assert_eq!(target.as_deref(), Some("https://example.com"));
//! # Ok(())
//! # }
//! ```

use crate::protocol::REMOVED;
use crate::storage::{CollectionKind, StoreError};
use bytes::{Buf, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::{TcpStream, ToSocketAddrs};

/// Tag token sent in front of every request.
const TAG: &str = "--file";

/// Flag token between the database and the quoted command.
const QUERY_FLAG: &str = "--query";

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The argument cannot be sent: the protocol has no escaping.
    #[error("invalid argument {0:?}: must be non-empty and free of whitespace and quotes")]
    InvalidArgument(String),

    /// The server answered with an error line.
    #[error("Server error: {0}")]
    Server(String),

    /// Earlier writes on this connection were refused because their table
    /// was full. `reply` is the raw reply to the call that noticed.
    #[error("{refused} earlier write(s) refused: table is full")]
    WriteRefused { refused: usize, reply: String },

    #[error("Connection closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, ClientError>;

pub struct Client {
    stream: BufWriter<TcpStream>,
    buffer: BytesMut,
    database: String,
}

impl Client {
    /// Connects to a server and targets `database` for every command.
    pub async fn connect(addr: impl ToSocketAddrs, database: impl Into<String>) -> Result<Self> {
        let database = database.into();
        check_argument(&database)?;

        let stream = TcpStream::connect(addr).await?;
        Ok(Self {
            stream: BufWriter::new(stream),
            buffer: BytesMut::with_capacity(512),
            database,
        })
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub async fn hset(&mut self, table: &str, key: &str, value: &str) -> Result<()> {
        self.send_command("HSET", &[table, key, value]).await
    }

    /// Returns `None` when the key or the table is absent.
    pub async fn hget(&mut self, table: &str, key: &str) -> Result<Option<String>> {
        self.send_command("HGET", &[table, key]).await?;
        self.read_value().await
    }

    /// Returns whether a key was removed.
    pub async fn hdel(&mut self, table: &str, key: &str) -> Result<bool> {
        self.send_command("HDEL", &[table, key]).await?;
        self.read_removed().await
    }

    pub async fn spush(&mut self, stack: &str, value: &str) -> Result<()> {
        self.send_command("SPUSH", &[stack, value]).await
    }

    /// Returns `None` when the stack is empty or absent.
    pub async fn spop(&mut self, stack: &str) -> Result<Option<String>> {
        self.send_command("SPOP", &[stack]).await?;
        self.read_value().await
    }

    pub async fn qpush(&mut self, queue: &str, value: &str) -> Result<()> {
        self.send_command("QPUSH", &[queue, value]).await
    }

    /// Returns `None` when the queue is empty or absent.
    pub async fn qpop(&mut self, queue: &str) -> Result<Option<String>> {
        self.send_command("QPOP", &[queue]).await?;
        self.read_value().await
    }

    pub async fn sadd(&mut self, set: &str, value: &str) -> Result<()> {
        self.send_command("SADD", &[set, value]).await
    }

    /// Returns whether a member was removed.
    pub async fn srem(&mut self, set: &str, value: &str) -> Result<bool> {
        self.send_command("SREM", &[set, value]).await?;
        self.read_removed().await
    }

    /// A missing set counts as not containing the value.
    pub async fn sismember(&mut self, set: &str, value: &str) -> Result<bool> {
        self.send_command("SISMEMBER", &[set, value]).await?;
        match self.read_value().await? {
            Some(line) => Ok(line == "true"),
            None => Ok(false),
        }
    }

    /// Asks the server to log the database. Nothing comes back.
    pub async fn dump(&mut self) -> Result<()> {
        let line = format!("dump {}\n", self.database);
        self.write_line(&line).await
    }

    async fn send_command(&mut self, verb: &str, args: &[&str]) -> Result<()> {
        let mut encoded = Vec::with_capacity(args.len());
        for arg in args {
            encoded.push(encode_argument(arg)?);
        }
        let line = format!(
            "{} {} {} \"{} {}\"\n",
            TAG,
            self.database,
            QUERY_FLAG,
            verb,
            encoded.join(" ")
        );
        self.write_line(&line).await
    }

    async fn write_line(&mut self, line: &str) -> Result<()> {
        self.stream.write_all(line.as_bytes()).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Reads one reply, mapping "absent" errors to `None`.
    async fn read_value(&mut self) -> Result<Option<String>> {
        let line = self.read_reply().await?;
        if is_absent(&line) {
            Ok(None)
        } else if is_error(&line) {
            Err(ClientError::Server(line))
        } else {
            Ok(Some(line))
        }
    }

    async fn read_removed(&mut self) -> Result<bool> {
        match self.read_value().await? {
            Some(line) if line == REMOVED => Ok(true),
            Some(line) => Err(ClientError::Server(line)),
            None => Ok(false),
        }
    }

    /// Reads the reply to the current call, past any refusals of earlier
    /// writes.
    async fn read_reply(&mut self) -> Result<String> {
        let table_full = StoreError::TableFull.to_string();
        let mut refused = 0;
        loop {
            let line = self.read_line().await?;
            if line != table_full {
                return match refused {
                    0 => Ok(line),
                    _ => Err(ClientError::WriteRefused {
                        refused,
                        reply: line,
                    }),
                };
            }
            refused += 1;
        }
    }

    async fn read_line(&mut self) -> Result<String> {
        loop {
            if let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
                let line = String::from_utf8_lossy(&self.buffer[..pos]).into_owned();
                self.buffer.advance(pos + 1);
                return Ok(line);
            }

            if 0 == self.stream.read_buf(&mut self.buffer).await? {
                return Err(ClientError::ConnectionClosed);
            }
        }
    }
}

/// Database names must be non-empty single tokens.
fn check_argument(arg: &str) -> Result<()> {
    if arg.is_empty() || arg.contains(|c: char| c.is_whitespace() || c == '"') {
        return Err(ClientError::InvalidArgument(arg.to_string()));
    }
    Ok(())
}

/// Command arguments may also be empty, sent as `""`.
fn encode_argument(arg: &str) -> Result<&str> {
    if arg.is_empty() {
        return Ok("\"\"");
    }
    check_argument(arg)?;
    Ok(arg)
}

/// Replies that mean "nothing there" rather than a failure.
fn is_absent(line: &str) -> bool {
    let absent = [
        StoreError::NotFound,
        StoreError::EmptyCollection(CollectionKind::Stack),
        StoreError::EmptyCollection(CollectionKind::Queue),
        StoreError::MissingCollection(CollectionKind::HashTable),
        StoreError::MissingCollection(CollectionKind::Stack),
        StoreError::MissingCollection(CollectionKind::Queue),
        StoreError::MissingCollection(CollectionKind::Set),
    ];
    absent.iter().any(|err| err.to_string() == line)
}

fn is_error(line: &str) -> bool {
    line.starts_with("ERR ")
}
