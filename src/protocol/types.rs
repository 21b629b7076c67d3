//! Protocol Data Types
//!
//! A decoded request is a closed set of variants: either the administrative
//! `dump`, or a [`Command`] addressed to one database. Every command has
//! already been checked for the right number of arguments by the time one of
//! these values exists.
//!
//! ## Wire Format
//!
//! ```text
//! request:   <tag> <database> [--flag] "<VERB> <arg> ..."\n
//! dump:      dump <database>\n
//! reply:     <text>\n                      (read verbs only)
//! ```
//!
//! ## Examples
//!
//! `x db1 "HSET table1 foo bar"`        no reply
//! `x db1 "HGET table1 foo"`            `bar\n`
//! `--file siteDB --query "HGET links abc"`   `Key not found\n`

use crate::storage::StoreError;
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

/// Reply line for a successful `HDEL` or `SREM`.
pub const REMOVED: &str = "Successfully removed";

/// Line terminator for replies
pub const NEWLINE: u8 = b'\n';

/// A fully validated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Log the state of a database server-side. Never replies.
    Dump { database: String },

    /// Run one command against a database, creating the database if needed.
    Query { database: String, command: Command },
}

/// One collection operation with its positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SPush { stack: String, value: String },
    SPop { stack: String },
    QPush { queue: String, value: String },
    QPop { queue: String },
    HSet { table: String, key: String, value: String },
    HGet { table: String, key: String },
    HDel { table: String, key: String },
    SAdd { set: String, value: String },
    SRem { set: String, value: String },
    SIsMember { set: String, value: String },
}

impl Command {
    /// Upper-case verb as it appears on the wire.
    pub fn verb(&self) -> &'static str {
        match self {
            Command::SPush { .. } => "SPUSH",
            Command::SPop { .. } => "SPOP",
            Command::QPush { .. } => "QPUSH",
            Command::QPop { .. } => "QPOP",
            Command::HSet { .. } => "HSET",
            Command::HGet { .. } => "HGET",
            Command::HDel { .. } => "HDEL",
            Command::SAdd { .. } => "SADD",
            Command::SRem { .. } => "SREM",
            Command::SIsMember { .. } => "SISMEMBER",
        }
    }

    /// Push/insert verbs succeed silently.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Command::SPush { .. } | Command::QPush { .. } | Command::HSet { .. } | Command::SAdd { .. }
        )
    }
}

/// A single reply line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A stored value (pop, HGET)
    Value(String),

    /// Result of SISMEMBER
    Bool(bool),

    /// HDEL / SREM succeeded
    Removed,

    /// Any failure, as human-readable text
    Error(String),
}

impl Reply {
    pub fn value(v: impl Into<String>) -> Self {
        Reply::Value(v.into())
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Reply::Error(msg.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }

    /// Encodes the reply as one newline-terminated line.
    pub fn serialize(&self) -> Bytes {
        self.serialize_bounded(usize::MAX)
    }

    /// Encodes the reply, cutting the text so the whole line (newline
    /// included) fits in `max_len` bytes. Cuts land on a char boundary.
    pub fn serialize_bounded(&self, max_len: usize) -> Bytes {
        let text = self.to_string();
        let limit = max_len.saturating_sub(1);
        let mut end = text.len().min(limit);
        while !text.is_char_boundary(end) {
            end -= 1;
        }

        let mut buf = BytesMut::with_capacity(end + 1);
        buf.put_slice(&text.as_bytes()[..end]);
        buf.put_u8(NEWLINE);
        buf.freeze()
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Value(v) => f.write_str(v),
            Reply::Bool(b) => write!(f, "{}", b),
            Reply::Removed => f.write_str(REMOVED),
            Reply::Error(e) => f.write_str(e),
        }
    }
}

impl From<StoreError> for Reply {
    fn from(err: StoreError) -> Self {
        Reply::Error(err.to_string())
    }
}
