//! Request Parser
//!
//! Turns one raw message into a [`Request`]. Parsing happens before the
//! registry lock is taken, and every verb's argument count is checked here,
//! so the dispatcher never indexes past the end of an argument list.
//!
//! ## Message Shape
//!
//! ```text
//!   x   db1   "HSET table1 foo bar"
//!   │    │      │
//!   │    │      └── verb + positional arguments, quotes stripped per token
//!   │    └───────── database name
//!   └────────────── tag (ignored, except the literal `dump`)
//! ```
//!
//! A single `--flag` token may sit between the database and the command, so
//! `--file siteDB --query "HGET links abc"` parses the same as
//! `x siteDB "HGET links abc"`.
//!
//! Framing lives here too: [`next_frame`] splits a read buffer into messages.
//! A line cut off by the end of a full read waits for the next read.

use crate::protocol::types::{Command, Request, NEWLINE};
use thiserror::Error;

/// Quote character stripped from the ends of every token.
const QUOTE: char = '"';

/// Tag that selects the administrative dump form.
const DUMP_TAG: &str = "dump";

/// Errors for messages that cannot be turned into a request.
///
/// These are reported back to the client; the connection stays open.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Nothing but whitespace
    #[error("empty command")]
    EmptyInput,

    /// Message is not valid UTF-8
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(String),

    /// Only a tag was given
    #[error("missing database name")]
    MissingDatabase,

    /// Tag and database but no verb
    #[error("missing command")]
    MissingCommand,

    /// Verb outside the supported set
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// Too few or too many arguments for the verb
    #[error("wrong number of arguments for '{verb}' command")]
    WrongArity { verb: &'static str },

    /// A single line longer than the read cap
    #[error("request exceeds {limit} bytes")]
    TooLong { limit: usize },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Parses one message (with or without its trailing newline).
pub fn parse_request(message: &[u8]) -> ParseResult<Request> {
    let message =
        std::str::from_utf8(message).map_err(|e| ParseError::InvalidUtf8(e.to_string()))?;

    // A lone quote only delimits the command; `""` is an empty argument.
    let mut tokens = message
        .split_whitespace()
        .filter(|token| *token != "\"")
        .map(|token| token.trim_matches(QUOTE));

    let tag = tokens.next().ok_or(ParseError::EmptyInput)?;
    let database = tokens.next().ok_or(ParseError::MissingDatabase)?.to_string();

    if tag.eq_ignore_ascii_case(DUMP_TAG) {
        return Ok(Request::Dump { database });
    }

    let mut rest: Vec<&str> = tokens.collect();
    if rest.first().is_some_and(|token| token.starts_with("--")) {
        rest.remove(0);
    }

    let (verb, args) = rest.split_first().ok_or(ParseError::MissingCommand)?;
    let command = parse_command(verb, args)?;

    Ok(Request::Query { database, command })
}

/// Builds a [`Command`] from a verb (any case) and its arguments.
pub fn parse_command(verb: &str, args: &[&str]) -> ParseResult<Command> {
    let command = match verb.to_ascii_uppercase().as_str() {
        "SPUSH" => {
            let [stack, value] = arguments("SPUSH", args)?;
            Command::SPush { stack, value }
        }
        "SPOP" => {
            let [stack] = arguments("SPOP", args)?;
            Command::SPop { stack }
        }
        "QPUSH" => {
            let [queue, value] = arguments("QPUSH", args)?;
            Command::QPush { queue, value }
        }
        "QPOP" => {
            let [queue] = arguments("QPOP", args)?;
            Command::QPop { queue }
        }
        "HSET" => {
            let [table, key, value] = arguments("HSET", args)?;
            Command::HSet { table, key, value }
        }
        "HGET" => {
            let [table, key] = arguments("HGET", args)?;
            Command::HGet { table, key }
        }
        "HDEL" => {
            let [table, key] = arguments("HDEL", args)?;
            Command::HDel { table, key }
        }
        "SADD" => {
            let [set, value] = arguments("SADD", args)?;
            Command::SAdd { set, value }
        }
        "SREM" => {
            let [set, value] = arguments("SREM", args)?;
            Command::SRem { set, value }
        }
        "SISMEMBER" => {
            let [set, value] = arguments("SISMEMBER", args)?;
            Command::SIsMember { set, value }
        }
        _ => return Err(ParseError::UnknownCommand(verb.to_string())),
    };
    Ok(command)
}

/// Checks that exactly `N` arguments were given and takes ownership of them.
fn arguments<const N: usize>(verb: &'static str, args: &[&str]) -> ParseResult<[String; N]> {
    let args: [&str; N] = args
        .try_into()
        .map_err(|_| ParseError::WrongArity { verb })?;
    Ok(args.map(str::to_string))
}

/// One step of splitting a read buffer into messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    /// A message of `len` bytes. `consumed` includes the newline, if any.
    Message { len: usize, consumed: usize },

    /// A line longer than the request cap. Drop `consumed` bytes; when
    /// `terminated` is false the rest of the line is still to come.
    TooLong { consumed: usize, terminated: bool },
}

/// Finds the next message in `buf`.
///
/// A message ends at a newline and may be at most `max_len` bytes long.
/// Bytes without a newline form a message only once `burst_complete` says
/// nothing else is on its way; otherwise `None` asks for another read.
/// Returns `None` for an empty buffer.
pub fn next_frame(buf: &[u8], max_len: usize, burst_complete: bool) -> Option<Frame> {
    if buf.is_empty() {
        return None;
    }
    match buf.iter().position(|&b| b == NEWLINE) {
        Some(pos) if pos > max_len => Some(Frame::TooLong {
            consumed: pos + 1,
            terminated: true,
        }),
        Some(pos) => Some(Frame::Message {
            len: pos,
            consumed: pos + 1,
        }),
        None if buf.len() > max_len => Some(Frame::TooLong {
            consumed: buf.len(),
            terminated: false,
        }),
        None if burst_complete => Some(Frame::Message {
            len: buf.len(),
            consumed: buf.len(),
        }),
        None => None,
    }
}

/// True for messages that contain only whitespace (e.g. a bare `\r\n`).
pub fn is_blank(message: &[u8]) -> bool {
    message.iter().all(u8::is_ascii_whitespace)
}
