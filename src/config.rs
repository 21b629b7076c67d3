//! Server configuration, parsed from the command line.

use crate::connection::{ConnectionLimits, DEFAULT_MAX_REPLY_SIZE, DEFAULT_MAX_REQUEST_SIZE};
use crate::storage::DEFAULT_CAPACITY;
use crate::{DEFAULT_HOST, DEFAULT_PORT};
use clap::Parser;

/// ShelfKV - in-memory hash tables, stacks, queues and sets over TCP
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "shelfkv-server", version, about)]
pub struct Config {
    /// Host to bind to
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Slots per hash table and set (rounded up to a power of two)
    #[arg(long, default_value_t = DEFAULT_CAPACITY, value_parser = parse_positive)]
    pub table_capacity: usize,

    /// Largest number of bytes read from a client at once
    #[arg(long, default_value_t = DEFAULT_MAX_REQUEST_SIZE, value_parser = parse_positive)]
    pub max_request_size: usize,

    /// Reply lines longer than this many bytes are truncated
    #[arg(long, default_value_t = DEFAULT_MAX_REPLY_SIZE, value_parser = parse_positive)]
    pub max_reply_size: usize,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            table_capacity: DEFAULT_CAPACITY,
            max_request_size: DEFAULT_MAX_REQUEST_SIZE,
            max_reply_size: DEFAULT_MAX_REPLY_SIZE,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Buffer limits applied to every connection.
    pub fn limits(&self) -> ConnectionLimits {
        ConnectionLimits {
            max_request_size: self.max_request_size,
            max_reply_size: self.max_reply_size,
        }
    }
}

fn parse_positive(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be greater than zero".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}
