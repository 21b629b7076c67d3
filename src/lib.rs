//! # ShelfKV - A Small In-Memory Multi-Database Store
//!
//! ShelfKV keeps named hash tables, stacks, queues and sets inside named
//! databases, and serves them over a plain-text TCP protocol. The hash table
//! resolves collisions itself with open addressing and double hashing.
//!
//! ## Architecture
//!
//! ```text
//!  client ──TCP──► server::accept_loop
//!                        │ one task per socket
//!                        ▼
//!             connection::ConnectionHandler     reads bursts, splits lines
//!                        │
//!                        ▼
//!             protocol::parse_request           no lock held
//!                        │
//!                        ▼
//!             commands::CommandHandler ── lock ──► storage::Registry
//!                                                    └─ Database
//!                                                        ├─ HashTable
//!                                                        ├─ Stack / Queue
//!                                                        └─ Set
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use shelfkv::commands::CommandHandler;
//! use shelfkv::connection::{ConnectionLimits, ConnectionStats};
//! use shelfkv::server::accept_loop;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let handler = CommandHandler::with_table_capacity(512);
//!     let stats = Arc::new(ConnectionStats::new());
//!     let listener = TcpListener::bind("127.0.0.1:6379").await?;
//!
//!     accept_loop(listener, handler, ConnectionLimits::default(), stats).await
//! }
//! ```
//!
//! ## Protocol
//!
//! ```text
//! x db1 "HSET table1 foo bar"      (no reply)
//! x db1 "HGET table1 foo"          bar
//! x db1 "SPUSH s1 a"               (no reply)
//! x db1 "SPOP s1"                  a
//! dump db1                         (logged server-side, no reply)
//! ```
//!
//! ## Module Overview
//!
//! - [`storage`]: Hash table, stack, queue, set, database and registry
//! - [`protocol`]: Message framing, request parsing, reply encoding
//! - [`commands`]: Dispatch of requests under the global lock
//! - [`connection`]: Per-client read/execute/reply loop
//! - [`server`]: TCP accept loop
//! - [`client`]: Async client for the line protocol
//! - [`config`]: Command-line configuration

pub mod client;
pub mod commands;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod server;
pub mod storage;

// Re-export commonly used types for convenience
pub use client::Client;
pub use commands::CommandHandler;
pub use config::Config;
pub use connection::{handle_connection, ConnectionLimits, ConnectionStats};
pub use protocol::{parse_request, Command, ParseError, Reply, Request};
pub use storage::{HashTable, Queue, Registry, Set, Stack, StoreError};

/// The default port ShelfKV listens on
pub const DEFAULT_PORT: u16 = 6379;

/// The default host ShelfKV binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of ShelfKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
