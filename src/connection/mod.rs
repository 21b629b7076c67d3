//! Client connections.
//!
//! [`handle_connection`] drives one socket: it reads bursts of at most
//! [`ConnectionLimits::max_request_size`] bytes, splits them into messages,
//! runs each through the shared [`CommandHandler`](crate::commands::CommandHandler)
//! and writes back whatever reply line the command produced. Traffic totals
//! for all connections accumulate in one [`ConnectionStats`].

pub mod handler;

pub use handler::{
    handle_connection, ConnectionError, ConnectionHandler, ConnectionLimits, ConnectionStats,
    StatsSnapshot, DEFAULT_MAX_REPLY_SIZE, DEFAULT_MAX_REQUEST_SIZE,
};
