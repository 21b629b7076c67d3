//! Command execution.
//!
//! [`CommandHandler`] is the only path into the registry. It turns a raw
//! message into a [`Request`](crate::protocol::Request) without holding any
//! lock, then takes the global registry lock for exactly one command.

pub mod handler;

pub use handler::CommandHandler;
