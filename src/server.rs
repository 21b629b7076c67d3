//! TCP listener: accepts clients and spawns one handler task per connection.
//!
//! Tasks are independent; none supervises another. A failing connection
//! ends only its own task, while a failing `accept` ends the loop and is
//! treated as fatal by the caller.

use crate::commands::CommandHandler;
use crate::connection::{handle_connection, ConnectionLimits, ConnectionStats};
use std::io;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error};

/// Accepts connections forever, or until `accept` fails.
pub async fn accept_loop(
    listener: TcpListener,
    handler: CommandHandler,
    limits: ConnectionLimits,
    stats: Arc<ConnectionStats>,
) -> io::Result<()> {
    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!("Failed to accept connection: {}", e);
                return Err(e);
            }
        };
        debug!(client = %addr, "Accepted connection");

        let handler = handler.clone();
        let stats = Arc::clone(&stats);

        // Spawn a task to handle this connection
        tokio::spawn(async move {
            handle_connection(stream, addr, handler, limits, stats).await;
        });
    }
}
