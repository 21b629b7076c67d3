//! ShelfKV server binary.
//!
//! Parses the configuration, sets up logging, binds the listener and serves
//! until Ctrl+C or a fatal accept error.

use anyhow::Context;
use clap::Parser;
use shelfkv::commands::CommandHandler;
use shelfkv::config::Config;
use shelfkv::connection::ConnectionStats;
use shelfkv::server::accept_loop;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    info!("ShelfKV v{}", shelfkv::VERSION);

    // One registry for the whole process, behind one lock
    let handler = CommandHandler::with_table_capacity(config.table_capacity);
    info!(
        table_capacity = config.table_capacity,
        max_request_size = config.max_request_size,
        max_reply_size = config.max_reply_size,
        "Registry initialized"
    );

    let stats = Arc::new(ConnectionStats::new());

    // A bind failure is fatal
    let listener = TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address()))?;
    info!("Listening on {}", config.bind_address());

    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received, stopping server...");
    };

    let result = tokio::select! {
        result = accept_loop(listener, handler.clone(), config.limits(), Arc::clone(&stats)) => {
            result.context("listener failed")
        }
        _ = shutdown => Ok(()),
    };

    let totals = stats.snapshot();
    info!(
        connections = totals.accepted,
        messages = totals.messages,
        bytes_in = totals.bytes_in,
        bytes_out = totals.bytes_out,
        databases = handler.registry().lock().len(),
        "Server shutdown complete"
    );

    result
}
