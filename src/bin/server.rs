//! wsdsp Server Binary
//!
//! Starts the WebSocket DSP server.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};
use wsdsp::config::{UnknownCommandPolicy, DEFAULT_RING_DEPTH};
use wsdsp::network::Server;
use wsdsp::Config;

/// wsdsp Server
#[derive(Parser, Debug)]
#[command(name = "wsdsp-server")]
#[command(about = "WebSocket subprotocol server for chained DSP commands")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7681")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "64")]
    max_connections: usize,

    /// Slots in each per-connection ring
    #[arg(short, long, default_value_t = DEFAULT_RING_DEPTH)]
    ring_depth: usize,

    /// Largest accepted WebSocket message in MB
    #[arg(long, default_value = "16")]
    max_message_mb: usize,

    /// Stop after the first connection that received a response closes
    #[arg(long)]
    one_shot: bool,

    /// Refuse requests that contain unknown commands instead of skipping them
    #[arg(long)]
    reject_unknown: bool,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,wsdsp=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("wsdsp Server v{}", wsdsp::VERSION);
    tracing::info!("Listen address: {}", args.listen);

    let policy = if args.reject_unknown {
        UnknownCommandPolicy::Reject
    } else {
        UnknownCommandPolicy::Skip
    };

    // Build config from args
    let config = Config::builder()
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .ring_depth(args.ring_depth)
        .max_message_size(args.max_message_mb * 1024 * 1024)
        .exit_after_response(args.one_shot)
        .unknown_command_policy(policy)
        .build();

    let server = match Server::bind(config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    let summary = match server.run() {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!("Server error: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Server stopped: {} connections, {} failed, {} requests processed",
        summary.connections,
        summary.failed_connections,
        summary.messages_processed
    );

    if args.one_shot && !summary.completed {
        tracing::error!("One-shot session ended without writing a response");
        std::process::exit(1);
    }
}
