//! Mock API Server - CLI Entry Point

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use mock_api_server::{ChaosConfig, MockServer, ServerConfig};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "mock-api-server",
    about = "Configurable mock REST API server - generic CRUD, JSON Patch, and failure injection",
    version
)]
struct Args {
    /// Path to the OpenAPI document to serve
    #[arg(long)]
    openapi: Option<PathBuf>,

    /// Path to the JSON dataset file
    #[arg(long)]
    data: Option<PathBuf>,

    /// Fixed latency added to every request, in milliseconds
    #[arg(long, default_value_t = 0)]
    latency_ms: u64,

    /// Percentage of requests (0-100) answered with an injected error
    #[arg(long, default_value_t = 0)]
    error_rate: u8,

    /// Address to listen on
    #[arg(short, long, default_value = "0.0.0.0:3000")]
    listen: SocketAddr,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: Level,

    /// Load and validate the configured inputs, then exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = ServerConfig {
        bind_addr: args.listen,
        openapi_spec: args.openapi,
        dataset: args.data,
        chaos: ChaosConfig {
            latency: Duration::from_millis(args.latency_ms),
            error_rate: args.error_rate,
        },
    };

    let server = MockServer::new(config)?;
    let (object_types, objects) = server.store().stats().await;

    if args.validate {
        println!("Configuration is valid ({object_types} object types, {objects} objects)");
        return Ok(());
    }

    info!(
        object_types,
        objects,
        spec_loaded = server.spec_loaded(),
        latency_ms = args.latency_ms,
        error_rate = args.error_rate,
        "mock API server initialized"
    );

    server.serve().await
}
