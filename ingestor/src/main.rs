use axum::{routing::get, Router};
use clap::Parser;
use std::sync::Arc;
use telemetry_ingestor::metrics;
use telemetry_ingestor::rest;
use telemetry_ingestor::shutdown;
use telemetry_ingestor::store::{TelemetryStore, DEFAULT_HISTORY};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// In-memory device telemetry API for running the simulators locally
#[derive(Debug, Parser)]
#[command(name = "telemetry-ingestor", version, about)]
struct Opts {
    /// Address to serve HTTP on
    #[arg(long, env = "HTTP_ADDR", default_value = "0.0.0.0:3000")]
    http_addr: String,

    /// Readings kept per device
    #[arg(long, env = "INGESTOR_HISTORY", default_value_t = DEFAULT_HISTORY)]
    history: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting telemetry ingestor");
    info!("History per device: {}", opts.history);

    let store = Arc::new(TelemetryStore::new(opts.history));

    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .merge(rest::create_router(store));

    let listener = tokio::net::TcpListener::bind(&opts.http_addr)
        .await
        .map_err(|e| {
            error!("Failed to bind to {}: {}", opts.http_addr, e);
            e
        })?;

    info!("HTTP server listening on {}", opts.http_addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::wait_for(tokio::signal::ctrl_c()))
        .await
    {
        error!("HTTP server error: {}", e);
    }

    info!("Shutting down");
    Ok(())
}

async fn metrics_handler() -> String {
    metrics::gather_metrics()
}
