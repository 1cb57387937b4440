//! Channel redirector server.
//!
//! # Architecture Overview
//!
//! ```text
//!   GET /{id}/path?q ──▶ http ──▶ resolver ──▶ gate ──▶ 302 Location
//!                                    │           └────▶ 200 challenge page
//!   POST /api/create ──▶ http ──▶ registry
//!   POST /api/update ──▶ http ──▶ registry
//!   POST /api/verify ──▶ http ──▶ gate ──▶ Set-Cookie access proof
//!                                    │
//!                                    ▼
//!                       resilience (timeout, read retry)
//!                                    │
//!                                    ▼
//!                       RecordStore (file | memory)
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use channel_redirect::config::load_or_default;
use channel_redirect::lifecycle::signals::wait_for_signal;
use channel_redirect::observability::{logging, metrics};
use channel_redirect::{store, HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "channel-redirect")]
#[command(about = "Redirects /{channel_id}/... to a registered host and port", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "CHANNEL_REDIRECT_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_or_default(args.config.as_deref())?;

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "channel-redirect starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        store_backend = ?config.store.backend,
        store_path = %config.store.path,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let store = store::from_config(&config.store);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    let server = HttpServer::new(config, store);
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
