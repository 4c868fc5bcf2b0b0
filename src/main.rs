//! toon-http demo server.
//!
//! Serves `GET /health`, `GET /api/users` and `POST /api/echo`. The `/api`
//! routes speak TOON to clients that send `Content-Type: text/toon` or
//! `Accept: text/toon`, and JSON to everyone else.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use toon_http::config::ConfigWatcher;
use toon_http::http::HttpServer;
use toon_http::lifecycle::signals::wait_for_signal;
use toon_http::lifecycle::startup::{
    apply_environment, init_observability, load_startup_config, TOON_ENV,
};
use toon_http::lifecycle::{ServerError, Shutdown};

#[derive(Parser)]
#[command(name = "toon-http")]
#[command(about = "Demo server with TOON content negotiation", long_about = None)]
struct Args {
    /// Path to a TOML config file. Watched for changes when given.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    serve(args).await?;
    Ok(())
}

async fn serve(args: Args) -> Result<(), ServerError> {
    let config = load_startup_config(args.config.as_deref())?;
    init_observability(&config)?;

    tracing::info!("toon-http v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        content_type = %config.toon.content_type,
        error_handling = ?config.toon.error_handling,
        production = config.toon.production,
        global = config.toon.global,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let (update_tx, update_rx) = mpsc::unbounded_channel();

    let _watcher = match &args.config {
        Some(path) => {
            let (watcher, mut file_updates) = ConfigWatcher::new(path);
            let handle = watcher.run()?;
            tokio::spawn(async move {
                while let Some(config) = file_updates.recv().await {
                    let env = std::env::var(TOON_ENV).ok();
                    if update_tx.send(apply_environment(config, env.as_deref())).is_err() {
                        break;
                    }
                }
            });
            Some(handle)
        }
        None => None,
    };

    let server = HttpServer::new(config);
    let mut server_task = tokio::spawn(server.run(listener, update_rx, shutdown.subscribe()));

    tokio::select! {
        result = &mut server_task => {
            result??;
            return Ok(());
        }
        _ = wait_for_signal(&shutdown) => {}
    }

    server_task.await??;
    tracing::info!("Shutdown complete");
    Ok(())
}
