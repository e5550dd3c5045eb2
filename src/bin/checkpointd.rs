//! Checkpoint HTTP server.
//!
//! # Usage
//!
//! ```bash
//! # Serve GET /check on 0.0.0.0:8080, rooms.json next to the binary
//! checkpointd
//!
//! # Custom document and address
//! CHECKPOINT_ROOMS_FILE=/var/lib/checkpoint/rooms.json CHECKPOINT_BIND=127.0.0.1:9000 checkpointd
//! ```

use std::sync::Arc;

use rs_checkpoint::{AccessCheckService, Config, FileStore};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let config = Config::from_env()?;
    let rooms_path = config.rooms_path();

    let service = Arc::new(AccessCheckService::new(FileStore::new(&rooms_path)));
    let app = rs_checkpoint::axum::router(service);

    let listener = TcpListener::bind(config.bind).await?;
    info!("checkpointd listening on {}", listener.local_addr()?);
    info!("  rooms file: {}", rooms_path.display());

    ::axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("checkpointd stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to register SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown signal received");
}
