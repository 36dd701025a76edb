//! The Kraken application: starts the tracker/announce HTTP server and
//! waits for a shutdown signal.
use std::net::SocketAddr;
use std::sync::Arc;

use kraken_configuration::Configuration;
use tokio::task::JoinHandle;
use tracing::info;

use crate::servers::signals;
use crate::servers::tracker::{self, AppState};

/// Starts the tracker server and returns its join handle; the server shuts
/// down gracefully on `ctrl_c` or `SIGTERM`.
///
/// # Panics
///
/// Panics if `config.tracker.bind_address` does not parse as a socket
/// address.
pub fn start(config: &Configuration, state: Arc<AppState>) -> JoinHandle<()> {
    let addr: SocketAddr = config.tracker.bind_address.parse().expect("bind_address must be a valid socket address");
    let router = tracker::router(state);

    tokio::spawn(async move {
        info!(%addr, "starting tracker server");
        let listener = tokio::net::TcpListener::bind(addr).await.expect("failed to bind tracker server");
        axum::serve(listener, router)
            .with_graceful_shutdown(signals::global_shutdown_signal())
            .await
            .expect("tracker server failed");
    })
}
