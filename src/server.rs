//! Accept loop and per-connection worker spawn.
//!
//! Accept failures are logged and the loop continues; only a failure to
//! bind the listening socket is fatal. Workers are spawned detached, the
//! acceptor never awaits a connection's completion.

use std::sync::Arc;

use tokio::net::TcpListener;

use crate::cache::CacheStore;
use crate::pipeline::handle_connection;

/// Binds `port` and serves forever. Returns only on a bind failure.
pub async fn run(port: u16, cache: Arc<CacheStore>) -> std::io::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "listening");

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                tracing::debug!(%addr, "accepted connection");
                let cache = Arc::clone(&cache);
                tokio::spawn(async move {
                    handle_connection(stream, cache).await;
                });
            }
            Err(err) => {
                tracing::warn!(%err, "accept failed, continuing");
            }
        }
    }
}
