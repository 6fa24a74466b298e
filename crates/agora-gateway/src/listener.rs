use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use crate::app::AppState;
use crate::connection::handle_connection;

/// Binds `bind:port`. Split out from `serve` so tests can bind an
/// ephemeral port (0) and learn the real address before accepting.
pub async fn bind(bind: &str, port: u16) -> std::io::Result<TcpListener> {
    let addr = format!("{bind}:{port}");
    TcpListener::bind(&addr).await
}

/// Accepts connections forever, spawning one handler task per connection.
pub async fn serve(state: Arc<AppState>, listener: TcpListener) -> std::io::Result<()> {
    info!(addr = %listener.local_addr()?, "agora gateway listening");
    loop {
        match listener.accept().await {
            Ok((socket, peer)) => {
                let state = state.clone();
                tokio::spawn(async move {
                    tracing::debug!(%peer, "accepted connection");
                    handle_connection(socket, state).await;
                });
            }
            Err(e) => {
                error!(error = %e, "accept failed");
            }
        }
    }
}

/// Bind and serve in one call — the production entry point.
pub async fn run(state: Arc<AppState>, bind_addr: &str, port: u16) -> std::io::Result<()> {
    let listener = bind(bind_addr, port).await?;
    serve(state, listener).await
}
