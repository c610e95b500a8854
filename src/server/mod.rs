pub mod batch;
pub mod routes;
pub mod state;

pub use batch::*;
pub use routes::*;
pub use state::*;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

/// Build the full application router
pub fn router(state: AppState) -> Router {
    api_router().with_state(state)
}

/// Bind `addr` and serve until the process exits
pub async fn serve(state: AppState, addr: &str) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "listening");

    axum::serve(listener, router(state))
        .await
        .context("Server error")
}
