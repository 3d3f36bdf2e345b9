mod app;
mod auth;
mod db;
mod error;
mod permission;
mod routes;
mod state;
mod store;

use anyhow::Result;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

const DEFAULT_PORT: u16 = 8365;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let pool = db::init_pool().await?;
    let state = AppState::new(pool);
    if let Some(pool) = &state.db {
        db::load_store(pool, &state.store).await?;
    }

    let port = std::env::var("KITH_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!("kith-server listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app::app(state)).await?;

    Ok(())
}
