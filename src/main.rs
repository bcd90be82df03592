use anyhow::Context;
use tracing::info;

use stock_ledger::auth::SessionStore;
use stock_ledger::config::{self, ServerConfig};
use stock_ledger::models::AppState;
use stock_ledger::routes;
use stock_ledger::storage::Storage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::init_tracing();
    let config = ServerConfig::from_env();
    let storage = Storage::new(&config.database_url)
        .await
        .context("Error initializing storage")?;
    let sessions = SessionStore::new();
    sessions.seed_from_env().await;
    let state = AppState::new(storage, sessions);
    let app = routes::init(state);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .context("bind failed")?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await.context("server failed")?;
    Ok(())
}
