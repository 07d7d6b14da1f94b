//! Budget tracker backend: expense tracking, spending analytics and a
//! monthly savings goal, served over a JSON REST API.

pub mod backend;
pub mod config;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::AppConfig;

/// Build the backend from `config` and serve it until the process exits
pub async fn run(config: AppConfig) -> Result<()> {
    let app_state = backend::initialize_backend(&config)?;
    let app = backend::create_router(app_state, &config.server)?;

    let address = config.server.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("Starting server on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
