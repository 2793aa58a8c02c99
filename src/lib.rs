//! Recipe sharing backend.
//!
//! Users publish recipes built from tagged ingredients, follow each other,
//! keep favorites and compile a shopping list out of the recipes in their
//! cart. Everything is served as JSON under `/api`.

use std::sync::Arc;

use axum::Router;
use tokio::{
    net::TcpListener,
    signal::{self, ctrl_c},
};
use tracing::info;

pub mod auth;
pub mod config;
pub mod database;
pub mod digest;
pub mod error;
pub mod extract;
pub mod filters;
pub mod media;
pub mod routes;
pub mod shopping_list;
pub mod state;
pub mod store;
pub mod validation;
pub mod views;

use config::Config;
use state::AppState;

pub fn app(state: Arc<AppState>) -> Router {
    routes::router(state)
}

pub async fn start_server(config: Config) -> std::io::Result<()> {
    info!("Initializing state...");
    let port = config.port;
    let state = AppState::from_config(config)
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    let address = format!("0.0.0.0:{port}");
    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app(Arc::new(state)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
