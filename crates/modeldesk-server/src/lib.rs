//! modeldesk-server: serves the compiled console and tells it where the
//! backend services live.

pub mod api;
pub mod state;

use std::net::SocketAddr;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::state::AppState;

pub use state::ServerConfig;

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api::router())
        .fallback(api::serve_frontend)
        .with_state(state)
        .layer(cors)
}

/// Bind and serve until the process is stopped.
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(
        models = %config.api.models_url(),
        runs = %config.api.model_runs_url(),
        "modeldesk console at http://{}",
        addr
    );

    let app = build_router(AppState::new(config.api));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
