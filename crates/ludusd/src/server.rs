//! HTTP server for ludusd.

use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::routes;
use crate::state::AppState;

/// Run the HTTP server until the process is stopped.
pub async fn run(state: AppState) -> Result<()> {
    let addr = state.config.bind_addr.clone();
    let state = Arc::new(state);

    let app = Router::new()
        .merge(routes::game_routes())
        .merge(routes::learner_routes())
        .merge(routes::leaderboard_routes())
        .merge(routes::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("  Listening on http://{addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
