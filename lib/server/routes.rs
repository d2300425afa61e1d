//! Router construction and serving of the management API.

use std::net::SocketAddr;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;

use crate::MonoboxResult;

use super::{handlers, state::ServerState};

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Creates the router of the management API.
pub fn create_router(state: ServerState) -> Router {
    Router::new()
        .route(
            "/containers",
            post(handlers::create_handler).get(handlers::list_handler),
        )
        .route(
            "/containers/{id}",
            get(handlers::status_handler).delete(handlers::remove_handler),
        )
        .route("/containers/{id}/start", post(handlers::start_handler))
        .route("/containers/{id}/stop", post(handlers::stop_handler))
        .with_state(state)
}

/// Binds the listener and serves the management API until the process exits.
pub async fn serve(state: ServerState, addr: SocketAddr) -> MonoboxResult<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("management api listening on {}", addr);

    let app = create_router(state);
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
