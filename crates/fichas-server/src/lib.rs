pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;
use fichas_core::FichaStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(store: Arc<dyn FichaStore>) -> Router {
    let app_state = state::AppState::new(store);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/api/fichas",
            get(routes::fichas::list_fichas).post(routes::fichas::create_ficha),
        )
        .route("/api/fichas/pending", get(routes::fichas::list_pending))
        .route(
            "/api/fichas/bulk-discard-low",
            post(routes::fichas::bulk_discard_low),
        )
        .route("/api/fichas/stats/summary", get(routes::stats::summary))
        .route("/api/fichas/{id}", get(routes::fichas::get_ficha))
        .route(
            "/api/fichas/{id}/contact",
            patch(routes::fichas::mark_contacted),
        )
        .route(
            "/api/fichas/{id}/discard",
            patch(routes::fichas::mark_discarded),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Serve the API on `bind:port` until the process is stopped.
pub async fn serve(
    store: Arc<dyn FichaStore>,
    bind: &str,
    port: u16,
    open_browser: bool,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind((bind, port)).await?;
    serve_on(store, listener, open_browser).await
}

/// Serve on a pre-bound listener, so callers can bind port 0 and read back
/// the port the OS picked.
pub async fn serve_on(
    store: Arc<dyn FichaStore>,
    listener: tokio::net::TcpListener,
    open_browser: bool,
) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app = build_router(store);

    tracing::info!("fichas API listening on http://localhost:{actual_port}");

    if open_browser {
        let url = format!("http://localhost:{actual_port}/api/fichas/pending");
        if let Err(e) = open::that(&url) {
            tracing::warn!("could not open browser: {e}");
        }
    }

    axum::serve(listener, app).await?;
    Ok(())
}
