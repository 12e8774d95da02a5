//! REST facade over a markdown kanban board file, plus static serving of a
//! built web UI.

pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post, put};
use axum::Router;
use state::AppState;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let router = Router::new()
        .route("/api/health", get(routes::board::health))
        .route("/api/events", get(routes::events::board_events))
        // Board
        .route("/api/board", get(routes::board::get_board))
        .route("/api/board", put(routes::board::put_board))
        // Cards
        .route("/api/cards", post(routes::cards::add_card))
        .route("/api/cards/move", put(routes::cards::move_card))
        .route(
            "/api/cards/{column}/{index}",
            put(routes::cards::edit_card).delete(routes::cards::delete_card),
        );

    let router = match app_state.web_dist.as_deref().filter(|dir| dir.is_dir()) {
        Some(dist) => {
            let index = ServeFile::new(dist.join("index.html"));
            router.fallback_service(ServeDir::new(dist).not_found_service(index))
        }
        None => router.fallback(routes::not_found),
    };

    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Bind `127.0.0.1:<port>` and serve until Ctrl-C.
pub async fn serve(app_state: AppState, port: u16, open_browser: bool) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    serve_on(app_state, listener, open_browser).await
}

/// Serve on a pre-bound listener, so callers binding port 0 can read the
/// actual port first.
pub async fn serve_on(
    app_state: AppState,
    listener: tokio::net::TcpListener,
    open_browser: bool,
) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let board_path = app_state.board.path().display().to_string();
    let app = build_router(app_state);

    tracing::info!(board = %board_path, "kanban board listening on http://localhost:{actual_port}");

    if open_browser {
        let url = format!("http://localhost:{actual_port}");
        if let Err(e) = open::that(&url) {
            tracing::warn!(error = %e, "could not open browser");
        }
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
