pub mod board;
pub mod cards;
pub mod events;

use axum::http::Uri;

use crate::error::AppError;

/// Fallback when no web UI is being served.
pub async fn not_found(uri: Uri) -> AppError {
    AppError::not_found(format!("no route for {}", uri.path()))
}
