use axum::extract::State;
use axum::Json;
use issue_core::{Board, BoardError};

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/board: the board as parsed from disk right now.
pub async fn get_board(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let file = app.board.clone();
    let result = tokio::task::spawn_blocking(move || {
        let board = file.load()?;
        Ok::<_, BoardError>(serde_json::to_value(&board)?)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

/// PUT /api/board: replace the whole board (drag-and-drop reorder).
pub async fn put_board(
    State(app): State<AppState>,
    Json(board): Json<Board>,
) -> Result<Json<serde_json::Value>, AppError> {
    board.check()?;

    let guard = app.lock().await;
    let file = app.board.clone();
    tokio::task::spawn_blocking(move || {
        let _guard = guard;
        file.save(&board)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(serde_json::json!({ "ok": true })))
}

/// GET /api/health
pub async fn health(State(app): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "ok": true,
        "board": app.board.path().display().to_string(),
        "exists": app.board.exists(),
    }))
}
