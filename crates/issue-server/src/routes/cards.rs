use axum::extract::{Path, State};
use axum::Json;
use issue_core::ops::{self, CardEdit};
use issue_core::{Board, BoardError, Card, Meta};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AddCardBody {
    pub column: String,
    pub title: String,
    #[serde(default)]
    pub meta: Meta,
    #[serde(default)]
    pub body: String,
}

#[derive(Deserialize)]
pub struct MoveCardBody {
    pub from_column: String,
    pub from_index: usize,
    pub to_column: String,
    pub to_index: usize,
}

#[derive(Deserialize)]
pub struct EditCardBody {
    pub title: String,
    #[serde(default)]
    pub meta: Meta,
    #[serde(default)]
    pub body: String,
}

/// Run one read-modify-write under the board lock and return the new board.
async fn mutate<F>(app: AppState, f: F) -> Result<Json<serde_json::Value>, AppError>
where
    F: FnOnce(&mut Board) -> issue_core::Result<()> + Send + 'static,
{
    let guard = app.lock().await;
    let file = app.board.clone();
    let result = tokio::task::spawn_blocking(move || {
        let _guard = guard;
        let board = file.update(|board| {
            f(board)?;
            Ok(board.clone())
        })?;
        Ok::<_, BoardError>(serde_json::to_value(&board)?)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

/// POST /api/cards: append a card to a column.
pub async fn add_card(
    State(app): State<AppState>,
    Json(body): Json<AddCardBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    mutate(app, move |board| {
        let mut card = Card::new(body.title);
        card.meta = body.meta;
        card.body = body.body;
        if !card.body.is_empty() {
            card.ensure_expansion_flag();
        }
        ops::add_card(board, &body.column, card).map(|_| ())
    })
    .await
}

/// PUT /api/cards/move: move a card; the destination index is clamped.
pub async fn move_card(
    State(app): State<AppState>,
    Json(body): Json<MoveCardBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    mutate(app, move |board| {
        ops::move_card(
            board,
            &body.from_column,
            body.from_index,
            &body.to_column,
            body.to_index,
        )
        .map(|_| ())
    })
    .await
}

/// PUT /api/cards/{column}/{index}: replace a card's title, meta and body.
pub async fn edit_card(
    State(app): State<AppState>,
    Path((column, index)): Path<(String, usize)>,
    Json(body): Json<EditCardBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    mutate(app, move |board| {
        let edit = CardEdit::replace(body.title, body.meta, body.body);
        ops::edit_card(board, &column, index, edit).map(|_| ())
    })
    .await
}

/// DELETE /api/cards/{column}/{index}
pub async fn delete_card(
    State(app): State<AppState>,
    Path((column, index)): Path<(String, usize)>,
) -> Result<Json<serde_json::Value>, AppError> {
    mutate(app, move |board| {
        let card = ops::delete_card(board, &column, index)?;
        tracing::debug!(column = %column, title = %card.title, "deleted card");
        Ok(())
    })
    .await
}
