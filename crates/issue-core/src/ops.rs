use crate::board::{self, Board, Card, Column, Meta, DONE_COLUMN};
use crate::error::{BoardError, Result};
use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// Edits
// ---------------------------------------------------------------------------

/// How to change a card's due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueChange {
    Set(NaiveDate),
    Clear,
}

/// Field replacements for [`edit_card`]. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct CardEdit {
    pub title: Option<String>,
    pub meta: Option<Meta>,
    pub body: Option<String>,
    pub due: Option<DueChange>,
}

impl CardEdit {
    /// Full replacement, as sent by the web UI.
    pub fn replace(title: impl Into<String>, meta: Meta, body: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            meta: Some(meta),
            body: Some(body.into()),
            due: None,
        }
    }

    /// Reject replacements the board file could not hold.
    pub fn check(&self) -> Result<()> {
        if let Some(title) = &self.title {
            board::check_heading("card title", title)?;
        }
        if let Some(meta) = &self.meta {
            board::check_meta(meta)?;
        }
        if let Some(body) = &self.body {
            board::check_body(body)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Append `card` to `column`. Returns its index.
pub fn add_card(board: &mut Board, column: &str, card: Card) -> Result<usize> {
    card.check()?;
    let col = column_mut(board, column)?;
    col.cards.push(card);
    Ok(col.cards.len() - 1)
}

/// Relocate a card. `to_index` past the end of the destination appends.
pub fn move_card<'a>(
    board: &'a mut Board,
    from_column: &str,
    from_index: usize,
    to_column: &str,
    to_index: usize,
) -> Result<&'a Card> {
    let from = column_position(board, from_column)?;
    let to = column_position(board, to_column)?;
    check_index(&board.columns[from], from_index)?;

    let card = board.columns[from].cards.remove(from_index);
    let dest = &mut board.columns[to].cards;
    let at = to_index.min(dest.len());
    dest.insert(at, card);
    Ok(&dest[at])
}

pub fn edit_card<'a>(
    board: &'a mut Board,
    column: &str,
    index: usize,
    edit: CardEdit,
) -> Result<&'a Card> {
    edit.check()?;
    let card = card_mut(board, column, index)?;
    let body_set = edit.body.as_deref().is_some_and(|b| !b.is_empty());
    if let Some(title) = edit.title {
        card.title = title;
    }
    if let Some(meta) = edit.meta {
        card.meta = meta;
    }
    match edit.due {
        Some(DueChange::Set(date)) => card.set_due(Some(date)),
        Some(DueChange::Clear) => card.set_due(None),
        None => {}
    }
    if let Some(body) = edit.body {
        card.body = body;
    }
    // Only a newly written body collapses the card.
    if body_set {
        card.ensure_expansion_flag();
    }
    Ok(card)
}

/// Move a card to the end of the `Done` column.
pub fn archive_card<'a>(board: &'a mut Board, column: &str, index: usize) -> Result<&'a Card> {
    let done_len = board
        .column(DONE_COLUMN)
        .map(|c| c.cards.len())
        .ok_or_else(|| BoardError::ColumnNotFound(DONE_COLUMN.to_string()))?;
    move_card(board, column, index, DONE_COLUMN, done_len)
}

/// Remove a card permanently and hand it back.
pub fn delete_card(board: &mut Board, column: &str, index: usize) -> Result<Card> {
    let col = column_mut(board, column)?;
    check_index(col, index)?;
    Ok(col.cards.remove(index))
}

pub fn card<'a>(board: &'a Board, column: &str, index: usize) -> Result<&'a Card> {
    let col = board
        .column(column)
        .ok_or_else(|| BoardError::ColumnNotFound(column.to_string()))?;
    check_index(col, index)?;
    Ok(&col.cards[index])
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn column_position(board: &Board, name: &str) -> Result<usize> {
    board
        .column_index(name)
        .ok_or_else(|| BoardError::ColumnNotFound(name.to_string()))
}

fn column_mut<'a>(board: &'a mut Board, name: &str) -> Result<&'a mut Column> {
    board
        .column_mut(name)
        .ok_or_else(|| BoardError::ColumnNotFound(name.to_string()))
}

fn card_mut<'a>(board: &'a mut Board, column: &str, index: usize) -> Result<&'a mut Card> {
    let col = column_mut(board, column)?;
    check_index(col, index)?;
    Ok(&mut col.cards[index])
}

fn check_index(col: &Column, index: usize) -> Result<()> {
    if index >= col.cards.len() {
        return Err(BoardError::CardIndexOutOfRange {
            column: col.name.clone(),
            index,
            len: col.cards.len(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
