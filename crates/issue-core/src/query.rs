//! Read-only views over a board used by the dashboard and the AI prompts.

use crate::board::{Board, Card, DONE_COLUMN, IN_PROGRESS_COLUMN, TODO_COLUMN};
use crate::due::{by_due, Urgency};
use chrono::NaiveDate;
use serde::Serialize;

pub const DEFAULT_TOP_TODOS: usize = 15;

/// A card that needs attention this week.
#[derive(Debug, Clone, Serialize)]
pub struct FocusItem<'a> {
    pub column: &'a str,
    pub card: &'a Card,
    pub due: Option<NaiveDate>,
    pub urgency: Urgency,
    pub in_progress: bool,
}

/// Cards that matter this week: everything in progress, plus any open card
/// that is overdue or due by Sunday. Sorted by due date, undated last.
pub fn this_week(board: &Board, today: NaiveDate) -> Vec<FocusItem<'_>> {
    let mut items = Vec::new();
    for column in &board.columns {
        if column.is_named(DONE_COLUMN) {
            continue;
        }
        let in_progress = column.is_named(IN_PROGRESS_COLUMN);
        for card in &column.cards {
            let due = card.due_date();
            let urgency = Urgency::classify(due, today);
            if in_progress || urgency.is_pressing(due, today) {
                items.push(FocusItem {
                    column: column.name.as_str(),
                    card,
                    due,
                    urgency,
                    in_progress,
                });
            }
        }
    }
    items.sort_by(|a, b| by_due(a.due, b.due));
    items
}

/// The head of the backlog: dated `To Do` cards by due date, then undated
/// cards in board order.
pub fn top_todos(board: &Board, limit: usize) -> Vec<&Card> {
    let Some(todo) = board.column(TODO_COLUMN) else {
        return Vec::new();
    };
    let mut cards: Vec<&Card> = todo.cards.iter().collect();
    cards.sort_by(|a, b| by_due(a.due_date(), b.due_date()));
    cards.truncate(limit);
    cards
}

/// `To Do: 4  ·  In Progress: 1  ·  Done: 12`
pub fn board_summary(board: &Board) -> String {
    board
        .column_counts()
        .iter()
        .map(|(name, n)| format!("{name}: {n}"))
        .collect::<Vec<_>>()
        .join("  ·  ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
