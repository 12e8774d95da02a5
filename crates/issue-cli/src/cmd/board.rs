use crate::output::{print_json, truncate};
use crate::root::Workspace;
use chrono::NaiveDate;
use colored::{Color, Colorize};
use issue_core::board::{Board, Card, Column, DONE_COLUMN};

const LEFT_MARGIN: usize = 2;
const GUTTER: usize = 2;
const MIN_COLUMN_WIDTH: usize = 18;
const MAX_ROWS: usize = 30;
const FALLBACK_WIDTH: usize = 120;

pub fn run(ws: &Workspace, all: bool, json: bool) -> anyhow::Result<()> {
    let board = ws.board.load()?;
    if json {
        return print_json(&board);
    }
    let width = crossterm::terminal::size()
        .map(|(w, _)| w as usize)
        .unwrap_or(FALLBACK_WIDTH);
    print!("{}", render(&board, ws.today, width, all));
    Ok(())
}

fn column_color(name: &str) -> Color {
    match name.to_lowercase().as_str() {
        "in progress" => Color::Magenta,
        "review" => Color::Yellow,
        "done" => Color::Green,
        "blocked/waiting" => Color::Red,
        _ => Color::Cyan,
    }
}

/// Side-by-side columns sized to `width`. Done is hidden unless `show_done`.
pub(crate) fn render(board: &Board, today: NaiveDate, width: usize, show_done: bool) -> String {
    let visible: Vec<&Column> = board
        .columns
        .iter()
        .filter(|c| show_done || !c.is_named(DONE_COLUMN))
        .collect();
    if visible.is_empty() {
        return "  (no columns)\n".to_string();
    }

    let n = visible.len();
    let usable = width.saturating_sub(LEFT_MARGIN + GUTTER * (n - 1));
    let col_w = MIN_COLUMN_WIDTH.max(usable / n);
    let margin = " ".repeat(LEFT_MARGIN);
    let sep = " ".repeat(GUTTER);

    let mut out = String::from("\n");
    let headers: Vec<String> = visible
        .iter()
        .map(|c| {
            let label = truncate(&format!("{} ({})", c.name, c.cards.len()), col_w);
            format!("{label:<col_w$}")
                .color(column_color(&c.name))
                .bold()
                .to_string()
        })
        .collect();
    let dividers: Vec<String> = visible
        .iter()
        .map(|_| "─".repeat(col_w).dimmed().to_string())
        .collect();
    out.push_str(&format!("{margin}{}\n", headers.join(&sep)));
    out.push_str(&format!("{margin}{}\n", dividers.join(&sep)));

    let rows = visible
        .iter()
        .map(|c| c.cards.len())
        .max()
        .unwrap_or(0)
        .min(MAX_ROWS);
    for row in 0..rows {
        let cells: Vec<String> = visible
            .iter()
            .map(|c| match c.cards.get(row) {
                Some(card) => card_cell(card, col_w, today, column_color(&c.name)),
                None => " ".repeat(col_w),
            })
            .collect();
        out.push_str(format!("{margin}{}", cells.join(&sep)).trim_end());
        out.push('\n');
    }

    let overflow: Vec<String> = visible
        .iter()
        .filter(|c| c.cards.len() > rows)
        .map(|c| format!("+{} more in {}", c.cards.len() - rows, c.name))
        .collect();
    if !overflow.is_empty() {
        out.push_str(&format!("\n{margin}{}\n", overflow.join("  ·  ").dimmed()));
    }
    out.push('\n');
    out
}

/// One cell: title plus a due marker and a notes marker, padded to `width`
/// visible chars.
fn card_cell(card: &Card, width: usize, today: NaiveDate, color: Color) -> String {
    let marker = card.due_date().and_then(|due| {
        let delta = (due - today).num_days();
        if delta < 0 {
            Some("⚠".red())
        } else if delta <= 2 {
            Some("●".yellow())
        } else if delta <= 7 {
            Some("·".green())
        } else {
            None
        }
    });
    let has_notes = !card.body.is_empty();
    let reserved = (if marker.is_some() { 2 } else { 0 }) + (if has_notes { 2 } else { 0 });

    let title = truncate(&card.title, width.saturating_sub(reserved));
    let padding = width.saturating_sub(title.chars().count() + reserved);

    let mut cell = title.color(color).to_string();
    if let Some(m) = marker {
        cell.push_str(&format!(" {m}"));
    }
    if has_notes {
        cell.push_str(&format!(" {}", "✎".dimmed()));
    }
    cell.push_str(&" ".repeat(padding));
    cell
}

#[cfg(test)]
mod tests {
    use super::*;
    use issue_core::parse;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn board() -> Board {
        parse(
            "## To Do\n\n### Overdue task\n\n  - due: 2026-10-01\n\n### A very long card title that will not fit\n\n\
             ## In Progress\n\n### With notes\n\n    ```md\n    details\n    ```\n\n## Done\n\n### Finished\n",
        )
    }

    #[test]
    fn done_hidden_by_default() {
        colored::control::set_override(false);
        let out = render(&board(), d("2026-10-14"), 80, false);
        assert!(out.contains("To Do (2)"));
        assert!(out.contains("In Progress (1)"));
        assert!(!out.contains("Done (1)"));
        assert!(!out.contains("Finished"));

        let all = render(&board(), d("2026-10-14"), 120, true);
        assert!(all.contains("Done (1)"));
        assert!(all.contains("Finished"));
    }

    #[test]
    fn cells_carry_markers_and_truncate() {
        colored::control::set_override(false);
        let out = render(&board(), d("2026-10-14"), 60, false);
        assert!(out.contains("Overdue task ⚠"));
        assert!(out.contains("With notes ✎"));
        assert!(out.contains("A very long card title that…"));
    }

    #[test]
    fn rows_capped_with_overflow_note() {
        colored::control::set_override(false);
        let mut text = String::from("## To Do\n\n");
        for i in 0..35 {
            text.push_str(&format!("### Card {i}\n\n"));
        }
        let out = render(&parse(&text), d("2026-10-14"), 80, false);
        assert!(out.contains("Card 29"));
        assert!(!out.contains("Card 30"));
        assert!(out.contains("+5 more in To Do"));
    }

    #[test]
    fn no_columns() {
        assert_eq!(render(&Board::default(), d("2026-10-14"), 80, false), "  (no columns)\n");
    }
}
