use crate::output::print_json;
use crate::root::Workspace;
use chrono::NaiveDate;
use colored::Colorize;
use issue_core::board::{Board, TODO_COLUMN};
use issue_core::due::{week_bounds, Urgency};
use issue_core::query::{self, FocusItem, DEFAULT_TOP_TODOS};

pub fn run(ws: &Workspace, json: bool) -> anyhow::Result<()> {
    let board = ws.board.load()?;
    if json {
        let (start, end) = week_bounds(ws.today);
        print_json(&serde_json::json!({
            "today": ws.today,
            "week": { "start": start, "end": end },
            "this_week": query::this_week(&board, ws.today),
            "top_todos": query::top_todos(&board, DEFAULT_TOP_TODOS),
            "backlog": backlog_len(&board),
            "columns": board.column_counts(),
        }))?;
    } else {
        print!("{}", render(&board, ws.today));
    }
    Ok(())
}

fn backlog_len(board: &Board) -> usize {
    board.column(TODO_COLUMN).map_or(0, |c| c.cards.len())
}

pub(crate) fn render(board: &Board, today: NaiveDate) -> String {
    let (start, end) = week_bounds(today);
    let mut out = String::new();
    out.push_str(&format!(
        "\n  {}  {}\n\n",
        "Kanban Dashboard".bold(),
        format!("week of {} – {}", start.format("%d/%m"), end.format("%d/%m/%Y")).dimmed()
    ));

    // This week
    out.push_str(&format!("  {}\n\n", "This Week".yellow().bold()));
    let focus = query::this_week(board, today);
    if focus.is_empty() {
        out.push_str(&format!("    {}\n", "Nothing urgent this week!".green()));
    }
    for (i, item) in focus.iter().enumerate() {
        let hint = if item.in_progress {
            String::new()
        } else {
            format!("  {}", format!("[{}]", item.column).dimmed())
        };
        out.push_str(&format!(
            "    {}  {}  {}{hint}\n",
            format!("{:>2}", i + 1).cyan(),
            item.card.title,
            focus_tag(item)
        ));
    }
    out.push('\n');

    // Top todos
    out.push_str(&format!(
        "  {}  {}\n\n",
        "Top Todos".cyan().bold(),
        format!("({} total in backlog)", backlog_len(board)).dimmed()
    ));
    let top = query::top_todos(board, DEFAULT_TOP_TODOS);
    if top.is_empty() {
        out.push_str(&format!("    {}\n", "(backlog is empty)".dimmed()));
    }
    for (i, card) in top.iter().enumerate() {
        let due = card
            .due_date()
            .map(|d| format!("  {}", todo_due(d, today)))
            .unwrap_or_default();
        let notes = if card.body.is_empty() {
            String::new()
        } else {
            format!("  {}", "✎".dimmed())
        };
        out.push_str(&format!(
            "    {}  {}{due}{notes}\n",
            format!("{:>2}", i + 1).cyan(),
            card.title
        ));
    }
    out.push('\n');

    out.push_str(&format!("  {}\n\n", query::board_summary(board).dimmed()));
    out
}

fn focus_tag(item: &FocusItem<'_>) -> colored::ColoredString {
    match (item.in_progress, item.urgency) {
        (true, Urgency::Overdue { days }) => format!("in progress · {days}d overdue").red(),
        (true, _) => "in progress".magenta(),
        (false, Urgency::Overdue { days }) => format!("{days}d overdue").red(),
        (false, u @ (Urgency::DueToday | Urgency::DueTomorrow)) => u.to_string().yellow(),
        (false, _) => match item.due {
            Some(d) => format!("due {}", d.format("%a %d/%m")).green(),
            None => "".normal(),
        },
    }
}

fn todo_due(due: NaiveDate, today: NaiveDate) -> colored::ColoredString {
    let delta = (due - today).num_days();
    if delta < 0 {
        format!("⚠ {}d overdue", -delta).red()
    } else if delta == 0 {
        "today".yellow()
    } else if delta <= 7 {
        due.format("%a %d/%m").to_string().yellow()
    } else {
        due.format("%d/%m").to_string().dimmed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use issue_core::parse;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    const BOARD: &str = "\
## To Do

### Pay invoice

  - due: 2026-10-12

### Book venue

  - due: 2026-10-30

### Someday

## In Progress

### Refactor parser

## Done

### Old thing
";

    #[test]
    fn dashboard_sections() {
        colored::control::set_override(false);
        // Wednesday
        let out = render(&parse(BOARD), d("2026-10-14"));
        assert!(out.contains("week of 12/10 – 18/10/2026"));
        assert!(out.contains(" 1  Pay invoice  2d overdue  [To Do]"));
        assert!(out.contains(" 2  Refactor parser  in progress\n"));
        assert!(!out.contains("Old thing"));
        assert!(out.contains("(3 total in backlog)"));
        assert!(out.contains(" 1  Pay invoice  ⚠ 2d overdue"));
        assert!(out.contains(" 2  Book venue  30/10"));
        assert!(out.contains(" 3  Someday\n"));
        assert!(out.contains("To Do: 3  ·  In Progress: 1  ·  Done: 1"));
    }

    #[test]
    fn empty_board_messages() {
        colored::control::set_override(false);
        let out = render(&parse("## To Do\n"), d("2026-10-14"));
        assert!(out.contains("Nothing urgent this week!"));
        assert!(out.contains("(backlog is empty)"));
    }
}
