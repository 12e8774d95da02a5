use crate::output::{print_json, print_table};
use crate::root::Workspace;
use anyhow::{bail, Context};
use clap::Subcommand;
use issue_core::board::{self, Card};
use issue_core::due::{self, Urgency};
use issue_core::ops::{self, CardEdit, DueChange};

#[derive(Subcommand)]
pub enum CardSubcommand {
    /// List cards, optionally for one column
    List {
        #[arg(long)]
        column: Option<String>,
    },
    /// Show one card with its metadata and notes
    Show { column: String, index: usize },
    /// Append a card to a column
    Add {
        column: String,
        #[arg(required = true)]
        title: Vec<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
        /// Notes shown in the card's body
        #[arg(long)]
        body: Option<String>,
        /// Extra metadata as key=value (repeatable)
        #[arg(long = "meta", value_parser = parse_meta)]
        meta: Vec<(String, String)>,
    },
    /// Move a card to another column
    Move {
        from: String,
        index: usize,
        to: String,
        /// Position in the destination (default: end)
        #[arg(long)]
        to_index: Option<usize>,
    },
    /// Change a card's title, due date, notes or metadata
    Edit {
        column: String,
        index: usize,
        #[arg(long)]
        title: Option<String>,
        /// New due date (YYYY-MM-DD), or `none` to clear it
        #[arg(long)]
        due: Option<String>,
        #[arg(long)]
        body: Option<String>,
        /// Set metadata as key=value (repeatable)
        #[arg(long = "meta", value_parser = parse_meta)]
        meta: Vec<(String, String)>,
    },
    /// Move a card to Done
    Archive { column: String, index: usize },
    /// Delete a card
    Delete { column: String, index: usize },
}

fn parse_meta(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() => {
            let (key, value) = (k.trim().to_lowercase(), v.trim().to_string());
            board::check_meta_entry(&key, &value).map_err(|e| e.to_string())?;
            Ok((key, value))
        }
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}

fn parse_due_change(raw: &str) -> anyhow::Result<DueChange> {
    if raw.eq_ignore_ascii_case("none") || raw.eq_ignore_ascii_case("clear") {
        return Ok(DueChange::Clear);
    }
    Ok(DueChange::Set(due::parse_date_arg(raw)?))
}

pub fn run(ws: &Workspace, subcmd: CardSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        CardSubcommand::List { column } => list(ws, column.as_deref(), json),
        CardSubcommand::Show { column, index } => show(ws, &column, index, json),
        CardSubcommand::Add {
            column,
            title,
            due,
            body,
            meta,
        } => add(ws, &column, &title.join(" "), due.as_deref(), body, meta, json),
        CardSubcommand::Move {
            from,
            index,
            to,
            to_index,
        } => move_card(ws, &from, index, &to, to_index, json),
        CardSubcommand::Edit {
            column,
            index,
            title,
            due,
            body,
            meta,
        } => {
            let due = due.as_deref().map(parse_due_change).transpose()?;
            edit(ws, &column, index, title, due, body, meta, json)
        }
        CardSubcommand::Archive { column, index } => archive(ws, &column, index, json),
        CardSubcommand::Delete { column, index } => delete(ws, &column, index, json),
    }
}

fn list(ws: &Workspace, column: Option<&str>, json: bool) -> anyhow::Result<()> {
    let board = ws.board.load()?;
    if let Some(name) = column {
        if board.column(name).is_none() {
            bail!("column not found: {name}");
        }
    }
    let cards: Vec<(&str, usize, &Card)> = board
        .cards()
        .filter(|(col, _, _)| column.map_or(true, |name| col.eq_ignore_ascii_case(name)))
        .collect();

    if json {
        let items: Vec<serde_json::Value> = cards
            .iter()
            .map(|(col, idx, card)| serde_json::json!({ "column": col, "index": idx, "card": card }))
            .collect();
        return print_json(&items);
    }

    if cards.is_empty() {
        println!("No cards.");
        return Ok(());
    }
    let rows = cards
        .iter()
        .map(|(col, idx, card)| {
            let urgency = Urgency::for_card(card, ws.today);
            vec![
                col.to_string(),
                idx.to_string(),
                card.title.clone(),
                card.meta_value(issue_core::board::DUE_KEY)
                    .unwrap_or("-")
                    .to_string(),
                match urgency {
                    Urgency::NoDueDate => String::new(),
                    u => u.to_string(),
                },
            ]
        })
        .collect();
    print_table(&["COLUMN", "#", "TITLE", "DUE", ""], rows);
    Ok(())
}

fn show(ws: &Workspace, column: &str, index: usize, json: bool) -> anyhow::Result<()> {
    let board = ws.board.load()?;
    let card = ops::card(&board, column, index)?;
    if json {
        return print_json(card);
    }
    println!("{}", card.title);
    for (key, value) in &card.meta {
        println!("  {key}: {value}");
    }
    if !card.body.is_empty() {
        println!();
        for line in card.body.lines() {
            println!("    {line}");
        }
    }
    Ok(())
}

fn add(
    ws: &Workspace,
    column: &str,
    title: &str,
    due: Option<&str>,
    body: Option<String>,
    meta: Vec<(String, String)>,
    json: bool,
) -> anyhow::Result<()> {
    let mut card = Card::new(title);
    if let Some(raw) = due {
        card = card.with_due(due::parse_date_arg(raw)?);
    }
    card.meta.extend(meta);
    if let Some(body) = body {
        card = card.with_body(body);
    }

    let stored = card.clone();
    let index = ws
        .board
        .update(|board| ops::add_card(board, column, card))
        .context("failed to add card")?;

    if json {
        print_json(&serde_json::json!({ "column": column, "index": index, "card": stored }))?;
    } else {
        println!("Added '{title}' to {column} [{index}]");
    }
    Ok(())
}

fn move_card(
    ws: &Workspace,
    from: &str,
    index: usize,
    to: &str,
    to_index: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    let (card, at) = ws.board.update(|board| {
        let same_column = board.column_index(from) == board.column_index(to);
        let dest_len = board.column(to).map_or(0, |c| c.cards.len());
        let dest_len = if same_column { dest_len.saturating_sub(1) } else { dest_len };
        let at = to_index.unwrap_or(usize::MAX).min(dest_len);
        let card = ops::move_card(board, from, index, to, at)?.clone();
        Ok((card, at))
    })?;

    if json {
        print_json(&serde_json::json!({ "column": to, "index": at, "card": card }))?;
    } else {
        println!("Moved '{}' → {to} [{at}]", card.title);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn edit(
    ws: &Workspace,
    column: &str,
    index: usize,
    title: Option<String>,
    due: Option<DueChange>,
    body: Option<String>,
    meta: Vec<(String, String)>,
    json: bool,
) -> anyhow::Result<()> {
    if title.is_none() && due.is_none() && body.is_none() && meta.is_empty() {
        bail!("nothing to change: pass --title, --due, --body or --meta");
    }
    let card = ws.board.update(|board| {
        let merged = if meta.is_empty() {
            None
        } else {
            let mut current = ops::card(board, column, index)?.meta.clone();
            current.extend(meta);
            Some(current)
        };
        let change = CardEdit {
            title,
            meta: merged,
            body,
            due,
        };
        Ok(ops::edit_card(board, column, index, change)?.clone())
    })?;

    if json {
        print_json(&serde_json::json!({ "column": column, "index": index, "card": card }))?;
    } else {
        println!("Updated '{}'", card.title);
    }
    Ok(())
}

fn archive(ws: &Workspace, column: &str, index: usize, json: bool) -> anyhow::Result<()> {
    let card = ws
        .board
        .update(|board| Ok(ops::archive_card(board, column, index)?.clone()))?;
    if json {
        print_json(&serde_json::json!({ "column": issue_core::board::DONE_COLUMN, "card": card }))?;
    } else {
        println!("Archived '{}'", card.title);
    }
    Ok(())
}

fn delete(ws: &Workspace, column: &str, index: usize, json: bool) -> anyhow::Result<()> {
    let card = ws
        .board
        .update(|board| ops::delete_card(board, column, index))?;
    if json {
        print_json(&serde_json::json!({ "deleted": card }))?;
    } else {
        println!("Deleted '{}'", card.title);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_pairs() {
        assert_eq!(
            parse_meta("Priority = high").unwrap(),
            ("priority".to_string(), "high".to_string())
        );
        assert_eq!(parse_meta("url=a=b").unwrap().1, "a=b");
        assert!(parse_meta("novalue").is_err());
        assert!(parse_meta("=x").is_err());
    }

    #[test]
    fn due_change_parsing() {
        assert_eq!(parse_due_change("none").unwrap(), DueChange::Clear);
        assert!(matches!(parse_due_change("2026-10-20").unwrap(), DueChange::Set(_)));
        assert!(parse_due_change("next week").is_err());
    }
}
