use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{BoardError, Result};
use crate::parser;

/// Card metadata: lower-cased key → raw string value, in file order.
pub type Meta = IndexMap<String, String>;

pub const DUE_KEY: &str = "due";
pub const EXPANDED_KEY: &str = "defaultExpanded";

pub const TODO_COLUMN: &str = "To Do";
pub const IN_PROGRESS_COLUMN: &str = "In Progress";
pub const DONE_COLUMN: &str = "Done";

/// Columns written by `issue init`.
pub const DEFAULT_COLUMNS: [&str; 5] = [
    TODO_COLUMN,
    IN_PROGRESS_COLUMN,
    "Review",
    "Blocked/Waiting",
    DONE_COLUMN,
];

// ---------------------------------------------------------------------------
// Card
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub title: String,
    #[serde(default)]
    pub meta: Meta,
    #[serde(default)]
    pub body: String,
}

impl Card {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            meta: Meta::new(),
            body: String::new(),
        }
    }

    pub fn with_due(mut self, due: NaiveDate) -> Self {
        self.set_due(Some(due));
        self
    }

    /// Attach a body. A non-empty body starts collapsed.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        if !self.body.is_empty() {
            self.ensure_expansion_flag();
        }
        self
    }

    /// Case-insensitive metadata lookup.
    pub fn meta_value(&self, key: &str) -> Option<&str> {
        self.meta
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.meta_value(DUE_KEY).and_then(crate::due::parse_due)
    }

    /// `Some(true|false)` when the expansion flag is present and readable.
    pub fn is_expanded(&self) -> Option<bool> {
        match self.meta_value(EXPANDED_KEY)?.trim() {
            v if v.eq_ignore_ascii_case("true") => Some(true),
            v if v.eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        }
    }

    pub fn set_due(&mut self, due: Option<NaiveDate>) {
        match due {
            Some(d) => {
                self.meta
                    .insert(DUE_KEY.to_string(), d.format("%Y-%m-%d").to_string());
            }
            None => {
                self.meta.shift_remove(DUE_KEY);
            }
        }
    }

    /// Add `defaultExpanded: false` unless any casing of the key is present.
    pub fn ensure_expansion_flag(&mut self) {
        if self.meta_value(EXPANDED_KEY).is_none() {
            self.meta
                .insert(EXPANDED_KEY.to_string(), "false".to_string());
        }
    }

    pub fn has_details(&self) -> bool {
        !self.meta.is_empty() || !self.body.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(default)]
    pub cards: Vec<Card>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cards: Vec::new(),
        }
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name.trim())
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// An ordered set of columns parsed from a `.kanban.md` file.
///
/// Boards are short-lived: every operation parses the file, mutates the
/// board, and writes it back. Nothing is cached between operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    #[serde(default)]
    pub columns: Vec<Column>,
}

impl Board {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn with_columns<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: names.into_iter().map(Column::new).collect(),
        }
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.is_named(name))
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.is_named(name))
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.is_named(name))
    }

    pub fn column_counts(&self) -> Vec<(&str, usize)> {
        self.columns
            .iter()
            .map(|c| (c.name.as_str(), c.cards.len()))
            .collect()
    }

    pub fn total_cards(&self) -> usize {
        self.columns.iter().map(|c| c.cards.len()).sum()
    }

    /// Every card with its column name and index, in board order.
    pub fn cards(&self) -> impl Iterator<Item = (&str, usize, &Card)> {
        self.columns.iter().flat_map(|col| {
            col.cards
                .iter()
                .enumerate()
                .map(move |(i, card)| (col.name.as_str(), i, card))
        })
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

// Content that passes these checks serializes and parses back to the same
// board, up to key case and surrounding whitespace.

/// Column names and card titles: one non-empty line.
pub fn check_heading(what: &str, text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(BoardError::InvalidContent(format!("{what} must not be empty")));
    }
    if text.contains(['\n', '\r']) {
        return Err(BoardError::InvalidContent(format!(
            "{what} must be a single line: {text:?}"
        )));
    }
    Ok(())
}

/// One metadata entry: a word-character key (spaces allowed inside) and a
/// non-empty single-line value.
pub fn check_meta_entry(key: &str, value: &str) -> Result<()> {
    if !parser::is_meta_key(key.trim()) {
        return Err(BoardError::InvalidContent(format!(
            "metadata key {key:?} must be letters, digits, '_' or spaces"
        )));
    }
    if value.trim().is_empty() {
        return Err(BoardError::InvalidContent(format!(
            "metadata '{key}' needs a value"
        )));
    }
    if value.contains(['\n', '\r']) {
        return Err(BoardError::InvalidContent(format!(
            "metadata '{key}' must be a single line"
        )));
    }
    Ok(())
}

pub fn check_meta(meta: &Meta) -> Result<()> {
    for (i, (key, value)) in meta.iter().enumerate() {
        check_meta_entry(key, value)?;
        let clash = meta
            .keys()
            .take(i)
            .any(|k| k.trim().eq_ignore_ascii_case(key.trim()));
        if clash {
            return Err(BoardError::InvalidContent(format!(
                "metadata key '{key}' appears twice"
            )));
        }
    }
    Ok(())
}

/// Card notes must not contain a line that would close the fence.
pub fn check_body(body: &str) -> Result<()> {
    match body.lines().find(|line| parser::is_fence(line)) {
        Some(line) => Err(BoardError::InvalidContent(format!(
            "notes must not contain a ``` line: {:?}",
            line.trim()
        ))),
        None => Ok(()),
    }
}

impl Card {
    pub fn check(&self) -> Result<()> {
        check_heading("card title", &self.title)?;
        check_meta(&self.meta)?;
        check_body(&self.body)
    }
}

impl Board {
    pub fn check(&self) -> Result<()> {
        for column in &self.columns {
            check_heading("column name", &column.name)?;
            for card in &column.cards {
                card.check()?;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn column_lookup_is_case_insensitive() {
        let board = Board::with_columns(["To Do", "In Progress", "Done"]);
        assert_eq!(board.column_index("to do"), Some(0));
        assert_eq!(board.column("DONE").unwrap().name, "Done");
        assert!(board.column("Backlog").is_none());
    }

    #[test]
    fn with_body_sets_collapsed_flag() {
        let card = Card::new("Write docs").with_body("- outline");
        assert_eq!(card.meta.get(EXPANDED_KEY).map(String::as_str), Some("false"));
        assert_eq!(card.is_expanded(), Some(false));

        let bare = Card::new("Nothing").with_body("");
        assert!(bare.meta.is_empty());
    }

    #[test]
    fn expansion_flag_lookup_ignores_case() {
        let mut card = Card::new("Parsed");
        card.meta
            .insert("defaultexpanded".to_string(), "true".to_string());
        assert_eq!(card.is_expanded(), Some(true));
        card.ensure_expansion_flag();
        assert_eq!(card.meta.len(), 1, "must not add a second casing of the key");
    }

    #[test]
    fn due_accessors() {
        let mut card = Card::new("Ship").with_due(date("2025-01-10"));
        assert_eq!(card.meta_value("due"), Some("2025-01-10"));
        assert_eq!(card.due_date(), Some(date("2025-01-10")));

        card.set_due(None);
        assert!(card.due_date().is_none());
        assert!(!card.has_details());
    }

    #[test]
    fn garbage_due_is_none() {
        let mut card = Card::new("Someday");
        card.meta.insert("due".to_string(), "next tuesday".to_string());
        assert_eq!(card.due_date(), None);
    }

    #[test]
    fn counts_and_iteration() {
        let mut board = Board::with_columns(["To Do", "Done"]);
        board.columns[0].cards.push(Card::new("a"));
        board.columns[0].cards.push(Card::new("b"));
        board.columns[1].cards.push(Card::new("c"));
        assert_eq!(board.column_counts(), vec![("To Do", 2), ("Done", 1)]);
        assert_eq!(board.total_cards(), 3);
        let listed: Vec<_> = board.cards().map(|(col, i, c)| (col, i, c.title.as_str())).collect();
        assert_eq!(listed, vec![("To Do", 0, "a"), ("To Do", 1, "b"), ("Done", 0, "c")]);
    }

    #[test]
    fn json_shape() {
        let mut board = Board::with_columns(["To Do"]);
        board.columns[0].cards.push(Card::new("x").with_body("y"));
        let json = serde_json::to_value(&board).unwrap();
        assert_eq!(json["columns"][0]["name"], "To Do");
        assert_eq!(json["columns"][0]["cards"][0]["title"], "x");
        assert_eq!(json["columns"][0]["cards"][0]["meta"]["defaultExpanded"], "false");
        assert_eq!(json["columns"][0]["cards"][0]["body"], "y");

        let back: Board = serde_json::from_value(serde_json::json!({
            "columns": [{"name": "Done", "cards": [{"title": "t"}]}]
        }))
        .unwrap();
        assert_eq!(back.columns[0].cards[0].body, "");
    }

    #[test]
    fn meta_entries_that_would_not_read_back_are_rejected() {
        assert!(check_meta_entry("priority", "high").is_ok());
        assert!(check_meta_entry("story points", "3").is_ok());

        for (key, value) in [
            ("story-points", "3"),
            ("note", ""),
            ("note", "   "),
            ("note", "two\nlines"),
            ("a:b", "c"),
            ("", "x"),
        ] {
            let err = check_meta_entry(key, value).unwrap_err();
            assert!(matches!(err, BoardError::InvalidContent(_)), "{key:?}={value:?}");
        }
    }

    #[test]
    fn duplicate_keys_differing_in_case_are_rejected() {
        let mut meta = Meta::new();
        meta.insert("Owner".into(), "sam".into());
        meta.insert("owner".into(), "kim".into());
        assert!(check_meta(&meta).is_err());
    }

    #[test]
    fn fence_lines_in_notes_are_rejected() {
        assert!(check_body("- steps\n- expected").is_ok());
        assert!(check_body("before\n  ```\nafter").is_err());
        assert!(check_body("```rust").is_err());
    }

    #[test]
    fn checked_cards_survive_a_round_trip() {
        let mut card = Card::new("Estimate").with_body("notes here");
        card.meta.insert("story points".into(), "3".into());
        card.meta.insert("owner".into(), "sam".into());
        let mut board = Board::with_columns(["To Do"]);
        board.columns[0].cards.push(card);
        board.check().unwrap();

        let back = crate::parse(&crate::serialize(&board));
        assert_eq!(back.columns[0].cards[0].title, "Estimate");
        assert_eq!(back.columns[0].cards[0].meta_value("story points"), Some("3"));
        assert_eq!(back.columns[0].cards[0].body, "notes here");

        board.columns[0].cards[0].meta.insert("story-points".into(), "3".into());
        assert!(board.check().is_err());
    }

    #[test]
    fn board_check_covers_column_names() {
        assert!(Board::with_columns(["To Do", "Done"]).check().is_ok());
        assert!(Board::with_columns(["  "]).check().is_err());
        assert!(Board::with_columns(["two\nlines"]).check().is_err());
    }
}
