//! Line-oriented parser for the `.kanban.md` board format.
//!
//! ```text
//! ## Column Name        ← starts a column
//! ### Card Title        ← starts a card in the current column
//!   - key: value        ← metadata (outside a fence)
//!     ```md             ← toggles the fenced body
//!     body line
//!     ```
//! ```
//!
//! Parsing never fails. Anything that is not recognisable structure is
//! dropped, and an unterminated fence swallows the rest of its card.

use crate::board::{Board, Card, Column, Meta};
use regex::Regex;
use std::sync::OnceLock;

const COLUMN_PREFIX: &str = "## ";
const CARD_PREFIX: &str = "### ";
const FENCE: &str = "```";

static META_RE: OnceLock<Regex> = OnceLock::new();
static META_KEY_RE: OnceLock<Regex> = OnceLock::new();

fn meta_re() -> &'static Regex {
    META_RE.get_or_init(|| Regex::new(r"^-\s+(\w[\w\s]*?):\s*(.+)$").unwrap())
}

/// True if `key` reads back unchanged from a `- key: value` line.
pub(crate) fn is_meta_key(key: &str) -> bool {
    META_KEY_RE
        .get_or_init(|| Regex::new(r"^\w(?:[\w \t]*\w)?$").unwrap())
        .is_match(key)
}

/// True if `line` would open or close a fenced body.
pub(crate) fn is_fence(line: &str) -> bool {
    line.trim().starts_with(FENCE)
}

/// Parse the full text of a board file.
pub fn parse(text: &str) -> Board {
    let mut parser = Parser::default();
    for line in text.split('\n') {
        parser.feed(line);
    }
    parser.finish()
}

/// Return the heading text if `line` is exactly `prefix` followed by at least
/// one more character.
fn heading<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    line.strip_prefix(prefix)
        .filter(|rest| !rest.is_empty())
        .map(str::trim)
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
enum State {
    /// No column has opened yet. Card headings here are ignored.
    #[default]
    OutsideColumn,
    InColumn(Column),
    InCard { column: Column, card: CardBuilder },
}

#[derive(Debug)]
struct CardBuilder {
    title: String,
    meta: Meta,
    body: Vec<String>,
    fenced: bool,
}

impl CardBuilder {
    fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            meta: Meta::new(),
            body: Vec::new(),
            fenced: false,
        }
    }

    fn push_line(&mut self, line: &str) {
        let trimmed = line.trim();
        if is_fence(trimmed) {
            self.fenced = !self.fenced;
            return;
        }
        if self.fenced {
            self.body.push(trimmed.to_string());
            return;
        }
        if let Some(caps) = meta_re().captures(trimmed) {
            let key = caps[1].trim().to_lowercase();
            let value = caps[2].trim().to_string();
            self.meta.insert(key, value);
        }
    }

    fn build(self) -> Card {
        Card {
            title: self.title,
            meta: self.meta,
            body: self.body.join("\n").trim().to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct Parser {
    state: State,
    columns: Vec<Column>,
}

impl Parser {
    fn feed(&mut self, line: &str) {
        if let Some(name) = heading(line, COLUMN_PREFIX) {
            self.close_column();
            self.state = State::InColumn(Column::new(name));
            return;
        }

        if let Some(title) = heading(line, CARD_PREFIX) {
            self.state = match std::mem::take(&mut self.state) {
                State::OutsideColumn => State::OutsideColumn,
                State::InColumn(column) => State::InCard {
                    column,
                    card: CardBuilder::new(title),
                },
                State::InCard { mut column, card } => {
                    column.cards.push(card.build());
                    State::InCard {
                        column,
                        card: CardBuilder::new(title),
                    }
                }
            };
            return;
        }

        if let State::InCard { card, .. } = &mut self.state {
            card.push_line(line);
        }
    }

    fn close_column(&mut self) {
        match std::mem::take(&mut self.state) {
            State::OutsideColumn => {}
            State::InColumn(column) => self.columns.push(column),
            State::InCard { mut column, card } => {
                column.cards.push(card.build());
                self.columns.push(column);
            }
        }
    }

    fn finish(mut self) -> Board {
        self.close_column();
        Board::new(self.columns)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = "## To Do

### Fix login bug

  - due: 2025-01-10
    ```md
    - steps to repro
    ```

## Done
";

    #[test]
    fn parses_documented_scenario() {
        let board = parse(SCENARIO);
        assert_eq!(board.column_names(), vec!["To Do", "Done"]);

        let todo = &board.columns[0];
        assert_eq!(todo.cards.len(), 1);
        let card = &todo.cards[0];
        assert_eq!(card.title, "Fix login bug");
        assert_eq!(card.meta.len(), 1);
        assert_eq!(card.meta["due"], "2025-01-10");
        assert_eq!(card.body, "- steps to repro");

        assert!(board.columns[1].cards.is_empty());
    }

    #[test]
    fn fenced_meta_shaped_lines_are_body() {
        let text = "## A\n### Card\n  ```md\n  - owner: bob\n  ```\n";
        let card = &parse(text).columns[0].cards[0];
        assert!(card.meta.is_empty());
        assert_eq!(card.body, "- owner: bob");
    }

    #[test]
    fn unfenced_meta_shaped_prose_is_meta() {
        let text = "## A\n### Card\n- Note to self: call the vendor\n";
        let card = &parse(text).columns[0].cards[0];
        assert_eq!(card.meta["note to self"], "call the vendor");
        assert_eq!(card.body, "");
    }

    #[test]
    fn meta_keys_lowercased_and_last_wins() {
        let text = "## A\n### Card\n  - Due: 2025-01-01\n  - defaultExpanded: true\n  - due: 2025-02-02\n";
        let card = &parse(text).columns[0].cards[0];
        assert_eq!(card.meta.len(), 2);
        assert_eq!(card.meta["due"], "2025-02-02");
        assert_eq!(card.meta["defaultexpanded"], "true");
        assert_eq!(card.meta.keys().next().map(String::as_str), Some("due"));
    }

    #[test]
    fn bare_card_has_empty_meta_and_body() {
        let board = parse("## A\n\n### Just a title\n\n### Another\n");
        let cards = &board.columns[0].cards;
        assert_eq!(cards.len(), 2);
        assert!(cards.iter().all(|c| c.meta.is_empty() && c.body.is_empty()));
    }

    #[test]
    fn card_before_any_column_is_ignored() {
        let text = "### Orphan\n  - due: 2025-01-01\n## To Do\n### Real\n";
        let board = parse(text);
        assert_eq!(board.columns.len(), 1);
        assert_eq!(board.columns[0].cards.len(), 1);
        assert_eq!(board.columns[0].cards[0].title, "Real");
        assert!(board.columns[0].cards[0].meta.is_empty());
    }

    #[test]
    fn deeper_headings_are_plain_text() {
        let text = "## A\n### Card\n#### not a heading\n##### nor this\n";
        let board = parse(text);
        assert_eq!(board.columns.len(), 1);
        assert_eq!(board.columns[0].cards.len(), 1);
        assert_eq!(board.columns[0].cards[0].title, "Card");
    }

    #[test]
    fn heading_needs_space_and_text() {
        let board = parse("##NoSpace\n## \n## Real\n");
        assert_eq!(board.column_names(), vec!["Real"]);
    }

    #[test]
    fn unterminated_fence_stops_at_next_heading() {
        let text = "## A\n### One\n  ```md\n  first\n  - k: v\n### Two\n  - k: v\n";
        let board = parse(text);
        let cards = &board.columns[0].cards;
        assert_eq!(cards[0].body, "first\n- k: v");
        assert!(cards[0].meta.is_empty());
        assert_eq!(cards[1].meta["k"], "v");
    }

    #[test]
    fn second_fence_appends_to_body() {
        let text = "## A\n### C\n```\none\n```\nignored prose\n```\ntwo\n```\n";
        let card = &parse(text).columns[0].cards[0];
        assert_eq!(card.body, "one\ntwo");
    }

    #[test]
    fn crlf_input() {
        let text = "## To Do\r\n\r\n### Card\r\n  - due: 2025-01-10\r\n";
        let board = parse(text);
        assert_eq!(board.columns[0].name, "To Do");
        assert_eq!(board.columns[0].cards[0].title, "Card");
        assert_eq!(board.columns[0].cards[0].meta["due"], "2025-01-10");
    }

    #[test]
    fn text_before_first_card_is_ignored() {
        let board = parse("## A\nsome description\n- stray: meta\n### C\n");
        assert_eq!(board.columns[0].cards.len(), 1);
        assert!(board.columns[0].cards[0].meta.is_empty());
    }

    #[test]
    fn empty_input() {
        assert!(parse("").columns.is_empty());
        assert!(parse("just prose\n").columns.is_empty());
    }
}
