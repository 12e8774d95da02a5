use crate::board::{Board, Card};

const META_INDENT: &str = "  ";
const BODY_INDENT: &str = "    ";

/// Render a board in canonical `.kanban.md` form.
///
/// The output always parses back into an equal board, and re-serializing
/// that board yields the same text.
pub fn serialize(board: &Board) -> String {
    let mut lines: Vec<String> = Vec::new();
    for column in &board.columns {
        lines.push(format!("## {}", column.name));
        lines.push(String::new());
        for card in &column.cards {
            push_card(&mut lines, card);
        }
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn push_card(lines: &mut Vec<String>, card: &Card) {
    lines.push(format!("### {}", card.title));
    lines.push(String::new());
    if !card.has_details() {
        return;
    }
    for (key, value) in &card.meta {
        lines.push(format!("{META_INDENT}- {key}: {value}"));
    }
    if !card.body.is_empty() {
        lines.push(format!("{BODY_INDENT}```md"));
        for body_line in card.body.split('\n') {
            lines.push(format!("{BODY_INDENT}{body_line}"));
        }
        lines.push(format!("{BODY_INDENT}```"));
    }
    lines.push(String::new());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Column;
    use crate::parser::parse;

    const SCENARIO: &str = "## To Do

### Fix login bug

  - due: 2025-01-10
    ```md
    - steps to repro
    ```

## Done
";

    fn sample_board() -> Board {
        let mut todo = Column::new("To Do");
        let mut card = Card::new("Fix login bug");
        card.meta.insert("due".into(), "2025-01-10".into());
        card.meta.insert("priority".into(), "high".into());
        card.body = "- steps to repro\n\n- expected: login works".into();
        todo.cards.push(card);
        todo.cards.push(Card::new("Bare card"));
        let mut doing = Column::new("In Progress");
        let mut only_meta = Card::new("Meta only");
        only_meta.meta.insert("defaultexpanded".into(), "true".into());
        doing.cards.push(only_meta);
        let mut only_body = Card::new("Body only");
        only_body.body = "line one\nline two".into();
        doing.cards.push(only_body);
        Board::new(vec![todo, doing, Column::new("Done")])
    }

    #[test]
    fn scenario_reserializes_verbatim() {
        let board = parse(SCENARIO);
        // Canonical form closes every column with one blank line.
        assert_eq!(serialize(&board), format!("{SCENARIO}\n"));
    }

    #[test]
    fn empty_card_is_heading_plus_blank_line() {
        let board = Board::new(vec![Column {
            name: "A".into(),
            cards: vec![Card::new("Lonely")],
        }]);
        let text = serialize(&board);
        assert_eq!(text, "## A\n\n### Lonely\n\n");
        assert!(!text.contains("```"));

        let back = parse(&text);
        let card = &back.columns[0].cards[0];
        assert!(card.meta.is_empty());
        assert!(card.body.is_empty());
    }

    #[test]
    fn round_trip_is_lossless() {
        let board = parse(&serialize(&sample_board()));
        let again = parse(&serialize(&board));
        assert_eq!(board, again);
    }

    #[test]
    fn reserialize_is_idempotent() {
        let once = serialize(&sample_board());
        let twice = serialize(&parse(&once));
        assert_eq!(once, twice);
    }

    #[test]
    fn meta_written_in_insertion_order() {
        let text = serialize(&sample_board());
        let due = text.find("  - due: 2025-01-10").unwrap();
        let priority = text.find("  - priority: high").unwrap();
        assert!(due < priority);
    }

    #[test]
    fn body_lines_indented_inside_fence() {
        let text = serialize(&sample_board());
        assert!(text.contains("    ```md\n    line one\n    line two\n    ```\n"));
    }

    #[test]
    fn empty_board_is_single_newline() {
        assert_eq!(serialize(&Board::default()), "\n");
        assert!(parse(&serialize(&Board::default())).columns.is_empty());
    }
}
