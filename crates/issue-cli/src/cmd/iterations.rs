use crate::output::{print_json, print_table};
use crate::root::Workspace;
use anyhow::bail;
use issue_core::gh::GhCli;
use issue_core::issues::IssueBackend;

pub fn run(ws: &Workspace, board_key: &str, json: bool) -> anyhow::Result<()> {
    let board = ws.config.board(board_key)?;
    if !board.fields.get("iteration").is_some_and(|f| f.is_iteration()) {
        bail!("board '{board_key}' has no iteration field");
    }
    let iterations = GhCli::locate()?.list_iterations(&ws.config.org, board, ws.today)?;
    if json {
        return print_json(&iterations);
    }
    if iterations.is_empty() {
        println!("No iterations on board '{board_key}'.");
        return Ok(());
    }
    let rows = iterations
        .into_iter()
        .map(|it| {
            vec![
                it.title,
                it.start.to_string(),
                it.end.to_string(),
                if it.current { "current".into() } else { String::new() },
            ]
        })
        .collect();
    print_table(&["ITERATION", "START", "END", ""], rows);
    Ok(())
}
