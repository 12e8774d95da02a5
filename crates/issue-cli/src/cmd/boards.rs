use crate::output::{print_json, print_table};
use crate::root::Workspace;

pub fn run(ws: &Workspace, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&ws.config.boards);
    }
    if ws.config.boards.is_empty() {
        println!("No boards configured.");
        return Ok(());
    }
    let rows = ws
        .config
        .boards
        .iter()
        .map(|(key, b)| {
            let fields: Vec<&str> = b.fields.keys().map(String::as_str).collect();
            vec![
                key.clone(),
                format!("#{}", b.number),
                b.name.clone(),
                ws.config.qualify_repo(&b.repo),
                fields.join(", "),
            ]
        })
        .collect();
    print_table(&["KEY", "PROJECT", "NAME", "REPO", "FIELDS"], rows);
    Ok(())
}
