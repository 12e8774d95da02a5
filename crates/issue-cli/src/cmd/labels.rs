use crate::output::{print_json, print_table};
use crate::root::Workspace;
use issue_core::gh::GhCli;
use issue_core::issues::IssueBackend;

pub fn run(ws: &Workspace, repo: Option<&str>, json: bool) -> anyhow::Result<()> {
    let repo = ws.config.repo_or_default(repo);
    let labels = GhCli::locate()?.list_labels(&repo)?;
    if json {
        return print_json(&labels);
    }
    if labels.is_empty() {
        println!("No labels on {repo}.");
        return Ok(());
    }
    let rows = labels
        .into_iter()
        .map(|l| vec![l.name, l.description.unwrap_or_default()])
        .collect();
    print_table(&["LABEL", "DESCRIPTION"], rows);
    Ok(())
}
