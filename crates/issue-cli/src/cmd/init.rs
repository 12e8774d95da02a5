use crate::output::print_json;
use crate::root::Workspace;
use anyhow::Context;
use issue_core::config::Config;
use issue_core::paths;

pub fn run(ws: &Workspace, columns: &[String], with_config: bool, json: bool) -> anyhow::Result<()> {
    let created = ws
        .board
        .init(Some(columns))
        .with_context(|| format!("failed to create {}", ws.board.path().display()))?;

    let config_path = paths::issue_dir(&ws.root).join(paths::CONFIG_YAML);
    let config_written = if with_config && !config_path.exists() {
        Config::default()
            .save(&config_path)
            .context("failed to write config")?;
        true
    } else {
        false
    };

    if json {
        print_json(&serde_json::json!({
            "board": ws.board.path(),
            "created": created,
            "config": config_written.then_some(&config_path),
        }))?;
        return Ok(());
    }

    if created {
        println!("Created {}", ws.board.path().display());
    } else {
        println!("{} already exists", ws.board.path().display());
    }
    if config_written {
        println!("Wrote {} (edit org, repos and board ids)", config_path.display());
    } else if with_config {
        println!("{} already exists", config_path.display());
    }
    Ok(())
}
