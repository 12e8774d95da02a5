use crate::output::print_json;
use crate::root::Workspace;
use anyhow::bail;
use clap::Subcommand;
use issue_core::config::WarnLevel;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the effective configuration
    Show,
    /// Check the configuration for problems
    Validate,
    /// Print where the configuration was loaded from
    Path,
}

pub fn run(ws: &Workspace, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => {
            if json {
                print_json(&ws.config)?;
            } else {
                print!("{}", serde_yaml::to_string(&ws.config)?);
            }
        }
        ConfigSubcommand::Validate => validate(ws, json)?,
        ConfigSubcommand::Path => {
            let source = ws.config_source.as_ref().map(|p| p.display().to_string());
            if json {
                print_json(&serde_json::json!({
                    "config": source,
                    "board": ws.board.path(),
                    "workspace": ws.root,
                }))?;
            } else {
                println!("config:    {}", source.as_deref().unwrap_or("(built-in defaults)"));
                println!("board:     {}", ws.board.path().display());
                println!("workspace: {}", ws.root.display());
            }
        }
    }
    Ok(())
}

fn validate(ws: &Workspace, json: bool) -> anyhow::Result<()> {
    let warnings = ws.config.validate();
    let errors = warnings
        .iter()
        .filter(|w| w.level == WarnLevel::Error)
        .count();

    if json {
        print_json(&serde_json::json!({
            "source": ws.config_source,
            "warnings": warnings,
            "ok": errors == 0,
        }))?;
    } else if warnings.is_empty() {
        println!("Config OK");
    } else {
        for w in &warnings {
            let tag = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("{tag}: {}", w.message);
        }
    }

    if errors > 0 {
        bail!("config has {errors} error(s)");
    }
    Ok(())
}
