use crate::output::print_json;
use crate::root::Workspace;
use clap::Args;
use issue_core::gh::GhCli;
use issue_core::issues::{create_on_board, CreateOutcome, CreateRequest};

#[derive(Args)]
pub struct CreateArgs {
    /// Board key from the config
    #[arg(long)]
    pub board: String,
    #[arg(long)]
    pub title: String,
    /// Repository (default: the board's repo); bare names get the org prefix
    #[arg(long)]
    pub repo: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// Acceptance criterion (repeatable)
    #[arg(long = "criteria")]
    pub criteria: Vec<String>,
    /// Extra section appended to the body
    #[arg(long)]
    pub context: Option<String>,
    /// Label (repeatable or comma-separated)
    #[arg(long = "labels", value_delimiter = ',')]
    pub labels: Vec<String>,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub priority: Option<String>,
    #[arg(long)]
    pub size: Option<String>,
    #[arg(long)]
    pub epic: Option<String>,
    #[arg(long)]
    pub team: Option<String>,
    /// Any other single-select field as name=option (repeatable)
    #[arg(long = "field")]
    pub fields: Vec<String>,
    /// Put the issue in the iteration that contains today
    #[arg(long)]
    pub current_iteration: bool,
}

impl CreateArgs {
    fn into_request(self) -> anyhow::Result<(String, CreateRequest)> {
        let mut req = CreateRequest {
            repo: self.repo,
            title: self.title,
            description: self.description,
            criteria: self.criteria,
            extra_context: self.context,
            labels: self.labels.into_iter().filter(|l| !l.trim().is_empty()).collect(),
            current_iteration: self.current_iteration,
            ..Default::default()
        };
        let named = [
            ("status", self.status),
            ("priority", self.priority),
            ("size", self.size),
            ("epic", self.epic),
            ("team", self.team),
        ];
        for (name, value) in named {
            if let Some(v) = value {
                req.fields.insert(name.to_string(), v);
            }
        }
        for raw in self.fields {
            let Some((name, option)) = raw.split_once('=') else {
                anyhow::bail!("--field expects name=option, got '{raw}'");
            };
            req.fields
                .insert(name.trim().to_lowercase(), option.trim().to_string());
        }
        Ok((self.board, req))
    }
}

pub fn run(ws: &Workspace, args: CreateArgs, json: bool) -> anyhow::Result<()> {
    let (board, req) = args.into_request()?;
    let gh = GhCli::locate()?;
    let outcome = create_on_board(&gh, &ws.config, &board, &req, ws.today)?;
    if json {
        print_json(&outcome)
    } else {
        print_outcome(&req.title, &outcome);
        Ok(())
    }
}

pub(crate) fn print_outcome(title: &str, outcome: &CreateOutcome) {
    match outcome.issue.number {
        Some(n) => println!("Created #{n}: {title}"),
        None => println!("Created: {title}"),
    }
    println!("  {}", outcome.issue.url);
    if !outcome.fields_set.is_empty() {
        println!("  fields: {}", outcome.fields_set.join(", "));
    }
    if !outcome.skipped_labels.is_empty() {
        println!(
            "  skipped labels (not on repo): {}",
            outcome.skipped_labels.join(", ")
        );
    }
    if !outcome.skipped_fields.is_empty() {
        println!("  skipped fields: {}", outcome.skipped_fields.join(", "));
    }
}
