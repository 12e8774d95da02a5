use crate::cmd::create::print_outcome;
use crate::output::{print_json, repo_short};
use crate::root::Workspace;
use anyhow::{bail, Context};
use claude_agent::{AssistantSession, SessionOptions};
use clap::Subcommand;
use colored::Colorize;
use futures::StreamExt;
use issue_core::ai::{self, AnalysisReport, BoardIssue, IssueDraft, RepoLabels};
use issue_core::gh::GhCli;
use issue_core::issues::{create_on_board, IssueBackend, IssueFilter};
use std::io::Write as _;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;

const ANALYSIS_TIMEOUT: Duration = Duration::from_secs(180);
const READ_ONLY_TOOLS: [&str; 3] = ["Read", "Glob", "Grep"];

#[derive(Subcommand)]
pub enum AiSubcommand {
    /// Draft one or more issues from a plain-language request
    Draft {
        #[arg(required = true)]
        request: Vec<String>,
        /// Board used when a draft does not name one
        #[arg(long, default_value = "main")]
        board: String,
        /// Create the drafted issues instead of only printing them
        #[arg(long)]
        create: bool,
    },
    /// Ask one question with the local board as context
    Ask {
        #[arg(required = true)]
        question: Vec<String>,
        /// Leave the board snapshot out of the prompt
        #[arg(long)]
        no_board: bool,
    },
    /// Interactive conversation; `exit` or end of input quits
    Chat {
        #[arg(long)]
        no_board: bool,
    },
    /// Analyse every open issue on the configured boards
    Analyse {
        /// Issues fetched per repository
        #[arg(long, default_value_t = 200)]
        limit: u32,
    },
}

pub fn run(ws: &Workspace, subcmd: AiSubcommand, json: bool) -> anyhow::Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    match subcmd {
        AiSubcommand::Draft {
            request,
            board,
            create,
        } => rt.block_on(draft(ws, &request.join(" "), &board, create, json)),
        AiSubcommand::Ask { question, no_board } => {
            rt.block_on(ask(ws, &question.join(" "), no_board))
        }
        AiSubcommand::Chat { no_board } => rt.block_on(chat(ws, no_board)),
        AiSubcommand::Analyse { limit } => rt.block_on(analyse(ws, limit, json)),
    }
}

fn session_options(ws: &Workspace) -> SessionOptions {
    SessionOptions {
        model: Some(ws.config.ai_model.clone()).filter(|m| !m.is_empty()),
        cwd: Some(ws.root.clone()),
        allowed_tools: READ_ONLY_TOOLS.iter().map(|t| t.to_string()).collect(),
        ..Default::default()
    }
}

/// Board snapshot for the chat prompt; a missing board is not an error.
fn snapshot(ws: &Workspace, skip: bool) -> Option<String> {
    if skip {
        return None;
    }
    match ws.board.load() {
        Ok(board) => Some(ai::board_snapshot(&board, ws.today)),
        Err(e) => {
            tracing::debug!(error = %e, "no board snapshot");
            None
        }
    }
}

// ─── draft ────────────────────────────────────────────────────────────────

async fn draft(
    ws: &Workspace,
    request: &str,
    default_board: &str,
    create: bool,
    json: bool,
) -> anyhow::Result<()> {
    let gh = GhCli::locate().ok();
    let labels: Vec<RepoLabels> = ws
        .config
        .boards
        .values()
        .map(|b| {
            let repo = ws.config.qualify_repo(&b.repo);
            let labels = gh
                .as_ref()
                .and_then(|gh| gh.list_labels(&repo).ok())
                .map(|ls| ls.into_iter().map(|l| l.name).collect());
            RepoLabels { repo, labels }
        })
        .collect();

    let system = ai::draft_system_prompt(&ws.config, &ws.root, &labels);
    let session = AssistantSession::start(system, session_options(ws));
    eprintln!("{}", "Drafting...".dimmed());
    let raw = session.ask(request).await;
    session.destroy();
    let raw = raw.context("assistant request failed")?;

    let drafts = ai::parse_drafts(&raw);
    if drafts.is_empty() {
        bail!("could not parse a draft from the reply:\n{raw}");
    }

    if !create {
        if json {
            return print_json(&drafts);
        }
        for (i, d) in drafts.iter().enumerate() {
            print!("{}", format_draft(d, i + 1, default_board));
        }
        return Ok(());
    }

    let gh = GhCli::locate()?;
    let mut outcomes = Vec::new();
    for d in drafts {
        let (board, req) = d.into_request(default_board);
        let title = req.title.clone();
        let outcome = create_on_board(&gh, &ws.config, &board, &req, ws.today)
            .with_context(|| format!("failed to create '{title}'"))?;
        if !json {
            print_outcome(&title, &outcome);
        }
        outcomes.push(outcome);
    }
    if json {
        print_json(&outcomes)?;
    }
    Ok(())
}

pub(crate) fn format_draft(d: &IssueDraft, index: usize, default_board: &str) -> String {
    let mut out = String::new();
    let board = d.board.as_deref().unwrap_or(default_board);
    out.push_str(&format!("{} {}  {}\n", format!("{index}.").cyan(), d.title.bold(), format!("[{board}]").dimmed()));
    if !d.description.is_empty() {
        for line in d.description.lines() {
            out.push_str(&format!("   {line}\n"));
        }
    }
    for c in &d.criteria {
        out.push_str(&format!("   - [ ] {c}\n"));
    }
    if !d.labels.is_empty() {
        out.push_str(&format!("   {} {}\n", "labels:".dimmed(), d.labels.join(", ")));
    }
    if !d.fields.is_empty() {
        let fields: Vec<String> = d.fields.iter().map(|(k, v)| format!("{k}={v}")).collect();
        out.push_str(&format!("   {} {}\n", "fields:".dimmed(), fields.join(", ")));
    }
    out.push('\n');
    out
}

// ─── ask / chat ───────────────────────────────────────────────────────────

/// Stream one reply to stdout, bounded by the session timeout.
async fn stream_reply(session: &AssistantSession, prompt: &str) -> anyhow::Result<()> {
    let timeout = session.options().timeout;
    let mut stream = session.send(prompt);
    let pump = async {
        let mut stdout = std::io::stdout();
        while let Some(chunk) = stream.next().await {
            write!(stdout, "{}", chunk?)?;
            stdout.flush()?;
        }
        writeln!(stdout)?;
        Ok::<_, anyhow::Error>(())
    };
    match tokio::time::timeout(timeout, pump).await {
        Ok(res) => res,
        Err(_) => bail!("timed out after {}s", timeout.as_secs()),
    }
}

async fn ask(ws: &Workspace, question: &str, no_board: bool) -> anyhow::Result<()> {
    let snap = snapshot(ws, no_board);
    let system = ai::chat_system_prompt(&ws.root, snap.as_deref());
    let session = AssistantSession::start(system, session_options(ws));
    let result = stream_reply(&session, question).await;
    session.destroy();
    result
}

async fn chat(ws: &Workspace, no_board: bool) -> anyhow::Result<()> {
    let snap = snapshot(ws, no_board);
    let system = ai::chat_system_prompt(&ws.root, snap.as_deref());
    let session = AssistantSession::start(system, session_options(ws));
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    eprintln!("{}", "Ask anything about the workspace. 'exit' to quit.".dimmed());
    let result = loop {
        eprint!("{} ", "you>".magenta().bold());
        let Some(line) = lines.next_line().await? else {
            break Ok(());
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line.to_lowercase().as_str(), "exit" | "quit" | "q") {
            break Ok(());
        }
        if let Err(e) = stream_reply(&session, line).await {
            break Err(e);
        }
    };
    session.destroy();
    result
}

// ─── analyse ──────────────────────────────────────────────────────────────

async fn analyse(ws: &Workspace, limit: u32, json: bool) -> anyhow::Result<()> {
    let gh = GhCli::locate()?;
    let filter = IssueFilter {
        limit,
        ..Default::default()
    };
    let mut issues = Vec::new();
    for (key, board) in &ws.config.boards {
        let repo = ws.config.qualify_repo(&board.repo);
        let found = gh
            .list_issues(&repo, &filter)
            .with_context(|| format!("failed to list issues for {repo}"))?;
        issues.extend(found.into_iter().map(|issue| BoardIssue {
            repo: repo.clone(),
            board: key.clone(),
            issue,
        }));
    }
    if issues.is_empty() {
        println!("No open issues on the configured boards.");
        return Ok(());
    }
    eprintln!("{}", format!("Analysing {} open issues...", issues.len()).dimmed());

    let opts = SessionOptions {
        timeout: ANALYSIS_TIMEOUT,
        ..session_options(ws)
    };
    let session = AssistantSession::start(ai::analysis_system_prompt(&ws.config.org, &ws.root), opts);
    let raw = session.ask(ai::issues_prompt(&issues)).await;
    session.destroy();
    let raw = raw.context("assistant request failed")?;

    let Some(report) = ai::parse_report(&raw) else {
        bail!("could not parse the analysis report:\n{raw}");
    };
    if json {
        print_json(&report)
    } else {
        print!("{}", format_report(&report, issues.len()));
        Ok(())
    }
}

fn section(out: &mut String, heading: &str) {
    out.push_str(&format!("\n  {}\n", heading.bold()));
}

fn mention(out: &mut String, indent: &str, number: String, title: &str, repo: &str) {
    out.push_str(&format!("{indent}{number}  {title}  {}\n", format!("({})", repo_short(repo)).dimmed()));
}

pub(crate) fn format_report(report: &AnalysisReport, fetched: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n  {}\n\n", "Backlog Analysis Report".magenta().bold()));

    let summary = report.summary.as_ref();
    let total = summary
        .and_then(|s| s.get("total_issues"))
        .and_then(|v| v.as_u64())
        .unwrap_or(fetched as u64);
    out.push_str(&format!("  {}\n", "Summary".bold()));
    out.push_str(&format!("    Total open issues:  {}\n", total.to_string().cyan()));
    if let Some(by_repo) = summary.and_then(|s| s.get("by_repo")).and_then(|v| v.as_object()) {
        for (repo, count) in by_repo {
            out.push_str(&format!("    {:<25} {}\n", repo_short(repo), count));
        }
    }
    if let Some(age) = summary.and_then(|s| s.get("avg_age_days")).and_then(|v| v.as_u64()) {
        out.push_str(&format!("    Average age:        {age} days\n"));
    }

    section(&mut out, if report.duplicates.is_empty() { "No Duplicates Found" } else { "Potential Duplicates" });
    for group in &report.duplicates {
        out.push_str(&format!("    {}\n", group.group.yellow().bold()));
        for m in &group.issues {
            mention(&mut out, "      ", format!("#{}", m.number).cyan().to_string(), &m.title, &m.repo);
        }
        if !group.recommendation.is_empty() {
            out.push_str(&format!("      {}\n", format!("→ {}", group.recommendation).dimmed()));
        }
    }

    section(&mut out, if report.stale.is_empty() { "No Stale Issues" } else { "Stale Issues" });
    for s in &report.stale {
        let number = format!("#{}", s.number);
        let number = if s.recommendation == "close" { number.red() } else { number.yellow() };
        out.push_str(&format!("    {number}  {}  {}\n", s.title, format!("({}, {}d old)", repo_short(&s.repo), s.age_days).dimmed()));
        out.push_str(&format!("      {}\n", format!("→ {}", s.recommendation).dimmed()));
    }

    section(&mut out, "Priority Assessment");
    for bucket in report.priority_assessment.iter().filter(|b| !b.issues.is_empty()) {
        let label = bucket.category.to_uppercase();
        let label = match bucket.category.as_str() {
            "critical" => label.red().bold(),
            "high" => label.yellow().bold(),
            "medium" => label.cyan().bold(),
            _ => label.dimmed(),
        };
        out.push_str(&format!("    {label}  ({} issues)\n", bucket.issues.len()));
        for m in &bucket.issues {
            mention(&mut out, "      ", format!("#{}", m.number).cyan().to_string(), &m.title, &m.repo);
            if let Some(reason) = m.reason.as_deref().filter(|r| !r.is_empty()) {
                out.push_str(&format!("        {}\n", reason.dimmed()));
            }
        }
    }

    section(&mut out, if report.risks_and_blockers.is_empty() { "No Risks or Blockers Identified" } else { "Risks & Blockers" });
    for r in &report.risks_and_blockers {
        mention(&mut out, "    ", format!("#{}", r.issue_number).red().to_string(), &r.title, &r.repo);
        out.push_str(&format!("      {}\n", r.risk.yellow()));
    }

    section(&mut out, if report.quick_wins.is_empty() { "No Quick Wins Identified" } else { "Quick Wins" });
    for w in &report.quick_wins {
        mention(&mut out, "    ", format!("#{}", w.number).green().to_string(), &w.title, &w.repo);
        if let Some(reason) = w.reason.as_deref().filter(|r| !r.is_empty()) {
            out.push_str(&format!("      {}\n", reason.dimmed()));
        }
    }

    if !report.recommendations.is_empty() {
        section(&mut out, "Recommendations");
        for (i, rec) in report.recommendations.iter().enumerate() {
            out.push_str(&format!("    {} {rec}\n", format!("{}.", i + 1).cyan()));
        }
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_rendering() {
        colored::control::set_override(false);
        let drafts = ai::parse_drafts(
            r#"{"title":"Add SSO","description":"Support SAML.","criteria":["login via IdP"],"labels":["auth"],"fields":{"priority":"p1"}}"#,
        );
        let out = format_draft(&drafts[0], 1, "main");
        assert!(out.starts_with("1. Add SSO  [main]\n"));
        assert!(out.contains("   Support SAML.\n"));
        assert!(out.contains("   - [ ] login via IdP\n"));
        assert!(out.contains("labels: auth"));
        assert!(out.contains("fields: priority=p1"));
    }

    #[test]
    fn report_rendering() {
        colored::control::set_override(false);
        let report = ai::parse_report(
            r#"{
                "summary": {"total_issues": 12, "by_repo": {"acme/api": 12}, "avg_age_days": 40},
                "stale": [{"number": 3, "repo": "acme/api", "title": "Old bug", "age_days": 90, "recommendation": "close"}],
                "priority_assessment": [{"category": "critical", "issues": [{"number": 5, "repo": "acme/api", "title": "Data loss", "reason": "corrupts saves"}]}],
                "recommendations": ["Close stale bugs"]
            }"#,
        )
        .unwrap();
        let out = format_report(&report, 12);
        assert!(out.contains("Total open issues:  12"));
        assert!(out.contains("api                       12"));
        assert!(out.contains("Average age:        40 days"));
        assert!(out.contains("No Duplicates Found"));
        assert!(out.contains("#3  Old bug  (api, 90d old)"));
        assert!(out.contains("CRITICAL  (1 issues)"));
        assert!(out.contains("corrupts saves"));
        assert!(out.contains("No Quick Wins Identified"));
        assert!(out.contains("1. Close stale bugs"));
    }
}
