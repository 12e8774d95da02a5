use crate::output::print_json;
use crate::root::Workspace;
use anyhow::bail;
use clap::Subcommand;
use colored::Colorize;
use issue_core::gh::GhCli;
use issue_core::issues::{Issue, IssueBackend, IssueDetail, IssueEdit, IssueFilter};

const COMMENTS_SHOWN: usize = 5;
const COMMENT_PREVIEW_LINES: usize = 4;

#[derive(Subcommand)]
pub enum IssuesSubcommand {
    /// List issues
    List {
        #[arg(long)]
        repo: Option<String>,
        /// open, closed or all
        #[arg(long, default_value = "open")]
        state: String,
        #[arg(long, default_value_t = 30)]
        limit: u32,
        /// Filter by label (repeatable)
        #[arg(long = "label")]
        labels: Vec<String>,
        #[arg(long)]
        assignee: Option<String>,
        /// GitHub search query
        #[arg(long)]
        search: Option<String>,
    },
    /// Show an issue with its latest comments
    View {
        number: String,
        #[arg(long)]
        repo: Option<String>,
    },
    /// Change title, body, labels or assignees
    Edit {
        number: String,
        #[arg(long)]
        repo: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        body: Option<String>,
        #[arg(long = "add-label")]
        add_labels: Vec<String>,
        #[arg(long = "remove-label")]
        remove_labels: Vec<String>,
        #[arg(long = "add-assignee")]
        add_assignees: Vec<String>,
    },
    Close {
        number: String,
        #[arg(long)]
        repo: Option<String>,
    },
    Reopen {
        number: String,
        #[arg(long)]
        repo: Option<String>,
    },
    /// Add a comment
    Comment {
        number: String,
        #[arg(required = true)]
        text: Vec<String>,
        #[arg(long)]
        repo: Option<String>,
    },
}

/// Accepts `42` or `#42`.
pub(crate) fn parse_number(raw: &str) -> anyhow::Result<u64> {
    let trimmed = raw.trim().trim_start_matches('#');
    match trimmed.parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => bail!("invalid issue number: '{raw}'"),
    }
}

pub fn run(ws: &Workspace, subcmd: IssuesSubcommand, json: bool) -> anyhow::Result<()> {
    let gh = GhCli::locate()?;
    run_with(&gh, ws, subcmd, json)
}

fn run_with(
    backend: &dyn IssueBackend,
    ws: &Workspace,
    subcmd: IssuesSubcommand,
    json: bool,
) -> anyhow::Result<()> {
    let repo_of = |r: Option<String>| ws.config.repo_or_default(r.as_deref());
    match subcmd {
        IssuesSubcommand::List {
            repo,
            state,
            limit,
            labels,
            assignee,
            search,
        } => {
            let repo = repo_of(repo);
            let filter = IssueFilter {
                state,
                limit,
                labels,
                assignee,
                search,
            };
            let issues = backend.list_issues(&repo, &filter)?;
            if json {
                return print_json(&issues);
            }
            if issues.is_empty() {
                println!("No issues found in {repo}.");
            } else {
                print!("{}", issue_table(&issues));
            }
        }
        IssuesSubcommand::View { number, repo } => {
            let detail = backend.view(&repo_of(repo), parse_number(&number)?)?;
            if json {
                return print_json(&detail);
            }
            print!("{}", issue_detail(&detail));
        }
        IssuesSubcommand::Edit {
            number,
            repo,
            title,
            body,
            add_labels,
            remove_labels,
            add_assignees,
        } => {
            let number = parse_number(&number)?;
            let edit = IssueEdit {
                title,
                body,
                add_labels,
                remove_labels,
                add_assignees,
            };
            if edit.is_empty() {
                bail!("nothing to change: pass --title, --body, --add-label, --remove-label or --add-assignee");
            }
            let repo = repo_of(repo);
            backend.edit(&repo, number, &edit)?;
            done(json, "edited", &repo, number)?;
        }
        IssuesSubcommand::Close { number, repo } => {
            let (repo, number) = (repo_of(repo), parse_number(&number)?);
            backend.close(&repo, number)?;
            done(json, "closed", &repo, number)?;
        }
        IssuesSubcommand::Reopen { number, repo } => {
            let (repo, number) = (repo_of(repo), parse_number(&number)?);
            backend.reopen(&repo, number)?;
            done(json, "reopened", &repo, number)?;
        }
        IssuesSubcommand::Comment { number, text, repo } => {
            let (repo, number) = (repo_of(repo), parse_number(&number)?);
            backend.comment(&repo, number, &text.join(" "))?;
            done(json, "commented", &repo, number)?;
        }
    }
    Ok(())
}

fn done(json: bool, action: &str, repo: &str, number: u64) -> anyhow::Result<()> {
    if json {
        print_json(&serde_json::json!({ "action": action, "repo": repo, "number": number }))
    } else {
        println!("{repo}#{number} {action}");
        Ok(())
    }
}

fn state_dot(state: &str) -> colored::ColoredString {
    if state.eq_ignore_ascii_case("open") {
        "●".green()
    } else {
        "●".red()
    }
}

pub(crate) fn issue_table(issues: &[Issue]) -> String {
    let num_w = issues
        .iter()
        .map(|i| i.number.to_string().len())
        .max()
        .unwrap_or(1);
    let mut out = String::new();
    for (idx, issue) in issues.iter().enumerate() {
        let labels: Vec<&str> = issue.labels.iter().map(|l| l.name.as_str()).collect();
        let label_str = if labels.is_empty() {
            String::new()
        } else {
            format!("  {}", format!("[{}]", labels.join(", ")).dimmed())
        };
        out.push_str(&format!(
            "  {}  {}  {}  {}{label_str}\n",
            format!("{:>3}", idx + 1).dimmed(),
            state_dot(&issue.state),
            format!("#{:<num_w$}", issue.number).cyan(),
            issue.title
        ));
    }
    out
}

pub(crate) fn issue_detail(issue: &IssueDetail) -> String {
    let mut out = String::new();
    let badge = if issue.state.eq_ignore_ascii_case("open") {
        "OPEN".green()
    } else {
        issue.state.to_uppercase().red()
    };
    out.push_str(&format!(
        "{}  {}  [{badge}]\n",
        format!("#{}", issue.number).bold(),
        issue.title.yellow().bold()
    ));
    out.push_str(&format!("{}\n\n", issue.url.dimmed()));

    let labels: Vec<&str> = issue.labels.iter().map(|l| l.name.as_str()).collect();
    if !labels.is_empty() {
        out.push_str(&format!("  {}    {}\n", "Labels:".bold(), labels.join(", ")));
    }
    let assignees: Vec<&str> = issue.assignees.iter().map(|a| a.login.as_str()).collect();
    if !assignees.is_empty() {
        out.push_str(&format!("  {} {}\n", "Assignees:".bold(), assignees.join(", ")));
    }
    if let Some(ms) = issue.milestone.as_ref().filter(|m| !m.title.is_empty()) {
        out.push_str(&format!("  {} {}\n", "Milestone:".bold(), ms.title));
    }

    let rule = "─".repeat(50);
    let body = if issue.body.trim().is_empty() {
        "_(no body)_"
    } else {
        issue.body.as_str()
    };
    out.push_str(&format!("\n{}\n", rule.dimmed()));
    for line in body.lines() {
        out.push_str(&format!("{} {line}\n", "│".dimmed()));
    }
    out.push_str(&format!("{}\n", rule.dimmed()));

    if !issue.comments.is_empty() {
        out.push_str(&format!("\n{}\n\n", format!("Comments ({}):", issue.comments.len()).bold()));
        let skip = issue.comments.len().saturating_sub(COMMENTS_SHOWN);
        for c in &issue.comments[skip..] {
            let author = c.author.as_ref().map_or("unknown", |a| a.login.as_str());
            let created = c.created_at.as_deref().unwrap_or("");
            let created = created.get(..10).unwrap_or(created);
            out.push_str(&format!("  {}  {}\n", author.cyan(), created.dimmed()));
            let lines: Vec<&str> = c.body.lines().collect();
            for line in lines.iter().take(COMMENT_PREVIEW_LINES) {
                out.push_str(&format!("    {line}\n"));
            }
            if lines.len() > COMMENT_PREVIEW_LINES {
                let more = format!("... ({} more lines)", lines.len() - COMMENT_PREVIEW_LINES);
                out.push_str(&format!("    {}\n", more.dimmed()));
            }
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use issue_core::issues::{Comment, LabelName, Milestone, User};

    #[test]
    fn issue_numbers() {
        assert_eq!(parse_number("42").unwrap(), 42);
        assert_eq!(parse_number(" #7 ").unwrap(), 7);
        assert!(parse_number("0").is_err());
        assert!(parse_number("abc").is_err());
    }

    fn issue(number: u64, title: &str, labels: &[&str]) -> Issue {
        Issue {
            number,
            title: title.into(),
            state: "OPEN".into(),
            labels: labels.iter().map(|l| LabelName { name: l.to_string() }).collect(),
            assignees: vec![],
            url: format!("https://github.com/acme/api/issues/{number}"),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn table_pads_numbers_and_lists_labels() {
        colored::control::set_override(false);
        let out = issue_table(&[issue(7, "Small", &[]), issue(123, "Big", &["bug", "p1"])]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "    1  ●  #7    Small");
        assert_eq!(lines[1], "    2  ●  #123  Big  [bug, p1]");
    }

    #[test]
    fn detail_shows_last_comments_truncated() {
        colored::control::set_override(false);
        let comments = (0..7)
            .map(|i| Comment {
                author: Some(User { login: format!("user{i}") }),
                body: if i == 6 { "a\nb\nc\nd\ne\nf".into() } else { format!("comment {i}") },
                created_at: Some("2026-10-01T10:00:00Z".into()),
            })
            .collect();
        let detail = IssueDetail {
            number: 9,
            title: "Crash on save".into(),
            body: String::new(),
            state: "CLOSED".into(),
            labels: vec![],
            assignees: vec![User { login: "sam".into() }],
            url: "https://github.com/acme/api/issues/9".into(),
            comments,
            milestone: Some(Milestone { title: "v2".into() }),
        };
        let out = issue_detail(&detail);
        assert!(out.contains("#9  Crash on save  [CLOSED]"));
        assert!(out.contains("Assignees: sam"));
        assert!(out.contains("Milestone: v2"));
        assert!(out.contains("│ _(no body)_"));
        assert!(out.contains("Comments (7):"));
        assert!(!out.contains("user1 "));
        assert!(out.contains("user2  2026-10-01"));
        assert!(out.contains("... (2 more lines)"));
    }
}
