//! Prompt builders and response parsing for the AI assistant.
//!
//! Nothing here talks to a model. The CLI assembles prompts with these
//! helpers, hands them to `claude_agent`, and feeds the raw replies back
//! through [`parse_drafts`] / [`parse_report`].

use crate::board::Board;
use crate::config::Config;
use crate::issues::{CreateRequest, Issue};
use crate::query;
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// Context blocks
// ---------------------------------------------------------------------------

/// One paragraph per configured board listing its fields and options.
pub fn board_schema_text(config: &Config) -> String {
    let mut lines = Vec::new();
    for (key, board) in &config.boards {
        lines.push(format!(
            "Board '{key}' ({}, project #{}, repo {}):",
            board.name, board.number, board.repo
        ));
        for (name, field) in &board.fields {
            if field.is_iteration() {
                lines.push(format!("  {name}: (iteration field)"));
            } else {
                let opts: Vec<&str> = field.options.keys().map(String::as_str).collect();
                lines.push(format!("  {name}: {}", opts.join(", ")));
            }
        }
    }
    lines.join("\n")
}

/// Plain-text view of the local kanban board: this week's focus then every
/// column with its cards.
pub fn board_snapshot(board: &Board, today: NaiveDate) -> String {
    let mut out = String::new();
    out.push_str(&format!("Local kanban board as of {today}:\n"));
    out.push_str(&format!("{}\n", query::board_summary(board)));

    let focus = query::this_week(board, today);
    if !focus.is_empty() {
        out.push_str("\nThis week:\n");
        for item in &focus {
            out.push_str(&format!("- [{}] {} ({})\n", item.column, item.card.title, item.urgency));
        }
    }

    for column in &board.columns {
        out.push_str(&format!("\n## {} ({})\n", column.name, column.cards.len()));
        for card in &column.cards {
            match card.due_date() {
                Some(due) => {
                    out.push_str(&format!("- {} (due {due})\n", card.title));
                }
                None => {
                    out.push_str(&format!("- {}\n", card.title));
                }
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// System prompts
// ---------------------------------------------------------------------------

/// Labels that exist on a repo, as fetched before drafting.
#[derive(Debug, Clone)]
pub struct RepoLabels {
    pub repo: String,
    /// `None` when the labels could not be fetched.
    pub labels: Option<Vec<String>>,
}

pub fn draft_system_prompt(config: &Config, workspace: &Path, labels: &[RepoLabels]) -> String {
    let mut label_lines: Vec<String> = labels
        .iter()
        .map(|l| match &l.labels {
            Some(names) => format!("Available labels on {}: {}", l.repo, names.join(", ")),
            None => format!("Could not fetch labels for {}.", l.repo),
        })
        .collect();
    label_lines.push("Only use labels from these lists. Do NOT invent labels.".into());

    let repo_map: Vec<String> = config
        .boards
        .iter()
        .map(|(key, b)| format!("  {} -> board \"{key}\"", b.repo))
        .collect();

    format!(
        r#"You are a helpful assistant embedded in the `issue` CLI.
You have access to the user's local workspace at {workspace}.

GitHub organisation: {org}

Repository-to-board mapping:
{repo_map}
Always set "board" based on which repo the issue belongs to.

{schema}

{labels}

Field selection guidelines:
- Use the available field options shown in the board schema above.
- For priority fields: "p0" = critical, "p1" = important, "p2" = normal (default if not specified).
- For size fields: "xs" = trivial, "s" = small, "m" = medium, "l" = large, "xl" = very large.
- For status fields: use what the user specifies, otherwise default to the first option.
- If a field has options, only use values from those options.

When asked to draft issues, always respond with valid JSON: no markdown fences, no preamble, no commentary.

For a SINGLE issue use this schema:
{{
  "title": "<concise issue title>",
  "description": "<detailed description>",
  "criteria": ["<AC 1>", "<AC 2>"],
  "board": "<board key from the list above>",
  "labels": ["<label>"],
  "fields": {{"<field_name>": "<option_key>"}}
}}

For MULTIPLE issues return a JSON array of objects with the same schema.

Never ask clarifying questions. Make your best judgement and draft the issues.
When the user lists multiple items, create a separate issue for each distinct item
unless it clearly makes sense to group closely related ones together.
"#,
        workspace = workspace.display(),
        org = config.org,
        repo_map = repo_map.join("\n"),
        schema = board_schema_text(config),
        labels = label_lines.join("\n"),
    )
}

pub fn chat_system_prompt(workspace: &Path, snapshot: Option<&str>) -> String {
    let mut prompt = format!(
        "You are a helpful assistant embedded in the `issue` CLI.\n\
         You have access to the user's local workspace at {}.\n\
         You can read any file in the workspace to answer questions.\n\
         Keep answers concise and practical.\n",
        workspace.display()
    );
    if let Some(snapshot) = snapshot {
        prompt.push('\n');
        prompt.push_str(snapshot);
    }
    prompt
}

pub fn analysis_system_prompt(org: &str, workspace: &Path) -> String {
    format!(
        r#"You are a senior engineering manager and product owner reviewing a development team's backlog.

Organisation: {org}
Workspace: {workspace}

You will receive a JSON array of all open issues across the configured repositories.
Analyse them and produce a structured JSON report.

Respond ONLY with valid JSON, no markdown and no commentary, using this schema:

{{
  "summary": {{ "total_issues": <int>, "by_repo": {{ "<repo>": <int> }}, "avg_age_days": <int> }},
  "duplicates": [ {{ "group": "<label>", "issues": [ {{ "number": <int>, "repo": "<repo>", "title": "<str>" }} ], "recommendation": "<str>" }} ],
  "stale": [ {{ "number": <int>, "repo": "<repo>", "title": "<str>", "age_days": <int>, "recommendation": "close | deprioritise | needs-update" }} ],
  "priority_assessment": [ {{ "category": "critical | high | medium | low", "issues": [ {{ "number": <int>, "repo": "<repo>", "title": "<str>", "reason": "<str>" }} ] }} ],
  "risks_and_blockers": [ {{ "issue_number": <int>, "repo": "<repo>", "title": "<str>", "risk": "<str>" }} ],
  "quick_wins": [ {{ "number": <int>, "repo": "<repo>", "title": "<str>", "reason": "<str>" }} ],
  "recommendations": [ "<actionable sentence>" ]
}}

Rules:
- "stale" means older than 60 days with no recent activity.
- For duplicates, compare titles and descriptions semantically, not just exact matches.
- Priority should weigh urgency cues, security implications, and user impact.
- If a category has no items, return an empty array.
"#,
        workspace = workspace.display()
    )
}

/// An open issue tagged with where it came from.
#[derive(Debug, Clone)]
pub struct BoardIssue {
    pub repo: String,
    pub board: String,
    pub issue: Issue,
}

#[derive(Serialize)]
struct CompactIssue<'a> {
    number: u64,
    repo: &'a str,
    board: &'a str,
    title: &'a str,
    state: &'a str,
    labels: Vec<&'a str>,
    assignees: Vec<&'a str>,
    created: &'a str,
    updated: &'a str,
}

fn date_part(ts: Option<&str>) -> &str {
    let ts = ts.unwrap_or("");
    ts.get(..10).unwrap_or(ts)
}

/// Compact JSON array of issues for the analysis prompt.
pub fn issues_prompt(issues: &[BoardIssue]) -> String {
    let compact: Vec<CompactIssue<'_>> = issues
        .iter()
        .map(|bi| CompactIssue {
            number: bi.issue.number,
            repo: &bi.repo,
            board: &bi.board,
            title: &bi.issue.title,
            state: &bi.issue.state,
            labels: bi.issue.labels.iter().map(|l| l.name.as_str()).collect(),
            assignees: bi.issue.assignees.iter().map(|a| a.login.as_str()).collect(),
            created: date_part(bi.issue.created_at.as_deref()),
            updated: date_part(bi.issue.updated_at.as_deref()),
        })
        .collect();
    let json = serde_json::to_string_pretty(&compact).unwrap_or_else(|_| "[]".into());
    format!(
        "Here are {} open issues across our boards. Analyse them and produce the JSON report.\n\n{json}",
        issues.len()
    )
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Pull a JSON value out of a model reply. Code fences are stripped; if the
/// text still is not JSON, the outermost `[...]` then `{...}` span is tried.
pub fn extract_json(raw: &str) -> Option<serde_json::Value> {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = match rest.split_once('\n') {
            Some((_, body)) => body,
            None => rest,
        };
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    let text = text.trim();

    if let Ok(v) = serde_json::from_str(text) {
        return Some(v);
    }
    for (open, close) in [('[', ']'), ('{', '}')] {
        if let (Some(start), Some(end)) = (text.find(open), text.rfind(close)) {
            if end > start {
                if let Ok(v) = serde_json::from_str(&text[start..=end]) {
                    return Some(v);
                }
            }
        }
    }
    None
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueDraft {
    pub title: String,
    pub description: String,
    pub criteria: Vec<String>,
    pub board: Option<String>,
    pub labels: Vec<String>,
    pub fields: IndexMap<String, String>,
}

impl IssueDraft {
    /// Board key (falling back to `default_board`) and the create request.
    pub fn into_request(self, default_board: &str) -> (String, CreateRequest) {
        let board = self
            .board
            .filter(|b| !b.trim().is_empty())
            .unwrap_or_else(|| default_board.to_string());
        let fields = self
            .fields
            .into_iter()
            .filter(|(k, _)| !k.eq_ignore_ascii_case("iteration"))
            .collect();
        let req = CreateRequest {
            repo: None,
            title: self.title,
            description: Some(self.description),
            criteria: self.criteria,
            extra_context: None,
            labels: self.labels,
            fields,
            current_iteration: false,
        };
        (board, req)
    }
}

/// Drafts from a model reply. A single object becomes a one-element list;
/// anything unparsable, and drafts without a title, are dropped.
pub fn parse_drafts(raw: &str) -> Vec<IssueDraft> {
    let values = match extract_json(raw) {
        Some(serde_json::Value::Array(items)) => items,
        Some(obj @ serde_json::Value::Object(_)) => vec![obj],
        _ => return Vec::new(),
    };
    values
        .into_iter()
        .filter_map(|v| serde_json::from_value::<IssueDraft>(v).ok())
        .filter(|d| !d.title.trim().is_empty())
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueMention {
    pub number: u64,
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuplicateGroup {
    pub group: String,
    pub issues: Vec<IssueMention>,
    pub recommendation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaleIssue {
    pub number: u64,
    pub repo: String,
    pub title: String,
    pub age_days: i64,
    pub recommendation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityBucket {
    pub category: String,
    pub issues: Vec<IssueMention>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Risk {
    pub issue_number: u64,
    pub repo: String,
    pub title: String,
    pub risk: String,
}

/// Backlog analysis returned by the model. Missing sections are empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisReport {
    pub summary: Option<serde_json::Value>,
    pub duplicates: Vec<DuplicateGroup>,
    pub stale: Vec<StaleIssue>,
    pub priority_assessment: Vec<PriorityBucket>,
    pub risks_and_blockers: Vec<Risk>,
    pub quick_wins: Vec<IssueMention>,
    pub recommendations: Vec<String>,
}

pub fn parse_report(raw: &str) -> Option<AnalysisReport> {
    match extract_json(raw)? {
        v @ serde_json::Value::Object(_) => serde_json::from_value(v).ok(),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issues::LabelName;
    use crate::parser::parse;

    #[test]
    fn drafts_from_fenced_object() {
        let raw = "```json\n{\"title\":\"Fix login\",\"description\":\"d\",\"criteria\":[\"works\"],\"board\":\"main\",\"labels\":[\"bug\"],\"fields\":{\"status\":\"todo\"}}\n```";
        let drafts = parse_drafts(raw);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].title, "Fix login");
        assert_eq!(drafts[0].fields["status"], "todo");
    }

    #[test]
    fn drafts_from_array_with_preamble() {
        let raw = "Sure! Here you go:\n[{\"title\":\"A\"},{\"title\":\"B\",\"labels\":[\"x\"]}]\nLet me know.";
        let drafts = parse_drafts(raw);
        let titles: Vec<_> = drafts.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
        assert!(drafts[0].criteria.is_empty());
    }

    #[test]
    fn drafts_from_garbage_are_empty() {
        assert!(parse_drafts("I could not do that.").is_empty());
        assert!(parse_drafts("[]").is_empty());
        assert!(parse_drafts("42").is_empty());
        assert!(parse_drafts("[{\"description\":\"no title\"}]").is_empty());
    }

    #[test]
    fn draft_into_request_defaults_board() {
        let mut draft = IssueDraft {
            title: "T".into(),
            description: "D".into(),
            ..Default::default()
        };
        draft.fields.insert("status".into(), "todo".into());
        draft.fields.insert("Iteration".into(), "current".into());
        let (board, req) = draft.into_request("main");
        assert_eq!(board, "main");
        assert_eq!(req.fields.len(), 1);
        assert_eq!(req.description.as_deref(), Some("D"));
    }

    #[test]
    fn report_sections_default_to_empty() {
        let raw = r#"{"duplicates":[{"group":"login","issues":[{"number":1,"repo":"o/r","title":"a"}],"recommendation":"close 2"}],"recommendations":["Triage weekly"]}"#;
        let report = parse_report(raw).unwrap();
        assert_eq!(report.duplicates[0].issues[0].number, 1);
        assert!(report.stale.is_empty());
        assert_eq!(report.recommendations, vec!["Triage weekly"]);
        assert!(parse_report("[1,2]").is_none());
        assert!(parse_report("nope").is_none());
    }

    #[test]
    fn schema_lists_options_and_iterations() {
        let text = board_schema_text(&Config::default());
        assert!(text.contains("Board 'main' (Main Project, project #1"));
        assert!(text.contains("  status: todo, in progress, review, done"));
        assert!(text.contains("  iteration: (iteration field)"));
    }

    #[test]
    fn draft_prompt_includes_labels() {
        let labels = vec![
            RepoLabels {
                repo: "o/a".into(),
                labels: Some(vec!["bug".into(), "docs".into()]),
            },
            RepoLabels {
                repo: "o/b".into(),
                labels: None,
            },
        ];
        let prompt = draft_system_prompt(&Config::default(), Path::new("/ws"), &labels);
        assert!(prompt.contains("Available labels on o/a: bug, docs"));
        assert!(prompt.contains("Could not fetch labels for o/b."));
        assert!(prompt.contains("your-org/your-repo -> board \"main\""));
    }

    #[test]
    fn snapshot_lists_focus_and_columns() {
        let board = parse("## To Do\n### Ship\n  - due: 2025-01-07\n### Later\n## Done\n");
        let snap = board_snapshot(&board, NaiveDate::from_ymd_opt(2025, 1, 8).unwrap());
        assert!(snap.contains("To Do: 2  ·  Done: 0"));
        assert!(snap.contains("- [To Do] Ship (1d overdue)"));
        assert!(snap.contains("## To Do (2)\n- Ship (due 2025-01-07)\n- Later\n"));
    }

    #[test]
    fn issues_prompt_is_compact() {
        let issue = Issue {
            number: 9,
            title: "Slow page".into(),
            state: "OPEN".into(),
            labels: vec![LabelName { name: "perf".into() }],
            assignees: Vec::new(),
            url: "u".into(),
            created_at: Some("2024-11-02T10:00:00Z".into()),
            updated_at: None,
        };
        let prompt = issues_prompt(&[BoardIssue {
            repo: "o/r".into(),
            board: "main".into(),
            issue,
        }]);
        assert!(prompt.starts_with("Here are 1 open issues"));
        assert!(prompt.contains("\"created\": \"2024-11-02\""));
        assert!(prompt.contains("\"updated\": \"\""));
        assert!(prompt.contains("\"perf\""));
    }
}
