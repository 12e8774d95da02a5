//! Issue tracker types and the backend contract.
//!
//! [`IssueBackend`] is the narrow seam between the CLI and GitHub. The
//! production implementation is [`crate::gh::GhCli`]; tests substitute an
//! in-memory fake.

use crate::config::{BoardDef, Config};
use crate::error::Result;
use chrono::{Duration, NaiveDate};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueEdit {
    pub title: Option<String>,
    pub body: Option<String>,
    pub add_labels: Vec<String>,
    pub remove_labels: Vec<String>,
    pub add_assignees: Vec<String>,
}

impl IssueEdit {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.body.is_none()
            && self.add_labels.is_empty()
            && self.remove_labels.is_empty()
            && self.add_assignees.is_empty()
    }
}

/// A freshly created issue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueRef {
    pub url: String,
    pub number: Option<u64>,
}

impl IssueRef {
    pub fn from_url(url: &str) -> Self {
        let url = url.trim().to_string();
        let number = url.rsplit('/').next().and_then(|n| n.parse().ok());
        Self { url, number }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelName {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub state: String,
    #[serde(default)]
    pub labels: Vec<LabelName>,
    #[serde(default)]
    pub assignees: Vec<User>,
    pub url: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(default)]
    pub author: Option<User>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueDetail {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub state: String,
    #[serde(default)]
    pub labels: Vec<LabelName>,
    #[serde(default)]
    pub assignees: Vec<User>,
    pub url: String,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub milestone: Option<Milestone>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IssueFilter {
    pub state: String,
    pub limit: u32,
    pub labels: Vec<String>,
    pub assignee: Option<String>,
    pub search: Option<String>,
}

impl Default for IssueFilter {
    fn default() -> Self {
        Self {
            state: "open".into(),
            limit: 30,
            labels: Vec::new(),
            assignee: None,
            search: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Iteration {
    pub id: String,
    pub title: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub current: bool,
}

/// A value for a project field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    SingleSelect(String),
    Iteration(String),
}

impl FieldValue {
    /// The GraphQL `value` input object body.
    pub fn graphql_input(&self) -> String {
        match self {
            FieldValue::SingleSelect(id) => format!("singleSelectOptionId: \"{id}\""),
            FieldValue::Iteration(id) => format!("iterationId: \"{id}\""),
        }
    }
}

// ---------------------------------------------------------------------------
// Backend contract
// ---------------------------------------------------------------------------

pub trait IssueBackend {
    fn create(&self, repo: &str, issue: &NewIssue) -> Result<IssueRef>;
    fn edit(&self, repo: &str, number: u64, edit: &IssueEdit) -> Result<()>;
    fn close(&self, repo: &str, number: u64) -> Result<()>;
    fn reopen(&self, repo: &str, number: u64) -> Result<()>;
    fn comment(&self, repo: &str, number: u64, text: &str) -> Result<()>;
    /// Labels sorted by name.
    fn list_labels(&self, repo: &str) -> Result<Vec<Label>>;
    fn list_issues(&self, repo: &str, filter: &IssueFilter) -> Result<Vec<Issue>>;
    fn view(&self, repo: &str, number: u64) -> Result<IssueDetail>;
    /// Add an issue to a project board. Returns the project item id.
    fn add_to_project(&self, owner: &str, board: &BoardDef, issue_url: &str) -> Result<String>;
    fn set_project_field(
        &self,
        project_id: &str,
        item_id: &str,
        field_id: &str,
        value: &FieldValue,
    ) -> Result<()>;
    fn list_iterations(&self, owner: &str, board: &BoardDef, today: NaiveDate)
        -> Result<Vec<Iteration>>;
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Render an issue body with description, checkbox criteria, and optional
/// context sections.
pub fn build_body(description: &str, criteria: &[String], extra_context: Option<&str>) -> String {
    let mut body = format!("## Description\n\n{description}\n");
    if !criteria.is_empty() {
        body.push_str("\n## Acceptance Criteria\n\n");
        for c in criteria {
            body.push_str(&format!("- [ ] {c}\n"));
        }
    }
    if let Some(extra) = extra_context.filter(|s| !s.trim().is_empty()) {
        body.push_str(&format!("\n## Additional Context\n\n{extra}\n"));
    }
    body
}

/// End date and "is current" for an iteration starting on `start` and
/// lasting `duration_days`. Both ends are inclusive.
pub fn iteration_window(start: NaiveDate, duration_days: i64, today: NaiveDate) -> (NaiveDate, bool) {
    let end = start + Duration::days(duration_days);
    (end, start <= today && today <= end)
}

// ---------------------------------------------------------------------------
// Create on board
// ---------------------------------------------------------------------------

/// Everything needed to create an issue and place it on a project board.
#[derive(Debug, Clone, Default)]
pub struct CreateRequest {
    pub repo: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub criteria: Vec<String>,
    pub extra_context: Option<String>,
    pub labels: Vec<String>,
    /// Single-select field name → option name.
    pub fields: IndexMap<String, String>,
    pub current_iteration: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateOutcome {
    pub issue: IssueRef,
    pub item_id: String,
    pub skipped_labels: Vec<String>,
    pub fields_set: Vec<String>,
    pub skipped_fields: Vec<String>,
}

/// Create an issue, add it to `board_key`'s project and set its fields.
///
/// Labels that do not exist on the repo are dropped rather than failing the
/// create. Unknown fields or options are reported in `skipped_fields`.
pub fn create_on_board(
    backend: &dyn IssueBackend,
    config: &Config,
    board_key: &str,
    req: &CreateRequest,
    today: NaiveDate,
) -> Result<CreateOutcome> {
    let board = config.board(board_key)?;
    let repo = config.qualify_repo(req.repo.as_deref().unwrap_or(&board.repo));

    let mut fields: Vec<(String, String, FieldValue)> = Vec::new();
    let mut skipped_fields = Vec::new();
    for (name, option) in &req.fields {
        match board
            .field(board_key, name)
            .and_then(|f| Ok((f.id.clone(), f.option(name, option)?.to_string())))
        {
            Ok((field_id, option_id)) => {
                fields.push((name.clone(), field_id, FieldValue::SingleSelect(option_id)))
            }
            Err(e) => {
                tracing::warn!("skipping field: {e}");
                skipped_fields.push(format!("{name}={option}"));
            }
        }
    }

    if req.current_iteration {
        match board.fields.get("iteration") {
            Some(field) => {
                let iterations = backend.list_iterations(&config.org, board, today)?;
                match iterations.into_iter().find(|it| it.current) {
                    Some(it) => fields.push((
                        "iteration".into(),
                        field.id.clone(),
                        FieldValue::Iteration(it.id),
                    )),
                    None => skipped_fields.push("iteration".into()),
                }
            }
            None => skipped_fields.push("iteration".into()),
        }
    }

    let (labels, skipped_labels): (Vec<String>, Vec<String>) = if req.labels.is_empty() {
        (Vec::new(), Vec::new())
    } else {
        let existing = backend.list_labels(&repo)?;
        req.labels
            .iter()
            .cloned()
            .partition(|l| existing.iter().any(|e| e.name.eq_ignore_ascii_case(l)))
    };

    let description = req
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or("_(no description)_");
    let issue = backend.create(
        &repo,
        &NewIssue {
            title: req.title.clone(),
            body: build_body(description, &req.criteria, req.extra_context.as_deref()),
            labels,
        },
    )?;

    let item_id = backend.add_to_project(&config.org, board, &issue.url)?;
    let mut fields_set = Vec::new();
    for (name, field_id, value) in fields {
        backend.set_project_field(&board.project_id, &item_id, &field_id, &value)?;
        fields_set.push(name);
    }

    Ok(CreateOutcome {
        issue,
        item_id,
        skipped_labels,
        fields_set,
        skipped_fields,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
