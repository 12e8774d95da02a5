use crate::config::BoardDef;
use crate::error::{BoardError, Result};
use crate::issues::{
    iteration_window, FieldValue, Issue, IssueBackend, IssueDetail, IssueEdit, IssueFilter,
    IssueRef, Iteration, Label, NewIssue,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::PathBuf;

const ISSUE_LIST_FIELDS: &str = "number,title,state,labels,assignees,url,createdAt,updatedAt";
const ISSUE_VIEW_FIELDS: &str = "number,title,body,state,labels,assignees,url,comments,milestone";
const LABEL_LIMIT: &str = "100";

// ---------------------------------------------------------------------------
// GhCli
// ---------------------------------------------------------------------------

/// [`IssueBackend`] backed by the GitHub CLI.
#[derive(Debug, Clone)]
pub struct GhCli {
    bin: PathBuf,
}

impl GhCli {
    /// Locate `gh` on `PATH`.
    pub fn locate() -> Result<Self> {
        let bin = which::which("gh").map_err(|_| BoardError::GhNotInstalled)?;
        Ok(Self { bin })
    }

    pub fn with_binary(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }

    /// Run `gh` and return trimmed stdout. Non-zero exit surfaces stderr.
    fn run(&self, args: &[String]) -> Result<String> {
        tracing::debug!(args = ?args, "gh");
        let output = std::process::Command::new(&self.bin)
            .args(args)
            .output()
            .map_err(|e| BoardError::Gh(e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BoardError::Gh(stderr.trim().to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn run_json<T: for<'de> Deserialize<'de>>(&self, args: &[String]) -> Result<T> {
        let out = self.run(args)?;
        Ok(serde_json::from_str(&out)?)
    }

    fn graphql(&self, query: &str) -> Result<serde_json::Value> {
        self.run_json(&graphql_args(query))
    }
}

impl IssueBackend for GhCli {
    fn create(&self, repo: &str, issue: &NewIssue) -> Result<IssueRef> {
        let url = self.run(&create_args(repo, issue))?;
        Ok(IssueRef::from_url(&url))
    }

    fn edit(&self, repo: &str, number: u64, edit: &IssueEdit) -> Result<()> {
        self.run(&edit_args(repo, number, edit)).map(drop)
    }

    fn close(&self, repo: &str, number: u64) -> Result<()> {
        self.run(&simple_args("close", repo, number)).map(drop)
    }

    fn reopen(&self, repo: &str, number: u64) -> Result<()> {
        self.run(&simple_args("reopen", repo, number)).map(drop)
    }

    fn comment(&self, repo: &str, number: u64, text: &str) -> Result<()> {
        let mut args = simple_args("comment", repo, number);
        args.extend(["--body".to_string(), text.to_string()]);
        self.run(&args).map(drop)
    }

    fn list_labels(&self, repo: &str) -> Result<Vec<Label>> {
        let mut labels: Vec<Label> = self.run_json(&label_args(repo))?;
        labels.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(labels)
    }

    fn list_issues(&self, repo: &str, filter: &IssueFilter) -> Result<Vec<Issue>> {
        self.run_json(&list_args(repo, filter))
    }

    fn view(&self, repo: &str, number: u64) -> Result<IssueDetail> {
        let mut args = simple_args("view", repo, number);
        args.extend(["--json".to_string(), ISSUE_VIEW_FIELDS.to_string()]);
        self.run_json(&args)
    }

    fn add_to_project(&self, owner: &str, board: &BoardDef, issue_url: &str) -> Result<String> {
        #[derive(Deserialize)]
        struct Item {
            id: String,
        }
        let item: Item = self.run_json(&item_add_args(owner, board.number, issue_url))?;
        Ok(item.id)
    }

    fn set_project_field(
        &self,
        project_id: &str,
        item_id: &str,
        field_id: &str,
        value: &FieldValue,
    ) -> Result<()> {
        self.graphql(&set_field_mutation(project_id, item_id, field_id, value))
            .map(drop)
    }

    fn list_iterations(
        &self,
        owner: &str,
        board: &BoardDef,
        today: NaiveDate,
    ) -> Result<Vec<Iteration>> {
        let data = self.graphql(&iterations_query(owner, board.number))?;
        parse_iterations(data, today)
    }
}

// ---------------------------------------------------------------------------
// Argument builders
// ---------------------------------------------------------------------------

fn s(v: &str) -> String {
    v.to_string()
}

pub fn create_args(repo: &str, issue: &NewIssue) -> Vec<String> {
    let mut args = vec![
        s("issue"),
        s("create"),
        s("--repo"),
        s(repo),
        s("--title"),
        issue.title.clone(),
        s("--body"),
        issue.body.clone(),
    ];
    for label in &issue.labels {
        args.extend([s("--label"), label.clone()]);
    }
    args
}

pub fn edit_args(repo: &str, number: u64, edit: &IssueEdit) -> Vec<String> {
    let mut args = simple_args("edit", repo, number);
    if let Some(title) = &edit.title {
        args.extend([s("--title"), title.clone()]);
    }
    if let Some(body) = &edit.body {
        args.extend([s("--body"), body.clone()]);
    }
    if !edit.add_labels.is_empty() {
        args.extend([s("--add-label"), edit.add_labels.join(",")]);
    }
    if !edit.remove_labels.is_empty() {
        args.extend([s("--remove-label"), edit.remove_labels.join(",")]);
    }
    if !edit.add_assignees.is_empty() {
        args.extend([s("--add-assignee"), edit.add_assignees.join(",")]);
    }
    args
}

/// `gh issue <verb> <number> --repo <repo>`
pub fn simple_args(verb: &str, repo: &str, number: u64) -> Vec<String> {
    vec![s("issue"), s(verb), number.to_string(), s("--repo"), s(repo)]
}

pub fn list_args(repo: &str, filter: &IssueFilter) -> Vec<String> {
    let mut args = vec![
        s("issue"),
        s("list"),
        s("--repo"),
        s(repo),
        s("--state"),
        filter.state.clone(),
        s("--limit"),
        filter.limit.to_string(),
        s("--json"),
        s(ISSUE_LIST_FIELDS),
    ];
    for label in &filter.labels {
        args.extend([s("--label"), label.clone()]);
    }
    if let Some(assignee) = &filter.assignee {
        args.extend([s("--assignee"), assignee.clone()]);
    }
    if let Some(search) = &filter.search {
        args.extend([s("--search"), search.clone()]);
    }
    args
}

pub fn label_args(repo: &str) -> Vec<String> {
    vec![
        s("label"),
        s("list"),
        s("--repo"),
        s(repo),
        s("--json"),
        s("name,description"),
        s("--limit"),
        s(LABEL_LIMIT),
    ]
}

pub fn item_add_args(owner: &str, project_number: u64, issue_url: &str) -> Vec<String> {
    vec![
        s("project"),
        s("item-add"),
        project_number.to_string(),
        s("--owner"),
        s(owner),
        s("--url"),
        s(issue_url),
        s("--format"),
        s("json"),
    ]
}

pub fn graphql_args(query: &str) -> Vec<String> {
    vec![s("api"), s("graphql"), s("-f"), format!("query={query}")]
}

pub fn set_field_mutation(
    project_id: &str,
    item_id: &str,
    field_id: &str,
    value: &FieldValue,
) -> String {
    format!(
        "mutation {{ updateProjectV2ItemFieldValue(input: {{ projectId: \"{project_id}\" itemId: \"{item_id}\" fieldId: \"{field_id}\" value: {{ {} }} }}) {{ projectV2Item {{ id }} }} }}",
        value.graphql_input()
    )
}

pub fn iterations_query(owner: &str, project_number: u64) -> String {
    format!(
        "{{ organization(login: \"{owner}\") {{ projectV2(number: {project_number}) {{ field(name: \"Iteration\") {{ ... on ProjectV2IterationField {{ configuration {{ iterations {{ id title startDate duration }} }} }} }} }} }} }}"
    )
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawIteration {
    id: String,
    title: String,
    start_date: String,
    duration: i64,
}

/// Pull iterations out of the `iterations_query` response. A project without
/// an iteration field yields an empty list.
pub fn parse_iterations(data: serde_json::Value, today: NaiveDate) -> Result<Vec<Iteration>> {
    let raw = data
        .pointer("/data/organization/projectV2/field/configuration/iterations")
        .cloned()
        .unwrap_or(serde_json::Value::Array(Vec::new()));
    let raw: Vec<RawIteration> = serde_json::from_value(raw)?;
    raw.into_iter()
        .map(|it| -> Result<Iteration> {
            let start = crate::due::parse_date_arg(&it.start_date)?;
            let (end, current) = iteration_window(start, it.duration, today);
            Ok(Iteration {
                id: it.id,
                title: it.title,
                start,
                end,
                current,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
