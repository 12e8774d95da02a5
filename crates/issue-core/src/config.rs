use crate::error::{BoardError, Result};
use crate::paths;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

impl ConfigWarning {
    fn warning(message: String) -> Self {
        Self {
            level: WarnLevel::Warning,
            message,
        }
    }

    fn error(message: String) -> Self {
        Self {
            level: WarnLevel::Error,
            message,
        }
    }
}

// ---------------------------------------------------------------------------
// Project board definitions
// ---------------------------------------------------------------------------

/// A project field. Single-select fields list their options (lower-cased
/// name → option id); iteration fields have none.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub id: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub options: IndexMap<String, String>,
}

impl FieldDef {
    pub fn is_iteration(&self) -> bool {
        self.options.is_empty()
    }

    /// Option id by name, ignoring case.
    pub fn option(&self, field: &str, name: &str) -> Result<&str> {
        self.options
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name.trim()))
            .map(|(_, v)| v.as_str())
            .ok_or_else(|| BoardError::UnknownOption {
                field: field.to_string(),
                option: name.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardDef {
    pub number: u64,
    pub name: String,
    pub repo: String,
    pub project_id: String,
    #[serde(default)]
    pub fields: IndexMap<String, FieldDef>,
}

impl BoardDef {
    pub fn field(&self, board_key: &str, name: &str) -> Result<&FieldDef> {
        self.fields
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, f)| f)
            .ok_or_else(|| BoardError::UnknownField {
                board: board_key.to_string(),
                field: name.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub org: String,
    pub default_repo: String,
    pub ai_model: String,
    pub boards: IndexMap<String, BoardDef>,
    pub kanban_file: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_dist: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let mut status = FieldDef {
            id: "PVTSSF_status_xxx".into(),
            options: IndexMap::new(),
        };
        for (name, id) in [
            ("todo", "opt_todo"),
            ("in progress", "opt_in_progress"),
            ("review", "opt_review"),
            ("done", "opt_done"),
        ] {
            status.options.insert(name.into(), id.into());
        }
        let iteration = FieldDef {
            id: "PVTIF_iteration_xxx".into(),
            options: IndexMap::new(),
        };

        let mut fields = IndexMap::new();
        fields.insert("status".to_string(), status);
        fields.insert("iteration".to_string(), iteration);

        let mut boards = IndexMap::new();
        boards.insert(
            "main".to_string(),
            BoardDef {
                number: 1,
                name: "Main Project".into(),
                repo: "your-org/your-repo".into(),
                project_id: "PVT_xxx".into(),
                fields,
            },
        );

        Self {
            org: "your-org".into(),
            default_repo: "your-org/your-repo".into(),
            ai_model: "claude-opus-4.6".into(),
            boards,
            kanban_file: PathBuf::from(paths::BOARD_FILE),
            web_dist: None,
        }
    }
}

/// A config together with the file it came from (`None` for built-ins).
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub source: Option<PathBuf>,
}

impl Config {
    /// Find and load the config for `root`: `$ISSUE_CONFIG`, then the
    /// workspace `.issue/`, then `~/.issue/`, then built-in defaults.
    pub fn discover(root: &Path) -> Result<LoadedConfig> {
        let mut candidates = Vec::new();
        if let Some(explicit) = std::env::var_os(paths::CONFIG_ENV).filter(|v| !v.is_empty()) {
            let explicit = PathBuf::from(explicit);
            if explicit.is_file() {
                candidates.push(explicit);
            } else {
                tracing::warn!(path = %explicit.display(), "{} does not exist, ignoring", paths::CONFIG_ENV);
            }
        }
        let home = home::home_dir();
        candidates.extend(paths::config_candidates(root, home.as_deref()));
        Self::load_first(&candidates)
    }

    /// Load the first existing file in `candidates`.
    pub fn load_first(candidates: &[PathBuf]) -> Result<LoadedConfig> {
        for path in candidates {
            if path.is_file() {
                let config = Self::load_file(path)?;
                tracing::debug!(path = %path.display(), "loaded config");
                return Ok(LoadedConfig {
                    config,
                    source: Some(path.clone()),
                });
            }
        }
        tracing::debug!("no config file found, using built-in defaults");
        Ok(LoadedConfig {
            config: Config::default(),
            source: None,
        })
    }

    /// Parse a config file. `.json` files are JSON, anything else YAML.
    pub fn load_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        if paths::is_json(path) {
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(serde_yaml::from_str(&data)?)
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = if paths::is_json(path) {
            serde_json::to_string_pretty(self)?
        } else {
            serde_yaml::to_string(self)?
        };
        crate::io::atomic_write(path, data.as_bytes())
    }

    pub fn board_path(&self, root: &Path) -> PathBuf {
        paths::resolve_board_path(root, &self.kanban_file)
    }

    pub fn board(&self, key: &str) -> Result<&BoardDef> {
        self.boards
            .get(key)
            .ok_or_else(|| BoardError::UnknownBoard(key.to_string()))
    }

    /// `repo` → `org/repo`; already-qualified names pass through.
    pub fn qualify_repo(&self, repo: &str) -> String {
        if repo.contains('/') {
            repo.to_string()
        } else {
            format!("{}/{}", self.org, repo)
        }
    }

    /// The given repo, or the configured default, qualified with the org.
    pub fn repo_or_default(&self, repo: Option<&str>) -> String {
        self.qualify_repo(repo.unwrap_or(&self.default_repo))
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.org.trim().is_empty() {
            warnings.push(ConfigWarning::error("org is empty".into()));
        }
        if self.default_repo.trim().is_empty() {
            warnings.push(ConfigWarning::error("default_repo is empty".into()));
        } else if !self.default_repo.contains('/') {
            warnings.push(ConfigWarning::warning(format!(
                "default_repo '{}' has no owner; '{}' will be used",
                self.default_repo,
                self.qualify_repo(&self.default_repo)
            )));
        }
        if self.boards.is_empty() {
            warnings.push(ConfigWarning::warning(
                "no boards configured; 'issue create' needs at least one".into(),
            ));
        }

        for (key, board) in &self.boards {
            if board.repo.trim().is_empty() {
                warnings.push(ConfigWarning::error(format!("board '{key}' has an empty repo")));
            }
            if board.project_id.trim().is_empty() {
                warnings.push(ConfigWarning::error(format!(
                    "board '{key}' has an empty project_id"
                )));
            }
            for (name, field) in &board.fields {
                if field.id.trim().is_empty() {
                    warnings.push(ConfigWarning::error(format!(
                        "field '{name}' on board '{key}' has no id"
                    )));
                }
            }
        }

        if let Some(dist) = &self.web_dist {
            if !dist.join("index.html").is_file() {
                warnings.push(ConfigWarning::warning(format!(
                    "web_dist '{}' has no index.html",
                    dist.display()
                )));
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_valid() {
        let cfg = Config::default();
        assert_eq!(cfg.org, "your-org");
        assert_eq!(cfg.ai_model, "claude-opus-4.6");
        assert!(cfg.boards["main"].fields["iteration"].is_iteration());
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let cfg: Config = serde_yaml::from_str("org: acme\n").unwrap();
        assert_eq!(cfg.org, "acme");
        assert_eq!(cfg.default_repo, "your-org/your-repo");
        assert_eq!(cfg.kanban_file, PathBuf::from("board.kanban.md"));
        assert!(cfg.boards.contains_key("main"));
    }

    #[test]
    fn json_config_parsed_by_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"org":"acme","default_repo":"acme/api","boards":{"ops":{"number":7,"name":"Ops","repo":"acme/ops","project_id":"PVT_1","fields":{"status":{"id":"F1","options":{"todo":"o1"}}}}}}"#,
        )
        .unwrap();
        let cfg = Config::load_file(&path).unwrap();
        assert_eq!(cfg.boards.len(), 1);
        let ops = cfg.board("ops").unwrap();
        assert_eq!(ops.number, 7);
        assert_eq!(ops.field("ops", "Status").unwrap().option("status", "TODO").unwrap(), "o1");
    }

    #[test]
    fn first_existing_candidate_wins() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.yaml");
        let yaml = dir.path().join("a.yaml");
        let json = dir.path().join("b.json");
        std::fs::write(&yaml, "org: from-yaml\n").unwrap();
        std::fs::write(&json, r#"{"org":"from-json"}"#).unwrap();

        let loaded = Config::load_first(&[missing.clone(), yaml.clone(), json]).unwrap();
        assert_eq!(loaded.config.org, "from-yaml");
        assert_eq!(loaded.source, Some(yaml));

        let fallback = Config::load_first(&[missing]).unwrap();
        assert!(fallback.source.is_none());
        assert_eq!(fallback.config, Config::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(Config::load_file(&path), Err(BoardError::Json(_))));
    }

    #[test]
    fn save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".issue/config.yaml");
        let mut cfg = Config::default();
        cfg.org = "acme".into();
        cfg.save(&path).unwrap();
        assert_eq!(Config::load_file(&path).unwrap(), cfg);
    }

    #[test]
    fn repo_qualification() {
        let cfg = Config::default();
        assert_eq!(cfg.qualify_repo("api"), "your-org/api");
        assert_eq!(cfg.qualify_repo("other/api"), "other/api");
        assert_eq!(cfg.repo_or_default(None), "your-org/your-repo");
    }

    #[test]
    fn unknown_lookups() {
        let cfg = Config::default();
        assert!(matches!(cfg.board("nope"), Err(BoardError::UnknownBoard(_))));
        let main = cfg.board("main").unwrap();
        assert!(matches!(
            main.field("main", "priority"),
            Err(BoardError::UnknownField { .. })
        ));
        assert!(matches!(
            main.fields["status"].option("status", "wontfix"),
            Err(BoardError::UnknownOption { .. })
        ));
    }

    #[test]
    fn validate_flags_problems() {
        let mut cfg = Config::default();
        cfg.org = String::new();
        cfg.default_repo = "api".into();
        cfg.boards.get_mut("main").unwrap().fields.get_mut("status").unwrap().id = String::new();
        let warnings = cfg.validate();
        let messages: Vec<_> = warnings.iter().map(|w| w.message.as_str()).collect();
        assert!(messages.contains(&"org is empty"));
        assert!(messages.iter().any(|m| m.contains("has no owner")));
        assert!(messages.iter().any(|m| m.contains("field 'status'")));
    }

    #[test]
    fn board_path_resolution() {
        let cfg = Config::default();
        assert_eq!(cfg.board_path(Path::new("/ws")), PathBuf::from("/ws/board.kanban.md"));
    }
}
