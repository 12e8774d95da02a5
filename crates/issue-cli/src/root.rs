use anyhow::Context;
use chrono::NaiveDate;
use issue_core::config::Config;
use issue_core::{due, paths, BoardFile};
use std::path::{Path, PathBuf};

/// Overrides "today" for every date calculation (YYYY-MM-DD).
pub const TODAY_ENV: &str = "ISSUE_TODAY";

/// Resolve the workspace root.
///
/// Priority:
/// 1. `--workspace` flag / `ISSUE_WORKSPACE` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.issue/`
/// 3. Walk upward from `cwd` looking for `.git/`
/// 4. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_upward(&cwd, paths::ISSUE_DIR)
        .or_else(|| find_upward(&cwd, ".git"))
        .unwrap_or(cwd)
}

fn find_upward(start: &Path, marker: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(marker).is_dir())
        .map(Path::to_path_buf)
}

/// Everything a command needs about where it is running.
pub struct Workspace {
    pub root: PathBuf,
    pub config: Config,
    /// The config file in use; `None` means built-in defaults.
    pub config_source: Option<PathBuf>,
    pub board: BoardFile,
    pub today: NaiveDate,
}

impl Workspace {
    pub fn open(root: PathBuf, board_override: Option<&Path>) -> anyhow::Result<Self> {
        let loaded = Config::discover(&root).context("failed to load config")?;
        let board_path = match board_override {
            Some(p) => paths::resolve_board_path(&root, p),
            None => loaded.config.board_path(&root),
        };
        Ok(Self {
            board: BoardFile::new(board_path),
            config: loaded.config,
            config_source: loaded.source,
            today: today()?,
            root,
        })
    }

    /// The configured web UI directory, resolved against the root.
    pub fn web_dist(&self) -> Option<PathBuf> {
        self.config
            .web_dist
            .as_deref()
            .map(|p| paths::resolve_board_path(&self.root, p))
    }
}

fn today() -> anyhow::Result<NaiveDate> {
    match std::env::var(TODAY_ENV) {
        Ok(raw) if !raw.trim().is_empty() => {
            due::parse_date_arg(&raw).with_context(|| format!("invalid {TODAY_ENV}"))
        }
        _ => Ok(chrono::Local::now().date_naive()),
    }
}
