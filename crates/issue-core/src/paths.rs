use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const ISSUE_DIR: &str = ".issue";
pub const BOARD_FILE: &str = "board.kanban.md";

pub const CONFIG_YAML: &str = "config.yaml";
pub const CONFIG_JSON: &str = "config.json";

pub const CONFIG_ENV: &str = "ISSUE_CONFIG";
pub const WORKSPACE_ENV: &str = "ISSUE_WORKSPACE";

pub const DEFAULT_PORT: u16 = 3333;

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn issue_dir(root: &Path) -> PathBuf {
    root.join(ISSUE_DIR)
}

pub fn default_board_path(root: &Path) -> PathBuf {
    root.join(BOARD_FILE)
}

/// Resolve a configured board file. Relative paths are taken from the
/// workspace root.
pub fn resolve_board_path(root: &Path, configured: &Path) -> PathBuf {
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        root.join(configured)
    }
}

/// Config files in lookup order, excluding `$ISSUE_CONFIG`.
pub fn config_candidates(root: &Path, home: Option<&Path>) -> Vec<PathBuf> {
    let mut out = vec![
        issue_dir(root).join(CONFIG_YAML),
        issue_dir(root).join(CONFIG_JSON),
    ];
    if let Some(home) = home {
        out.push(home.join(ISSUE_DIR).join(CONFIG_YAML));
        out.push(home.join(ISSUE_DIR).join(CONFIG_JSON));
    }
    out
}

pub fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_workspace_before_home() {
        let got = config_candidates(Path::new("/ws"), Some(Path::new("/home/me")));
        assert_eq!(
            got,
            vec![
                PathBuf::from("/ws/.issue/config.yaml"),
                PathBuf::from("/ws/.issue/config.json"),
                PathBuf::from("/home/me/.issue/config.yaml"),
                PathBuf::from("/home/me/.issue/config.json"),
            ]
        );
        assert_eq!(config_candidates(Path::new("/ws"), None).len(), 2);
    }

    #[test]
    fn board_path_relative_to_root() {
        let root = Path::new("/ws");
        assert_eq!(
            resolve_board_path(root, Path::new("docs/board.kanban.md")),
            PathBuf::from("/ws/docs/board.kanban.md")
        );
        assert_eq!(
            resolve_board_path(root, Path::new("/tmp/b.md")),
            PathBuf::from("/tmp/b.md")
        );
    }

    #[test]
    fn json_detection() {
        assert!(is_json(Path::new("a/config.JSON")));
        assert!(!is_json(Path::new("a/config.yaml")));
        assert!(!is_json(Path::new("config")));
    }
}
