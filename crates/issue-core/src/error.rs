use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("column not found: {0}")]
    ColumnNotFound(String),

    #[error("card index {index} out of range for column '{column}' ({len} cards)")]
    CardIndexOutOfRange {
        column: String,
        index: usize,
        len: usize,
    },

    #[error("board file not found: {0} (run 'issue init')")]
    BoardFileMissing(PathBuf),

    /// Text the board file cannot hold without losing it on the next read.
    #[error("invalid board content: {0}")]
    InvalidContent(String),

    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("unknown board: {0}")]
    UnknownBoard(String),

    #[error("board '{board}' has no field '{field}'")]
    UnknownField { board: String, field: String },

    #[error("field '{field}' has no option '{option}'")]
    UnknownOption { field: String, option: String },

    #[error("gh error: {0}")]
    Gh(String),

    #[error("gh CLI not found on PATH: install it from https://cli.github.com")]
    GhNotInstalled,

    #[error("home directory not found: set HOME environment variable")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BoardError>;
