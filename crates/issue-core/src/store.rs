use crate::board::{Board, DEFAULT_COLUMNS};
use crate::error::{BoardError, Result};
use crate::{io, parser, serializer};
use std::path::{Path, PathBuf};

/// The board file on disk. Every operation reads it fresh; there is no
/// cached copy and no locking, so concurrent writers race and the last
/// write wins.
#[derive(Debug, Clone)]
pub struct BoardFile {
    path: PathBuf,
}

impl BoardFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn load(&self) -> Result<Board> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(parser::parse(&text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BoardError::BoardFileMissing(self.path.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, board: &Board) -> Result<()> {
        io::atomic_write(&self.path, serializer::serialize(board).as_bytes())
    }

    /// Read, mutate, write back. Nothing is written if `f` fails.
    pub fn update<T>(&self, f: impl FnOnce(&mut Board) -> Result<T>) -> Result<T> {
        let mut board = self.load()?;
        let out = f(&mut board)?;
        self.save(&board)?;
        Ok(out)
    }

    /// Create the file with `columns` (or the default set) unless it exists.
    /// Returns true if a new file was written.
    pub fn init(&self, columns: Option<&[String]>) -> Result<bool> {
        let board = match columns {
            Some(cols) if !cols.is_empty() => Board::with_columns(cols.iter().map(String::as_str)),
            _ => Board::with_columns(DEFAULT_COLUMNS),
        };
        board.check()?;
        let written = io::write_if_missing(&self.path, serializer::serialize(&board).as_bytes())?;
        if written {
            tracing::debug!(path = %self.path.display(), "initialised board file");
        }
        Ok(written)
    }
}
