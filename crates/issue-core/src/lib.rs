pub mod ai;
pub mod board;
pub mod config;
pub mod due;
pub mod error;
pub mod gh;
pub mod io;
pub mod issues;
pub mod ops;
pub mod parser;
pub mod paths;
pub mod query;
pub mod serializer;
pub mod store;

pub use board::{Board, Card, Column, Meta};
pub use error::{BoardError, Result};
pub use parser::parse;
pub use serializer::serialize;
pub use store::BoardFile;
