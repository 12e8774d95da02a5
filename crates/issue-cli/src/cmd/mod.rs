pub mod ai;
pub mod board;
pub mod boards;
pub mod card;
pub mod config;
pub mod create;
pub mod dashboard;
pub mod init;
pub mod issues;
pub mod iterations;
pub mod labels;
pub mod serve;
