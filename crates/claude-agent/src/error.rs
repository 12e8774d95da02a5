use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClaudeAgentError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse stream-json line: {source}\n  line: {line}")]
    Parse {
        line: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Process error: {0}")]
    Process(String),

    #[error("Assistant returned an error: {0}")]
    Assistant(String),

    #[error("No response from assistant after {}s", .0.as_secs())]
    Timeout(Duration),
}
