//! `claude-agent`: streaming assistant sessions over the Claude CLI.
//!
//! Speaks the `--output-format stream-json` protocol so callers get reply
//! text as an async stream without a Node.js runtime.
//!
//! ```text
//! AssistantSession   ← system prompt, options, resumable session id
//!     │ send(prompt)
//!     ▼
//! ClaudeProcess      ← spawns `claude --print --output-format stream-json …`
//!     │                 prompt on stdin, JSONL on stdout
//!     ▼
//! TextStream         ← futures::Stream<Item = Result<String>>
//! ```

pub mod error;
pub mod session;
pub mod stream;
pub mod types;

pub(crate) mod process;

pub use error::ClaudeAgentError;
pub use session::AssistantSession;
pub use stream::TextStream;
pub use types::{Message, ResultMessage, SessionOptions, DEFAULT_TIMEOUT};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, ClaudeAgentError>;
