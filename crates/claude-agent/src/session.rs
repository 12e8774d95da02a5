use std::sync::{Arc, Mutex};

use futures::StreamExt;

use crate::process::{build_args, ClaudeProcess};
use crate::stream::{SessionSlot, TextStream};
use crate::types::SessionOptions;
use crate::{ClaudeAgentError, Result};

// ─── AssistantSession ─────────────────────────────────────────────────────

/// A multi-turn conversation with the assistant.
///
/// Each [`send`](Self::send) runs one `claude` process. The session id
/// reported by the first turn is passed as `--resume` on later turns, so the
/// assistant keeps its context without this side holding any history.
///
/// ```rust,ignore
/// let session = AssistantSession::start(system_prompt, SessionOptions::default());
/// let mut stream = session.send("What is overdue?");
/// while let Some(chunk) = stream.next().await {
///     print!("{}", chunk?);
/// }
/// let follow_up = session.ask("Draft an issue for the first one").await?;
/// session.destroy();
/// ```
pub struct AssistantSession {
    system_prompt: String,
    opts: SessionOptions,
    session_id: SessionSlot,
    #[cfg(test)]
    mock: Option<Vec<String>>,
}

impl AssistantSession {
    pub fn start(system_prompt: impl Into<String>, opts: SessionOptions) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            opts,
            session_id: Arc::new(Mutex::new(None)),
            #[cfg(test)]
            mock: None,
        }
    }

    /// Run a command in place of `claude` for every turn.
    #[cfg(test)]
    pub(crate) fn with_mock(mut self, argv: &[&str]) -> Self {
        self.mock = Some(argv.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn options(&self) -> &SessionOptions {
        &self.opts
    }

    /// The resumable id, once a turn has reported one.
    pub fn session_id(&self) -> Option<String> {
        self.session_id.lock().ok().and_then(|g| g.clone())
    }

    /// Start a turn and stream the reply text.
    pub fn send(&self, prompt: impl Into<String>) -> TextStream {
        let prompt = prompt.into();
        let resume = self.session_id();
        // The system prompt is fixed by the first turn.
        let system_prompt = if resume.is_some() { "" } else { self.system_prompt.as_str() };
        let args = build_args(&self.opts, system_prompt, resume.as_deref());
        let slot = Arc::clone(&self.session_id);

        #[cfg(test)]
        if let Some(argv) = self.mock.clone() {
            let mut cmd = tokio::process::Command::new(&argv[0]);
            cmd.args(&argv[1..]);
            return TextStream::spawn(async move { ClaudeProcess::spawn_command(cmd) }, slot);
        }

        let opts = self.opts.clone();
        TextStream::spawn(
            async move { ClaudeProcess::spawn(&prompt, &args, &opts).await },
            slot,
        )
    }

    /// Send a prompt and collect the whole reply, failing with
    /// [`ClaudeAgentError::Timeout`] if it takes longer than the configured
    /// timeout.
    pub async fn ask(&self, prompt: impl Into<String>) -> Result<String> {
        let mut stream = self.send(prompt);
        let collect = async {
            let mut out = String::new();
            while let Some(chunk) = stream.next().await {
                out.push_str(&chunk?);
            }
            Ok::<_, ClaudeAgentError>(out)
        };
        match tokio::time::timeout(self.opts.timeout, collect).await {
            Ok(res) => res,
            Err(_) => Err(ClaudeAgentError::Timeout(self.opts.timeout)),
        }
    }

    /// End the conversation. The resume id is forgotten.
    pub fn destroy(self) {
        if let Ok(mut g) = self.session_id.lock() {
            if let Some(id) = g.take() {
                tracing::debug!(session_id = %id, "assistant session closed");
            }
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::tests::{fixture, ASSISTANT, INIT, RESULT};
    use std::time::Duration;

    fn session(opts: SessionOptions) -> AssistantSession {
        AssistantSession::start("You help with the board.", opts)
    }

    #[tokio::test]
    async fn ask_collects_and_captures_session() {
        let f = fixture(&[INIT, ASSISTANT, RESULT]);
        let path = f.path().to_string_lossy().to_string();
        let s = session(SessionOptions::default()).with_mock(&["cat", &path]);
        assert_eq!(s.session_id(), None);

        let reply = s.ask("What is due?").await.unwrap();
        assert_eq!(reply, "Hello there");
        assert_eq!(s.session_id().as_deref(), Some("sess-1"));
    }

    #[tokio::test]
    async fn ask_times_out() {
        let opts = SessionOptions {
            timeout: Duration::from_millis(200),
            ..Default::default()
        };
        let s = session(opts).with_mock(&["sleep", "5"]);
        let err = s.ask("hello").await.unwrap_err();
        assert!(matches!(err, ClaudeAgentError::Timeout(d) if d == Duration::from_millis(200)));
    }

    #[tokio::test]
    async fn missing_executable_is_a_process_error() {
        let opts = SessionOptions {
            executable: Some("/nonexistent/claude-binary".into()),
            ..Default::default()
        };
        let err = session(opts).ask("hi").await.unwrap_err();
        assert!(matches!(err, ClaudeAgentError::Process(m) if m.contains("not found")));
    }

    #[tokio::test]
    async fn destroy_forgets_session() {
        let f = fixture(&[INIT, RESULT]);
        let path = f.path().to_string_lossy().to_string();
        let s = session(SessionOptions::default()).with_mock(&["cat", &path]);
        s.ask("hi").await.unwrap();
        let slot = Arc::clone(&s.session_id);
        s.destroy();
        assert!(slot.lock().unwrap().is_none());
    }
}
