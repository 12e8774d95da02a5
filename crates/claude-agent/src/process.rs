use std::process::Stdio;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::types::{Message, SessionOptions};
use crate::{ClaudeAgentError, Result};

// ─── ClaudeProcess ────────────────────────────────────────────────────────

/// A running `claude` subprocess speaking stream-json in both directions.
///
/// The prompt goes in as one JSON user message on stdin, then stdin is
/// closed. Replies are read as JSONL from stdout. Stderr is drained in the
/// background and surfaced if the process exits non-zero.
pub(crate) struct ClaudeProcess {
    child: Child,
    lines: Lines<BufReader<ChildStdout>>,
    stdin: Option<ChildStdin>,
    stderr_buf: Arc<Mutex<String>>,
}

impl ClaudeProcess {
    /// Spawn `claude` with `args` and send `prompt` as a single user turn.
    ///
    /// `CLAUDECODE` is removed from the environment so nested invocations
    /// from inside a Claude session are not refused.
    pub(crate) async fn spawn(prompt: &str, args: &[String], opts: &SessionOptions) -> Result<Self> {
        let exe = opts
            .executable
            .as_deref()
            .map(|p| p.as_os_str().to_owned())
            .unwrap_or_else(|| "claude".into());
        let mut cmd = Command::new(&exe);
        cmd.args(args).env_remove("CLAUDECODE");
        if let Some(cwd) = &opts.cwd {
            cmd.current_dir(cwd);
        }
        tracing::debug!(exe = ?exe, args = ?args, "spawning assistant");

        let mut process = Self::from_command(cmd).map_err(|e| match e {
            ClaudeAgentError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
                ClaudeAgentError::Process(format!(
                    "'{}' not found: install the Claude CLI or set the executable path",
                    exe.to_string_lossy()
                ))
            }
            other => other,
        })?;

        let user_msg = serde_json::json!({
            "type": "user",
            "message": {
                "role": "user",
                "content": [{"type": "text", "text": prompt}]
            }
        });
        process.send_message(&user_msg).await?;
        process.close_stdin();

        Ok(process)
    }

    /// Spawn an arbitrary command that emits fixed JSON lines.
    #[cfg(test)]
    pub(crate) fn spawn_command(cmd: Command) -> Result<Self> {
        Self::from_command(cmd)
    }

    fn from_command(mut cmd: Command) -> Result<Self> {
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(ClaudeAgentError::Io)?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ClaudeAgentError::Process("stdout not captured".into()))?;
        let stdin = child.stdin.take();

        let stderr_buf = Arc::new(Mutex::new(String::new()));
        if let Some(stderr) = child.stderr.take() {
            let buf = Arc::clone(&stderr_buf);
            tokio::spawn(async move {
                let mut reader = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = reader.next_line().await {
                    if let Ok(mut b) = buf.lock() {
                        if !b.is_empty() {
                            b.push('\n');
                        }
                        b.push_str(&line);
                    }
                }
            });
        }

        Ok(Self {
            child,
            lines: BufReader::new(stdout).lines(),
            stdin,
            stderr_buf,
        })
    }

    async fn send_message(&mut self, msg: &serde_json::Value) -> Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| ClaudeAgentError::Process("stdin already closed".into()))?;

        let mut buf = serde_json::to_vec(msg).map_err(|e| {
            ClaudeAgentError::Process(format!("failed to serialize stdin message: {e}"))
        })?;
        buf.push(b'\n');

        stdin.write_all(&buf).await?;
        stdin.flush().await?;
        Ok(())
    }

    fn close_stdin(&mut self) {
        self.stdin.take();
    }

    /// Next recognised message, or `Ok(None)` at EOF. Blank lines and valid
    /// JSON of an unhandled `type` are skipped.
    pub(crate) async fn next_message(&mut self) -> Result<Option<Message>> {
        loop {
            let Some(line) = self.lines.next_line().await? else {
                return Ok(None);
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<Message>(trimmed) {
                Ok(msg) => return Ok(Some(msg)),
                Err(_) if has_type_field(trimmed) => continue,
                Err(e) => {
                    return Err(ClaudeAgentError::Parse {
                        line: trimmed.to_owned(),
                        source: e,
                    })
                }
            }
        }
    }

    /// Wait for exit; a non-zero status becomes an error carrying stderr.
    pub(crate) async fn wait_exit_error(&mut self) -> Option<ClaudeAgentError> {
        let status = match self.child.wait().await {
            Ok(s) => s,
            Err(e) => return Some(ClaudeAgentError::Io(e)),
        };
        if status.success() {
            return None;
        }

        let stderr = self
            .stderr_buf
            .lock()
            .ok()
            .map(|b| b.clone())
            .unwrap_or_default();
        let head = match status.code() {
            Some(code) => format!("claude exited with code {code}"),
            None => "claude terminated by signal".to_string(),
        };
        let msg = if stderr.is_empty() {
            head
        } else {
            format!("{head}\nstderr: {stderr}")
        };
        Some(ClaudeAgentError::Process(msg))
    }

    pub(crate) async fn kill(&mut self) {
        let _ = self.child.kill().await;
    }
}

/// Valid JSON with a `"type"` we don't model (e.g. `rate_limit_event`).
fn has_type_field(line: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(line)
        .map(|v| v.get("type").is_some())
        .unwrap_or(false)
}

// ─── Arguments ────────────────────────────────────────────────────────────

/// Command-line arguments for one turn. The prompt itself goes on stdin.
pub(crate) fn build_args(
    opts: &SessionOptions,
    system_prompt: &str,
    resume: Option<&str>,
) -> Vec<String> {
    let mut args: Vec<String> = [
        "--print",
        "--output-format",
        "stream-json",
        "--verbose",
        "--input-format",
        "stream-json",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    if opts.include_partial_messages {
        args.push("--include-partial-messages".into());
    }
    if let Some(model) = &opts.model {
        args.extend(["--model".into(), model.clone()]);
    }
    if !system_prompt.is_empty() {
        args.extend(["--system-prompt".into(), system_prompt.to_string()]);
    }
    if !opts.allowed_tools.is_empty() {
        args.push("--allowed-tools".into());
        args.extend(opts.allowed_tools.iter().cloned());
    }
    if let Some(id) = resume {
        args.extend(["--resume".into(), id.to_string()]);
    }
    args
}

// ─── Tests ────────────────────────────────────────────────────────────────
