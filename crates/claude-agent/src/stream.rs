use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use crate::process::ClaudeProcess;
use crate::types::Message;
use crate::{ClaudeAgentError, Result};

/// Where the background task records the session id it sees.
pub(crate) type SessionSlot = Arc<Mutex<Option<String>>>;

// ─── TextStream ───────────────────────────────────────────────────────────

/// Assistant reply text, chunk by chunk.
///
/// A background task owns the [`ClaudeProcess`] and forwards text until the
/// turn's result message, EOF, or an error. Dropping the stream closes the
/// channel; the task notices, kills the subprocess and exits.
pub struct TextStream {
    rx: mpsc::Receiver<Result<String>>,
}

impl TextStream {
    pub(crate) fn spawn<F>(start: F, slot: SessionSlot) -> Self
    where
        F: Future<Output = Result<ClaudeProcess>> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(async move {
            let mut process = match start.await {
                Ok(p) => p,
                Err(e) => {
                    let _ = tx.send(Err(e)).await;
                    return;
                }
            };
            pump(&mut process, &tx, &slot).await;
            process.kill().await;
        });
        TextStream { rx }
    }
}

impl Stream for TextStream {
    type Item = Result<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

// ─── Pump ─────────────────────────────────────────────────────────────────

struct Turn {
    saw_delta: bool,
    emitted: bool,
}

/// Forward one turn. With partial messages enabled, text arrives twice
/// (deltas, then the complete assistant message); only the deltas are sent.
async fn pump(process: &mut ClaudeProcess, tx: &mpsc::Sender<Result<String>>, slot: &SessionSlot) {
    let mut turn = Turn {
        saw_delta: false,
        emitted: false,
    };

    loop {
        let next = tokio::select! {
            next = process.next_message() => next,
            _ = tx.closed() => return,
        };
        let msg = match next {
            Ok(Some(msg)) => msg,
            Ok(None) => break,
            Err(e) => {
                let _ = tx.send(Err(e)).await;
                return;
            }
        };

        if let Some(id) = msg.session_id() {
            remember(slot, id);
        }

        match msg {
            Message::System(_) => {}
            Message::StreamEvent(ev) => {
                if let Some(text) = ev.text_delta() {
                    turn.saw_delta = true;
                    if !forward(tx, &mut turn, text).await {
                        return;
                    }
                }
            }
            Message::Assistant(a) => {
                if turn.saw_delta {
                    continue;
                }
                for text in a.texts() {
                    if !forward(tx, &mut turn, text).await {
                        return;
                    }
                }
            }
            Message::Result(r) => {
                if r.is_error() {
                    let _ = tx.send(Err(ClaudeAgentError::Assistant(r.error_text()))).await;
                } else if !turn.emitted {
                    if let Some(text) = r.result.as_deref().filter(|t| !t.is_empty()) {
                        let _ = tx.send(Ok(text.to_string())).await;
                    }
                }
                return;
            }
        }
    }

    // EOF without a result: surface a bad exit status.
    if let Some(err) = process.wait_exit_error().await {
        let _ = tx.send(Err(err)).await;
    }
}

async fn forward(tx: &mpsc::Sender<Result<String>>, turn: &mut Turn, text: &str) -> bool {
    if text.is_empty() {
        return true;
    }
    turn.emitted = true;
    tx.send(Ok(text.to_string())).await.is_ok()
}

fn remember(slot: &SessionSlot, id: &str) {
    if let Ok(mut guard) = slot.lock() {
        if guard.as_deref() != Some(id) {
            tracing::debug!(session_id = id, "assistant session");
            *guard = Some(id.to_string());
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
