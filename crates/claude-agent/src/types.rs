use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

// ─── Message ──────────────────────────────────────────────────────────────

/// The subset of `claude --output-format stream-json` messages a text
/// session cares about. Discriminated by the JSON `"type"` field; other
/// types are skipped by the reader.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    System(SystemMessage),
    Assistant(AssistantMessage),
    /// Partial assistant output (`--include-partial-messages`).
    StreamEvent(StreamEventMessage),
    Result(ResultMessage),
}

impl Message {
    pub fn session_id(&self) -> Option<&str> {
        let id = match self {
            Message::System(m) => &m.session_id,
            Message::Assistant(m) => &m.session_id,
            Message::StreamEvent(m) => &m.session_id,
            Message::Result(m) => &m.session_id,
        };
        Some(id.as_str()).filter(|s| !s.is_empty())
    }
}

// ─── System ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SystemMessage {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub subtype: String,
    #[serde(default)]
    pub model: Option<String>,
}

// ─── Assistant ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub session_id: String,
    pub message: AssistantContent,
}

impl AssistantMessage {
    /// Text blocks in order; tool calls are dropped.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.message.content.iter().filter_map(|b| match b {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssistantContent {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    #[serde(other)]
    Other,
}

// ─── Stream events ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamEventMessage {
    #[serde(default)]
    pub session_id: String,
    pub event: StreamEvent,
}

impl StreamEventMessage {
    pub fn text_delta(&self) -> Option<&str> {
        match &self.event {
            StreamEvent::ContentBlockDelta {
                delta: Delta::TextDelta { text },
            } => Some(text.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    ContentBlockDelta { delta: Delta },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Delta {
    TextDelta { text: String },
    #[serde(other)]
    Other,
}

// ─── Result ───────────────────────────────────────────────────────────────

/// Terminal message of a turn. `subtype` is `success` or one of the
/// `error_*` variants.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResultMessage {
    pub subtype: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default)]
    pub num_turns: u32,
    #[serde(default)]
    pub total_cost_usd: Option<f64>,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl ResultMessage {
    pub fn is_error(&self) -> bool {
        self.is_error || self.subtype.starts_with("error")
    }

    pub fn error_text(&self) -> String {
        if !self.errors.is_empty() {
            return self.errors.join("; ");
        }
        self.result.clone().unwrap_or_else(|| self.subtype.clone())
    }
}

// ─── SessionOptions ───────────────────────────────────────────────────────

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub model: Option<String>,
    /// Path to the `claude` binary. Defaults to `claude` on `PATH`.
    pub executable: Option<PathBuf>,
    pub cwd: Option<PathBuf>,
    /// Applies to [`crate::AssistantSession::ask`].
    pub timeout: Duration,
    /// Ask the CLI for partial messages so text streams as it is generated.
    pub include_partial_messages: bool,
    pub allowed_tools: Vec<String>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            model: None,
            executable: None,
            cwd: None,
            timeout: DEFAULT_TIMEOUT,
            include_partial_messages: true,
            allowed_tools: Vec::new(),
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Message {
        serde_json::from_str(json).expect("failed to parse message")
    }

    #[test]
    fn parse_system_init() {
        let msg = parse(
            r#"{"type":"system","subtype":"init","session_id":"abc-123","model":"claude-opus-4.6","tools":["Read"],"cwd":"/tmp"}"#,
        );
        let Message::System(sys) = &msg else {
            panic!("expected System")
        };
        assert_eq!(sys.subtype, "init");
        assert_eq!(sys.model.as_deref(), Some("claude-opus-4.6"));
        assert_eq!(msg.session_id(), Some("abc-123"));
    }

    #[test]
    fn assistant_texts_skip_tool_use() {
        let msg = parse(
            r#"{"type":"assistant","session_id":"s","message":{"id":"m","role":"assistant","content":[
                {"type":"text","text":"Reading the board."},
                {"type":"tool_use","id":"tu_1","name":"Read","input":{"file_path":"board.kanban.md"}},
                {"type":"thinking","thinking":"..."},
                {"type":"text","text":"Done."}
            ]}}"#,
        );
        let Message::Assistant(a) = msg else {
            panic!("expected Assistant")
        };
        assert_eq!(a.texts().collect::<Vec<_>>(), vec!["Reading the board.", "Done."]);
    }

    #[test]
    fn stream_event_text_delta() {
        let msg = parse(
            r#"{"type":"stream_event","session_id":"s","event":{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hel"}}}"#,
        );
        let Message::StreamEvent(ev) = msg else {
            panic!("expected StreamEvent")
        };
        assert_eq!(ev.text_delta(), Some("Hel"));

        let other = parse(r#"{"type":"stream_event","session_id":"s","event":{"type":"message_start","message":{}}}"#);
        let Message::StreamEvent(ev) = other else {
            panic!("expected StreamEvent")
        };
        assert_eq!(ev.text_delta(), None);
    }

    #[test]
    fn result_success_and_error() {
        let ok = parse(
            r#"{"type":"result","subtype":"success","session_id":"s","result":"hi","is_error":false,"num_turns":1,"total_cost_usd":0.01}"#,
        );
        let Message::Result(r) = ok else {
            panic!("expected Result")
        };
        assert!(!r.is_error());
        assert_eq!(r.result.as_deref(), Some("hi"));

        let err = parse(
            r#"{"type":"result","subtype":"error_max_turns","session_id":"s","is_error":true,"errors":["Reached maximum turn limit"]}"#,
        );
        let Message::Result(r) = err else {
            panic!("expected Result")
        };
        assert!(r.is_error());
        assert_eq!(r.error_text(), "Reached maximum turn limit");
    }

    #[test]
    fn unknown_type_is_a_parse_error() {
        assert!(serde_json::from_str::<Message>(r#"{"type":"rate_limit_event"}"#).is_err());
    }
}
