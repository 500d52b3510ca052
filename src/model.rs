//! Data model for the chat session protocol.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Opaque identifier scoping one message exchange.
///
/// Returned by session creation and carried in the path of the message
/// request. There is no server-side close call; the handle is simply
/// discarded once the exchange ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle(String);

impl SessionHandle {
    /// Extract a handle from the identifier value of an open response.
    ///
    /// Follows the upstream truthiness rule: a non-empty string, a non-zero
    /// number, or `true` is an identifier; everything else (missing field,
    /// `null`, empty string, `0`, `false`) is treated as no identifier at
    /// all.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self(s.clone())),
            Value::Number(n) => {
                if n.as_f64() == Some(0.0) {
                    None
                } else {
                    Some(Self(n.to_string()))
                }
            }
            Value::Bool(true) => Some(Self("true".to_string())),
            _ => None,
        }
    }

    /// The raw identifier, as used in the message request path.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The outgoing message request body.
///
/// Besides the message itself every field is fixed: streaming on, re-chat
/// off, all five attachment lists empty, no form data. The server expects
/// the full shape on every call.
#[derive(Debug, Clone, Serialize)]
pub struct MessageRequest {
    message: String,
    stream: bool,
    re_chat: bool,
    image_list: Vec<Value>,
    document_list: Vec<Value>,
    audio_list: Vec<Value>,
    video_list: Vec<Value>,
    other_list: Vec<Value>,
    form_data: Map<String, Value>,
}

impl MessageRequest {
    /// Build the request for one outgoing message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stream: true,
            re_chat: false,
            image_list: Vec::new(),
            document_list: Vec::new(),
            audio_list: Vec::new(),
            video_list: Vec::new(),
            other_list: Vec::new(),
            form_data: Map::new(),
        }
    }

    /// The message text being sent.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A decoded unit of streamed reply text, extracted from one payload line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentEvent {
    /// The `content` string of the payload.
    pub text: String,
}

/// Lifecycle of one exchange, as reported to the surface.
///
/// `Complete`, `Cancelled`, and `Failed` are terminal. Cancellation is
/// deliberately its own state so surfaces never render it as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeStatus {
    /// The session-open request is in flight.
    Opening,
    /// The message was sent; waiting for the response head.
    AwaitingReply,
    /// Events are arriving.
    Streaming,
    /// The stream ended normally.
    Complete,
    /// The exchange was cancelled through its token.
    Cancelled,
    /// The exchange terminated on an error.
    Failed,
}

impl ExchangeStatus {
    /// Whether the exchange has ended in this state.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ExchangeStatus::Complete | ExchangeStatus::Cancelled | ExchangeStatus::Failed
        )
    }
}

impl fmt::Display for ExchangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ExchangeStatus::Opening => "opening session",
            ExchangeStatus::AwaitingReply => "awaiting reply",
            ExchangeStatus::Streaming => "streaming",
            ExchangeStatus::Complete => "done",
            ExchangeStatus::Cancelled => "cancelled",
            ExchangeStatus::Failed => "error",
        };
        f.write_str(text)
    }
}
