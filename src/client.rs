//! Core client trait and error types.

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::model::{MessageRequest, SessionHandle};
use crate::stream::EventStream;

/// Errors that can occur while running a message exchange.
///
/// Per-line parse failures inside the stream are not represented here.
/// A line that is not `data:`-prefixed, not JSON, or lacks a string
/// `content` field is an expected case and is skipped by the parser.
#[derive(Error, Debug)]
pub enum ChatError {
    /// The session-open request came back with a non-success status.
    #[error("session open failed: HTTP {0}")]
    OpenFailed(reqwest::StatusCode),

    /// The session-open response parsed, but carried no usable identifier.
    ///
    /// A present-but-falsy value (empty string, zero, `false`, `null`) is
    /// treated exactly like a missing one.
    #[error("session open response carried no session identifier")]
    MissingSessionId,

    /// The message request was rejected before any streaming began.
    /// The response body is captured for diagnostics.
    #[error("message request failed: HTTP {status}: {body}")]
    StreamFailed {
        status: reqwest::StatusCode,
        body: String,
    },

    /// Transport-level failure on either request or mid-stream.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Invalid client configuration (bad header value, malformed proxy, ...).
    #[error("configuration error: {0}")]
    Config(String),

    /// The exchange was cancelled through its token.
    ///
    /// Terminal, but distinct from failure; surfaces must not render it as
    /// an error.
    #[error("exchange cancelled")]
    Cancelled,
}

impl ChatError {
    /// Whether this is the cancellation outcome rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ChatError::Cancelled)
    }

    /// One diagnostic line for the log surface: status code plus raw body
    /// where available.
    pub fn diagnostic(&self) -> String {
        match self {
            ChatError::StreamFailed { status, body } => {
                format!("[stream] status={} body={}", status.as_u16(), body)
            }
            ChatError::OpenFailed(status) => {
                format!("[open] status={}", status.as_u16())
            }
            other => format!("error: {other}"),
        }
    }
}

/// The protocol seam between the exchange driver and a concrete transport.
///
/// [`HttpChatClient`](crate::provider::HttpChatClient) is the production
/// implementation; tests substitute their own.
///
/// # Example
/// ```rust,ignore
/// let handle = client.open_session().await?;
/// let events = client
///     .send_message(&handle, MessageRequest::new("hello"), token)
///     .await?;
/// ```
#[async_trait]
pub trait SessionClient: Send + Sync {
    /// Create a chat session and return its handle.
    ///
    /// Single attempt, no retries; the caller decides whether to try again.
    async fn open_session(&self) -> Result<SessionHandle, ChatError>;

    /// Send one message into the session and return the lazy event stream.
    ///
    /// One stream per call. The stream is not restartable; a second call
    /// needs a fresh token.
    async fn send_message(
        &self,
        handle: &SessionHandle,
        request: MessageRequest,
        cancel: CancellationToken,
    ) -> Result<EventStream, ChatError>;
}
