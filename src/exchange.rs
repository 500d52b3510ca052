//! Per-exchange driver: session opening, streaming, output accumulation.
//!
//! One call to [`run_exchange`] owns one exchange from start to terminal
//! status. All state lives in the call frame; the only thing shared across
//! exchanges is the [`ExchangeSlot`], which holds the active cancellation
//! token so that starting a new exchange always cancels the previous one.

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::{ChatError, SessionClient};
use crate::model::{ContentEvent, ExchangeStatus, MessageRequest};

/// The UI collaborator, kept stateless on purpose.
///
/// `output` always receives the full accumulated text, never a delta, so an
/// implementation can overwrite its display without tracking anything. The
/// diagnostic log is append-only and separate from the reply output.
pub trait ChatSurface: Send {
    /// Clear reply output and diagnostic log ahead of a new exchange.
    fn clear(&mut self);

    /// A status transition; terminal states arrive exactly once.
    fn status(&mut self, status: ExchangeStatus);

    /// The full accumulated reply text so far.
    fn output(&mut self, text: &str);

    /// One diagnostic line to append to the log.
    fn append_log(&mut self, line: &str);
}

/// Running reply text for one exchange.
#[derive(Debug, Default)]
pub struct OutputAccumulator {
    text: String,
}

impl OutputAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one event and return the full text accumulated so far.
    pub fn append(&mut self, event: &ContentEvent) -> &str {
        self.text.push_str(&event.text);
        &self.text
    }

    /// The accumulated text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Clear accumulated text for a new exchange.
    pub fn reset(&mut self) {
        self.text.clear();
    }

    /// Consume the accumulator, keeping the final text.
    pub fn into_text(self) -> String {
        self.text
    }
}

/// Single-slot discipline for exchanges sharing one output target.
///
/// At most one exchange may be live per slot. `begin` cancels whatever
/// exchange currently holds the slot before minting the next token, so two
/// live connections can never race to update the same surface.
#[derive(Debug, Default)]
pub struct ExchangeSlot {
    active: Option<CancellationToken>,
}

impl ExchangeSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the active exchange, if any, and return a fresh token for the
    /// next one.
    pub fn begin(&mut self) -> CancellationToken {
        if let Some(previous) = self.active.take() {
            previous.cancel();
        }
        let token = CancellationToken::new();
        self.active = Some(token.clone());
        token
    }

    /// Cancel the active exchange without starting a new one.
    pub fn cancel(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel();
        }
    }
}

/// Run one message exchange end to end.
///
/// Drives open, send, and the event stream, forwarding accumulated text and
/// status transitions to the surface. The token is checked at the top of
/// every suspension point.
///
/// Terminal behavior:
/// - normal completion returns the full reply text
/// - cancellation surfaces as [`ExchangeStatus::Cancelled`] and returns
///   `Err(ChatError::Cancelled)`; it is never rendered as a failure
/// - any other error surfaces as [`ExchangeStatus::Failed`] plus one
///   diagnostic log line, leaving partially accumulated output visible
pub async fn run_exchange<C, S>(
    client: &C,
    message: &str,
    cancel: CancellationToken,
    surface: &mut S,
) -> Result<String, ChatError>
where
    C: SessionClient + ?Sized,
    S: ChatSurface,
{
    surface.clear();
    let mut accumulator = OutputAccumulator::new();

    match drive(client, message, &cancel, surface, &mut accumulator).await {
        Ok(()) => {
            debug!(chars = accumulator.text().len(), "exchange complete");
            surface.status(ExchangeStatus::Complete);
            Ok(accumulator.into_text())
        }
        Err(err) if err.is_cancelled() => {
            surface.status(ExchangeStatus::Cancelled);
            Err(err)
        }
        Err(err) => {
            warn!(error = %err, "exchange failed");
            surface.status(ExchangeStatus::Failed);
            surface.append_log(&err.diagnostic());
            Err(err)
        }
    }
}

async fn drive<C, S>(
    client: &C,
    message: &str,
    cancel: &CancellationToken,
    surface: &mut S,
    accumulator: &mut OutputAccumulator,
) -> Result<(), ChatError>
where
    C: SessionClient + ?Sized,
    S: ChatSurface,
{
    if cancel.is_cancelled() {
        return Err(ChatError::Cancelled);
    }
    surface.status(ExchangeStatus::Opening);
    let handle = client.open_session().await?;

    if cancel.is_cancelled() {
        return Err(ChatError::Cancelled);
    }
    surface.status(ExchangeStatus::AwaitingReply);
    let mut events = client
        .send_message(&handle, MessageRequest::new(message), cancel.clone())
        .await?;

    surface.status(ExchangeStatus::Streaming);
    while let Some(event) = events.next().await {
        let event = event?;
        surface.output(accumulator.append(&event));
    }
    Ok(())
}
