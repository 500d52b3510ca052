//! Lazy event stream over raw transport chunks.
//!
//! [`decode_chunk_stream`] is the single place where bytes become
//! [`ContentEvent`]s. It owns the decoder and parser state, checks the
//! cancellation token ahead of every read, and ends the stream on the first
//! terminal condition. Dropping the returned stream drops the underlying
//! byte stream with it, which releases the transport connection on every
//! exit path.

use std::collections::VecDeque;
use std::pin::Pin;

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::client::ChatError;
use crate::model::ContentEvent;
use crate::sse::{LineParser, Utf8Decoder};

/// Boxed stream of content events, as handed out by a
/// [`SessionClient`](crate::client::SessionClient).
pub type EventStream = Pin<Box<dyn Stream<Item = Result<ContentEvent, ChatError>> + Send>>;

/// Drive a stream of raw byte chunks through the incremental parser.
///
/// Yields content events in the exact order their lines appeared. The
/// stream terminates after the first `Err` item:
/// - `ChatError::Cancelled` when the token fires; a chunk whose read was
///   already in flight is discarded, not parsed
/// - the transport error, passed through unchanged
///
/// At end of input any unterminated trailing line is discarded and the
/// stream simply ends.
pub fn decode_chunk_stream<S>(
    chunks: S,
    cancel: CancellationToken,
) -> impl Stream<Item = Result<ContentEvent, ChatError>> + Send
where
    S: Stream<Item = Result<Bytes, ChatError>> + Send + 'static,
{
    stream::unfold(
        (
            Box::pin(chunks),
            Utf8Decoder::new(),
            ParseState::default(),
            cancel,
        ),
        |(mut chunks, mut decoder, mut state, cancel)| async move {
            loop {
                if let Some(event) = state.ready.pop_front() {
                    return Some((Ok(event), (chunks, decoder, state, cancel)));
                }
                if state.done {
                    return None;
                }

                // Cancellation is observed here, at the top of the only
                // suspension point in the loop.
                if cancel.is_cancelled() {
                    state.done = true;
                    return Some((Err(ChatError::Cancelled), (chunks, decoder, state, cancel)));
                }

                match chunks.next().await {
                    Some(Ok(chunk)) => {
                        if cancel.is_cancelled() {
                            // The read completed, but cancellation won the
                            // race: discard the chunk rather than parse it.
                            state.done = true;
                            return Some((
                                Err(ChatError::Cancelled),
                                (chunks, decoder, state, cancel),
                            ));
                        }
                        let text = decoder.feed(&chunk);
                        state.ready.extend(state.parser.feed(&text));
                    }
                    Some(Err(err)) => {
                        state.done = true;
                        return Some((Err(err), (chunks, decoder, state, cancel)));
                    }
                    None => {
                        state.parser.flush();
                        state.done = true;
                        return None;
                    }
                }
            }
        },
    )
}

/// Parser state threaded through the unfold.
#[derive(Default)]
struct ParseState {
    parser: LineParser,
    ready: VecDeque<ContentEvent>,
    done: bool,
}
