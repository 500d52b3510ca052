//! Incremental parsing of the line-delimited event stream.
//!
//! The server pushes a chunked text body where logical lines carry JSON
//! payloads behind a `data:` marker:
//!
//! ```text
//! data: {"content": "Hi"}
//!
//! data: {"content": " there"}
//! ```
//!
//! Network chunks align with neither line boundaries nor UTF-8 character
//! boundaries, so parsing happens in two stateful stages:
//!
//! 1. [`Utf8Decoder`] turns raw byte chunks into text, carrying partial
//!    multi-byte sequences over to the next chunk
//! 2. [`LineParser`] splits the text into lines, buffering the unterminated
//!    remainder, and extracts a [`ContentEvent`] per qualifying line
//!
//! Both stages guarantee that the emitted event sequence depends only on the
//! concatenated input, never on how it was fragmented.

use bytes::BytesMut;
use serde_json::Value;

use crate::model::ContentEvent;

/// Incremental UTF-8 decoder over raw byte chunks.
///
/// A multi-byte character split across two chunks is held back until its
/// remaining bytes arrive. Bytes that can never begin or continue a valid
/// sequence decode to U+FFFD, matching what a lossy text decoder would do.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: BytesMut,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk, returning all text that is complete so far.
    pub fn feed(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let keep = incomplete_suffix_len(&self.pending);
        let complete = self.pending.split_to(self.pending.len() - keep);
        String::from_utf8_lossy(&complete).into_owned()
    }
}

/// Length of a trailing incomplete UTF-8 sequence, 0 if none.
///
/// Scans back over at most three continuation bytes looking for a lead byte
/// whose sequence extends past the end of the buffer. Anything else is left
/// for lossy decoding to reject.
fn incomplete_suffix_len(bytes: &[u8]) -> usize {
    let len = bytes.len();
    for back in 1..=len.min(4) {
        let byte = bytes[len - back];
        if byte & 0b1100_0000 != 0b1000_0000 {
            let need = match byte {
                0xF0..=0xFF => 4,
                0xE0..=0xEF => 3,
                0xC0..=0xDF => 2,
                _ => 1,
            };
            return if need > back { back } else { 0 };
        }
    }
    0
}

/// Extract the payload of a `data:` line.
///
/// Returns the trimmed text after the marker, or `None` when the line does
/// not qualify (no marker, or nothing but whitespace behind it).
///
/// # Example
/// ```
/// use kbchat::sse::parse_data_line;
///
/// assert_eq!(parse_data_line("data: {\"content\":\"x\"}"), Some("{\"content\":\"x\"}"));
/// assert_eq!(parse_data_line("data:"), None);
/// assert_eq!(parse_data_line("event: ping"), None);
/// ```
pub fn parse_data_line(line: &str) -> Option<&str> {
    line.strip_prefix("data:")
        .map(str::trim)
        .filter(|payload| !payload.is_empty())
}

/// Decode one payload into a content event.
///
/// The payload must parse as JSON and carry a string field named `content`.
/// Every other outcome, including plain parse failure, is an expected skip
/// and returns `None`; nothing here is an error.
pub fn content_from_payload(payload: &str) -> Option<ContentEvent> {
    let value: Value = serde_json::from_str(payload).ok()?;
    let text = value.get("content")?.as_str()?;
    Some(ContentEvent {
        text: text.to_string(),
    })
}

/// Stateful line splitter over decoded text fragments.
///
/// Carries the unterminated tail of each fragment into the next `feed`
/// call, so a line split across network chunks is reassembled before it is
/// inspected. Lines end at `\n` or `\r\n`.
#[derive(Debug, Default)]
pub struct LineParser {
    pending: String,
}

impl LineParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the next text fragment and return the events completed by it,
    /// in stream order.
    pub fn feed(&mut self, fragment: &str) -> Vec<ContentEvent> {
        self.pending.push_str(fragment);

        let mut events = Vec::new();
        while let Some(pos) = self.pending.find('\n') {
            let mut line: String = self.pending.drain(..=pos).collect();
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }

            if let Some(payload) = parse_data_line(&line) {
                if let Some(event) = content_from_payload(payload) {
                    events.push(event);
                }
            }
        }
        events
    }

    /// End of stream: discard any unterminated trailing partial line.
    ///
    /// No implicit terminator is assumed, so a payload the server never
    /// finished is dropped rather than parsed.
    pub fn flush(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(events: &[ContentEvent]) -> Vec<&str> {
        events.iter().map(|e| e.text.as_str()).collect()
    }

    #[test]
    fn test_parse_data_line() {
        assert_eq!(parse_data_line("data: hello"), Some("hello"));
        assert_eq!(parse_data_line("data:hello"), Some("hello"));
        assert_eq!(parse_data_line("data:   spaces  "), Some("spaces"));
        assert_eq!(parse_data_line("data:"), None);
        assert_eq!(parse_data_line("data:    "), None);
        assert_eq!(parse_data_line("invalid"), None);
        assert_eq!(parse_data_line(""), None);
    }

    #[test]
    fn test_content_from_payload() {
        assert_eq!(
            content_from_payload("{\"content\":\"Hi\"}").unwrap().text,
            "Hi"
        );
        // empty string content is still an event
        assert_eq!(content_from_payload("{\"content\":\"\"}").unwrap().text, "");
        assert!(content_from_payload("{\"other\":\"x\"}").is_none());
        assert!(content_from_payload("{\"content\":5}").is_none());
        assert!(content_from_payload("{\"content\":null}").is_none());
        assert!(content_from_payload("{not json").is_none());
        assert!(content_from_payload("[1,2,3]").is_none());
    }

    #[test]
    fn parser_emits_in_stream_order() {
        let mut parser = LineParser::new();
        let events = parser.feed(
            "data: {\"content\":\"a\"}\n\ndata: {\"content\":\"b\"}\n\ndata: {\"content\":\"c\"}\n",
        );
        assert_eq!(texts(&events), ["a", "b", "c"]);
    }

    #[test]
    fn parser_handles_crlf_terminators() {
        let mut parser = LineParser::new();
        let events = parser.feed("data: {\"content\":\"a\"}\r\ndata: {\"content\":\"b\"}\r\n");
        assert_eq!(texts(&events), ["a", "b"]);
    }

    #[test]
    fn malformed_line_does_not_interrupt_neighbours() {
        let mut parser = LineParser::new();
        let events = parser.feed(
            "data: {\"content\":\"before\"}\ndata: {not json\ndata: {\"content\":\"after\"}\n",
        );
        assert_eq!(texts(&events), ["before", "after"]);
    }

    #[test]
    fn missing_content_field_yields_nothing() {
        let mut parser = LineParser::new();
        let events = parser.feed("data: {\"other\":\"x\"}\n");
        assert!(events.is_empty());
    }

    #[test]
    fn non_data_lines_are_skipped_silently() {
        let mut parser = LineParser::new();
        let events = parser.feed("event: ping\n: comment\n\ndata: {\"content\":\"x\"}\n");
        assert_eq!(texts(&events), ["x"]);
    }

    #[test]
    fn trailing_remainder_is_rebuffered() {
        let mut parser = LineParser::new();
        assert!(parser.feed("data: {\"content\":\"sp").is_empty());
        let events = parser.feed("lit\"}\n");
        assert_eq!(texts(&events), ["split"]);
    }

    #[test]
    fn flush_discards_unterminated_line() {
        let mut parser = LineParser::new();
        assert!(parser.feed("data: {\"content\":\"lost\"}").is_empty());
        parser.flush();
        assert!(parser.feed("\n").is_empty());
    }

    #[test]
    fn chunk_boundary_invariance_over_all_splits() {
        let transcript = "data: {\"content\":\"Hi\"}\r\n\r\ndata: {not json\n\
                          data: {\"other\":1}\ndata: {\"content\":\" there\"}\n\n";

        let mut whole = LineParser::new();
        let expected = whole.feed(transcript);
        assert_eq!(texts(&expected), ["Hi", " there"]);

        for split in 0..=transcript.len() {
            if !transcript.is_char_boundary(split) {
                continue;
            }
            let mut parser = LineParser::new();
            let mut events = parser.feed(&transcript[..split]);
            events.extend(parser.feed(&transcript[split..]));
            parser.flush();
            assert_eq!(events, expected, "diverged at split {split}");
        }
    }

    #[test]
    fn decoder_passes_ascii_through() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.feed(b"hello"), "hello");
        assert_eq!(decoder.feed(b""), "");
    }

    #[test]
    fn decoder_reassembles_split_two_byte_char() {
        let mut decoder = Utf8Decoder::new();
        let bytes = "h\u{e9}llo".as_bytes(); // é is 0xC3 0xA9
        assert_eq!(decoder.feed(&bytes[..2]), "h");
        assert_eq!(decoder.feed(&bytes[2..]), "\u{e9}llo");
    }

    #[test]
    fn decoder_reassembles_split_three_byte_char() {
        let mut decoder = Utf8Decoder::new();
        let bytes = "\u{4f60}\u{597d}".as_bytes(); // six bytes total
        let mut out = String::new();
        for byte in bytes {
            out.push_str(&decoder.feed(std::slice::from_ref(byte)));
        }
        assert_eq!(out, "\u{4f60}\u{597d}");
    }

    #[test]
    fn decoder_replaces_invalid_bytes() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.feed(&[b'a', 0xFF, b'b']), "a\u{FFFD}b");
    }

    #[test]
    fn decoder_and_parser_invariant_at_every_byte_split() {
        let transcript = "data: {\"content\":\"\u{4f60}\u{597d}\"}\n\ndata: {\"content\":\"!\"}\n";
        let bytes = transcript.as_bytes();

        let mut whole = LineParser::new();
        let expected = whole.feed(transcript);
        assert_eq!(texts(&expected), ["\u{4f60}\u{597d}", "!"]);

        for split in 0..=bytes.len() {
            let mut decoder = Utf8Decoder::new();
            let mut parser = LineParser::new();
            let mut events = parser.feed(&decoder.feed(&bytes[..split]));
            events.extend(parser.feed(&decoder.feed(&bytes[split..])));
            parser.flush();
            assert_eq!(events, expected, "diverged at byte split {split}");
        }
    }
}
