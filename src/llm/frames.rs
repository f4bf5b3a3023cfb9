//! Decoder for the provider's line-delimited streaming format
//!
//! Each frame is one `data: <json>` line carrying a chat-completion chunk;
//! the stream ends with `data: [DONE]`. Network chunks do not respect line
//! boundaries, so bytes are buffered until a full line is available.

use super::models::ChatCompletionChunk;
use tracing::{debug, warn};

/// Sentinel payload that terminates the stream
pub const DONE_SENTINEL: &str = "[DONE]";

/// Longest line kept while waiting for its terminator
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// One decoded frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A content delta to forward
    Content(String),
    /// The termination sentinel
    Done,
}

/// Incremental frame decoder
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    // bytes of `buffer` already searched for a terminator
    scanned: usize,
    // the current line overflowed and is skipped up to its terminator
    discarding: bool,
    done: bool,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the termination sentinel has been seen
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed raw bytes and return the content deltas of every completed line.
    ///
    /// Nothing is returned once the sentinel has been seen. A line that grows
    /// past [`MAX_LINE_LEN`] without a terminator is dropped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        if self.done {
            return Vec::new();
        }
        self.buffer.extend_from_slice(chunk);

        let mut deltas = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buffer[self.scanned..].iter().position(|b| *b == b'\n') {
            let end = self.scanned + offset;
            self.scanned = end + 1;

            if self.discarding {
                self.discarding = false;
            } else if take_line(&self.buffer[start..end], &mut deltas) {
                debug!("Stream sentinel received");
                self.done = true;
                self.buffer.clear();
                self.scanned = 0;
                return deltas;
            }
            start = end + 1;
        }

        self.buffer.drain(..start);
        self.scanned = self.buffer.len();

        if self.buffer.len() > MAX_LINE_LEN {
            if !self.discarding {
                warn!("Dropping frame longer than {} bytes", MAX_LINE_LEN);
            }
            self.buffer.clear();
            self.scanned = 0;
            self.discarding = true;
        }
        deltas
    }

    /// Decode whatever is left after the upstream closed
    pub fn finish(&mut self) -> Vec<String> {
        let mut deltas = Vec::new();
        let line = std::mem::take(&mut self.buffer);
        self.scanned = 0;
        if !self.done && !self.discarding && !line.is_empty() && take_line(&line, &mut deltas) {
            self.done = true;
        }
        deltas
    }
}

// Returns true when the sentinel was reached
fn take_line(line: &[u8], deltas: &mut Vec<String>) -> bool {
    match decode_line(line) {
        Some(Frame::Content(content)) => {
            deltas.push(content);
            false
        }
        Some(Frame::Done) => true,
        None => false,
    }
}

/// Decode a single line without its terminator.
///
/// Returns `None` for lines that carry nothing to forward: blanks, comments,
/// other fields, content-less chunks and malformed payloads (logged).
pub fn decode_line(line: &[u8]) -> Option<Frame> {
    let line = match std::str::from_utf8(line) {
        Ok(line) => line.trim_end_matches('\r'),
        Err(e) => {
            warn!("Dropping frame with invalid UTF-8: {}", e);
            return None;
        }
    };

    if line.trim().is_empty() || line.starts_with(':') {
        return None;
    }

    let data = line.strip_prefix("data:")?;
    let data = data.strip_prefix(' ').unwrap_or(data);

    if data.trim() == DONE_SENTINEL {
        return Some(Frame::Done);
    }

    match serde_json::from_str::<ChatCompletionChunk>(data) {
        Ok(chunk) => chunk
            .content()
            .filter(|content| !content.is_empty())
            .map(|content| Frame::Content(content.to_string())),
        Err(e) => {
            warn!("Error parsing stream frame: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(content: &str) -> String {
        format!(
            "data: {}\n\n",
            serde_json::json!({"choices": [{"index": 0, "delta": {"content": content}}]})
        )
    }

    #[test]
    fn test_decode_content_line() {
        let line = frame("Hello");
        assert_eq!(
            decode_line(line.trim_end().as_bytes()),
            Some(Frame::Content("Hello".to_string()))
        );
    }

    #[test]
    fn test_decode_ignores_non_content() {
        assert_eq!(decode_line(b""), None);
        assert_eq!(decode_line(b": keep-alive"), None);
        assert_eq!(decode_line(b"event: message"), None);
        assert_eq!(
            decode_line(br#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#),
            None
        );
        assert_eq!(
            decode_line(br#"data: {"choices":[{"delta":{"content":""}}]}"#),
            None
        );
    }

    #[test]
    fn test_decode_sentinel() {
        assert_eq!(decode_line(b"data: [DONE]"), Some(Frame::Done));
        assert_eq!(decode_line(b"data:[DONE]\r"), Some(Frame::Done));
    }

    #[test]
    fn test_malformed_line_emits_nothing() {
        let mut decoder = FrameDecoder::new();
        let input = format!("{}data: {{not json\n\n{}", frame("a"), frame("b"));
        assert_eq!(decoder.push(input.as_bytes()), vec!["a", "b"]);
    }

    #[test]
    fn test_sentinel_stops_emission() {
        let mut decoder = FrameDecoder::new();
        let input = format!("{}data: [DONE]\n\n{}", frame("a"), frame("late"));
        let deltas = decoder.push(input.as_bytes());

        assert_eq!(deltas, vec!["a"]);
        assert!(decoder.is_done());
        assert!(decoder.push(frame("later").as_bytes()).is_empty());
        assert!(decoder.finish().is_empty());
    }

    #[test]
    fn test_frame_split_across_chunks() {
        let mut decoder = FrameDecoder::new();
        let input = frame("héllo wörld");
        let bytes = input.as_bytes();
        // split inside the multi-byte 'é'
        let split = input.find('é').unwrap() + 1;

        assert!(decoder.push(&bytes[..split]).is_empty());
        assert_eq!(decoder.push(&bytes[split..]), vec!["héllo wörld"]);
    }

    #[test]
    fn test_crlf_lines() {
        let mut decoder = FrameDecoder::new();
        let input = frame("x").replace('\n', "\r\n");
        assert_eq!(decoder.push(input.as_bytes()), vec!["x"]);
    }

    #[test]
    fn test_oversized_line_is_dropped() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(b"data: ").is_empty());
        let filler = vec![b'x'; 16 * 1024];
        for _ in 0..6 {
            assert!(decoder.push(&filler).is_empty());
            assert!(decoder.buffer.len() <= MAX_LINE_LEN);
        }

        let rest = format!("xx\n{}", frame("after"));
        assert_eq!(decoder.push(rest.as_bytes()), vec!["after"]);
        assert!(decoder.buffer.is_empty());
    }

    #[test]
    fn test_many_lines_in_one_chunk() {
        let mut decoder = FrameDecoder::new();
        let input: String = (0..100).map(|i| frame(&i.to_string())).collect();
        let deltas = decoder.push(input.as_bytes());

        assert_eq!(deltas.len(), 100);
        assert_eq!(deltas[99], "99");
        assert!(decoder.buffer.is_empty());
    }

    #[test]
    fn test_finish_flushes_unterminated_line() {
        let mut decoder = FrameDecoder::new();
        let input = frame("tail");
        assert!(decoder.push(input.trim_end().as_bytes()).is_empty());
        assert_eq!(decoder.finish(), vec!["tail"]);
    }
}
