use serde_json::Value;
use tracing::{debug, warn};

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";
const CONTENT_POINTER: &str = "/choices/0/delta/content";

/// Re-attempts granted to a `data:` line whose payload does not parse.
pub const DEFAULT_PARSE_RETRY_LIMIT: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecoderState {
    Idle,
    Streaming,
    Completed,
    Failed { reason: String },
}

impl DecoderState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DecoderState::Completed | DecoderState::Failed { .. })
    }
}

enum Record {
    Ignored,
    Done,
    Payload(Option<String>),
    Malformed,
}

/// Incremental decoder for a `data: `-framed chat completion stream.
///
/// Bytes are buffered until a full line is available, so chunk boundaries
/// never change the decoded text. A line whose JSON does not parse is pushed
/// back and re-tried on the next chunk, up to `parse_retry_limit` times, then
/// dropped. `None` keeps such a line forever, which stalls every line behind it.
#[derive(Debug)]
pub struct StreamDecoder {
    state: DecoderState,
    utf8_tail: Vec<u8>,
    buffer: String,
    content: String,
    stalled: u32,
    parse_retry_limit: Option<u32>,
}

impl Default for StreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::with_retry_limit(Some(DEFAULT_PARSE_RETRY_LIMIT))
    }

    pub fn with_retry_limit(parse_retry_limit: Option<u32>) -> Self {
        Self {
            state: DecoderState::Idle,
            utf8_tail: Vec::new(),
            buffer: String::new(),
            content: String::new(),
            stalled: 0,
            parse_retry_limit,
        }
    }

    pub fn state(&self) -> &DecoderState {
        &self.state
    }

    /// Full text accumulated so far.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Feed one chunk of the response body. Returns the content deltas that
    /// completed in this chunk, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        match self.state {
            DecoderState::Completed | DecoderState::Failed { .. } => return Vec::new(),
            DecoderState::Idle => self.state = DecoderState::Streaming,
            DecoderState::Streaming => {}
        }
        self.decode_utf8(chunk);
        self.drain_lines(false)
    }

    /// The body reported end-of-data. Any unterminated or held line gets one
    /// last parse attempt before the decoder completes.
    pub fn finish(&mut self) -> Vec<String> {
        if self.state.is_terminal() {
            return Vec::new();
        }
        if !self.utf8_tail.is_empty() {
            let tail = std::mem::take(&mut self.utf8_tail);
            self.buffer.push_str(&String::from_utf8_lossy(&tail));
        }
        if !self.buffer.is_empty() && !self.buffer.ends_with('\n') {
            self.buffer.push('\n');
        }
        let deltas = self.drain_lines(true);
        self.complete();
        deltas
    }

    /// The transport failed; the decoder stops accepting input.
    pub fn fail(&mut self, reason: impl Into<String>) {
        if self.state.is_terminal() {
            return;
        }
        self.state = DecoderState::Failed {
            reason: reason.into(),
        };
        self.discard_buffers();
    }

    fn complete(&mut self) {
        self.state = DecoderState::Completed;
        self.discard_buffers();
    }

    fn discard_buffers(&mut self) {
        self.buffer.clear();
        self.utf8_tail.clear();
        self.stalled = 0;
    }

    fn decode_utf8(&mut self, chunk: &[u8]) {
        self.utf8_tail.extend_from_slice(chunk);
        let bytes = std::mem::take(&mut self.utf8_tail);
        let mut rest = &bytes[..];
        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    if let Ok(text) = std::str::from_utf8(valid) {
                        self.buffer.push_str(text);
                    }
                    match err.error_len() {
                        Some(len) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        // Sequence split across chunks: wait for the rest of it.
                        None => {
                            self.utf8_tail = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
    }

    fn drain_lines(&mut self, last_attempt: bool) -> Vec<String> {
        let mut deltas = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let raw: String = self.buffer.drain(..=pos).collect();
            let line = raw.trim_end_matches('\n');
            let line = line.strip_suffix('\r').unwrap_or(line);

            match classify(line) {
                Record::Ignored => {}
                Record::Done => {
                    debug!("stream sentinel received");
                    self.complete();
                    break;
                }
                Record::Payload(delta) => {
                    self.stalled = 0;
                    if let Some(delta) = delta {
                        self.content.push_str(&delta);
                        deltas.push(delta);
                    }
                }
                Record::Malformed => {
                    let exhausted = self
                        .parse_retry_limit
                        .is_some_and(|limit| self.stalled >= limit);
                    if last_attempt || exhausted {
                        warn!(
                            attempts = self.stalled + 1,
                            line = %line,
                            "dropping unparseable stream record"
                        );
                        self.stalled = 0;
                        continue;
                    }
                    self.stalled += 1;
                    self.buffer.insert_str(0, &raw);
                    break;
                }
            }
        }
        deltas
    }
}

fn classify(line: &str) -> Record {
    if line.trim().is_empty() || line.starts_with(':') {
        return Record::Ignored;
    }
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        debug!(line = %line, "ignoring non-data stream record");
        return Record::Ignored;
    };
    let payload = payload.trim();
    if payload == DONE_SENTINEL {
        return Record::Done;
    }
    match serde_json::from_str::<Value>(payload) {
        Ok(value) => Record::Payload(
            value
                .pointer(CONTENT_POINTER)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        ),
        Err(_) => Record::Malformed,
    }
}
