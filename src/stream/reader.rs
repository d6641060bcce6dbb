//! Chunk-to-event reader for the batch progress feed.

use super::decoder::Utf8StreamDecoder;
use super::event::{StreamEvent, parse_line};
use super::lines::LineBuffer;
use crate::utils::truncate_chars;

/// Longest slice of a malformed line echoed into the log
const MAX_LOGGED_CHARS: usize = 200;

/// Counters describing what a reader consumed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReaderStats {
    /// Lines parsed into events
    pub parsed: u64,
    /// Non-blank lines skipped because they failed to parse
    pub malformed: u64,
    /// Bytes of unterminated text dropped at end of stream
    pub discarded_bytes: usize,
}

/// Turns body chunks into [`StreamEvent`]s
///
/// Chunk boundaries are arbitrary: a record can span chunks and a chunk can
/// hold several records. Malformed lines are logged and skipped.
#[derive(Debug, Default)]
pub struct NdjsonReader {
    decoder: Utf8StreamDecoder,
    lines: LineBuffer,
    stats: ReaderStats,
}

impl NdjsonReader {
    /// Create a reader with empty buffers
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return the events it completed, in stream order
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        let text = self.decoder.decode(chunk);
        if text.is_empty() {
            return Vec::new();
        }

        let mut events = Vec::new();
        for line in self.lines.push(&text) {
            match parse_line(&line) {
                Ok(Some(event)) => {
                    self.stats.parsed += 1;
                    events.push(event);
                }
                Ok(None) => {}
                Err(e) => {
                    self.stats.malformed += 1;
                    tracing::warn!(
                        error = %e,
                        line = %truncate_chars(&line, MAX_LOGGED_CHARS),
                        "skipping malformed batch record"
                    );
                }
            }
        }
        events
    }

    /// End of stream: drop any unterminated record and report totals
    pub fn finish(mut self) -> ReaderStats {
        let mut remainder = self.lines.take_remainder();
        remainder.push_str(&self.decoder.finish());

        if !remainder.trim().is_empty() {
            self.stats.discarded_bytes = remainder.len();
            tracing::debug!(
                bytes = remainder.len(),
                "discarding unterminated record at end of stream"
            );
        }
        self.stats
    }

    /// Totals so far
    pub fn stats(&self) -> ReaderStats {
        self.stats
    }
}
