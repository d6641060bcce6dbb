//! Incremental UTF-8 decoding of chunked response bodies.

/// Stateful UTF-8 decoder for byte chunks that may split multi-byte characters
///
/// An incomplete sequence at the end of a chunk is held back and completed by
/// the next call. Invalid sequences decode to U+FFFD and decoding continues.
#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    pending: Vec<u8>,
}

impl Utf8StreamDecoder {
    /// Create an empty decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a chunk, returning all text that is complete so far
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);

        let mut text = String::with_capacity(self.pending.len());
        let mut input: &[u8] = &self.pending;

        loop {
            match std::str::from_utf8(input) {
                Ok(valid) => {
                    text.push_str(valid);
                    input = &[];
                    break;
                }
                Err(e) => {
                    let (valid, rest) = input.split_at(e.valid_up_to());
                    text.push_str(std::str::from_utf8(valid).unwrap_or_default());

                    match e.error_len() {
                        Some(invalid_len) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            input = &rest[invalid_len..];
                        }
                        None => {
                            // Truncated sequence: wait for the next chunk
                            input = rest;
                            break;
                        }
                    }
                }
            }
        }

        let held_back = input.len();
        let consumed = self.pending.len() - held_back;
        self.pending.drain(..consumed);
        text
    }

    /// Whether bytes of an unfinished character are buffered
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Flush at end of input; a dangling partial character becomes U+FFFD
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        self.pending.clear();
        char::REPLACEMENT_CHARACTER.to_string()
    }
}
