//! Newline framing over decoded text.

/// Accumulates decoded text and yields complete `\n`-terminated lines
///
/// The unterminated tail is kept until a later push completes it.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buffer: String,
}

impl LineBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append text and drain every line it completes, in order
    ///
    /// Returned lines do not include the `\n` terminator.
    pub fn push(&mut self, text: &str) -> Vec<String> {
        self.buffer.push_str(text);

        let Some(last_newline) = self.buffer.rfind('\n') else {
            return Vec::new();
        };

        let tail = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, tail);

        complete[..last_newline]
            .split('\n')
            .map(str::to_string)
            .collect()
    }

    /// Unterminated text currently buffered
    pub fn remainder(&self) -> &str {
        &self.buffer
    }

    /// Drop and return the unterminated tail
    pub fn take_remainder(&mut self) -> String {
        std::mem::take(&mut self.buffer)
    }
}
