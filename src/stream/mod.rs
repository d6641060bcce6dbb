//! Newline-delimited JSON decoding for the batch progress feed.
//!
//! The backend answers a batch submission with a chunked body of one JSON
//! record per line. Decoding happens in three layers:
//! - [`decoder`] - bytes to text, holding back split multi-byte characters
//! - [`lines`] - text to complete `\n`-terminated lines
//! - [`event`] - lines to typed [`StreamEvent`]s
//!
//! [`NdjsonReader`] combines the three.

pub mod decoder;
pub mod event;
pub mod lines;
pub mod reader;

pub use decoder::Utf8StreamDecoder;
pub use event::{StreamEvent, parse_line};
pub use lines::LineBuffer;
pub use reader::{NdjsonReader, ReaderStats};
