//! Line framing for controller responses.
//!
//! Frame format:
//! - BODY (0-255 bytes): ASCII text
//! - TERMINATOR (1 byte): `\n`
//!
//! A line that reaches [`LINE_CAPACITY`] without a terminator is cut there
//! and delivered as is.

use heapless::{String, Vec};

/// Maximum line length in bytes, terminator included
pub const LINE_CAPACITY: usize = 256;

/// Line terminator
pub const LINE_END: u8 = b'\n';

/// Characters stripped from both ends of a line before classification
pub const TRIM_CHARS: [char; 4] = [' ', '\n', '\r', '#'];

/// A complete, trimmed response line
pub type Line = String<LINE_CAPACITY>;

/// Reasons a line could not be produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Nothing at all arrived within the read timeout
    NoData,
    /// Some bytes arrived, then the link went quiet before the terminator
    Stalled,
}

/// Strip the protocol's delimiter noise from both ends of a line
pub fn trim_line(line: &str) -> &str {
    line.trim_matches(&TRIM_CHARS[..])
}

/// Accumulates bytes into lines
///
/// Bytes of an unterminated line survive across reads, so a stall in the
/// middle of a line does not lose the part already received.
#[derive(Debug, Clone, Default)]
pub struct LineReader {
    buffer: Vec<u8, LINE_CAPACITY>,
}

impl LineReader {
    /// Create an empty reader
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Drop any partially received line
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Whether bytes of an unterminated line are held
    pub fn has_partial(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Feed a single byte
    ///
    /// Returns the trimmed line when `byte` completes one, either by being
    /// the terminator or by filling the buffer.
    pub fn feed(&mut self, byte: u8) -> Option<Line> {
        if byte == LINE_END {
            return Some(self.take());
        }

        // Capacity is one short of the buffer so the cut mirrors a
        // terminator landing in the last slot.
        let _ = self.buffer.push(byte);
        if self.buffer.len() >= LINE_CAPACITY - 1 {
            return Some(self.take());
        }
        None
    }

    /// Feed several bytes, stopping at the first completed line
    ///
    /// Returns the line and the number of bytes consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Option<(Line, usize)> {
        for (i, &byte) in bytes.iter().enumerate() {
            if let Some(line) = self.feed(byte) {
                return Some((line, i + 1));
            }
        }
        None
    }

    fn take(&mut self) -> Line {
        let text = match core::str::from_utf8(&self.buffer) {
            Ok(text) => text,
            // Keep the valid prefix; the controller only speaks ASCII so
            // anything past a bad byte is line noise.
            Err(e) => core::str::from_utf8(&self.buffer[..e.valid_up_to()]).unwrap_or(""),
        };

        let mut line = Line::new();
        // Cannot overflow: the buffer and the line share a capacity.
        let _ = line.push_str(trim_line(text));
        self.buffer.clear();
        line
    }
}
