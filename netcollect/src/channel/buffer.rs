//! Accumulates shell output with terminal control sequences removed.

use regex::bytes::Regex;
use vte::{Parser, Perform};

/// Output collected since the last [`drain`](Self::drain).
///
/// Prompt matching only looks at the last `window` bytes, so a long
/// `show running-config` does not turn every read into a full rescan. The
/// VT parser is kept across pushes, so an escape sequence split between two
/// reads is still removed.
pub struct TextBuffer {
    text: Vec<u8>,
    window: usize,
    vt: Parser,
}

/// Receives parser output: printable characters plus line control.
struct Sink<'a>(&'a mut Vec<u8>);

impl Perform for Sink<'_> {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.0.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        if let b'\n' | b'\r' | b'\t' = byte {
            self.0.push(byte);
        }
    }
}

impl TextBuffer {
    pub fn new(window: usize) -> Self {
        Self {
            text: Vec::with_capacity(4096),
            window,
            vt: Parser::new(),
        }
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.vt.advance(&mut Sink(&mut self.text), bytes);
    }

    /// Whether `pattern` matches inside the trailing window.
    pub fn tail_matches(&self, pattern: &Regex) -> bool {
        let from = self.text.len().saturating_sub(self.window);
        pattern.is_match(&self.text[from..])
    }

    /// Hand over everything collected and start empty.
    pub fn drain(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.text)
    }
}
