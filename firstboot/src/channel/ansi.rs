//! ANSI escape stripping backed by the vte state machine.
//!
//! The parser is kept between calls, so an escape sequence split across
//! two reads is still removed. Invalid UTF-8 comes out as U+FFFD.

use vte::{Parser, Perform};

/// Streaming ANSI/VT100 escape sequence remover.
pub struct AnsiStripper {
    parser: Parser,
}

impl AnsiStripper {
    /// Create a stripper with a fresh parser state.
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
        }
    }

    /// Strip escape sequences from `data`, returning printable text plus
    /// line-structure control bytes.
    pub fn strip(&mut self, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(data.len());
        let mut printer = Printer { out: &mut out };
        self.parser.advance(&mut printer, data);
        out
    }
}

impl Default for AnsiStripper {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AnsiStripper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnsiStripper").finish_non_exhaustive()
    }
}

struct Printer<'a> {
    out: &'a mut Vec<u8>,
}

impl Perform for Printer<'_> {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.out
            .extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        // BS, TAB, LF, CR
        if matches!(byte, 0x08 | b'\t' | b'\n' | b'\r') {
            self.out.push(byte);
        }
    }
}
