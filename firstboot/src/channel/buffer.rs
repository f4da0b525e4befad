//! Accumulating read buffer with a movable search mark.
//!
//! Everything received is appended after ANSI stripping. Prompt searches
//! only look at bytes from the mark onward, so a shell session can keep
//! its whole transcript without old prompts matching again.

use std::borrow::Cow;

use super::ansi::AnsiStripper;
use super::patterns::{PromptMatch, PromptSet};

/// Buffer for accumulating output and searching it for prompts.
#[derive(Debug, Default)]
pub struct PatternBuffer {
    /// The accumulated output buffer.
    buffer: Vec<u8>,

    /// Start of the searchable region.
    mark: usize,

    stripper: AnsiStripper,
}

impl PatternBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            mark: 0,
            stripper: AnsiStripper::new(),
        }
    }

    /// Extend the buffer with new data, stripping ANSI escape codes.
    pub fn extend(&mut self, data: &[u8]) {
        let cleaned = self.stripper.strip(data);
        self.buffer.extend_from_slice(&cleaned);
    }

    /// Move the search mark to the current end of the buffer.
    pub fn set_mark(&mut self) {
        self.mark = self.buffer.len();
    }

    /// Move the search mark just past `end`, so a matched prompt is not
    /// found again.
    pub fn mark_through(&mut self, end: usize) {
        self.mark = end.min(self.buffer.len());
    }

    /// Current mark position.
    pub fn mark(&self) -> usize {
        self.mark
    }

    /// Search the region after the mark.
    ///
    /// Returned offsets are absolute positions in the whole buffer.
    pub fn find(&self, prompts: &PromptSet) -> Option<PromptMatch> {
        prompts.find(&self.buffer[self.mark..]).map(|m| PromptMatch {
            index: m.index,
            start: m.start + self.mark,
            end: m.end + self.mark,
        })
    }

    /// Remove and return everything up to `end`, keeping the remainder.
    pub fn split_through(&mut self, end: usize) -> Vec<u8> {
        let end = end.min(self.buffer.len());
        let rest = self.buffer.split_off(end);
        self.mark = 0;
        std::mem::replace(&mut self.buffer, rest)
    }

    /// Bytes from `start` to the end of the buffer.
    pub fn since(&self, start: usize) -> &[u8] {
        &self.buffer[start.min(self.buffer.len())..]
    }

    /// Bytes after the mark.
    pub fn unmarked(&self) -> &[u8] {
        self.since(self.mark)
    }

    /// Take ownership of the buffer contents and reset.
    pub fn take(&mut self) -> Vec<u8> {
        self.mark = 0;
        std::mem::take(&mut self.buffer)
    }

    /// Get a reference to the buffer contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the buffer contents as a string (lossy UTF-8 conversion).
    pub fn as_str_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.buffer)
    }

    /// Get the current buffer length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.mark = 0;
    }
}
