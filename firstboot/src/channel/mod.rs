//! Channel layer for prompt matching over a byte transport.
//!
//! This module handles output buffering, ANSI stripping and the
//! deadline-bounded read loop used for every command exchange.

mod ansi;
mod buffer;
mod patterns;
mod reader;

pub use ansi::AnsiStripper;
pub use buffer::PatternBuffer;
pub use patterns::{PromptMatch, PromptSet};
pub use reader::{Framing, read_until};
