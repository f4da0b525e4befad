//! The single deadline-bounded read loop shared by every session kind.

use std::time::Duration;

use log::trace;
use tokio::time::{Instant, timeout_at};

use super::buffer::PatternBuffer;
use super::patterns::{PromptMatch, PromptSet};
use crate::error::{ConnectionError, Result, TimeoutError};
use crate::transport::Transport;

/// How matched output is taken out of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Consume through the end of the match; later reads see only what
    /// followed the prompt. Used for telnet consoles.
    Line,

    /// Keep the whole transcript and search only what arrived after the
    /// last write. Used for SSH shells.
    Stream,
}

/// Read from `transport` into `buffer` until one of `prompts` matches
/// after the buffer mark, or `timeout` elapses.
///
/// Data already buffered is searched before any read. End of stream is a
/// `ConnectionError::Closed`; an expired deadline is a `TimeoutError`
/// carrying whatever arrived after the mark.
pub async fn read_until<T: Transport>(
    transport: &mut T,
    buffer: &mut PatternBuffer,
    prompts: &PromptSet,
    timeout: Duration,
    command: &str,
) -> Result<PromptMatch> {
    let deadline = Instant::now() + timeout;

    loop {
        if let Some(found) = buffer.find(prompts) {
            return Ok(found);
        }

        match timeout_at(deadline, transport.read_chunk()).await {
            Ok(Ok(Some(chunk))) => {
                trace!("read {} bytes", chunk.len());
                buffer.extend(&chunk);
            }
            Ok(Ok(None)) => return Err(ConnectionError::Closed.into()),
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(TimeoutError {
                    command: command.to_string(),
                    patterns: prompts.sources(),
                    timeout,
                    partial: String::from_utf8_lossy(buffer.unmarked()).into_owned(),
                }
                .into());
            }
        }
    }
}
