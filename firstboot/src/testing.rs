//! Scripted transport used by the unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;

use crate::error::{ConnectionError, Result};
use crate::session::SessionConfig;
use crate::transport::Transport;

/// Shared record of everything written to a [`ScriptedTransport`].
#[derive(Debug, Clone, Default)]
pub(crate) struct WriteLog(Arc<Mutex<Vec<Vec<u8>>>>);

impl WriteLog {
    fn push(&self, data: &[u8]) {
        self.0.lock().unwrap().push(data.to_vec());
    }

    /// Raw writes in order.
    pub(crate) fn raw(&self) -> Vec<Vec<u8>> {
        self.0.lock().unwrap().clone()
    }

    /// Newline-terminated writes, with the newline removed.
    pub(crate) fn commands(&self) -> Vec<String> {
        self.raw()
            .iter()
            .filter(|w| w.ends_with(b"\n"))
            .map(|w| String::from_utf8_lossy(&w[..w.len() - 1]).into_owned())
            .collect()
    }
}

/// A transport that answers the n-th write with the n-th scripted reply.
///
/// Reads block forever once nothing is queued, so a missing prompt ends
/// in the caller's timeout.
#[derive(Debug, Default)]
pub(crate) struct ScriptedTransport {
    incoming: VecDeque<Bytes>,
    replies: VecDeque<String>,
    log: WriteLog,
    closed: bool,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Output available before anything is written.
    pub(crate) fn with_initial<I, S>(mut self, chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for chunk in chunks {
            self.incoming
                .push_back(Bytes::copy_from_slice(chunk.as_ref().as_bytes()));
        }
        self
    }

    /// Queue the reply to the next unanswered write.
    pub(crate) fn reply(mut self, text: &str) -> Self {
        self.replies.push_back(text.to_string());
        self
    }

    /// Queue several replies.
    pub(crate) fn replies<I, S>(mut self, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for text in texts {
            self.replies.push_back(text.as_ref().to_string());
        }
        self
    }

    /// Start in the closed state.
    pub(crate) fn closed(mut self) -> Self {
        self.closed = true;
        self
    }

    pub(crate) fn log(&self) -> WriteLog {
        self.log.clone()
    }
}

impl Transport for ScriptedTransport {
    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        if self.closed {
            return Err(ConnectionError::Closed.into());
        }
        self.log.push(data);
        if let Some(reply) = self.replies.pop_front() {
            if !reply.is_empty() {
                self.incoming.push_back(Bytes::from(reply));
            }
        }
        Ok(())
    }

    async fn read_chunk(&mut self) -> Result<Option<Bytes>> {
        if let Some(chunk) = self.incoming.pop_front() {
            return Ok(Some(chunk));
        }
        if self.closed {
            return Ok(None);
        }
        std::future::pending().await
    }

    fn is_alive(&self) -> bool {
        !self.closed
    }

    async fn close(self) -> Result<()> {
        Ok(())
    }
}

/// Session settings with short timeouts and no settle waits.
pub(crate) fn test_config() -> SessionConfig {
    SessionConfig {
        timeout: Duration::from_secs(1),
        connect_timeout: Duration::from_secs(1),
        banner_quiet: Duration::from_millis(20),
        close_settle: Duration::ZERO,
        persist_on_close: false,
        ..SessionConfig::default()
    }
}
