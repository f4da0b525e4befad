//! Interactive sessions over telnet consoles and SSH shells.
//!
//! Both kinds implement [`Connector`]: write a command, then wait for one
//! of several prompts with a deadline. They differ only in framing; see
//! [`Framing`](crate::channel::Framing).

mod builder;
mod response;

pub use builder::{SessionBuilder, SessionConfig};
pub use response::Response;

use std::borrow::Cow;
use std::future::Future;
use std::time::{Duration, Instant};

use log::{debug, trace, warn};

use crate::channel::{Framing, PatternBuffer, PromptMatch, PromptSet, read_until};
use crate::error::{ConnectionError, Result};
use crate::transport::{SshTransport, TelnetTransport, Transport};

/// Command sent before closing a shell session to persist configuration.
pub const PERSIST_COMMAND: &str = "write";

/// Prompt expected after [`PERSIST_COMMAND`].
pub const PERSIST_PROMPT: &str = "#";

/// The contract every session kind fulfils.
pub trait Connector: Send {
    /// Send `command` followed by a newline and wait for one of `prompts`.
    ///
    /// Uses the session's default timeout when `timeout` is `None`. Fails
    /// with `ConnectionError::NotConnected` before writing anything if the
    /// session is not connected.
    fn execute(
        &mut self,
        command: &str,
        prompts: &PromptSet,
        timeout: Option<Duration>,
    ) -> impl Future<Output = Result<Response>> + Send;

    /// Write bytes without a trailing newline and without waiting.
    fn write_raw(&mut self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Wait for one of `prompts` without sending anything.
    fn expect(
        &mut self,
        prompts: &PromptSet,
        timeout: Option<Duration>,
    ) -> impl Future<Output = Result<Response>> + Send;

    /// Whether the transport is still usable.
    fn is_connected(&self) -> bool;

    /// Best-effort shutdown. Never fails; problems are logged.
    fn disconnect(&mut self) -> impl Future<Output = ()> + Send;
}

/// A session over one transport.
pub struct Session<T> {
    /// Transport (None after disconnect).
    transport: Option<T>,

    buffer: PatternBuffer,

    framing: Framing,

    config: SessionConfig,

    /// Peer label for log lines.
    peer: String,
}

impl<T: Transport> Session<T> {
    /// Wrap a connected transport.
    pub fn new(transport: T, framing: Framing, config: SessionConfig, peer: impl Into<String>) -> Self {
        Self {
            transport: Some(transport),
            buffer: PatternBuffer::new(),
            framing,
            config,
            peer: peer.into(),
        }
    }

    /// The framing this session uses.
    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// Session settings.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Peer label.
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Everything currently held in the read buffer.
    pub fn transcript(&self) -> Cow<'_, str> {
        self.buffer.as_str_lossy()
    }

    /// Read and discard output until the device has been quiet for the
    /// configured banner period. Returns the number of bytes dropped.
    pub async fn drain_banner(&mut self) -> Result<usize> {
        let quiet = self.config.banner_quiet;
        let deadline = tokio::time::Instant::now() + self.config.timeout;
        let transport = self
            .transport
            .as_mut()
            .ok_or(ConnectionError::NotConnected)?;

        let mut dropped = 0;
        while tokio::time::Instant::now() < deadline {
            match tokio::time::timeout(quiet, transport.read_chunk()).await {
                Ok(Ok(Some(chunk))) => dropped += chunk.len(),
                Ok(Ok(None)) => return Err(ConnectionError::Closed.into()),
                Ok(Err(e)) => return Err(e),
                Err(_) => break,
            }
        }
        self.buffer.clear();
        trace!("{}: dropped {} banner bytes", self.peer, dropped);
        Ok(dropped)
    }

    fn response(&mut self, command: &str, found: PromptMatch, start: Instant) -> Response {
        let prompt =
            String::from_utf8_lossy(&self.buffer.as_slice()[found.start..found.end]).into_owned();

        match self.framing {
            Framing::Line => {
                let consumed = self.buffer.split_through(found.end);
                let output = String::from_utf8_lossy(&consumed).into_owned();
                Response::new(
                    command,
                    output.clone(),
                    output,
                    prompt,
                    found.index,
                    start.elapsed(),
                )
            }
            Framing::Stream => {
                let reply = String::from_utf8_lossy(self.buffer.unmarked()).into_owned();
                let output = self.buffer.as_str_lossy().into_owned();
                self.buffer.mark_through(found.end);
                Response::new(command, output, reply, prompt, found.index, start.elapsed())
            }
        }
    }
}

impl<T: Transport> Connector for Session<T> {
    async fn execute(
        &mut self,
        command: &str,
        prompts: &PromptSet,
        timeout: Option<Duration>,
    ) -> Result<Response> {
        let timeout = timeout.unwrap_or(self.config.timeout);
        let transport = match self.transport.as_mut() {
            Some(t) if t.is_alive() => t,
            _ => return Err(ConnectionError::NotConnected.into()),
        };

        let start = Instant::now();
        if self.framing == Framing::Stream {
            self.buffer.set_mark();
        }

        let mut line = Vec::with_capacity(command.len() + 1);
        line.extend_from_slice(command.as_bytes());
        line.push(b'\n');
        transport.write_all(&line).await?;
        trace!("{}: wrote {} bytes", self.peer, line.len());

        let found = read_until(transport, &mut self.buffer, prompts, timeout, command).await?;
        Ok(self.response(command, found, start))
    }

    async fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        match self.transport.as_mut() {
            Some(t) if t.is_alive() => t.write_all(data).await,
            _ => Err(ConnectionError::NotConnected.into()),
        }
    }

    async fn expect(&mut self, prompts: &PromptSet, timeout: Option<Duration>) -> Result<Response> {
        let timeout = timeout.unwrap_or(self.config.timeout);
        let transport = match self.transport.as_mut() {
            Some(t) if t.is_alive() => t,
            _ => return Err(ConnectionError::NotConnected.into()),
        };

        let start = Instant::now();
        let found = read_until(transport, &mut self.buffer, prompts, timeout, "").await?;
        Ok(self.response("", found, start))
    }

    fn is_connected(&self) -> bool {
        self.transport.as_ref().is_some_and(|t| t.is_alive())
    }

    async fn disconnect(&mut self) {
        if self.transport.is_none() {
            return;
        }

        if self.config.persist_on_close && self.is_connected() {
            match PromptSet::single(PERSIST_PROMPT) {
                Ok(prompts) => match self.execute(PERSIST_COMMAND, &prompts, None).await {
                    Ok(_) => tokio::time::sleep(self.config.close_settle).await,
                    Err(e) => warn!("{}: persist before close failed: {}", self.peer, e),
                },
                Err(e) => warn!("{}: {}", self.peer, e),
            }
        }

        if let Some(transport) = self.transport.take() {
            if let Err(e) = transport.close().await {
                warn!("{}: close failed: {}", self.peer, e);
            }
        }
        debug!("{}: disconnected", self.peer);
    }
}

/// A session of either kind, chosen at runtime.
pub enum AnySession {
    /// Telnet console session (line framing).
    Telnet(Session<TelnetTransport>),

    /// SSH shell session (stream framing).
    Shell(Session<SshTransport>),
}

impl Connector for AnySession {
    async fn execute(
        &mut self,
        command: &str,
        prompts: &PromptSet,
        timeout: Option<Duration>,
    ) -> Result<Response> {
        match self {
            AnySession::Telnet(s) => s.execute(command, prompts, timeout).await,
            AnySession::Shell(s) => s.execute(command, prompts, timeout).await,
        }
    }

    async fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        match self {
            AnySession::Telnet(s) => s.write_raw(data).await,
            AnySession::Shell(s) => s.write_raw(data).await,
        }
    }

    async fn expect(&mut self, prompts: &PromptSet, timeout: Option<Duration>) -> Result<Response> {
        match self {
            AnySession::Telnet(s) => s.expect(prompts, timeout).await,
            AnySession::Shell(s) => s.expect(prompts, timeout).await,
        }
    }

    fn is_connected(&self) -> bool {
        match self {
            AnySession::Telnet(s) => s.is_connected(),
            AnySession::Shell(s) => s.is_connected(),
        }
    }

    async fn disconnect(&mut self) {
        match self {
            AnySession::Telnet(s) => s.disconnect().await,
            AnySession::Shell(s) => s.disconnect().await,
        }
    }
}
