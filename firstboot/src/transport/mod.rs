//! Byte-level transports: raw telnet over TCP and SSH shell channels.
//!
//! A transport only moves bytes. Prompt detection, buffering and timeouts
//! live in the channel and session layers, which are shared by both kinds.

pub mod config;
mod ssh;
mod telnet;

pub use config::{AuthMethod, HostKeyVerification, SshConfig, TelnetConfig};
pub use ssh::SshTransport;
pub use telnet::TelnetTransport;

use std::future::Future;

use bytes::Bytes;

use crate::error::Result;

/// A bidirectional byte stream to a device CLI.
pub trait Transport: Send {
    /// Write all bytes to the device.
    fn write_all(&mut self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Read the next chunk of device output.
    ///
    /// Returns `Ok(None)` once the peer has closed the stream. Dropping the
    /// returned future before it resolves must not lose data that was
    /// already received.
    fn read_chunk(&mut self) -> impl Future<Output = Result<Option<Bytes>>> + Send;

    /// Whether the underlying connection is still usable.
    fn is_alive(&self) -> bool;

    /// Close the connection.
    fn close(self) -> impl Future<Output = Result<()>> + Send
    where
        Self: Sized;
}
