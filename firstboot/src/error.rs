//! Error types for firstboot.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::platform::{Phase, Stage};
use crate::topology::OsFamily;

/// Main error type for firstboot operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport refused, dropped, or never became ready.
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// No expected prompt arrived in time.
    #[error("Timeout: {0}")]
    Timeout(#[from] TimeoutError),

    /// Topology data is insufficient to proceed.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The device answered with a prompt that ends the dialog.
    #[error("Unexpected prompt: {0}")]
    UnexpectedPrompt(#[from] UnexpectedPromptError),
}

impl Error {
    /// Output captured before the failure, when the error carries any.
    pub fn partial_output(&self) -> Option<&str> {
        match self {
            Error::Timeout(e) => Some(&e.partial),
            Error::UnexpectedPrompt(e) => Some(&e.output),
            _ => None,
        }
    }
}

/// Transport layer errors (telnet socket, SSH connection, authentication).
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// Transport did not come up within its own timeout
    #[error("Connection to {host}:{port} timed out after {timeout:?}")]
    ConnectTimeout {
        host: String,
        port: u16,
        timeout: Duration,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// Host key not present in known_hosts (strict mode)
    #[error("Host key for {host}:{port} is not known")]
    HostKeyUnknown { host: String, port: u16 },

    /// Host key differs from the one in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Session used before connect or after disconnect
    #[error("Session not connected")]
    NotConnected,

    /// Peer closed the stream
    #[error("Connection closed by peer")]
    Closed,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// No expected prompt matched within the allotted window.
#[derive(Error, Debug, Clone)]
#[error("no prompt matching {patterns:?} within {timeout:?} after '{command}'")]
pub struct TimeoutError {
    /// Command that was sent (empty when only waiting).
    pub command: String,

    /// Patterns that were being waited for.
    pub patterns: Vec<String>,

    /// Window that elapsed.
    pub timeout: Duration,

    /// Everything read before the deadline, lossily decoded.
    pub partial: String,
}

/// Topology or dialog data that prevents a run from starting.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// A value a dialog needs is not present
    #[error("Device '{device}' is missing required field '{field}'")]
    MissingField { device: String, field: String },

    /// No interface carries the given alias
    #[error("Device '{device}' has no interface with alias '{alias}'")]
    MissingInterface { device: String, alias: String },

    /// An `initial`/`mgmt` interface does not lead to exactly one neighbour
    #[error("Interface '{interface}' on '{device}' resolves to {found} neighbour devices, expected 1")]
    UnresolvedNeighbor {
        device: String,
        interface: String,
        found: usize,
    },

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Address or network literal that does not parse
    #[error("Invalid address '{value}': {reason}")]
    InvalidAddress { value: String, reason: String },

    /// Two devices share a name
    #[error("Duplicate device '{name}'")]
    DuplicateDevice { name: String },

    /// Reference to a device that does not exist
    #[error("Unknown device '{name}'")]
    UnknownDevice { name: String },

    /// OS family string that is not supported
    #[error("Unsupported OS family '{os}'")]
    UnsupportedOs { os: String },

    /// No dialog is registered for this OS and phase
    #[error("No {phase} dialog registered for '{os}'")]
    NoDialog { os: OsFamily, phase: Phase },

    /// A dialog with this key is already registered
    #[error("Dialog '{name}' already registered")]
    AlreadyRegistered { name: String },

    /// Topology document failed to parse
    #[error("Topology parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Topology file could not be read
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Invalid builder or dialog configuration
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// A reply matched an alternative that ends the dialog.
#[derive(Error, Debug, Clone)]
#[error("{stage}: '{prompt}' after '{command}'")]
pub struct UnexpectedPromptError {
    /// Stage that was running.
    pub stage: Stage,

    /// Command whose reply was rejected.
    pub command: String,

    /// Prompt text that was matched.
    pub prompt: String,

    /// Reply captured for diagnosis.
    pub output: String,
}

/// Result type alias using firstboot's Error.
pub type Result<T> = std::result::Result<T, Error>;
