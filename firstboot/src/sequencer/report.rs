//! Per-device outcome of a dialog run.

use std::fmt;
use std::time::Duration;

use crate::error::Error;
use crate::platform::{Phase, Stage};

/// Terminal status of one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    Success,
    /// Nothing to do for this device in this phase.
    Skipped,
    TimeoutFailure,
    ConnectionFailure,
    ConfigurationFailure,
    UnexpectedPrompt,
}

impl DeviceStatus {
    /// Status for a run that ended with `error`.
    pub fn from_error(error: &Error) -> Self {
        match error {
            Error::Connection(_) => DeviceStatus::ConnectionFailure,
            Error::Timeout(_) => DeviceStatus::TimeoutFailure,
            Error::Configuration(_) => DeviceStatus::ConfigurationFailure,
            Error::UnexpectedPrompt(_) => DeviceStatus::UnexpectedPrompt,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DeviceStatus::Success)
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeviceStatus::Success => "success",
            DeviceStatus::Skipped => "skipped",
            DeviceStatus::TimeoutFailure => "timeout",
            DeviceStatus::ConnectionFailure => "connection failure",
            DeviceStatus::ConfigurationFailure => "configuration failure",
            DeviceStatus::UnexpectedPrompt => "unexpected prompt",
        };
        f.write_str(s)
    }
}

/// What happened to one device.
#[derive(Debug, Clone)]
pub struct DeviceReport {
    pub device: String,
    pub phase: Phase,
    pub status: DeviceStatus,
    /// Last stage entered.
    pub stage: Stage,
    /// Last output captured from the device.
    pub last_output: String,
    /// Error message for failed runs, or the reason for a skip.
    pub error: Option<String>,
    pub elapsed: Duration,
}

impl DeviceReport {
    /// Report for a device that was not attempted.
    pub fn skipped(device: impl Into<String>, phase: Phase, reason: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            phase,
            status: DeviceStatus::Skipped,
            stage: Stage::Idle,
            last_output: String::new(),
            error: Some(reason.into()),
            elapsed: Duration::ZERO,
        }
    }

    /// Report for a device that failed before any session was opened.
    pub fn failed(device: impl Into<String>, phase: Phase, error: &Error, elapsed: Duration) -> Self {
        Self {
            device: device.into(),
            phase,
            status: DeviceStatus::from_error(error),
            stage: Stage::Idle,
            last_output: error.partial_output().unwrap_or_default().to_string(),
            error: Some(error.to_string()),
            elapsed,
        }
    }
}

impl fmt::Display for DeviceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {} at {}", self.device, self.phase, self.status, self.stage)?;
        if let Some(error) = &self.error {
            write!(f, " ({error})")?;
        }
        Ok(())
    }
}
