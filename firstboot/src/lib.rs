//! # Firstboot
//!
//! Async first-boot bring-up for lab network devices.
//!
//! Firstboot drives the interactive console and shell dialogs a freshly
//! booted router, firewall or Linux host presents, and leaves each device
//! reachable and configured from a testbed description.
//!
//! ## Features
//!
//! - Telnet console and SSH shell sessions behind one [`Connector`] trait
//! - Tail-searched prompt matching over ANSI-stripped output
//! - Declarative per-OS dialogs (IOS, IOS-XE, FTD, Linux) in a global registry
//! - Autofill of credentials, endpoints and gateways from the topology
//! - Route synthesis for the gateway host
//! - A bounded worker pool with one report per device
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use firstboot::{AutofillPolicy, NetworkOpener, Phase, Provisioner, Topology};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), firstboot::Error> {
//!     let topology = Topology::from_yaml_file("testbed.yaml")?;
//!     let (provisioner, filled) =
//!         Provisioner::prepare(topology, &AutofillPolicy::default(), NetworkOpener::default());
//!     println!("autofill set {} values", filled.len());
//!
//!     for report in provisioner.configure_all(Phase::Initial).await {
//!         println!("{report}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod autofill;
pub mod channel;
pub mod error;
pub mod platform;
pub mod pool;
pub mod routes;
pub mod sequencer;
pub mod session;
pub mod topology;
pub mod transport;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use autofill::{AutofillPolicy, AutofillReport, autofill};
pub use error::{Error, Result};
pub use platform::{DialogDefinition, DialogRegistry, Phase, Stage};
pub use pool::{NetworkOpener, Opener, Provisioner};
pub use routes::RouteTable;
pub use sequencer::{DeviceReport, DeviceStatus, DialogContext, Sequencer};
pub use session::{AnySession, Connector, Response, SessionBuilder};
pub use topology::{Device, OsFamily, Topology};
pub use transport::HostKeyVerification;
