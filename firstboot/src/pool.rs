//! Run dialogs across a whole topology with a bounded number of workers.
//!
//! The topology is frozen behind an [`Arc`] once autofill has run; every
//! worker reads it and none writes. Each device gets its own session and
//! its own [`DeviceReport`]; a failure ends only that device's run.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{info, warn};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::autofill::{AutofillPolicy, AutofillReport, autofill};
use crate::error::Result;
use crate::platform::{DialogDefinition, DialogRegistry, Phase, TransportKind};
use crate::routes::RouteTable;
use crate::sequencer::{DeviceReport, DeviceStatus, DialogContext, Sequencer, SequencerOptions};
use crate::session::{AnySession, Connector, SessionBuilder};
use crate::topology::{DEFAULT_GROUP, Device, DeviceId, Endpoint, OsFamily, Topology};
use crate::transport::HostKeyVerification;

/// Default number of devices configured at once.
pub const DEFAULT_WORKERS: usize = 4;

/// Opens the session a dialog runs over.
pub trait Opener: Send + Sync + 'static {
    type Session: Connector + 'static;

    fn open(
        &self,
        device: &Device,
        dialog: &DialogDefinition,
        endpoint: &Endpoint,
    ) -> impl Future<Output = Result<Self::Session>> + Send;
}

/// Opens real telnet and SSH sessions.
#[derive(Debug, Clone)]
pub struct NetworkOpener {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub host_key_verification: HostKeyVerification,
}

impl Default for NetworkOpener {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(10),
            host_key_verification: HostKeyVerification::Disabled,
        }
    }
}

impl Opener for NetworkOpener {
    type Session = AnySession;

    async fn open(
        &self,
        device: &Device,
        dialog: &DialogDefinition,
        endpoint: &Endpoint,
    ) -> Result<AnySession> {
        let mut builder = SessionBuilder::for_endpoint(endpoint)
            .name(device.name.clone())
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .persist_on_close(dialog.persist_on_close)
            .host_key_verification(self.host_key_verification.clone());

        match dialog.transport {
            TransportKind::Telnet => Ok(AnySession::Telnet(builder.telnet().await?)),
            TransportKind::Shell => {
                if let Some(login) = device.credentials.get(DEFAULT_GROUP) {
                    if let Some(username) = &login.username {
                        builder = builder.username(username.clone());
                    }
                    if let Some(password) = &login.password {
                        builder = builder.password_secret(password.clone());
                    }
                }
                Ok(AnySession::Shell(builder.shell().await?))
            }
        }
    }
}

/// Drives dialogs over every device of a frozen topology.
pub struct Provisioner<O> {
    topology: Arc<Topology>,
    registry: Arc<DialogRegistry>,
    opener: Arc<O>,
    options: SequencerOptions,
    workers: usize,
    routes: Option<(DeviceId, Arc<RouteTable>)>,
}

impl<O> Clone for Provisioner<O> {
    fn clone(&self) -> Self {
        Self {
            topology: Arc::clone(&self.topology),
            registry: Arc::clone(&self.registry),
            opener: Arc::clone(&self.opener),
            options: self.options.clone(),
            workers: self.workers,
            routes: self.routes.clone(),
        }
    }
}

impl<O: Opener> Provisioner<O> {
    /// Freeze `topology`. Routes are synthesized for the first Linux
    /// device that has a host network config.
    pub fn new(topology: Topology, opener: O) -> Self {
        let host = topology
            .devices()
            .find(|(_, d)| d.os == OsFamily::Linux && d.custom.network_config.is_some())
            .map(|(id, _)| id);
        let routes = host.map(|id| (id, Arc::new(RouteTable::synthesize(&topology, id))));

        Self {
            topology: Arc::new(topology),
            registry: Arc::new(DialogRegistry::snapshot()),
            opener: Arc::new(opener),
            options: SequencerOptions::default(),
            workers: DEFAULT_WORKERS,
            routes,
        }
    }

    /// Autofill `topology`, then freeze it as in [`Provisioner::new`].
    pub fn prepare(mut topology: Topology, policy: &AutofillPolicy, opener: O) -> (Self, AutofillReport) {
        let report = autofill(&mut topology, policy);
        (Self::new(topology, opener), report)
    }

    pub fn with_registry(mut self, registry: DialogRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn with_options(mut self, options: SequencerOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the worker count. At least one worker always runs.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Routes synthesized for the gateway host, if there is one.
    pub fn routes(&self) -> Option<&RouteTable> {
        self.routes.as_ref().map(|(_, table)| table.as_ref())
    }

    /// Run the `phase` dialog on one device. Never fails; the outcome is in
    /// the report.
    pub async fn configure_device(&self, id: DeviceId, phase: Phase) -> DeviceReport {
        let start = Instant::now();
        let device = self.topology.device(id);
        let name = device.name.clone();

        let Some(dialog) = self.registry.get(device.os, phase) else {
            return DeviceReport::skipped(name, phase, format!("no {phase} dialog for {}", device.os));
        };
        let endpoint = match dialog.transport {
            TransportKind::Telnet => device.connections.telnet.as_ref(),
            TransportKind::Shell => device.connections.ssh.as_ref(),
        };
        let Some(endpoint) = endpoint else {
            return DeviceReport::skipped(name, phase, format!("no {:?} endpoint", dialog.transport));
        };

        let routes = self
            .routes
            .as_ref()
            .filter(|(host, _)| *host == id)
            .map(|(_, table)| table.as_ref());
        let context = match DialogContext::from_topology(&self.topology, id, routes)
            .and_then(|ctx| dialog.check(&ctx).map(|()| ctx))
        {
            Ok(ctx) => ctx,
            Err(e) => {
                warn!("{}: {}", name, e);
                return DeviceReport::failed(name, phase, &e, start.elapsed());
            }
        };

        let mut session = match self.opener.open(device, dialog, endpoint).await {
            Ok(session) => session,
            Err(e) => {
                warn!("{}: {}", name, e);
                return DeviceReport::failed(name, phase, &e, start.elapsed());
            }
        };

        let mut sequencer = Sequencer::new(dialog, &context).with_options(self.options.clone());
        let result = sequencer.run(&mut session).await;
        session.disconnect().await;

        let (status, error) = match result {
            Ok(()) => {
                info!("{}: {} finished in {:?}", name, dialog.name, start.elapsed());
                (DeviceStatus::Success, None)
            }
            Err(e) => {
                warn!("{}: failed at {}: {}", name, sequencer.stage(), e);
                (DeviceStatus::from_error(&e), Some(e.to_string()))
            }
        };

        DeviceReport {
            device: name,
            phase,
            status,
            stage: sequencer.stage(),
            last_output: sequencer.last_output().to_string(),
            error,
            elapsed: start.elapsed(),
        }
    }

    /// Run the `phase` dialog on every device, at most `workers` at a time.
    /// Reports arrive in completion order.
    pub async fn configure_all(&self, phase: Phase) -> Vec<DeviceReport> {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();

        info!(
            "configuring {} devices ({phase}) with {} workers",
            self.topology.len(),
            self.workers
        );

        for id in self.topology.device_ids() {
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    warn!("worker pool closed: {}", e);
                    break;
                }
            };
            let this = self.clone();
            tasks.spawn(async move {
                let report = this.configure_device(id, phase).await;
                drop(permit);
                report
            });
        }

        let mut reports = Vec::with_capacity(self.topology.len());
        while let Some(res) = tasks.join_next().await {
            match res {
                Ok(report) => reports.push(report),
                Err(e) => warn!("worker task failed: {}", e),
            }
        }
        reports
    }
}
