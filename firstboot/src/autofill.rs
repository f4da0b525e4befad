//! Fill in the data a bring-up needs but a testbed usually leaves out.
//!
//! Autofill only adds: a value that is already present is never replaced,
//! so running it twice changes nothing the second time.

use std::net::Ipv4Addr;

use log::{debug, info};

use crate::topology::{
    Credential, DEFAULT_GROUP, DeviceId, ENABLE_GROUP, Endpoint, OsFamily, Route, Topology,
};

/// Defaults applied by [`autofill`].
#[derive(Debug, Clone)]
pub struct AutofillPolicy {
    /// OS families left untouched.
    pub excluded: Vec<OsFamily>,
    pub username: String,
    pub password: String,
    pub enable_password: String,
    pub ssh_port: u16,
    /// Host given to telnet endpoints that have none (the console server).
    pub telnet_host: String,
    /// Destination of the computed gateway route.
    pub gateway_dest: Ipv4Addr,
    pub gateway_mask: Ipv4Addr,
}

impl Default for AutofillPolicy {
    fn default() -> Self {
        Self {
            excluded: vec![OsFamily::Linux, OsFamily::Ftd],
            username: "admin".into(),
            password: "Admin123".into(),
            enable_password: "enablepa55".into(),
            ssh_port: 22,
            telnet_host: "192.168.0.100".into(),
            gateway_dest: Ipv4Addr::new(192, 168, 11, 0),
            gateway_mask: Ipv4Addr::new(255, 255, 255, 0),
        }
    }
}

/// One value that was filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filled {
    Hostname(String),
    DefaultCredentials,
    EnableCredentials,
    SshEndpoint(Endpoint),
    TelnetHost(String),
    Gateway(Ipv4Addr),
}

/// Everything [`autofill`] changed, per device.
#[derive(Debug, Clone, Default)]
pub struct AutofillReport {
    pub entries: Vec<(String, Filled)>,
}

impl AutofillReport {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Values filled for one device.
    pub fn for_device<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Filled> + 'a {
        self.entries
            .iter()
            .filter(move |(device, _)| device == name)
            .map(|(_, filled)| filled)
    }
}

/// Enrich every device not excluded by `policy`. Missing data that cannot
/// be derived, such as a gateway without a neighbour, is left absent.
pub fn autofill(topology: &mut Topology, policy: &AutofillPolicy) -> AutofillReport {
    let mut report = AutofillReport::default();
    let ids: Vec<DeviceId> = topology.device_ids().collect();

    for id in ids {
        if policy.excluded.contains(&topology.device(id).os) {
            continue;
        }
        let gateway = topology.neighbor_address(id, "initial");
        let device = topology.device_mut(id);
        let name = device.name.clone();
        let mut fill = |filled: Filled| {
            debug!("{}: filled {:?}", name, filled);
            report.entries.push((name.clone(), filled));
        };

        if device.custom.hostname.is_none() {
            device.custom.hostname = Some(device.name.clone());
            fill(Filled::Hostname(device.name.clone()));
        }

        if device.credentials.insert_if_absent(
            DEFAULT_GROUP,
            Credential::new(policy.username.clone(), policy.password.clone()),
        ) {
            fill(Filled::DefaultCredentials);
        }
        if device.credentials.insert_if_absent(
            ENABLE_GROUP,
            Credential::password_only(policy.enable_password.clone()),
        ) {
            fill(Filled::EnableCredentials);
        }

        if device.connections.ssh.is_none() {
            let address = device
                .interface_by_alias("initial")
                .and_then(|i| i.ipv4)
                .map(|net| net.ip());
            if let Some(address) = address {
                let endpoint = Endpoint::new(address.to_string(), policy.ssh_port);
                device.connections.ssh = Some(endpoint.clone());
                fill(Filled::SshEndpoint(endpoint));
            }
        }

        if let Some(telnet) = device.connections.telnet.as_mut() {
            if telnet.host.is_none() {
                telnet.host = Some(policy.telnet_host.clone());
                fill(Filled::TelnetHost(policy.telnet_host.clone()));
            }
        }

        if device.custom.gateway.is_none() {
            if let Some(next_hop) = gateway {
                device.custom.gateway = Some(Route {
                    dest: policy.gateway_dest,
                    mask: policy.gateway_mask,
                    next_hop,
                });
                fill(Filled::Gateway(next_hop));
            }
        }
    }

    info!("autofill filled {} values", report.len());
    report
}
