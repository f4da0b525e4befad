//! Testbed documents.
//!
//! A testbed has a `devices:` section (OS, platform, credentials,
//! connections, custom settings) and a `topology:` section listing each
//! device's interfaces. Interfaces naming the same `link` share it.
//!
//! ```yaml
//! devices:
//!   R1:
//!     os: ios
//!     platform: iosv
//!     credentials:
//!       default: { username: cisco, password: cisco }
//!     connections:
//!       telnet: { ip: 192.168.0.100, port: 5001 }
//! topology:
//!   R1:
//!     interfaces:
//!       GigabitEthernet0/0: { alias: initial, ipv4: 192.168.11.2/24, link: l1 }
//! ```

use std::net::Ipv4Addr;
use std::path::Path;

use indexmap::IndexMap;
use ipnetwork::Ipv4Network;
use log::debug;
use serde::Deserialize;

use super::{
    Connections, Credential, Custom, Device, DhcpPool, Endpoint, HostNetworkConfig, Interface,
    IpHelper, OsFamily, Route, Topology,
};
use crate::error::{ConfigurationError, Result};

#[derive(Debug, Deserialize)]
struct RawTestbed {
    #[serde(default)]
    devices: IndexMap<String, RawDevice>,
    #[serde(default)]
    topology: IndexMap<String, RawDeviceTopology>,
}

#[derive(Debug, Deserialize)]
struct RawDevice {
    os: String,
    #[serde(default)]
    platform: Option<String>,
    #[serde(default, rename = "type")]
    device_type: Option<String>,
    #[serde(default)]
    credentials: IndexMap<String, RawCredential>,
    #[serde(default)]
    connections: RawConnections,
    #[serde(default)]
    custom: RawCustom,
}

#[derive(Debug, Deserialize)]
struct RawCredential {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawConnections {
    #[serde(default)]
    telnet: Option<RawEndpoint>,
    #[serde(default)]
    ssh: Option<RawEndpoint>,
    #[serde(default)]
    rest: Option<RawEndpoint>,
}

#[derive(Debug, Deserialize)]
struct RawEndpoint {
    #[serde(default)]
    ip: Option<String>,
    #[serde(default)]
    port: Option<u16>,
}

/// DNS servers may be written as a comma-separated string or a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawDns {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Default, Deserialize)]
struct RawCustom {
    #[serde(default)]
    hostname: Option<String>,
    #[serde(default)]
    gateway: Option<Route>,
    #[serde(default)]
    dhcp: Vec<DhcpPool>,
    #[serde(default)]
    static_routes: Vec<Route>,
    #[serde(default)]
    ospf_area: Option<u32>,
    #[serde(default)]
    dns: Option<RawDns>,
    #[serde(default)]
    ip_helper: Option<IpHelper>,
    #[serde(default)]
    requires_mgmt_route: bool,
    #[serde(default)]
    network_config: Option<RawNetworkConfig>,
}

#[derive(Debug, Deserialize)]
struct RawNetworkConfig {
    interface: String,
    ip: String,
    gateway: Ipv4Addr,
    #[serde(default)]
    routes: IndexMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDeviceTopology {
    #[serde(default)]
    interfaces: IndexMap<String, RawInterface>,
}

#[derive(Debug, Default, Deserialize)]
struct RawInterface {
    #[serde(default)]
    alias: Option<String>,
    #[serde(default)]
    ipv4: Option<String>,
    #[serde(default)]
    link: Option<String>,
}

fn parse_network(value: &str) -> Result<Ipv4Network> {
    value.parse::<Ipv4Network>().map_err(|e| {
        ConfigurationError::InvalidAddress {
            value: value.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

impl From<RawEndpoint> for Endpoint {
    fn from(raw: RawEndpoint) -> Self {
        Endpoint {
            host: raw.ip,
            port: raw.port,
        }
    }
}

impl RawCustom {
    fn into_custom(self) -> Result<Custom> {
        let dns = match self.dns {
            Some(RawDns::One(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            Some(RawDns::Many(list)) => list,
            None => Vec::new(),
        };

        let network_config = match self.network_config {
            Some(raw) => {
                let mut routes = IndexMap::new();
                for (label, subnet) in raw.routes {
                    routes.insert(label, parse_network(&subnet)?);
                }
                Some(HostNetworkConfig {
                    interface: raw.interface,
                    ip: parse_network(&raw.ip)?,
                    gateway: raw.gateway,
                    routes,
                })
            }
            None => None,
        };

        Ok(Custom {
            hostname: self.hostname,
            gateway: self.gateway,
            dhcp: self.dhcp,
            static_routes: self.static_routes,
            ospf_area: self.ospf_area,
            dns,
            ip_helper: self.ip_helper,
            requires_mgmt_route: self.requires_mgmt_route,
            network_config,
        })
    }
}

impl Topology {
    /// Parse a testbed document.
    pub fn from_yaml_str(source: &str) -> Result<Self> {
        let raw: RawTestbed =
            serde_yaml::from_str(source).map_err(ConfigurationError::from)?;
        Self::from_raw(raw)
    }

    /// Read and parse a testbed file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&source)
    }

    fn from_raw(raw: RawTestbed) -> Result<Self> {
        let mut topology = Topology::new();
        let mut layout = raw.topology;

        for (name, dev) in raw.devices {
            let os: OsFamily = dev.os.parse()?;
            let mut device = Device::new(name.clone(), os);
            device.platform = dev.platform;
            device.device_type = dev.device_type;
            device.custom = dev.custom.into_custom()?;
            device.connections = Connections {
                telnet: dev.connections.telnet.map(Endpoint::from),
                ssh: dev.connections.ssh.map(Endpoint::from),
                rest: dev.connections.rest.map(Endpoint::from),
            };
            for (group, cred) in dev.credentials {
                let credential = Credential {
                    username: cred.username,
                    password: cred.password.map(Into::into),
                };
                device.credentials.insert(group, credential);
            }

            let mut links = Vec::new();
            if let Some(entry) = layout.shift_remove(&name) {
                for (iface_name, iface) in entry.interfaces {
                    let mut interface = Interface::new(iface_name.clone());
                    interface.alias = iface.alias;
                    interface.ipv4 = iface.ipv4.as_deref().map(parse_network).transpose()?;
                    if let Some(link) = iface.link {
                        links.push((iface_name, link));
                    }
                    device = device.with_interface(interface);
                }
            }

            let id = topology.add_device(device)?;
            for (iface_name, link) in links {
                let link = topology.link_named(&link);
                topology.attach(id, &iface_name, link)?;
            }
        }

        if let Some(name) = layout.keys().next() {
            return Err(ConfigurationError::UnknownDevice { name: name.clone() }.into());
        }

        debug!("loaded topology with {} devices", topology.len());
        Ok(topology)
    }
}
