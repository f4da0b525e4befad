//! Devices, interfaces and their per-device settings.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use indexmap::IndexMap;
use ipnetwork::Ipv4Network;
use serde::Deserialize;

use super::LinkId;
use super::credentials::Credentials;
use crate::error::ConfigurationError;

/// Operating system family, which selects the dialog tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsFamily {
    /// Classic IOS (IOSv, IOU).
    Ios,
    /// IOS-XE (CSR1000v).
    Iosxe,
    /// Firepower Threat Defense.
    Ftd,
    /// Linux host.
    Linux,
}

impl OsFamily {
    /// Lowercase name as written in topology files.
    pub fn as_str(&self) -> &'static str {
        match self {
            OsFamily::Ios => "ios",
            OsFamily::Iosxe => "iosxe",
            OsFamily::Ftd => "ftd",
            OsFamily::Linux => "linux",
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OsFamily {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ios" => Ok(OsFamily::Ios),
            "iosxe" | "csr" => Ok(OsFamily::Iosxe),
            "ftd" => Ok(OsFamily::Ftd),
            "linux" => Ok(OsFamily::Linux),
            _ => Err(ConfigurationError::UnsupportedOs { os: s.to_string() }),
        }
    }
}

/// A host/port pair for one way of reaching a device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Endpoint {
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl Endpoint {
    /// Endpoint with both fields set.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: Some(host.into()),
            port: Some(port),
        }
    }
}

/// Connection descriptors for a device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Connections {
    pub telnet: Option<Endpoint>,
    pub ssh: Option<Endpoint>,
    pub rest: Option<Endpoint>,
}

/// A static IPv4 route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Route {
    pub dest: Ipv4Addr,
    pub mask: Ipv4Addr,
    pub next_hop: Ipv4Addr,
}

/// A DHCP pool served by a router.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DhcpPool {
    /// First and last excluded address.
    pub excluded: [Ipv4Addr; 2],
    pub network: Ipv4Addr,
    pub mask: Ipv4Addr,
    pub default_router: Ipv4Addr,
    pub dns_server: Ipv4Addr,
    /// Pool name; derived from the network when absent.
    #[serde(default)]
    pub name: Option<String>,
}

impl DhcpPool {
    /// `POOL_` followed by the network with dots replaced.
    pub fn pool_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("POOL_{}", self.network.to_string().replace('.', "_")))
    }
}

/// DHCP relay target attached to interfaces with a matching alias.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IpHelper {
    /// DHCP server address.
    pub ip: Ipv4Addr,
    /// Alias of the interfaces that get the helper.
    pub next_hop: String,
}

/// Addressing for a Linux host's uplink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostNetworkConfig {
    pub interface: String,
    pub ip: Ipv4Network,
    pub gateway: Ipv4Addr,
    /// Declared routes, used when none are synthesized.
    pub routes: IndexMap<String, Ipv4Network>,
}

/// Per-device settings that dialogs read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Custom {
    pub hostname: Option<String>,
    pub gateway: Option<Route>,
    pub dhcp: Vec<DhcpPool>,
    pub static_routes: Vec<Route>,
    pub ospf_area: Option<u32>,
    pub dns: Vec<String>,
    pub ip_helper: Option<IpHelper>,
    /// Include this device's `mgmt` subnet in synthesized routes.
    pub requires_mgmt_route: bool,
    pub network_config: Option<HostNetworkConfig>,
}

/// One interface of a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    pub name: String,
    /// Role tag such as `initial` or `mgmt`.
    pub alias: Option<String>,
    pub ipv4: Option<Ipv4Network>,
    pub link: Option<LinkId>,
}

impl Interface {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            ipv4: None,
            link: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_ipv4(mut self, ipv4: Ipv4Network) -> Self {
        self.ipv4 = Some(ipv4);
        self
    }

    /// Whether the alias equals `alias`.
    pub fn has_alias(&self, alias: &str) -> bool {
        self.alias.as_deref() == Some(alias)
    }
}

/// A device in the topology.
#[derive(Debug, Clone)]
pub struct Device {
    pub name: String,
    pub os: OsFamily,
    /// Platform variant, e.g. `iosv`, `iou`, `csr1000v`.
    pub platform: Option<String>,
    /// Device type, e.g. `router`, `ubuntu`.
    pub device_type: Option<String>,
    pub custom: Custom,
    pub credentials: Credentials,
    pub connections: Connections,
    pub interfaces: IndexMap<String, Interface>,
}

impl Device {
    pub fn new(name: impl Into<String>, os: OsFamily) -> Self {
        Self {
            name: name.into(),
            os,
            platform: None,
            device_type: None,
            custom: Custom::default(),
            credentials: Credentials::default(),
            connections: Connections::default(),
            interfaces: IndexMap::new(),
        }
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    /// Add an interface. Links are attached through the topology.
    pub fn with_interface(mut self, interface: Interface) -> Self {
        self.interfaces.insert(interface.name.clone(), interface);
        self
    }

    /// First interface carrying `alias`.
    pub fn interface_by_alias(&self, alias: &str) -> Option<&Interface> {
        self.interfaces.values().find(|i| i.has_alias(alias))
    }

    /// Hostname to configure: the explicit one or the device name.
    pub fn hostname(&self) -> &str {
        self.custom.hostname.as_deref().unwrap_or(&self.name)
    }
}
