//! In-memory topology: devices, their interfaces, and the links between them.
//!
//! Devices and links live in arenas and refer to each other by index.
//! An interface stores the [`LinkId`] it is attached to; a link stores the
//! `(device, interface)` pairs attached to it.

mod credentials;
mod device;
mod loader;

pub use credentials::{Credential, Credentials, DEFAULT_GROUP, ENABLE_GROUP};
pub use device::{
    Connections, Custom, Device, DhcpPool, Endpoint, HostNetworkConfig, Interface, IpHelper,
    OsFamily, Route,
};

use std::fmt;
use std::net::Ipv4Addr;

use indexmap::IndexMap;

use crate::error::{ConfigurationError, Result};

/// Stable index of a device in a [`Topology`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(usize);

/// Stable index of a link in a [`Topology`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId(usize);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device#{}", self.0)
    }
}

/// An undirected shared medium.
#[derive(Debug, Clone)]
pub struct Link {
    pub name: String,
    members: Vec<(DeviceId, String)>,
}

impl Link {
    /// Attached `(device, interface name)` pairs in attachment order.
    pub fn members(&self) -> &[(DeviceId, String)] {
        &self.members
    }
}

/// The device graph.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    devices: Vec<Device>,
    links: Vec<Link>,
    by_name: IndexMap<String, DeviceId>,
    links_by_name: IndexMap<String, LinkId>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device. Interfaces that already carry a link index are
    /// rejected; attach them with [`Topology::attach`].
    pub fn add_device(&mut self, mut device: Device) -> Result<DeviceId> {
        if self.by_name.contains_key(&device.name) {
            return Err(ConfigurationError::DuplicateDevice { name: device.name }.into());
        }
        for interface in device.interfaces.values_mut() {
            interface.link = None;
        }
        let id = DeviceId(self.devices.len());
        self.by_name.insert(device.name.clone(), id);
        self.devices.push(device);
        Ok(id)
    }

    /// Get or create the link with this name.
    pub fn link_named(&mut self, name: &str) -> LinkId {
        if let Some(id) = self.links_by_name.get(name) {
            return *id;
        }
        let id = LinkId(self.links.len());
        self.links.push(Link {
            name: name.to_string(),
            members: Vec::new(),
        });
        self.links_by_name.insert(name.to_string(), id);
        id
    }

    /// Attach a device interface to a link.
    pub fn attach(&mut self, device: DeviceId, interface: &str, link: LinkId) -> Result<()> {
        let dev = self
            .devices
            .get_mut(device.0)
            .ok_or_else(|| ConfigurationError::UnknownDevice {
                name: device.to_string(),
            })?;
        let iface = dev.interfaces.get_mut(interface).ok_or_else(|| {
            ConfigurationError::MissingInterface {
                device: dev.name.clone(),
                alias: interface.to_string(),
            }
        })?;
        iface.link = Some(link);
        if let Some(l) = self.links.get_mut(link.0) {
            l.members.push((device, interface.to_string()));
        }
        Ok(())
    }

    /// Connect two device interfaces with a named link.
    pub fn connect(
        &mut self,
        link: &str,
        a: (DeviceId, &str),
        b: (DeviceId, &str),
    ) -> Result<LinkId> {
        let id = self.link_named(link);
        self.attach(a.0, a.1, id)?;
        self.attach(b.0, b.1, id)?;
        Ok(id)
    }

    pub fn device(&self, id: DeviceId) -> &Device {
        &self.devices[id.0]
    }

    pub fn device_mut(&mut self, id: DeviceId) -> &mut Device {
        &mut self.devices[id.0]
    }

    pub fn link(&self, id: LinkId) -> &Link {
        &self.links[id.0]
    }

    /// Look up a device by name.
    pub fn find(&self, name: &str) -> Option<DeviceId> {
        self.by_name.get(name).copied()
    }

    /// All devices in insertion order.
    pub fn devices(&self) -> impl Iterator<Item = (DeviceId, &Device)> {
        self.devices.iter().enumerate().map(|(i, d)| (DeviceId(i), d))
    }

    pub fn device_ids(&self) -> impl Iterator<Item = DeviceId> + use<> {
        (0..self.devices.len()).map(DeviceId)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Distinct devices attached to a link, in attachment order.
    pub fn connected_devices(&self, link: LinkId) -> Vec<DeviceId> {
        let mut seen = Vec::new();
        for (device, _) in &self.link(link).members {
            if !seen.contains(device) {
                seen.push(*device);
            }
        }
        seen
    }

    /// Other devices sharing the link of `device`'s interface with `alias`.
    pub fn neighbors_by_alias(&self, device: DeviceId, alias: &str) -> Vec<DeviceId> {
        self.device(device)
            .interface_by_alias(alias)
            .and_then(|i| i.link)
            .map(|link| {
                self.connected_devices(link)
                    .into_iter()
                    .filter(|d| *d != device)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Address of the first neighbour interface on the link of `device`'s
    /// interface with `alias`.
    ///
    /// Neighbours are visited in attachment order and, within a neighbour,
    /// interfaces in declaration order; interfaces without an address are
    /// passed over.
    pub fn neighbor_address(&self, device: DeviceId, alias: &str) -> Option<Ipv4Addr> {
        let link = self.device(device).interface_by_alias(alias)?.link?;
        self.connected_devices(link)
            .into_iter()
            .filter(|d| *d != device)
            .flat_map(|d| self.device(d).interfaces.values())
            .filter(|i| i.link == Some(link))
            .find_map(|i| i.ipv4.map(|net| net.ip()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn pair() -> (Topology, DeviceId, DeviceId) {
        let mut topo = Topology::new();
        let r1 = topo
            .add_device(
                Device::new("R1", OsFamily::Ios).with_interface(
                    Interface::new("Gi0/0")
                        .with_alias("initial")
                        .with_ipv4("10.0.0.2/24".parse().unwrap()),
                ),
            )
            .unwrap();
        let sw = topo
            .add_device(
                Device::new("IOU1", OsFamily::Ios)
                    .with_interface(
                        Interface::new("Eth0/1").with_ipv4("10.0.0.1/24".parse().unwrap()),
                    ),
            )
            .unwrap();
        topo.connect("l1", (r1, "Gi0/0"), (sw, "Eth0/1")).unwrap();
        (topo, r1, sw)
    }

    #[test]
    fn test_neighbor_address() {
        let (topo, r1, _) = pair();
        assert_eq!(
            topo.neighbor_address(r1, "initial"),
            Some("10.0.0.1".parse().unwrap())
        );
        assert_eq!(topo.neighbor_address(r1, "mgmt"), None);
    }

    #[test]
    fn test_neighbors_exclude_self() {
        let (topo, r1, sw) = pair();
        assert_eq!(topo.neighbors_by_alias(r1, "initial"), vec![sw]);
    }

    #[test]
    fn test_duplicate_device_rejected() {
        let (mut topo, _, _) = pair();
        let err = topo.add_device(Device::new("R1", OsFamily::Ios)).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Configuration(ConfigurationError::DuplicateDevice { .. })
        ));
    }

    #[test]
    fn test_attach_unknown_interface() {
        let (mut topo, r1, _) = pair();
        let link = topo.link_named("l2");
        assert!(topo.attach(r1, "Gi9/9", link).is_err());
    }

    #[test]
    fn test_unaddressed_neighbor_interface_skipped() {
        let (mut topo, r1, _) = pair();
        let sw2 = topo
            .add_device(
                Device::new("SW2", OsFamily::Ios).with_interface(Interface::new("Eth0/0")),
            )
            .unwrap();
        let l1 = topo.link_named("l1");
        topo.attach(sw2, "Eth0/0", l1).unwrap();

        assert_eq!(
            topo.neighbor_address(r1, "initial"),
            Some("10.0.0.1".parse().unwrap())
        );
        assert_eq!(topo.connected_devices(l1).len(), 3);
    }
}
