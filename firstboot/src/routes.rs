//! Routes a host needs to reach every lab subnet.

use std::collections::BTreeSet;
use std::net::Ipv4Addr;

use indexmap::IndexMap;
use ipnetwork::Ipv4Network;
use log::debug;

use crate::topology::{DeviceId, Topology};

/// Prefix every synthesized route is widened to.
const ROUTE_PREFIX: u8 = 24;

/// Ordered label to subnet table, `route-1`, `route-2`, ...
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    routes: IndexMap<String, Ipv4Network>,
}

impl RouteTable {
    /// Collect the /24 of every address on every other device, plus the
    /// destinations of their static routes.
    ///
    /// `mgmt` subnets are left out unless their device sets
    /// `requires_mgmt_route`. Subnets are ordered numerically.
    pub fn synthesize(topology: &Topology, host: DeviceId) -> Self {
        let mut subnets = BTreeSet::new();

        for (id, device) in topology.devices() {
            if id == host {
                continue;
            }
            for iface in device.interfaces.values() {
                if iface.has_alias("mgmt") && !device.custom.requires_mgmt_route {
                    continue;
                }
                if let Some(net) = iface.ipv4 {
                    subnets.insert(widen(net.ip()));
                }
            }
            for route in &device.custom.static_routes {
                subnets.insert(widen(route.dest));
            }
        }

        let routes = subnets
            .into_iter()
            .enumerate()
            .filter_map(|(i, network)| {
                Ipv4Network::new(network, ROUTE_PREFIX)
                    .ok()
                    .map(|net| (format!("route-{}", i + 1), net))
            })
            .collect::<IndexMap<_, _>>();

        debug!(
            "{}: synthesized {} routes",
            topology.device(host).name,
            routes.len()
        );
        Self { routes }
    }

    /// Labels and subnets in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Ipv4Network)> {
        self.routes.iter().map(|(l, n)| (l.as_str(), *n))
    }

    pub fn get(&self, label: &str) -> Option<Ipv4Network> {
        self.routes.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Network address of the /24 containing `addr`.
fn widen(addr: Ipv4Addr) -> Ipv4Addr {
    Ipv4Addr::from(u32::from(addr) & 0xffff_ff00)
}
