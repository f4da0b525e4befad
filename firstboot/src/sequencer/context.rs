//! Values a dialog reads, resolved from the topology before a run.

use std::net::Ipv4Addr;

use indexmap::IndexMap;
use ipnetwork::Ipv4Network;
use secrecy::{ExposeSecret, SecretString};

use crate::error::{ConfigurationError, Result};
use crate::platform::Scope;
use crate::routes::RouteTable;
use crate::topology::{DEFAULT_GROUP, DeviceId, ENABLE_GROUP, Topology};

/// Aliases whose link must lead to exactly one neighbour.
const ANCHOR_ALIASES: [&str; 2] = ["initial", "mgmt"];

/// Value of `dns` for a device that lists no servers.
const NO_DNS: &str = "none";

/// Named string values.
pub type Vars = IndexMap<String, String>;

/// Variables and collections for one device.
#[derive(Debug, Clone, Default)]
pub struct DialogContext {
    device: String,
    vars: Vars,
    secrets: IndexMap<String, SecretString>,
    collections: IndexMap<String, Vec<Vars>>,
}

impl DialogContext {
    /// An empty context for `device`.
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            ..Self::default()
        }
    }

    /// Resolve everything the built-in dialogs use.
    ///
    /// Fails if an `initial` or `mgmt` interface does not lead to exactly
    /// one neighbouring device. `routes`, when given, replaces the routes a
    /// host declares for itself.
    pub fn from_topology(topology: &Topology, id: DeviceId, routes: Option<&RouteTable>) -> Result<Self> {
        let device = topology.device(id);
        let mut ctx = Self::new(device.name.clone());

        for iface in device.interfaces.values() {
            let Some(alias) = iface.alias.as_deref() else {
                continue;
            };
            if !ANCHOR_ALIASES.contains(&alias) {
                continue;
            }
            let found = topology.neighbors_by_alias(id, alias).len();
            if found != 1 {
                return Err(ConfigurationError::UnresolvedNeighbor {
                    device: device.name.clone(),
                    interface: iface.name.clone(),
                    found,
                }
                .into());
            }
        }

        ctx.set_var("name", &device.name);
        ctx.set_var("hostname", device.hostname());
        ctx.set_var("os", device.os.as_str());
        if let Some(platform) = &device.platform {
            ctx.set_var("platform", platform);
        }
        if let Some(device_type) = &device.device_type {
            ctx.set_var("device_type", device_type);
        }

        if let Some(default) = device.credentials.get(DEFAULT_GROUP) {
            if let Some(username) = &default.username {
                ctx.set_var("username", username);
            }
            if let Some(password) = &default.password {
                ctx.secrets.insert("password".into(), password.clone());
            }
        }
        if let Some(password) = device
            .credentials
            .get(ENABLE_GROUP)
            .and_then(|c| c.password.as_ref())
        {
            ctx.secrets.insert("enable_password".into(), password.clone());
        }

        if let Some(initial) = device.interface_by_alias("initial") {
            ctx.set_var("initial_interface", &initial.name);
            if let Some(net) = initial.ipv4 {
                ctx.set_var("initial_ip", net.ip().to_string());
                ctx.set_var("initial_mask", net.mask().to_string());
            }
        }

        if let Some(mgmt) = device.interface_by_alias("mgmt") {
            ctx.set_var("mgmt_interface", &mgmt.name);
            if let Some(net) = mgmt.ipv4 {
                ctx.set_var("mgmt_ip", net.ip().to_string());
                ctx.set_var("mgmt_mask", net.mask().to_string());
            }
            if let Some(gateway) = topology.neighbor_address(id, "mgmt") {
                ctx.set_var("mgmt_gateway", gateway.to_string());
            }
        }

        let custom = &device.custom;
        if let Some(gateway) = custom.gateway {
            ctx.set_var("gateway_dest", gateway.dest.to_string());
            ctx.set_var("gateway_mask", gateway.mask.to_string());
            ctx.set_var("gateway_next_hop", gateway.next_hop.to_string());
        }
        if custom.dns.is_empty() {
            ctx.set_var("dns", NO_DNS);
        } else {
            ctx.set_var("dns", custom.dns.join(","));
        }
        let area = custom.ospf_area.unwrap_or(0).to_string();
        ctx.set_var("ospf_area", &area);
        if let Some(helper) = &custom.ip_helper {
            ctx.set_var("helper_ip", helper.ip.to_string());
        }
        if let Some(rest) = device.connections.rest.as_ref().and_then(|r| r.host.as_ref()) {
            ctx.set_var("rest_host", rest);
        }

        for pool in &custom.dhcp {
            ctx.push_item(
                "dhcp",
                [
                    ("excluded_start", pool.excluded[0].to_string()),
                    ("excluded_end", pool.excluded[1].to_string()),
                    ("pool_name", pool.pool_name()),
                    ("network", pool.network.to_string()),
                    ("mask", pool.mask.to_string()),
                    ("default_router", pool.default_router.to_string()),
                    ("dns_server", pool.dns_server.to_string()),
                ],
            );
        }

        for route in &custom.static_routes {
            ctx.push_item(
                "static_routes",
                [
                    ("dest", route.dest.to_string()),
                    ("mask", route.mask.to_string()),
                    ("next_hop", route.next_hop.to_string()),
                ],
            );
        }

        for iface in device.interfaces.values() {
            let Some(net) = iface.ipv4 else {
                continue;
            };
            ctx.push_item(
                "ospf_networks",
                [
                    ("network", net.network().to_string()),
                    ("wildcard", wildcard(net).to_string()),
                    ("area", area.clone()),
                ],
            );
            if !iface.has_alias("initial") {
                ctx.push_item(
                    "interfaces",
                    [
                        ("name", iface.name.clone()),
                        ("ip", net.ip().to_string()),
                        ("mask", net.mask().to_string()),
                    ],
                );
            }
        }

        if let Some(helper) = &custom.ip_helper {
            for iface in device.interfaces.values().filter(|i| i.has_alias(&helper.next_hop)) {
                ctx.push_item("helper_interfaces", [("name", iface.name.clone())]);
            }
        }

        if let Some(net) = &custom.network_config {
            ctx.set_var("host_interface", &net.interface);
            ctx.set_var("host_address", net.ip.to_string());
            ctx.set_var("host_gateway", net.gateway.to_string());

            let declared = net.routes.iter().map(|(l, s)| (l.as_str(), *s));
            let routes: Vec<(&str, Ipv4Network)> = match routes {
                Some(table) => table.iter().collect(),
                None => declared.collect(),
            };
            for (label, subnet) in routes {
                ctx.push_item(
                    "host_routes",
                    [("label", label.to_string()), ("subnet", subnet.to_string())],
                );
            }
        }

        Ok(ctx)
    }

    /// Device this context was built for.
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Bind a plain variable.
    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Bind a secret variable.
    pub fn set_secret(&mut self, name: impl Into<String>, value: SecretString) {
        self.secrets.insert(name.into(), value);
    }

    /// Append an item to a collection.
    pub fn push_item<I, K>(&mut self, collection: &str, fields: I)
    where
        I: IntoIterator<Item = (K, String)>,
        K: Into<String>,
    {
        let item = fields.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(item);
    }

    /// Value of a variable; secrets are exposed.
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(String::as_str)
            .or_else(|| self.secrets.get(name).map(|s| s.expose_secret()))
    }

    /// Items of a collection; empty when absent.
    pub fn collection(&self, name: &str) -> &[Vars] {
        self.collections.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Scope over the device variables.
    pub fn scope(&self) -> ContextScope<'_> {
        ContextScope { ctx: self, item: None }
    }

    /// Scope where `item` fields shadow the device variables.
    pub fn scope_with<'a>(&'a self, item: &'a Vars) -> ContextScope<'a> {
        ContextScope {
            ctx: self,
            item: Some(item),
        }
    }
}

/// Template scope over a [`DialogContext`] and, inside loops, one item.
#[derive(Debug, Clone, Copy)]
pub struct ContextScope<'a> {
    ctx: &'a DialogContext,
    item: Option<&'a Vars>,
}

impl Scope for ContextScope<'_> {
    fn var(&self, name: &str) -> Option<&str> {
        self.item
            .and_then(|item| item.get(name).map(String::as_str))
            .or_else(|| self.ctx.var(name))
    }

    fn device_name(&self) -> &str {
        &self.ctx.device
    }
}

fn wildcard(net: Ipv4Network) -> Ipv4Addr {
    Ipv4Addr::from(!u32::from(net.mask()))
}
