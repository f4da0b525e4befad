//! Dialog stages, phases and the transport each dialog runs over.

use std::fmt;

/// One step of a configuration dialog. Control flow only; no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Idle,
    AwaitDialogSkip,
    PrivExec,
    GlobalConfig,
    InterfaceConfig,
    RouteConfig,
    OspfNetwork,
    HostnameSet,
    DomainSet,
    CryptoKeygen,
    CryptoReplaceConfirm,
    LocalUser,
    VtyLogin,
    SshEnable,
    ScpEnable,
    EnableSecret,
    DhcpPools,
    IpHelper,
    RestconfEnable,
    ExitConfig,
    Save,
    Login,
    EulaAccept,
    PasswordChange,
    Ipv4Addressing,
    GatewaySet,
    DnsSet,
    SearchDomains,
    LocalManagement,
    AddressAssign,
    LinkUp,
    HostRoutes,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Idle => "IDLE",
            Stage::AwaitDialogSkip => "AWAIT_DIALOG_SKIP",
            Stage::PrivExec => "PRIV_EXEC",
            Stage::GlobalConfig => "GLOBAL_CONFIG",
            Stage::InterfaceConfig => "INTERFACE_CONFIG",
            Stage::RouteConfig => "ROUTE_CONFIG",
            Stage::OspfNetwork => "OSPF_NETWORK",
            Stage::HostnameSet => "HOSTNAME_SET",
            Stage::DomainSet => "DOMAIN_SET",
            Stage::CryptoKeygen => "CRYPTO_KEYGEN",
            Stage::CryptoReplaceConfirm => "CRYPTO_REPLACE_CONFIRM",
            Stage::LocalUser => "LOCAL_USER",
            Stage::VtyLogin => "VTY_LOGIN",
            Stage::SshEnable => "SSH_ENABLE",
            Stage::ScpEnable => "SCP_ENABLE",
            Stage::EnableSecret => "ENABLE_SECRET",
            Stage::DhcpPools => "DHCP_POOLS",
            Stage::IpHelper => "IP_HELPER",
            Stage::RestconfEnable => "RESTCONF_ENABLE",
            Stage::ExitConfig => "EXIT_CONFIG",
            Stage::Save => "SAVE",
            Stage::Login => "LOGIN",
            Stage::EulaAccept => "EULA_ACCEPT",
            Stage::PasswordChange => "PASSWORD_CHANGE",
            Stage::Ipv4Addressing => "IPV4_ADDRESSING",
            Stage::GatewaySet => "GATEWAY_SET",
            Stage::DnsSet => "DNS_SET",
            Stage::SearchDomains => "SEARCH_DOMAINS",
            Stage::LocalManagement => "LOCAL_MANAGEMENT",
            Stage::AddressAssign => "ADDRESS_ASSIGN",
            Stage::LinkUp => "LINK_UP",
            Stage::HostRoutes => "HOST_ROUTES",
            Stage::Done => "DONE",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which pass over a device a dialog belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// First boot over the console.
    Initial,
    /// Follow-up configuration once management access works.
    Provision,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Initial => f.write_str("initial"),
            Phase::Provision => f.write_str("provision"),
        }
    }
}

/// Session kind a dialog expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// Telnet console, line framing.
    Telnet,
    /// SSH shell, stream framing.
    Shell,
}
