//! Cisco IOS and IOS-XE dialogs.
//!
//! Both families share one dialog; they differ in the enable command and in
//! how loosely the configuration prompt is matched.
//!
//! # Prompt Examples
//!
//! ```text
//! Would you like to enter the initial configuration dialog? [yes/no]:
//! Router>                        # user exec
//! Router#                        # privileged exec
//! Router(config)#                # global configuration
//! Router(config-if)#             # interface
//! Router(config-line)#           # vty lines
//! Router(config-router)#         # OSPF
//! Router(dhcp-config)#           # DHCP pool
//! ```
//!
//! # Bring-up
//!
//! ```text
//! AWAIT_DIALOG_SKIP ─► PRIV_EXEC ─► GLOBAL_CONFIG ─► INTERFACE_CONFIG
//!   ─► ROUTE_CONFIG | OSPF_NETWORK ─► HOSTNAME_SET ─► DOMAIN_SET
//!   ─► CRYPTO_KEYGEN [─► CRYPTO_REPLACE_CONFIRM] ─► LOCAL_USER ─► VTY_LOGIN
//!   ─► SSH_ENABLE ─► SCP_ENABLE [─► ENABLE_SECRET] [─► DHCP_POOLS] ─► SAVE
//! ```

use std::time::Duration;

use crate::platform::{
    Action, Condition, DialogDefinition, Exchange, Phase, Stage, Step, TransportKind,
};
use crate::topology::OsFamily;

const CONFIG_IF: &str = r"\(config-if\)#";
const CONFIG_LINE: &str = r"\(config-line\)#";
const CONFIG_ROUTER: &str = r"\(config-router\)#";
const DHCP_CONFIG: &str = r"\(dhcp-config\)#";
const SETUP_BANNER: &str = r"initial configuration dialog\? \[yes/no\]:";
const REPLACE_KEYS: &str = r"replace them\?";

/// Time allowed for the device to finish booting after the wizard is skipped.
const BOOT_WAIT: Duration = Duration::from_secs(300);

/// Pause after each RSA key generation step.
const KEYGEN_SETTLE: Duration = Duration::from_secs(5);

/// The parts that differ between IOS and IOS-XE.
struct Flavour {
    os: OsFamily,
    enable: &'static str,
    config: &'static str,
}

fn flavour(os: OsFamily) -> Flavour {
    match os {
        OsFamily::Iosxe => Flavour {
            os,
            enable: "enable",
            config: r"\(config\)#",
        },
        _ => Flavour {
            os: OsFamily::Ios,
            enable: "en",
            config: r"\(config.*\)#",
        },
    }
}

/// First-boot dialog over the console.
pub fn initial(os: OsFamily) -> DialogDefinition {
    let f = flavour(os);
    let cfg = f.config;

    DialogDefinition::new(format!("{}_initial", f.os), f.os, Phase::Initial, TransportKind::Telnet)
        .with_step(Step::new(
            Stage::AwaitDialogSkip,
            Action::DialogSkip {
                probe: Exchange::new("", [SETUP_BANNER, "[>#]"]),
                banner: 0,
                answers: vec![
                    Exchange::new("no", [r"terminate autoinstall\? \[yes/no\]:"]),
                    Exchange::new("yes", [r"RETURN to get started", ">"]).timeout(BOOT_WAIT),
                    Exchange::new("", [">"]),
                ],
            },
        ))
        .with_step(Step::send(Stage::PrivExec, vec![Exchange::new(f.enable, ["#"])]))
        .with_step(Step::send(Stage::GlobalConfig, vec![Exchange::new("conf t", [cfg])]))
        .with_step(Step::send(
            Stage::InterfaceConfig,
            vec![
                Exchange::new("int {initial_interface}", [CONFIG_IF]),
                Exchange::new("ip add {initial_ip} {initial_mask}", [CONFIG_IF]),
                Exchange::new("no shut", [CONFIG_IF]),
                Exchange::new("exit", [cfg]),
            ],
        ))
        .with_step(
            Step::send(
                Stage::RouteConfig,
                vec![Exchange::new(
                    "ip route {gateway_dest} {gateway_mask} {gateway_next_hop}",
                    [cfg],
                )],
            )
            .when(Condition::Present("gateway_next_hop")),
        )
        .with_step(ospf(cfg).when(Condition::All(vec![
            Condition::Absent("gateway_next_hop"),
            Condition::NonEmpty("ospf_networks"),
        ])))
        .with_step(Step::send(Stage::HostnameSet, vec![Exchange::new("hostname {hostname}", [cfg])]))
        .with_step(Step::send(
            Stage::DomainSet,
            vec![Exchange::new("ip domain name localdomain", [cfg])],
        ))
        .with_step(Step::new(
            Stage::CryptoKeygen,
            Action::Confirm {
                exchange: Exchange::new("crypto key generate rsa modulus 2048", [cfg, REPLACE_KEYS])
                    .settle(KEYGEN_SETTLE),
                question: "replace them".into(),
                answer: Exchange::new("yes", [cfg, REPLACE_KEYS]).settle(KEYGEN_SETTLE),
                confirm_stage: Some(Stage::CryptoReplaceConfirm),
            },
        ))
        .with_step(Step::send(
            Stage::LocalUser,
            vec![Exchange::new("username {username} privilege 15 secret {password}", [cfg]).hidden()],
        ))
        .with_step(Step::send(
            Stage::VtyLogin,
            vec![
                Exchange::new("line vty 0 4", [CONFIG_LINE]),
                Exchange::new("transport input ssh", [CONFIG_LINE]),
                Exchange::new("login local", [CONFIG_LINE]),
                Exchange::new("exit", [cfg]),
            ],
        ))
        .with_step(Step::send(Stage::SshEnable, vec![Exchange::new("ip ssh version 2", [cfg])]))
        .with_step(Step::send(Stage::ScpEnable, vec![Exchange::new("ip scp server enable", [cfg])]))
        .with_step(
            Step::send(
                Stage::EnableSecret,
                vec![Exchange::new("enable secret {enable_password}", [cfg]).hidden()],
            )
            .when(Condition::All(vec![
                Condition::Equals("platform", "iosv"),
                Condition::Present("enable_password"),
            ])),
        )
        .with_step(dhcp(cfg).when(Condition::NonEmpty("dhcp")))
        .with_step(Step::send(
            Stage::Save,
            vec![
                Exchange::new("end", ["{hostname}#"]),
                Exchange::new("write memory", [r"\[OK\]|{hostname}#"]),
                Exchange::new("", ["{hostname}#"]),
            ],
        ))
}

/// Follow-up configuration over SSH once the management address works.
pub fn provision(os: OsFamily) -> DialogDefinition {
    let f = flavour(os);
    let cfg = f.config;

    DialogDefinition::new(
        format!("{}_provision", f.os),
        f.os,
        Phase::Provision,
        TransportKind::Shell,
    )
    .with_step(Step::send(
        Stage::GlobalConfig,
        vec![Exchange::new("configure terminal", [cfg])],
    ))
    .with_step(
        Step::new(
            Stage::InterfaceConfig,
            Action::ForEach {
                collection: "interfaces",
                head: vec![],
                body: vec![
                    Exchange::new("interface {name}", [CONFIG_IF]),
                    Exchange::new("ip address {ip} {mask}", [CONFIG_IF]),
                    Exchange::new("no shutdown", [CONFIG_IF]),
                    Exchange::new("exit", [cfg]),
                ],
                tail: vec![],
            },
        )
        .when(Condition::NonEmpty("interfaces")),
    )
    .with_step(
        Step::new(
            Stage::IpHelper,
            Action::ForEach {
                collection: "helper_interfaces",
                head: vec![],
                body: vec![
                    Exchange::new("interface {name}", [CONFIG_IF]),
                    Exchange::new("ip helper-address {helper_ip}", [CONFIG_IF]),
                    Exchange::new("exit", [cfg]),
                ],
                tail: vec![],
            },
        )
        .when(Condition::All(vec![
            Condition::Present("helper_ip"),
            Condition::NonEmpty("helper_interfaces"),
        ])),
    )
    .with_step(
        Step::new(
            Stage::RouteConfig,
            Action::ForEach {
                collection: "static_routes",
                head: vec![],
                body: vec![Exchange::new("ip route {dest} {mask} {next_hop}", [cfg])],
                tail: vec![],
            },
        )
        .when(Condition::NonEmpty("static_routes")),
    )
    .with_step(ospf(cfg).when(Condition::All(vec![
        Condition::Empty("static_routes"),
        Condition::NonEmpty("ospf_networks"),
    ])))
    .with_step(dhcp(cfg).when(Condition::NonEmpty("dhcp")))
    .with_step(
        Step::send(
            Stage::RestconfEnable,
            vec![
                Exchange::new("ip http secure-server", [cfg]),
                Exchange::new("restconf", [cfg]),
            ],
        )
        .when(Condition::Present("rest_host")),
    )
    .with_step(Step::send(Stage::ExitConfig, vec![Exchange::new("end", ["#"])]))
}

fn ospf(cfg: &'static str) -> Step {
    Step::new(
        Stage::OspfNetwork,
        Action::ForEach {
            collection: "ospf_networks",
            head: vec![Exchange::new("router ospf 1", [CONFIG_ROUTER])],
            body: vec![Exchange::new("network {network} {wildcard} area {area}", [CONFIG_ROUTER])],
            tail: vec![Exchange::new("exit", [cfg])],
        },
    )
}

fn dhcp(cfg: &'static str) -> Step {
    Step::new(
        Stage::DhcpPools,
        Action::ForEach {
            collection: "dhcp",
            head: vec![],
            body: vec![
                Exchange::new("ip dhcp excluded-address {excluded_start} {excluded_end}", [cfg]),
                Exchange::new("ip dhcp pool {pool_name}", [DHCP_CONFIG]),
                Exchange::new("network {network} {mask}", [DHCP_CONFIG]),
                Exchange::new("default-router {default_router}", [DHCP_CONFIG]),
                Exchange::new("dns-server {dns_server}", [DHCP_CONFIG]),
            ],
            tail: vec![],
        },
    )
}
