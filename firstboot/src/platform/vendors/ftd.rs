//! Firepower Threat Defense first-boot dialog.
//!
//! The setup wizard is strictly linear: every question must be answered in
//! order, and the EULA is paged through with a fixed number of space presses.
//!
//! # Prompt Examples
//!
//! ```text
//! firepower login:
//! Press <ENTER> to display the EULA:
//! --MORE--
//! Please enter 'YES' or press <ENTER> to AGREE to the EULA:
//! Enter new password:
//! Do you want to configure IPv4? (y/n) [y]:
//! Manage the device locally? (yes/no) [yes]:
//! >
//! ```

use std::time::Duration;

use crate::platform::{Action, DialogDefinition, Exchange, Phase, Stage, Step, TransportKind};
use crate::topology::OsFamily;

/// Space presses needed to reach the end of the EULA.
const EULA_PAGES: usize = 15;

/// Delay between EULA page presses.
const EULA_INTERVAL: Duration = Duration::from_millis(500);

/// Applying the management settings restarts services on the device.
const APPLY_WAIT: Duration = Duration::from_secs(300);

/// Factory login.
const FACTORY_USER: &str = "admin";
const FACTORY_PASSWORD: &str = "Admin123";

/// First-boot dialog over the console.
pub fn initial() -> DialogDefinition {
    DialogDefinition::new("ftd_initial", OsFamily::Ftd, Phase::Initial, TransportKind::Telnet)
        .with_step(Step::send(
            Stage::Login,
            vec![
                Exchange::new("", ["firepower login:"]),
                Exchange::new(FACTORY_USER, ["Password:"]),
                Exchange::new(FACTORY_PASSWORD, ["Press <ENTER> to display the EULA:"]).hidden(),
            ],
        ))
        .with_step(Step::new(
            Stage::EulaAccept,
            Action::Page {
                trigger: Exchange::new("", ["--MORE--"]),
                key: b" ",
                presses: EULA_PAGES,
                interval: EULA_INTERVAL,
                done: "AGREE to the EULA:".into(),
            },
        ))
        .with_step(Step::send(
            Stage::PasswordChange,
            vec![
                Exchange::new("", ["Enter new password:"]),
                Exchange::new("{password}", ["Confirm new password:"]).hidden(),
                Exchange::new(
                    "{password}",
                    [r"Do you want to configure IPv4\? \(y/n\) \[y\]:"],
                )
                .hidden(),
            ],
        ))
        .with_step(Step::send(
            Stage::Ipv4Addressing,
            vec![
                Exchange::new("y", [r"Do you want to configure IPv6\? \(y/n\) \[n\]:"]),
                Exchange::new(
                    "n",
                    [r"Configure IPv4 via DHCP or manually\? \(dhcp/manual\) \[manual\]:"],
                ),
                Exchange::new(
                    "manual",
                    [r"Enter an IPv4 address for the management interface \[192\.168\.45\.45\]:"],
                ),
                Exchange::new(
                    "{mgmt_ip}",
                    [r"Enter an IPv4 netmask for the management interface \[255\.255\.255\.0\]"],
                ),
                Exchange::new(
                    "{mgmt_mask}",
                    [r"Enter the IPv4 default gateway for the management interface \[192\.168\.45\.1\]:"],
                ),
            ],
        ))
        .with_step(Step::send(
            Stage::GatewaySet,
            vec![Exchange::new(
                "{mgmt_gateway}",
                [r"Enter a fully qualified hostname for this system \[firepower\]:"],
            )],
        ))
        .with_step(Step::send(
            Stage::HostnameSet,
            vec![Exchange::new(
                "{hostname}",
                [r"Enter a comma-separated list of DNS severs or 'none' \[200\.67\.222\.222,208\.67\.220\.220\]"],
            )],
        ))
        .with_step(Step::send(
            Stage::DnsSet,
            vec![Exchange::new(
                "{dns}",
                [r"Enter a comma-separated list of search domains or 'none' \[\]"],
            )],
        ))
        .with_step(Step::send(
            Stage::SearchDomains,
            vec![Exchange::new(
                "none",
                [r"Manage the device locally\? \(yes/no\) \[yes\]:"],
            )],
        ))
        .with_step(Step::send(
            Stage::LocalManagement,
            vec![Exchange::new("yes", [">"]).timeout(APPLY_WAIT)],
        ))
}
