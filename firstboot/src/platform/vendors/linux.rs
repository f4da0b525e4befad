//! Linux host dialog.
//!
//! Brings up the host's uplink and installs routes toward the lab
//! subnets through the configured gateway. Runs over an SSH shell with
//! `$` (user) or `#` (root) prompts; `sudo` may ask for the password once.

use crate::platform::{Action, DialogDefinition, Exchange, Phase, Stage, Step, TransportKind};
use crate::topology::OsFamily;

const SHELL: &str = r"[$#]\s*$";
const SUDO_PASSWORD: &str = r"\[sudo\] password for [^:]*:\s*$|[Pp]assword:\s*$";

/// Uplink addressing and static routes.
pub fn initial() -> DialogDefinition {
    DialogDefinition::new("linux_host", OsFamily::Linux, Phase::Initial, TransportKind::Shell)
        .with_persist_on_close(false)
        .with_step(Step::new(
            Stage::AddressAssign,
            Action::Confirm {
                exchange: Exchange::new(
                    "sudo ip address add {host_address} dev {host_interface}",
                    [SHELL, SUDO_PASSWORD],
                ),
                question: SUDO_PASSWORD.into(),
                answer: Exchange::new("{password}", [SHELL, SUDO_PASSWORD]).hidden(),
                confirm_stage: None,
            },
        ))
        .with_step(Step::send(
            Stage::LinkUp,
            vec![Exchange::new("sudo ip link set {host_interface} up", [SHELL])],
        ))
        .with_step(Step::new(
            Stage::HostRoutes,
            Action::ForEach {
                collection: "host_routes",
                head: vec![],
                body: vec![Exchange::new("sudo ip route add {subnet} via {host_gateway}", [SHELL])],
                tail: vec![],
            },
        ))
}
