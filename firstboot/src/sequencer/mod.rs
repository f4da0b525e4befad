//! Dialog interpreter.
//!
//! A [`Sequencer`] walks a [`DialogDefinition`] step by step over a
//! [`Connector`], one command in flight at a time. The first failure ends
//! the run; nothing is retried except the single confirmation a
//! [`Action::Confirm`] step allows.

mod context;
mod report;

pub use context::{ContextScope, DialogContext, Vars};
pub use report::{DeviceReport, DeviceStatus};

use std::time::Duration;

use log::{debug, info};

use crate::channel::PromptSet;
use crate::error::{Error, Result, UnexpectedPromptError};
use crate::platform::{Action, DialogDefinition, Exchange, Scope, Stage};
use crate::session::{Connector, Response};

/// Shown in place of hidden commands.
const MASK: &str = "********";

/// Knobs for a run.
#[derive(Debug, Clone, Default)]
pub struct SequencerOptions {
    /// Replaces every settle time and paging interval. Zero disables them.
    pub settle: Option<Duration>,
}

impl SequencerOptions {
    /// Options with all settle waits disabled.
    pub fn no_settle() -> Self {
        Self {
            settle: Some(Duration::ZERO),
        }
    }

    fn settle_for(&self, configured: Option<Duration>) -> Option<Duration> {
        let wait = match (configured, self.settle) {
            (Some(_), Some(fixed)) => fixed,
            (Some(d), None) => d,
            (None, _) => return None,
        };
        (!wait.is_zero()).then_some(wait)
    }

    fn interval_for(&self, configured: Duration) -> Duration {
        self.settle.unwrap_or(configured)
    }
}

/// Runs one dialog against one device.
#[derive(Debug)]
pub struct Sequencer<'a> {
    definition: &'a DialogDefinition,
    context: &'a DialogContext,
    options: SequencerOptions,
    stage: Stage,
    history: Vec<Stage>,
    last_output: String,
}

impl<'a> Sequencer<'a> {
    pub fn new(definition: &'a DialogDefinition, context: &'a DialogContext) -> Self {
        Self {
            definition,
            context,
            options: SequencerOptions::default(),
            stage: Stage::Idle,
            history: Vec::new(),
            last_output: String::new(),
        }
    }

    pub fn with_options(mut self, options: SequencerOptions) -> Self {
        self.options = options;
        self
    }

    /// Current stage; the failing stage after an error.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Stages entered so far, in order.
    pub fn history(&self) -> &[Stage] {
        &self.history
    }

    /// Reply to the last exchange, or the partial output of a failed one.
    pub fn last_output(&self) -> &str {
        &self.last_output
    }

    /// Run every step whose guard holds, then enter [`Stage::Done`].
    ///
    /// All templates are rendered up front, so missing topology data fails
    /// before anything is sent.
    pub async fn run<C: Connector>(&mut self, conn: &mut C) -> Result<()> {
        let definition = self.definition;
        let context = self.context;
        definition.check(context)?;

        for step in &definition.steps {
            if !step.when.holds(context) {
                debug!("{}: skipping {}", context.device(), step.stage);
                continue;
            }
            self.enter(step.stage);
            let scope = context.scope();

            match &step.action {
                Action::Send(exchanges) => {
                    for exchange in exchanges {
                        self.exchange(conn, exchange, &scope).await?;
                    }
                }
                Action::DialogSkip {
                    probe,
                    banner,
                    answers,
                } => {
                    let response = self.exchange(conn, probe, &scope).await?;
                    if response.prompt_index == *banner {
                        debug!("{}: leaving setup dialog", context.device());
                        for answer in answers {
                            self.exchange(conn, answer, &scope).await?;
                        }
                    }
                }
                Action::Confirm {
                    exchange,
                    question,
                    answer,
                    confirm_stage,
                } => {
                    let question = PromptSet::single(&question.render_pattern(&scope)?)?;
                    let response = self.exchange(conn, exchange, &scope).await?;
                    if question.is_match(response.reply.as_bytes()) {
                        if let Some(stage) = confirm_stage {
                            self.enter(*stage);
                        }
                        let reply = self.exchange(conn, answer, &scope).await?;
                        if question.is_match(reply.reply.as_bytes()) {
                            return Err(UnexpectedPromptError {
                                stage: self.stage,
                                command: shown(answer, &reply.command),
                                prompt: reply.prompt,
                                output: reply.reply,
                            }
                            .into());
                        }
                    }
                }
                Action::Page {
                    trigger,
                    key,
                    presses,
                    interval,
                    done,
                } => {
                    self.exchange(conn, trigger, &scope).await?;
                    let interval = self.options.interval_for(*interval);
                    for _ in 0..*presses {
                        conn.write_raw(key).await?;
                        if !interval.is_zero() {
                            tokio::time::sleep(interval).await;
                        }
                    }
                    let done = PromptSet::single(&done.render_pattern(&scope)?)?;
                    let response = self.capture(conn.expect(&done, None).await)?;
                    self.last_output = response.reply;
                }
                Action::ForEach {
                    collection,
                    head,
                    body,
                    tail,
                } => {
                    for exchange in head {
                        self.exchange(conn, exchange, &scope).await?;
                    }
                    for item in context.collection(collection) {
                        let item_scope = context.scope_with(item);
                        for exchange in body {
                            self.exchange(conn, exchange, &item_scope).await?;
                        }
                    }
                    for exchange in tail {
                        self.exchange(conn, exchange, &scope).await?;
                    }
                }
            }
        }

        self.enter(Stage::Done);
        info!("{}: {} complete", context.device(), definition.name);
        Ok(())
    }

    async fn exchange<C: Connector>(
        &mut self,
        conn: &mut C,
        exchange: &Exchange,
        scope: &(dyn Scope + Sync),
    ) -> Result<Response> {
        let command = exchange.command.render(scope)?;
        let patterns = exchange
            .prompts
            .iter()
            .map(|p| p.render_pattern(scope))
            .collect::<Result<Vec<_>>>()?;
        let prompts = PromptSet::new(&patterns)?;

        debug!(
            "{}: [{}] {:?} expecting {:?}",
            self.context.device(),
            self.stage,
            shown(exchange, &command),
            patterns
        );

        let result = conn.execute(&command, &prompts, exchange.timeout).await;
        let mut response = self.capture(result)?;
        if exchange.hidden {
            response.command = MASK.to_string();
        }
        self.last_output = response.reply.clone();

        if let Some(wait) = self.options.settle_for(exchange.settle) {
            tokio::time::sleep(wait).await;
        }
        Ok(response)
    }

    /// Keep the partial output of a failed exchange.
    fn capture(&mut self, result: Result<Response>) -> Result<Response> {
        result.inspect_err(|e: &Error| {
            if let Some(partial) = e.partial_output() {
                self.last_output = partial.to_string();
            }
        })
    }

    fn enter(&mut self, stage: Stage) {
        info!("{}: {} -> {}", self.context.device(), self.stage, stage);
        self.stage = stage;
        self.history.push(stage);
    }
}

fn shown(exchange: &Exchange, command: &str) -> String {
    if exchange.hidden {
        MASK.to_string()
    } else {
        command.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Framing;
    use crate::platform::{Phase, Step, TransportKind, vendors};
    use crate::session::Session;
    use crate::testing::{ScriptedTransport, test_config};
    use crate::topology::{
        Credential, DEFAULT_GROUP, Device, DhcpPool, ENABLE_GROUP, Endpoint, HostNetworkConfig,
        Interface, IpHelper, OsFamily, Route, Topology,
    };

    fn ios_router() -> DialogContext {
        let mut topo = Topology::new();
        let mut r1 = Device::new("R1", OsFamily::Ios)
            .with_platform("iou")
            .with_interface(
                Interface::new("Gi0/0")
                    .with_alias("initial")
                    .with_ipv4("10.0.0.2/24".parse().unwrap()),
            );
        r1.credentials.insert(DEFAULT_GROUP, Credential::new("admin", "Admin123"));
        r1.credentials.insert("enable", Credential::password_only("enablepa55"));
        r1.custom.gateway = Some(Route {
            dest: "192.168.11.0".parse().unwrap(),
            mask: "255.255.255.0".parse().unwrap(),
            next_hop: "10.0.0.1".parse().unwrap(),
        });
        let r1 = topo.add_device(r1).unwrap();
        let sw = topo
            .add_device(
                Device::new("SW", OsFamily::Ios)
                    .with_interface(Interface::new("e0").with_ipv4("10.0.0.1/24".parse().unwrap())),
            )
            .unwrap();
        topo.connect("l1", (r1, "Gi0/0"), (sw, "e0")).unwrap();
        DialogContext::from_topology(&topo, r1, None).unwrap()
    }

    fn console(transport: ScriptedTransport) -> Session<ScriptedTransport> {
        Session::new(transport, Framing::Line, test_config(), "R1")
    }

    /// `dialog` reduced to the steps for `keep`, guards intact.
    fn only(mut dialog: DialogDefinition, keep: &[Stage]) -> DialogDefinition {
        dialog.steps.retain(|s| keep.contains(&s.stage));
        dialog
    }

    fn shell(transport: ScriptedTransport) -> Session<ScriptedTransport> {
        Session::new(transport, Framing::Stream, test_config(), "R1")
    }

    /// R1 with its initial interface on a link to SW, plus a LAN interface.
    fn routed_lab(r1: Device) -> (Topology, crate::topology::DeviceId) {
        let mut topo = Topology::new();
        let r1 = r1
            .with_interface(
                Interface::new("Gi0/0")
                    .with_alias("initial")
                    .with_ipv4("10.0.0.2/24".parse().unwrap()),
            )
            .with_interface(
                Interface::new("Gi0/1")
                    .with_alias("lan")
                    .with_ipv4("172.16.1.1/24".parse().unwrap()),
            );
        let r1 = topo.add_device(r1).unwrap();
        let sw = topo
            .add_device(
                Device::new("SW", OsFamily::Ios)
                    .with_interface(Interface::new("e0").with_ipv4("10.0.0.1/24".parse().unwrap())),
            )
            .unwrap();
        topo.connect("l1", (r1, "Gi0/0"), (sw, "e0")).unwrap();
        (topo, r1)
    }

    /// A router carrying one DHCP pool and an enable password.
    fn dhcp_router(os: OsFamily, platform: &str) -> DialogContext {
        let mut topo = Topology::new();
        let mut r1 = Device::new("R1", os).with_platform(platform);
        r1.credentials.insert(ENABLE_GROUP, Credential::password_only("enablepa55"));
        r1.custom.dhcp.push(DhcpPool {
            excluded: ["10.1.1.1".parse().unwrap(), "10.1.1.10".parse().unwrap()],
            network: "10.1.1.0".parse().unwrap(),
            mask: "255.255.255.0".parse().unwrap(),
            default_router: "10.1.1.1".parse().unwrap(),
            dns_server: "8.8.8.8".parse().unwrap(),
            name: None,
        });
        let r1 = topo.add_device(r1).unwrap();
        DialogContext::from_topology(&topo, r1, None).unwrap()
    }

    const DHCP_REPLIES: [&str; 5] = [
        "ip dhcp excluded-address 10.1.1.1 10.1.1.10\r\nR1(config)#",
        "ip dhcp pool POOL_10_1_1_0\r\nR1(dhcp-config)#",
        "network 10.1.1.0 255.255.255.0\r\nR1(dhcp-config)#",
        "default-router 10.1.1.1\r\nR1(dhcp-config)#",
        "dns-server 8.8.8.8\r\nR1(dhcp-config)#",
    ];

    const DHCP_COMMANDS: [&str; 5] = [
        "ip dhcp excluded-address 10.1.1.1 10.1.1.10",
        "ip dhcp pool POOL_10_1_1_0",
        "network 10.1.1.0 255.255.255.0",
        "default-router 10.1.1.1",
        "dns-server 8.8.8.8",
    ];

    /// A dialog holding only the key generation step.
    fn keygen_dialog() -> DialogDefinition {
        let full = vendors::cisco::initial(OsFamily::Iosxe);
        let mut dialog = DialogDefinition::new("keygen", OsFamily::Iosxe, Phase::Initial, TransportKind::Telnet);
        dialog.steps = full
            .steps
            .into_iter()
            .filter(|s| s.stage == Stage::CryptoKeygen)
            .collect();
        dialog
    }

    #[tokio::test]
    async fn test_ios_bring_up_end_to_end() {
        let ctx = ios_router();
        let dialog = vendors::cisco::initial(OsFamily::Ios);
        let transport = ScriptedTransport::new().replies([
            "\r\nRouter>",
            "en\r\nRouter#",
            "conf t\r\nRouter(config)#",
            "int Gi0/0\r\nRouter(config-if)#",
            "ip add 10.0.0.2 255.255.255.0\r\nRouter(config-if)#",
            "no shut\r\nRouter(config-if)#",
            "exit\r\nRouter(config)#",
            "ip route 192.168.11.0 255.255.255.0 10.0.0.1\r\nRouter(config)#",
            "hostname R1\r\nR1(config)#",
            "ip domain name localdomain\r\nR1(config)#",
            "crypto key generate rsa modulus 2048\r\n% Generating 2048 bit RSA keys ...[OK]\r\nR1(config)#",
            "username admin privilege 15 secret Admin123\r\nR1(config)#",
            "line vty 0 4\r\nR1(config-line)#",
            "transport input ssh\r\nR1(config-line)#",
            "login local\r\nR1(config-line)#",
            "exit\r\nR1(config)#",
            "ip ssh version 2\r\nR1(config)#",
            "ip scp server enable\r\nR1(config)#",
            "end\r\nR1#",
            "write memory\r\nBuilding configuration...\r\n[OK]\r\nR1#",
            "\r\nR1#",
        ]);
        let log = transport.log();
        let mut session = console(transport);

        let mut sequencer = Sequencer::new(&dialog, &ctx).with_options(SequencerOptions::no_settle());
        sequencer.run(&mut session).await.unwrap();

        assert_eq!(sequencer.stage(), Stage::Done);
        assert_eq!(
            log.commands(),
            vec![
                "",
                "en",
                "conf t",
                "int Gi0/0",
                "ip add 10.0.0.2 255.255.255.0",
                "no shut",
                "exit",
                "ip route 192.168.11.0 255.255.255.0 10.0.0.1",
                "hostname R1",
                "ip domain name localdomain",
                "crypto key generate rsa modulus 2048",
                "username admin privilege 15 secret Admin123",
                "line vty 0 4",
                "transport input ssh",
                "login local",
                "exit",
                "ip ssh version 2",
                "ip scp server enable",
                "end",
                "write memory",
                "",
            ]
        );
        assert_eq!(
            sequencer.history(),
            &[
                Stage::AwaitDialogSkip,
                Stage::PrivExec,
                Stage::GlobalConfig,
                Stage::InterfaceConfig,
                Stage::RouteConfig,
                Stage::HostnameSet,
                Stage::DomainSet,
                Stage::CryptoKeygen,
                Stage::LocalUser,
                Stage::VtyLogin,
                Stage::SshEnable,
                Stage::ScpEnable,
                Stage::Save,
                Stage::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_setup_dialog_is_skipped() {
        let mut ctx = DialogContext::new("R1");
        ctx.set_var("hostname", "R1");
        let dialog = DialogDefinition::new("skip", OsFamily::Ios, Phase::Initial, TransportKind::Telnet)
            .with_step(vendors::cisco::initial(OsFamily::Ios).steps.remove(0));
        let transport = ScriptedTransport::new().replies([
            "\r\nWould you like to enter the initial configuration dialog? [yes/no]: ",
            "no\r\nWould you like to terminate autoinstall? [yes/no]: ",
            "yes\r\nPress RETURN to get started!",
            "\r\nRouter>",
        ]);
        let log = transport.log();
        let mut session = console(transport);

        Sequencer::new(&dialog, &ctx).run(&mut session).await.unwrap();
        assert_eq!(log.commands(), vec!["", "no", "yes", ""]);
    }

    #[tokio::test]
    async fn test_crypto_replace_answered_once() {
        let ctx = DialogContext::new("R1");
        let dialog = keygen_dialog();
        let transport = ScriptedTransport::new().replies([
            "crypto key generate rsa modulus 2048\r\n% You already have RSA keys defined named R1.localdomain.\r\n% Do you really want to replace them? [yes/no]: ",
            "yes\r\nR1(config)#",
        ]);
        let log = transport.log();
        let mut session = console(transport);

        let mut sequencer = Sequencer::new(&dialog, &ctx).with_options(SequencerOptions::no_settle());
        sequencer.run(&mut session).await.unwrap();

        let yes = log.commands().iter().filter(|c| *c == "yes").count();
        assert_eq!(yes, 1);
        assert!(sequencer.history().contains(&Stage::CryptoReplaceConfirm));
    }

    #[tokio::test]
    async fn test_crypto_without_existing_keys_sends_no_yes() {
        let ctx = DialogContext::new("R1");
        let dialog = keygen_dialog();
        let transport = ScriptedTransport::new()
            .reply("crypto key generate rsa modulus 2048\r\n% Generating 2048 bit RSA keys ...[OK]\r\nR1(config)#");
        let log = transport.log();
        let mut session = console(transport);

        let mut sequencer = Sequencer::new(&dialog, &ctx).with_options(SequencerOptions::no_settle());
        sequencer.run(&mut session).await.unwrap();

        assert_eq!(log.commands(), vec!["crypto key generate rsa modulus 2048"]);
        assert!(!sequencer.history().contains(&Stage::CryptoReplaceConfirm));
    }

    #[tokio::test]
    async fn test_repeated_replace_question_is_unexpected() {
        let ctx = DialogContext::new("R1");
        let dialog = keygen_dialog();
        let transport = ScriptedTransport::new().replies([
            "crypto key generate rsa modulus 2048\r\n% Do you really want to replace them? [yes/no]: ",
            "yes\r\n% Do you really want to replace them? [yes/no]: ",
        ]);
        let mut session = console(transport);

        let mut sequencer = Sequencer::new(&dialog, &ctx).with_options(SequencerOptions::no_settle());
        let err = sequencer.run(&mut session).await.unwrap_err();

        match err {
            Error::UnexpectedPrompt(e) => {
                assert_eq!(e.stage, Stage::CryptoReplaceConfirm);
                assert_eq!(e.command, "yes");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ftd_eula_paging() {
        let mut ctx = DialogContext::new("FTD1");
        ctx.set_var("hostname", "FTD1");
        let full = vendors::ftd::initial();
        let mut dialog = DialogDefinition::new("eula", OsFamily::Ftd, Phase::Initial, TransportKind::Telnet);
        dialog.steps = full
            .steps
            .into_iter()
            .filter(|s| s.stage == Stage::EulaAccept)
            .collect();

        let mut replies = vec!["\r\nEnd User License Agreement\r\n--MORE--".to_string()];
        replies.extend((0..14).map(|i| format!("\r\npage {i}\r\n--MORE--")));
        replies.push("\r\nPlease enter 'YES' or press <ENTER> to AGREE to the EULA: ".to_string());
        let transport = ScriptedTransport::new().replies(replies);
        let log = transport.log();
        let mut session = console(transport);

        let mut sequencer = Sequencer::new(&dialog, &ctx).with_options(SequencerOptions::no_settle());
        sequencer.run(&mut session).await.unwrap();

        let raw = log.raw();
        assert_eq!(raw.len(), 16);
        assert!(raw[1..].iter().all(|w| w == b" "));
        assert!(sequencer.last_output().contains("AGREE to the EULA:"));
    }

    #[tokio::test]
    async fn test_timeout_keeps_partial_output_and_stage() {
        let ctx = ios_router();
        let dialog = vendors::cisco::initial(OsFamily::Ios);
        let transport = ScriptedTransport::new()
            .replies(["\r\nRouter>", "en\r\n% Bad secrets\r\n"]);
        let mut config = test_config();
        config.timeout = Duration::from_millis(50);
        let mut session = Session::new(transport, Framing::Line, config, "R1");

        let mut sequencer = Sequencer::new(&dialog, &ctx);
        let err = sequencer.run(&mut session).await.unwrap_err();

        assert!(matches!(err, Error::Timeout(_)));
        assert_eq!(sequencer.stage(), Stage::PrivExec);
        assert!(sequencer.last_output().contains("Bad secrets"));
    }

    #[tokio::test]
    async fn test_missing_data_fails_before_sending() {
        let ctx = DialogContext::new("R1");
        let dialog = DialogDefinition::new("t", OsFamily::Ios, Phase::Initial, TransportKind::Telnet)
            .with_step(Step::send(Stage::HostnameSet, vec![Exchange::new("hostname {hostname}", ["#"])]));
        let transport = ScriptedTransport::new();
        let log = transport.log();
        let mut session = console(transport);

        let err = Sequencer::new(&dialog, &ctx).run(&mut session).await.unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(log.raw().is_empty());
    }

    #[tokio::test]
    async fn test_ospf_advertises_every_network_without_gateway() {
        let (topo, r1) = routed_lab(Device::new("R1", OsFamily::Ios));
        let ctx = DialogContext::from_topology(&topo, r1, None).unwrap();
        let dialog = only(
            vendors::cisco::initial(OsFamily::Ios),
            &[Stage::RouteConfig, Stage::OspfNetwork],
        );
        let transport = ScriptedTransport::new().replies([
            "router ospf 1\r\nR1(config-router)#",
            "network 10.0.0.0 0.0.0.255 area 0\r\nR1(config-router)#",
            "network 172.16.1.0 0.0.0.255 area 0\r\nR1(config-router)#",
            "exit\r\nR1(config)#",
        ]);
        let log = transport.log();
        let mut session = console(transport);

        let mut sequencer = Sequencer::new(&dialog, &ctx);
        sequencer.run(&mut session).await.unwrap();

        assert_eq!(
            log.commands(),
            vec![
                "router ospf 1",
                "network 10.0.0.0 0.0.0.255 area 0",
                "network 172.16.1.0 0.0.0.255 area 0",
                "exit",
            ]
        );
        assert_eq!(sequencer.history(), &[Stage::OspfNetwork, Stage::Done]);
    }

    #[tokio::test]
    async fn test_gateway_route_replaces_ospf() {
        let ctx = ios_router();
        let dialog = only(
            vendors::cisco::initial(OsFamily::Ios),
            &[Stage::RouteConfig, Stage::OspfNetwork],
        );
        let transport = ScriptedTransport::new()
            .reply("ip route 192.168.11.0 255.255.255.0 10.0.0.1\r\nR1(config)#");
        let log = transport.log();
        let mut session = console(transport);

        let mut sequencer = Sequencer::new(&dialog, &ctx);
        sequencer.run(&mut session).await.unwrap();

        assert_eq!(log.commands(), vec!["ip route 192.168.11.0 255.255.255.0 10.0.0.1"]);
        assert_eq!(sequencer.history(), &[Stage::RouteConfig, Stage::Done]);
    }

    #[tokio::test]
    async fn test_iosv_sets_enable_secret_then_dhcp_pools() {
        let ctx = dhcp_router(OsFamily::Ios, "iosv");
        let dialog = only(
            vendors::cisco::initial(OsFamily::Ios),
            &[Stage::EnableSecret, Stage::DhcpPools],
        );
        let mut replies = vec!["enable secret enablepa55\r\nR1(config)#"];
        replies.extend(DHCP_REPLIES);
        let transport = ScriptedTransport::new().replies(replies);
        let log = transport.log();
        let mut session = console(transport);

        let mut sequencer = Sequencer::new(&dialog, &ctx);
        sequencer.run(&mut session).await.unwrap();

        let mut expected = vec!["enable secret enablepa55"];
        expected.extend(DHCP_COMMANDS);
        assert_eq!(log.commands(), expected);
        assert_eq!(
            sequencer.history(),
            &[Stage::EnableSecret, Stage::DhcpPools, Stage::Done]
        );
    }

    #[tokio::test]
    async fn test_csr_skips_enable_secret() {
        let ctx = dhcp_router(OsFamily::Iosxe, "csr1000v");
        let dialog = only(
            vendors::cisco::initial(OsFamily::Iosxe),
            &[Stage::EnableSecret, Stage::DhcpPools],
        );
        let transport = ScriptedTransport::new().replies(DHCP_REPLIES);
        let log = transport.log();
        let mut session = console(transport);

        let mut sequencer = Sequencer::new(&dialog, &ctx);
        sequencer.run(&mut session).await.unwrap();

        assert_eq!(log.commands(), DHCP_COMMANDS.to_vec());
        assert!(!sequencer.history().contains(&Stage::EnableSecret));
    }

    #[tokio::test]
    async fn test_provision_over_shell() {
        let mut r1 = Device::new("R1", OsFamily::Iosxe);
        r1.custom.ip_helper = Some(IpHelper {
            ip: "10.9.9.9".parse().unwrap(),
            next_hop: "lan".into(),
        });
        r1.custom.static_routes.push(Route {
            dest: "172.20.0.0".parse().unwrap(),
            mask: "255.255.0.0".parse().unwrap(),
            next_hop: "172.16.1.2".parse().unwrap(),
        });
        r1.connections.rest = Some(Endpoint::new("10.0.0.2", 443));
        let (topo, r1) = routed_lab(r1);
        let ctx = DialogContext::from_topology(&topo, r1, None).unwrap();
        let dialog = vendors::cisco::provision(OsFamily::Iosxe);

        let transport = ScriptedTransport::new().replies([
            "configure terminal\r\nR1(config)#",
            "interface Gi0/1\r\nR1(config-if)#",
            "ip address 172.16.1.1 255.255.255.0\r\nR1(config-if)#",
            "no shutdown\r\nR1(config-if)#",
            "exit\r\nR1(config)#",
            "interface Gi0/1\r\nR1(config-if)#",
            "ip helper-address 10.9.9.9\r\nR1(config-if)#",
            "exit\r\nR1(config)#",
            "ip route 172.20.0.0 255.255.0.0 172.16.1.2\r\nR1(config)#",
            "ip http secure-server\r\nR1(config)#",
            "restconf\r\nR1(config)#",
            "end\r\nR1#",
        ]);
        let log = transport.log();
        let mut session = shell(transport);

        let mut sequencer = Sequencer::new(&dialog, &ctx);
        sequencer.run(&mut session).await.unwrap();

        assert_eq!(
            log.commands(),
            vec![
                "configure terminal",
                "interface Gi0/1",
                "ip address 172.16.1.1 255.255.255.0",
                "no shutdown",
                "exit",
                "interface Gi0/1",
                "ip helper-address 10.9.9.9",
                "exit",
                "ip route 172.20.0.0 255.255.0.0 172.16.1.2",
                "ip http secure-server",
                "restconf",
                "end",
            ]
        );
        // declared static routes take the place of OSPF
        assert_eq!(
            sequencer.history(),
            &[
                Stage::GlobalConfig,
                Stage::InterfaceConfig,
                Stage::IpHelper,
                Stage::RouteConfig,
                Stage::RestconfEnable,
                Stage::ExitConfig,
                Stage::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_linux_host_answers_sudo_and_adds_routes() {
        let mut topo = Topology::new();
        let mut host = Device::new("UbuntuServer", OsFamily::Linux);
        host.credentials.insert(DEFAULT_GROUP, Credential::new("admin", "Admin123"));
        host.custom.network_config = Some(HostNetworkConfig {
            interface: "ens4".into(),
            ip: "192.168.11.10/24".parse().unwrap(),
            gateway: "192.168.11.1".parse().unwrap(),
            routes: [
                ("route-1".to_string(), "10.1.1.0/24".parse().unwrap()),
                ("route-2".to_string(), "10.2.2.0/24".parse().unwrap()),
            ]
            .into_iter()
            .collect(),
        });
        let host = topo.add_device(host).unwrap();
        let ctx = DialogContext::from_topology(&topo, host, None).unwrap();
        let dialog = vendors::linux::initial();

        let transport = ScriptedTransport::new().replies([
            "sudo ip address add 192.168.11.10/24 dev ens4\r\n[sudo] password for admin: ",
            "\r\nadmin@ubuntu:~$ ",
            "sudo ip link set ens4 up\r\nadmin@ubuntu:~$ ",
            "sudo ip route add 10.1.1.0/24 via 192.168.11.1\r\nadmin@ubuntu:~$ ",
            "sudo ip route add 10.2.2.0/24 via 192.168.11.1\r\nadmin@ubuntu:~$ ",
        ]);
        let log = transport.log();
        let mut session = shell(transport);

        let mut sequencer = Sequencer::new(&dialog, &ctx);
        sequencer.run(&mut session).await.unwrap();

        assert_eq!(
            log.commands(),
            vec![
                "sudo ip address add 192.168.11.10/24 dev ens4",
                "Admin123",
                "sudo ip link set ens4 up",
                "sudo ip route add 10.1.1.0/24 via 192.168.11.1",
                "sudo ip route add 10.2.2.0/24 via 192.168.11.1",
            ]
        );
        assert_eq!(
            sequencer.history(),
            &[Stage::AddressAssign, Stage::LinkUp, Stage::HostRoutes, Stage::Done]
        );
    }

    #[tokio::test]
    async fn test_ftd_without_dns_answers_none() {
        let mut topo = Topology::new();
        let ftd = topo.add_device(Device::new("FTD1", OsFamily::Ftd)).unwrap();
        let ctx = DialogContext::from_topology(&topo, ftd, None).unwrap();
        let dialog = only(
            vendors::ftd::initial(),
            &[Stage::HostnameSet, Stage::DnsSet, Stage::SearchDomains],
        );
        let transport = ScriptedTransport::new().replies([
            "FTD1\r\nEnter a comma-separated list of DNS severs or 'none' [200.67.222.222,208.67.220.220]:",
            "none\r\nEnter a comma-separated list of search domains or 'none' []:",
            "none\r\nManage the device locally? (yes/no) [yes]:",
        ]);
        let log = transport.log();
        let mut session = console(transport);

        let mut sequencer = Sequencer::new(&dialog, &ctx);
        sequencer.run(&mut session).await.unwrap();

        assert_eq!(log.commands(), vec!["FTD1", "none", "none"]);
        assert_eq!(sequencer.stage(), Stage::Done);
    }

    #[test]
    fn test_settle_override() {
        let options = SequencerOptions::no_settle();
        assert_eq!(options.settle_for(Some(Duration::from_secs(5))), None);
        assert_eq!(options.settle_for(None), None);

        let defaults = SequencerOptions::default();
        assert_eq!(
            defaults.settle_for(Some(Duration::from_secs(5))),
            Some(Duration::from_secs(5))
        );
        assert_eq!(defaults.interval_for(Duration::from_millis(500)), Duration::from_millis(500));
    }
}
