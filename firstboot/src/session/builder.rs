//! Builder for opening sessions.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use super::Session;
use crate::channel::Framing;
use crate::error::{ConfigurationError, Result};
use crate::topology::Endpoint;
use crate::transport::{
    AuthMethod, HostKeyVerification, SshConfig, SshTransport, TelnetConfig, TelnetTransport,
};

/// Settings shared by every session kind.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Default per-command timeout.
    pub timeout: Duration,

    /// Transport connect timeout.
    pub connect_timeout: Duration,

    /// Silence that ends the banner drain after an SSH login.
    pub banner_quiet: Duration,

    /// Wait after the persist command before closing.
    pub close_settle: Duration,

    /// Send the persist command on disconnect.
    pub persist_on_close: bool,

    /// Size of each socket read.
    pub read_size: usize,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(10),
            banner_quiet: Duration::from_millis(500),
            close_settle: Duration::from_secs(3),
            persist_on_close: false,
            read_size: 4096,
            terminal_width: 511,
            terminal_height: 24,
        }
    }
}

/// Builder for telnet and SSH shell sessions.
///
/// # Example
///
/// ```rust,no_run
/// use firstboot::session::{Connector, SessionBuilder};
/// use firstboot::channel::PromptSet;
///
/// # async fn example() -> Result<(), firstboot::Error> {
/// let mut session = SessionBuilder::new()
///     .host("192.168.0.100")
///     .port(5001)
///     .telnet()
///     .await?;
///
/// let prompt = PromptSet::single(r"[>#]")?;
/// let response = session.execute("", &prompt, None).await?;
/// println!("{}", response.prompt);
/// session.disconnect().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct SessionBuilder {
    name: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<SecretString>,
    persist_on_close: Option<bool>,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    config: SessionConfig,
}

impl SessionBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a topology endpoint; absent fields stay unset.
    pub fn for_endpoint(endpoint: &Endpoint) -> Self {
        Self {
            host: endpoint.host.clone(),
            port: endpoint.port,
            ..Self::default()
        }
    }

    /// Device name used in errors and log lines.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the target host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the target port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the username for SSH authentication.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the password for SSH authentication.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(SecretString::from(password.into()));
        self
    }

    /// Set the password from an existing secret.
    pub fn password_secret(mut self, password: SecretString) -> Self {
        self.password = Some(password);
        self
    }

    /// Set the default per-command timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the transport connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the banner quiet period.
    pub fn banner_quiet(mut self, quiet: Duration) -> Self {
        self.config.banner_quiet = quiet;
        self
    }

    /// Set the wait after the persist command.
    pub fn close_settle(mut self, settle: Duration) -> Self {
        self.config.close_settle = settle;
        self
    }

    /// Send the persist command on disconnect. Defaults to on for SSH
    /// shells and off for telnet.
    pub fn persist_on_close(mut self, persist: bool) -> Self {
        self.persist_on_close = Some(persist);
        self
    }

    /// Set terminal dimensions.
    pub fn terminal_size(mut self, width: u32, height: u32) -> Self {
        self.config.terminal_width = width;
        self.config.terminal_height = height;
        self
    }

    /// Set host key verification mode.
    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    /// Use a specific known_hosts file.
    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    /// Validate and produce the telnet transport settings.
    pub fn telnet_config(&self) -> Result<TelnetConfig> {
        Ok(TelnetConfig {
            host: self.require(&self.host, "host")?,
            port: self.require(&self.port, "port")?,
            timeout: self.config.connect_timeout,
            read_size: self.config.read_size,
        })
    }

    /// Validate and produce the SSH transport settings.
    pub fn ssh_config(&self) -> Result<SshConfig> {
        Ok(SshConfig {
            host: self.require(&self.host, "host")?,
            port: self.require(&self.port, "port")?,
            username: self.require(&self.username, "username")?,
            auth: AuthMethod::Password(self.require(&self.password, "password")?),
            timeout: self.config.connect_timeout,
            terminal_width: self.config.terminal_width,
            terminal_height: self.config.terminal_height,
            host_key_verification: self.host_key_verification.clone(),
            known_hosts_path: self.known_hosts_path.clone(),
        })
    }

    /// Connect a telnet console session.
    pub async fn telnet(self) -> Result<Session<TelnetTransport>> {
        let telnet = self.telnet_config()?;
        let transport = TelnetTransport::connect(&telnet).await?;

        let mut config = self.config;
        config.persist_on_close = self.persist_on_close.unwrap_or(false);
        let peer = self.name.unwrap_or_else(|| telnet.socket_addr());

        Ok(Session::new(transport, Framing::Line, config, peer))
    }

    /// Connect an SSH shell session and drain the login banner.
    pub async fn shell(self) -> Result<Session<SshTransport>> {
        let ssh = self.ssh_config()?;
        let peer = self.name.unwrap_or_else(|| ssh.socket_addr());
        let transport = SshTransport::connect(ssh).await?;

        let mut config = self.config;
        config.persist_on_close = self.persist_on_close.unwrap_or(true);

        let mut session = Session::new(transport, Framing::Stream, config, peer);
        session.drain_banner().await?;
        Ok(session)
    }

    fn require<T: Clone>(&self, value: &Option<T>, field: &str) -> Result<T> {
        value.clone().ok_or_else(|| {
            ConfigurationError::MissingField {
                device: self
                    .name
                    .clone()
                    .or_else(|| self.host.clone())
                    .unwrap_or_else(|| "<session>".to_string()),
                field: field.to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use secrecy::ExposeSecret;

    #[test]
    fn test_telnet_requires_port() {
        let err = SessionBuilder::new()
            .name("R1")
            .host("192.168.0.100")
            .telnet_config()
            .unwrap_err();

        match err {
            Error::Configuration(ConfigurationError::MissingField { device, field }) => {
                assert_eq!(device, "R1");
                assert_eq!(field, "port");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_shell_requires_credentials() {
        let builder = SessionBuilder::new().host("10.0.0.2").port(22).username("admin");
        assert!(matches!(
            builder.ssh_config(),
            Err(Error::Configuration(ConfigurationError::MissingField { ref field, .. })) if field == "password"
        ));
    }

    #[test]
    fn test_ssh_config_from_endpoint() {
        let endpoint = Endpoint::new("10.0.0.2", 22);
        let config = SessionBuilder::for_endpoint(&endpoint)
            .username("admin")
            .password("Admin123")
            .ssh_config()
            .unwrap();

        assert_eq!(config.socket_addr(), "10.0.0.2:22");
        assert!(matches!(config.host_key_verification, HostKeyVerification::Disabled));
        match config.auth {
            AuthMethod::Password(p) => assert_eq!(p.expose_secret(), "Admin123"),
            AuthMethod::None => panic!("expected password auth"),
        }
    }

    #[tokio::test]
    async fn test_missing_host_fails_before_connecting() {
        let err = SessionBuilder::new().port(23).telnet().await.err().unwrap();
        assert!(matches!(
            err,
            Error::Configuration(ConfigurationError::MissingField { .. })
        ));
    }
}
