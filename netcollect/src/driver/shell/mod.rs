//! Interactive CLI driver over SSH.
//!
//! `connect` resolves the dialect and prepares the session without any
//! network I/O. The SSH connection and shell channel are opened on the first
//! `execute`, so authentication and reachability failures surface there as
//! execution errors.

mod privilege;
mod session;

pub use privilege::{PrivilegeGraph, Step};
pub use session::ShellSession;

use std::path::PathBuf;
use std::time::Duration;

use log::debug;
use secrecy::{ExposeSecret, SecretString};

use super::{Credentials, DeviceDriver, Target};
use crate::error::{ConnectionError, ExecutionError, Result};
use crate::dialect;
use crate::tls::ConnectOption;
use crate::transport::{HostKeyVerification, SshConfig};

/// Default SSH port.
pub const DEFAULT_PORT: u16 = 22;

/// CLI driver for one dialect.
pub struct ShellDriver {
    dialect: String,
    timeout: Duration,
    host_key_verification: HostKeyVerification,
    known_hosts: Option<PathBuf>,
    session: Option<ShellSession>,
}

impl ShellDriver {
    /// Driver for the named dialect (e.g. `"arista_eos"`).
    ///
    /// The name is only resolved in `connect`, so an unknown dialect fails
    /// there with [`ConnectionError::UnknownDialect`]. See
    /// [`dialect::names`] for the built-in set.
    pub fn new(dialect: impl Into<String>) -> Self {
        Self {
            dialect: dialect.into(),
            timeout: Duration::from_secs(30),
            host_key_verification: HostKeyVerification::default(),
            known_hosts: None,
            session: None,
        }
    }

    /// Set the connect and read timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the host key verification mode.
    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    /// Use this known_hosts file instead of the user's.
    pub fn known_hosts(mut self, path: Option<PathBuf>) -> Self {
        self.known_hosts = path;
        self
    }

    /// Whether `connect` has prepared a session.
    pub fn is_prepared(&self) -> bool {
        self.session.is_some()
    }

    /// Whether the shell channel is open.
    pub fn is_live(&self) -> bool {
        self.session.as_ref().is_some_and(ShellSession::is_live)
    }
}

impl DeviceDriver for ShellDriver {
    type Operation = str;

    async fn connect(
        &mut self,
        target: &Target,
        credentials: &Credentials,
        _options: &[ConnectOption],
    ) -> Result<()> {
        let dialect = dialect::lookup(&self.dialect).ok_or_else(|| ConnectionError::UnknownDialect {
            name: self.dialect.clone(),
        })?;

        let password = SecretString::from(credentials.password().expose_secret());
        let ssh_config = SshConfig::new(target.host.as_str(), credentials.username(), password)
            .port(target.port_or(DEFAULT_PORT))
            .timeout(self.timeout)
            .pty_size(dialect.columns, dialect.rows)
            .host_keys(self.host_key_verification)
            .known_hosts(self.known_hosts.clone());

        debug!("shell: prepared {} session to {}", dialect.name, ssh_config.addr());
        self.session = Some(ShellSession::new(ssh_config, dialect)?);
        Ok(())
    }

    async fn execute(&mut self, command: &str) -> Result<String> {
        let session = self.session.as_mut().ok_or(ExecutionError::NotConnected)?;
        session.open().await?;
        Ok(session.send_command(command).await?)
    }

    async fn close(&mut self) -> Result<()> {
        match self.session.as_mut() {
            Some(session) => Ok(session.close().await?),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn creds() -> Credentials {
        Credentials::new("admin", "admin")
    }

    #[tokio::test]
    async fn test_unknown_dialect_fails_connect() {
        let mut driver = ShellDriver::new("acme_os");
        let err = driver
            .connect(&Target::new("127.0.0.1"), &creds(), &[])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(!driver.is_prepared());
    }

    #[tokio::test]
    async fn test_connect_is_deferred() {
        // Nothing listens on port 1; connect still succeeds
        let mut driver = ShellDriver::new("linux").timeout(Duration::from_secs(2));
        let target = Target::new("127.0.0.1").with_port(Some(1));
        driver.connect(&target, &creds(), &[]).await.unwrap();
        assert!(driver.is_prepared());
        assert!(!driver.is_live());

        let err = driver.execute("uname -a").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Execution);
        assert!(!driver.is_live());

        driver.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_execute_before_connect() {
        let mut driver = ShellDriver::new("linux");
        let err = driver.execute("uname -a").await.unwrap_err();
        assert!(matches!(err, crate::Error::Execution(ExecutionError::NotConnected)));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let mut driver = ShellDriver::new("arista_eos");
        driver.close().await.unwrap();

        driver
            .connect(&Target::new("127.0.0.1"), &creds(), &[])
            .await
            .unwrap();
        driver.close().await.unwrap();
        driver.close().await.unwrap();
    }
}
