//! NETCONF driver.
//!
//! Unlike the CLI driver the session is established eagerly in `connect`.

use std::path::PathBuf;
use std::time::Duration;

use log::{debug, info};
use secrecy::{ExposeSecret, SecretString};

use super::{Credentials, DeviceDriver, Target};
use crate::error::{ExecutionError, Result, ValidationError};
use crate::netconf::NetconfSession;
use crate::tls::ConnectOption;
use crate::transport::{HostKeyVerification, SshConfig};

/// Default NETCONF-over-SSH port.
pub const DEFAULT_PORT: u16 = 830;

/// NETCONF driver.
pub struct NetconfDriver {
    timeout: Duration,
    host_key_verification: HostKeyVerification,
    known_hosts: Option<PathBuf>,
    session: Option<NetconfSession>,
}

impl Default for NetconfDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl NetconfDriver {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            host_key_verification: HostKeyVerification::default(),
            known_hosts: None,
            session: None,
        }
    }

    /// Set the connect and reply timeout.
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

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }
}

impl DeviceDriver for NetconfDriver {
    type Operation = str;

    async fn connect(
        &mut self,
        target: &Target,
        credentials: &Credentials,
        _options: &[ConnectOption],
    ) -> Result<()> {
        let password = SecretString::from(credentials.password().expose_secret());
        let config = SshConfig::new(target.host.as_str(), credentials.username(), password)
            .port(target.port_or(DEFAULT_PORT))
            .timeout(self.timeout)
            .host_keys(self.host_key_verification)
            .known_hosts(self.known_hosts.clone());

        self.session = Some(NetconfSession::open(&config).await?);
        Ok(())
    }

    /// Send `rpc` (the body inside `<rpc>`) and return the raw reply XML.
    ///
    /// Message ids start at 101 and increase per call. A reply holding an
    /// `<rpc-error>` fails with [`ExecutionError::RpcFailed`] carrying the
    /// server's error message.
    async fn execute(&mut self, rpc: &str) -> Result<String> {
        let session = self.session.as_mut().ok_or(ExecutionError::NotConnected)?;
        if rpc.trim().is_empty() {
            return Err(ValidationError::EmptyOperation.into());
        }
        Ok(session.rpc(rpc).await?)
    }

    async fn close(&mut self) -> Result<()> {
        let Some(session) = self.session.take() else {
            debug!("netconf: no session, skipping close");
            return Ok(());
        };
        session.close().await?;
        info!("netconf: session closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn test_connect_failure_is_connection_error() {
        let mut driver = NetconfDriver::new().timeout(Duration::from_secs(2));
        let target = Target::new("127.0.0.1").with_port(Some(1));
        let err = driver
            .connect(&target, &Credentials::new("admin", "admin"), &[])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(!driver.is_connected());
    }

    #[tokio::test]
    async fn test_execute_before_connect() {
        let mut driver = NetconfDriver::new();
        let err = driver.execute("<get/>").await.unwrap_err();
        assert!(matches!(err, crate::Error::Execution(ExecutionError::NotConnected)));
    }

    #[tokio::test]
    async fn test_close_without_session() {
        let mut driver = NetconfDriver::new();
        driver.close().await.unwrap();
        driver.close().await.unwrap();
    }
}
