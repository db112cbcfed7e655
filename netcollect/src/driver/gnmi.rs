//! gNMI driver.

use std::time::Duration;

use log::debug;
use secrecy::ExposeSecret;

use super::{Credentials, DeviceDriver, Target};
use crate::error::{ExecutionError, Result};
use crate::gnmi::proto::{DataType, Encoding, GetRequest};
use crate::gnmi::{self, ClientConfig, GnmiClient};
use crate::tls::{ConnectOption, SupportsTls, TlsConfig, TlsScope, apply_options};

/// gNMI driver.
///
/// `connect` establishes the gRPC channel before returning. The
/// skip-TLS option selects a plaintext channel.
pub struct GnmiDriver {
    timeout: Duration,
    tls: TlsConfig,
    client: Option<GnmiClient>,
}

impl Default for GnmiDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl GnmiDriver {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            tls: TlsConfig::default(),
            client: None,
        }
    }

    /// Set the connect and RPC timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn tls_config(&self) -> TlsConfig {
        self.tls
    }
}

impl SupportsTls for GnmiDriver {
    fn tls_scope(&self) -> TlsScope {
        TlsScope::TransportAndTrust
    }

    fn tls_config_mut(&mut self) -> &mut TlsConfig {
        &mut self.tls
    }
}

impl DeviceDriver for GnmiDriver {
    type Operation = str;

    async fn connect(
        &mut self,
        target: &Target,
        credentials: &Credentials,
        options: &[ConnectOption],
    ) -> Result<()> {
        apply_options(self, options);

        let config = ClientConfig {
            host: &target.host,
            port: target.port_or(gnmi::DEFAULT_PORT),
            username: credentials.username(),
            password: credentials.password().expose_secret(),
            tls: self.tls,
            timeout: self.timeout,
        };
        self.client = Some(GnmiClient::connect(&config).await?);
        Ok(())
    }

    /// Fetch `path` with a JSON-encoded `Get` and render the notifications.
    ///
    /// The path is parsed before the session is touched, so a malformed
    /// path is a validation error even on an unconnected driver.
    async fn execute(&mut self, path: &str) -> Result<String> {
        let parsed = gnmi::parse_path(path)?;
        let client = self.client.as_mut().ok_or(ExecutionError::NotConnected)?;

        debug!("gnmi: Get {}", gnmi::path_to_string(&parsed));
        let request = GetRequest {
            prefix: None,
            path: vec![parsed],
            r#type: DataType::All as i32,
            encoding: Encoding::Json as i32,
        };
        let response = client.get(request).await.map_err(ExecutionError::Grpc)?;
        Ok(gnmi::format_get_response(&response).map_err(ExecutionError::Json)?)
    }

    async fn close(&mut self) -> Result<()> {
        if self.client.take().is_some() {
            debug!("gnmi: channel released");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn test_bad_path_is_validation_before_session() {
        // Never connected: a transport attempt would be NotConnected
        let mut driver = GnmiDriver::new();
        let err = driver.execute("/interfaces/interface[name=eth0").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = driver.execute("/interfaces/interface").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Execution);
    }

    #[tokio::test]
    async fn test_skip_tls_sets_insecure_and_connect_fails_cleanly() {
        let mut driver = GnmiDriver::new().timeout(Duration::from_secs(2));
        let target = Target::new("127.0.0.1").with_port(Some(1));
        let err = driver
            .connect(&target, &Credentials::new("admin", "admin"), &[ConnectOption::SkipTlsVerify])
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(driver.tls_config().insecure);
        assert!(driver.tls_config().skip_verify);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let mut driver = GnmiDriver::new();
        driver.close().await.unwrap();
        driver.close().await.unwrap();
    }
}
