//! RESTCONF driver.

use std::fmt;
use std::time::Duration;

use log::debug;
use reqwest::header::ACCEPT;
use reqwest::{Method, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use super::http::{self, Scheme};
use super::{Credentials, DeviceDriver, Target};
use crate::error::{ExecutionError, Result, ValidationError};
use crate::tls::{ConnectOption, SupportsTls, TlsConfig, TlsScope, apply_options};

/// Media type requested from the server.
pub const YANG_DATA_JSON: &str = "application/yang-data+json";

/// Methods a RESTCONF server can be asked for.
const METHODS: &[&str] = &["GET", "HEAD", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"];

/// One RESTCONF call: an HTTP method and an endpoint relative to `/restconf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestconfRequest {
    pub method: String,
    pub endpoint: String,
}

impl RestconfRequest {
    pub fn new(method: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            endpoint: endpoint.into(),
        }
    }

    fn http_method(&self) -> std::result::Result<Method, ValidationError> {
        let upper = self.method.trim().to_ascii_uppercase();
        if !METHODS.contains(&upper.as_str()) {
            return Err(ValidationError::InvalidMethod {
                method: self.method.clone(),
            });
        }
        Method::from_bytes(upper.as_bytes()).map_err(|_| ValidationError::InvalidMethod {
            method: self.method.clone(),
        })
    }
}

impl fmt::Display for RestconfRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.endpoint)
    }
}

struct Connected {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: SecretString,
}

impl Connected {
    fn url_for(&self, endpoint: &str) -> std::result::Result<Url, ValidationError> {
        let raw = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
        Url::parse(&raw).map_err(|e| ValidationError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })
    }
}

/// RESTCONF driver.
pub struct RestconfDriver {
    scheme: Scheme,
    timeout: Duration,
    tls: TlsConfig,
    connected: Option<Connected>,
}

impl Default for RestconfDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl RestconfDriver {
    pub fn new() -> Self {
        Self {
            scheme: Scheme::default(),
            timeout: http::DEFAULT_TIMEOUT,
            tls: TlsConfig::default(),
            connected: None,
        }
    }

    /// Use `scheme` instead of HTTPS.
    pub fn scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Current TLS settings.
    pub fn tls_config(&self) -> TlsConfig {
        self.tls
    }

    fn base_url(&self, target: &Target) -> String {
        format!(
            "{}://{}:{}/restconf",
            self.scheme,
            http::url_host(&target.host),
            target.port_or(self.scheme.default_port())
        )
    }
}

impl SupportsTls for RestconfDriver {
    fn tls_scope(&self) -> TlsScope {
        TlsScope::TransportAndTrust
    }

    fn tls_config_mut(&mut self) -> &mut TlsConfig {
        &mut self.tls
    }
}

impl DeviceDriver for RestconfDriver {
    type Operation = RestconfRequest;

    async fn connect(
        &mut self,
        target: &Target,
        credentials: &Credentials,
        options: &[ConnectOption],
    ) -> Result<()> {
        apply_options(self, options);
        let client = http::build_client(&self.tls, self.timeout)?;
        let base_url = self.base_url(target);
        debug!("restconf: client ready for {}", base_url);

        self.connected = Some(Connected {
            client,
            base_url,
            username: credentials.username().to_string(),
            password: SecretString::from(credentials.password().expose_secret().to_owned()),
        });
        Ok(())
    }

    async fn execute(&mut self, request: &RestconfRequest) -> Result<String> {
        let method = request.http_method()?;
        let conn = self.connected.as_ref().ok_or(ExecutionError::NotConnected)?;
        let url = conn.url_for(&request.endpoint)?;
        debug!("restconf: {} {}", method, url);

        let response = conn
            .client
            .request(method, url)
            .basic_auth(&conn.username, Some(conn.password.expose_secret()))
            .header(ACCEPT, YANG_DATA_JSON)
            .send()
            .await
            .map_err(ExecutionError::Http)?;

        let status = response.status();
        let body = response.text().await.map_err(ExecutionError::Http)?;
        if status != StatusCode::OK {
            return Err(ExecutionError::HttpStatus {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let data: Value = serde_json::from_str(&body).map_err(ExecutionError::Json)?;
        Ok(serde_json::to_string_pretty(&data).map_err(ExecutionError::Json)?)
    }

    async fn close(&mut self) -> Result<()> {
        self.connected = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use httptest::matchers::{contains, key, request};
    use httptest::responders::status_code;
    use httptest::{Expectation, Server};
    use tokio_test::assert_ok;

    use super::*;
    use crate::error::ErrorKind;

    fn creds() -> Credentials {
        Credentials::new("admin", "admin")
    }

    async fn connected(server: &Server) -> RestconfDriver {
        let addr = server.addr();
        let target = Target::new(addr.ip().to_string()).with_port(Some(addr.port()));
        let mut driver = RestconfDriver::new().scheme(Scheme::Http);
        assert_ok!(driver.connect(&target, &creds(), &[ConnectOption::SkipTlsVerify]).await);
        driver
    }

    #[tokio::test]
    async fn test_skip_tls_url_and_flags() {
        let mut driver = RestconfDriver::new();
        let target = Target::new("10.0.0.1");
        assert_ok!(driver.connect(&target, &creds(), &[ConnectOption::SkipTlsVerify]).await);

        assert!(driver.tls_config().skip_verify);
        assert!(driver.tls_config().insecure);

        // The url crate elides the scheme's default port
        let conn = driver.connected.as_ref().unwrap();
        assert_eq!(
            conn.url_for("data/interfaces").unwrap().as_str(),
            "https://10.0.0.1/restconf/data/interfaces"
        );

        let target = Target::new("10.0.0.1").with_port(Some(8443));
        assert_ok!(driver.connect(&target, &creds(), &[]).await);
        let conn = driver.connected.as_ref().unwrap();
        assert_eq!(
            conn.url_for("/data/interfaces").unwrap().as_str(),
            "https://10.0.0.1:8443/restconf/data/interfaces"
        );
    }

    #[tokio::test]
    async fn test_get_reformats_json() {
        let mut server = Server::run();
        server.expect(
            Expectation::matching(httptest::all_of![
                request::method_path("GET", "/restconf/data/interfaces"),
                request::headers(contains(("accept", YANG_DATA_JSON))),
                request::headers(contains(key("authorization"))),
            ])
            .respond_with(status_code(200).body(r#"{"a":1}"#)),
        );
        let mut driver = connected(&server).await;

        let output = driver
            .execute(&RestconfRequest::new("GET", "data/interfaces"))
            .await
            .unwrap();
        assert_eq!(output, "{\n  \"a\": 1\n}");
        server.verify_and_clear();
    }

    #[tokio::test]
    async fn test_only_200_is_success() {
        for status in [201, 204, 404] {
            let server = Server::run();
            server.expect(
                Expectation::matching(request::method_path("PUT", "/restconf/data/system"))
                    .respond_with(status_code(status)),
            );
            let mut driver = connected(&server).await;

            let err = driver
                .execute(&RestconfRequest::new("put", "/data/system"))
                .await
                .unwrap_err();
            assert!(
                matches!(
                    err,
                    crate::Error::Execution(ExecutionError::HttpStatus { status: got, .. }) if got == status
                ),
                "status {status}: {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_invalid_method_is_validation() {
        let mut driver = RestconfDriver::new();
        let err = driver
            .execute(&RestconfRequest::new("FETCH ME", "data"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_method_case_insensitive() {
        let request = RestconfRequest::new("patch", "data");
        assert_eq!(request.http_method().unwrap(), Method::PATCH);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let mut driver = RestconfDriver::new();
        assert_ok!(driver.close().await);
        assert_ok!(driver.close().await);
    }
}
