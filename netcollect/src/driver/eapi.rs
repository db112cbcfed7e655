//! JSON-RPC over HTTP(S) driver for Arista eAPI.
//!
//! Stateless: `connect` only builds the HTTP client, and each `execute` is
//! one `runCmds` POST. Idle connections stay pooled until `close`.

use std::time::Duration;

use log::debug;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;

use super::http::{self, Scheme};
use super::{Credentials, DeviceDriver, Target};
use crate::error::{ExecutionError, Result, ValidationError};
use crate::tls::{ConnectOption, SupportsTls, TlsConfig, TlsScope, apply_options};

/// Request id sent with every call.
const REQUEST_ID: &str = "EapiExplorer-1";

#[derive(Debug, Serialize)]
struct RunCmds<'a> {
    jsonrpc: &'static str,
    method: &'static str,
    params: RunCmdsParams<'a>,
    id: &'static str,
}

#[derive(Debug, Serialize)]
struct RunCmdsParams<'a> {
    version: u32,
    cmds: Vec<&'a str>,
    format: &'static str,
}

impl<'a> RunCmds<'a> {
    fn new(cmds: Vec<&'a str>) -> Self {
        Self {
            jsonrpc: "2.0",
            method: "runCmds",
            params: RunCmdsParams {
                version: 1,
                cmds,
                format: "json",
            },
            id: REQUEST_ID,
        }
    }
}

/// Split a comma separated command list, trimming each command.
fn split_commands(input: &str) -> Vec<&str> {
    input.split(',').map(str::trim).collect()
}

struct Connected {
    client: reqwest::Client,
    url: String,
    username: String,
    password: SecretString,
}

/// eAPI driver.
///
/// Each `execute` sends one JSON-RPC `runCmds` request to `/command-api`
/// with HTTP basic authentication. The operation is a comma separated list
/// of CLI commands, all of which travel in the same request and are
/// answered together in one JSON document.
///
/// Certificate checks follow [`ConnectOption::SkipTlsVerify`]; the scheme
/// itself never changes, so a device serving plain HTTP needs
/// [`Scheme::Http`].
///
/// # Example
///
/// ```rust,no_run
/// use netcollect::tls::ConnectOption;
/// use netcollect::{Credentials, DeviceDriver, EapiDriver, Target};
///
/// # async fn example() -> Result<(), netcollect::Error> {
/// let mut driver = EapiDriver::new();
/// driver
///     .connect(
///         &Target::new("leaf1.lab"),
///         &Credentials::new("admin", "admin"),
///         &[ConnectOption::SkipTlsVerify],
///     )
///     .await?;
/// let json = driver.execute("show version, show clock").await?;
/// println!("{json}");
/// driver.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct EapiDriver {
    scheme: Scheme,
    timeout: Duration,
    tls: TlsConfig,
    connected: Option<Connected>,
}

impl Default for EapiDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl EapiDriver {
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

    fn endpoint(&self, target: &Target) -> String {
        let host = http::url_host(&target.host);
        match target.port {
            Some(port) => format!("{}://{}:{}/command-api", self.scheme, host, port),
            None => format!("{}://{}/command-api", self.scheme, host),
        }
    }
}

impl SupportsTls for EapiDriver {
    fn tls_scope(&self) -> TlsScope {
        TlsScope::CertificateTrust
    }

    fn tls_config_mut(&mut self) -> &mut TlsConfig {
        &mut self.tls
    }
}

impl DeviceDriver for EapiDriver {
    type Operation = str;

    async fn connect(
        &mut self,
        target: &Target,
        credentials: &Credentials,
        options: &[ConnectOption],
    ) -> Result<()> {
        apply_options(self, options);
        let client = http::build_client(&self.tls, self.timeout)?;
        let url = self.endpoint(target);
        debug!("eapi: client ready for {}", url);

        self.connected = Some(Connected {
            client,
            url,
            username: credentials.username().to_string(),
            password: SecretString::from(credentials.password().expose_secret().to_owned()),
        });
        Ok(())
    }

    /// Run the comma separated `command` list in one request.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::EmptyOperation`] for a blank command list.
    /// - [`ExecutionError::HttpStatus`] with the response body for any
    ///   status other than 200.
    /// - [`ExecutionError::RpcFailed`] when the JSON-RPC reply carries an
    ///   `error` member, such as a rejected command.
    async fn execute(&mut self, command: &str) -> Result<String> {
        let conn = self.connected.as_ref().ok_or(ExecutionError::NotConnected)?;
        if command.trim().is_empty() {
            return Err(ValidationError::EmptyOperation.into());
        }

        let cmds = split_commands(command);
        debug!("eapi: runCmds {:?} at {}", cmds, conn.url);

        let response = conn
            .client
            .post(&conn.url)
            .basic_auth(&conn.username, Some(conn.password.expose_secret()))
            .json(&RunCmds::new(cmds))
            .send()
            .await
            .map_err(ExecutionError::Http)?;

        let status = response.status();
        let body = response.text().await.map_err(ExecutionError::Http)?;
        if status != reqwest::StatusCode::OK {
            return Err(ExecutionError::HttpStatus {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let reply: Value = serde_json::from_str(&body).map_err(ExecutionError::Json)?;
        if let Some(error) = reply.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .map_or_else(|| error.to_string(), str::to_string);
            return Err(ExecutionError::RpcFailed { message }.into());
        }

        Ok(serde_json::to_string_pretty(&reply).map_err(ExecutionError::Json)?)
    }

    async fn close(&mut self) -> Result<()> {
        if self.connected.take().is_some() {
            debug!("eapi: released HTTP client");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use httptest::matchers::{contains, eq, json_decoded, key, matches, request};
    use httptest::responders::status_code;
    use httptest::{Expectation, Server};
    use serde_json::json;

    use super::*;
    use crate::error::ErrorKind;

    fn creds() -> Credentials {
        Credentials::new("admin", "arista")
    }

    async fn connected(server: &Server) -> EapiDriver {
        let addr = server.addr();
        let target = Target::new(addr.ip().to_string()).with_port(Some(addr.port()));
        let mut driver = EapiDriver::new().scheme(Scheme::Http);
        driver.connect(&target, &creds(), &[]).await.unwrap();
        driver
    }

    #[test]
    fn test_split_commands() {
        assert_eq!(
            split_commands("show version, show clock"),
            vec!["show version", "show clock"]
        );
        assert_eq!(split_commands(" show version "), vec!["show version"]);
        assert_eq!(split_commands("a,b ,  c").len(), 3);
    }

    #[test]
    fn test_payload_shape() {
        let payload = serde_json::to_value(RunCmds::new(vec!["show version"])).unwrap();
        assert_eq!(
            payload,
            serde_json::json!({
                "jsonrpc": "2.0",
                "method": "runCmds",
                "params": {"version": 1, "cmds": ["show version"], "format": "json"},
                "id": "EapiExplorer-1"
            })
        );
    }

    #[test]
    fn test_endpoint_url() {
        let driver = EapiDriver::new();
        assert_eq!(
            driver.endpoint(&Target::new("10.0.0.1")),
            "https://10.0.0.1/command-api"
        );
        assert_eq!(
            driver.endpoint(&Target::new("10.0.0.1").with_port(Some(8443))),
            "https://10.0.0.1:8443/command-api"
        );
    }

    #[tokio::test]
    async fn test_skip_tls_sets_trust_only() {
        let mut driver = EapiDriver::new();
        driver
            .connect(&Target::new("10.0.0.1"), &creds(), &[ConnectOption::SkipTlsVerify])
            .await
            .unwrap();
        assert!(driver.tls_config().skip_verify);
        assert!(!driver.tls_config().insecure);
    }

    #[tokio::test]
    async fn test_batch_sent_in_one_post() {
        let mut server = Server::run();
        server.expect(
            Expectation::matching(httptest::all_of![
                request::method_path("POST", "/command-api"),
                request::headers(contains(("authorization", matches("^Basic ")))),
                request::body(json_decoded(eq(json!({
                    "jsonrpc": "2.0",
                    "method": "runCmds",
                    "params": {"version": 1, "cmds": ["show version", "show clock"], "format": "json"},
                    "id": "EapiExplorer-1"
                })))),
            ])
            .respond_with(
                status_code(200).body(r#"{"jsonrpc":"2.0","id":"EapiExplorer-1","result":[{},{}]}"#),
            ),
        );
        let mut driver = connected(&server).await;

        let output = driver.execute("show version, show clock").await.unwrap();
        assert!(output.contains("\"result\""));

        // The client stays usable until close
        assert!(driver.connected.is_some());
        driver.close().await.unwrap();
        server.verify_and_clear();
    }

    #[tokio::test]
    async fn test_non_200_carries_body() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::headers(contains(key("authorization"))))
                .respond_with(status_code(401).body("Unauthorized")),
        );
        let mut driver = connected(&server).await;

        let err = driver.execute("show version").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Execution);
        assert!(matches!(
            err,
            crate::Error::Execution(ExecutionError::HttpStatus { status: 401, ref body }) if body == "Unauthorized"
        ));
    }

    #[tokio::test]
    async fn test_jsonrpc_error_is_rpc_failure() {
        let body = r#"{"jsonrpc":"2.0","id":"EapiExplorer-1","error":{"code":1002,"message":"CLI command 1 of 1 'show bogus' failed: invalid command"}}"#;
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/command-api"))
                .respond_with(status_code(200).body(body)),
        );
        let mut driver = connected(&server).await;

        let err = driver.execute("show bogus").await.unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Execution(ExecutionError::RpcFailed { ref message }) if message.contains("invalid command")
        ));
    }

    #[tokio::test]
    async fn test_execute_before_connect() {
        let mut driver = EapiDriver::new();
        let err = driver.execute("show version").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Execution);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let mut driver = EapiDriver::new();
        driver.close().await.unwrap();
        driver
            .connect(&Target::new("10.0.0.1"), &creds(), &[])
            .await
            .unwrap();
        driver.close().await.unwrap();
        driver.close().await.unwrap();
    }
}
