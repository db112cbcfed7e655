//! Protocol drivers behind one lifecycle.
//!
//! Every protocol implements [`DeviceDriver`]: `connect` sets up whatever
//! session the protocol needs, `execute` runs exactly one operation, and
//! `close` releases the session. A driver instance is created fresh per
//! device and never reused.
//!
//! | Driver | Protocol | Operation | Output |
//! |---|---|---|---|
//! | [`ShellDriver`] | interactive CLI over SSH | command text | device text |
//! | [`EapiDriver`] | JSON-RPC over HTTP(S) | command(s), comma separated | JSON |
//! | [`NetconfDriver`] | NETCONF over SSH | RPC body XML | rpc-reply XML |
//! | [`GnmiDriver`] | gNMI over gRPC | path string | indented JSON |
//! | [`RestconfDriver`] | RESTCONF over HTTP(S) | [`RestconfRequest`] | indented JSON |

mod eapi;
mod gnmi;
mod http;
mod netconf;
mod restconf;
pub mod shell;

pub use eapi::EapiDriver;
pub use gnmi::GnmiDriver;
pub use http::Scheme;
pub(crate) use http::url_host;
pub use netconf::NetconfDriver;
pub use restconf::{RestconfDriver, RestconfRequest};
pub use shell::ShellDriver;

use std::future::Future;

use secrecy::SecretString;

use crate::error::Result;
use crate::tls::ConnectOption;

/// Login credentials, shared by every device in a run.
#[derive(Debug)]
pub struct Credentials {
    username: String,
    password: SecretString,
}

impl Credentials {
    /// Create credentials from a username and password.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// The login name.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The password, still wrapped.
    pub fn password(&self) -> &SecretString {
        &self.password
    }
}

/// Where a driver connects to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Hostname or IP address.
    pub host: String,

    /// Explicit port. Each driver has its own default.
    pub port: Option<u16>,
}

impl Target {
    /// Target on the protocol's default port.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
        }
    }

    /// Override the port.
    pub fn with_port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    /// The explicit port, or `default`.
    pub fn port_or(&self, default: u16) -> u16 {
        self.port.unwrap_or(default)
    }
}

/// The uniform connect/execute/close lifecycle.
///
/// Lifecycle rules every implementation follows:
///
/// - `connect` applies every option before or during session setup. On
///   failure the instance must not be used for `execute`.
/// - `execute` performs exactly one protocol operation and never retries.
///   It fails with an execution error on an unconnected instance.
/// - `close` is idempotent: it succeeds on a never-connected instance and
///   when called repeatedly.
pub trait DeviceDriver: Send {
    /// What `execute` takes.
    type Operation: ?Sized + Sync;

    /// Establish the protocol session.
    fn connect(
        &mut self,
        target: &Target,
        credentials: &Credentials,
        options: &[ConnectOption],
    ) -> impl Future<Output = Result<()>> + Send;

    /// Run one operation against the connected session.
    fn execute(&mut self, operation: &Self::Operation) -> impl Future<Output = Result<String>> + Send;

    /// Release session resources.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}
