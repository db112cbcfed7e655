//! Shared HTTP plumbing for the eAPI and RESTCONF drivers.

use std::fmt;
use std::time::Duration;

use log::debug;
use serde::Deserialize;

use crate::error::ConnectionError;
use crate::tls::TlsConfig;

/// URL scheme for HTTP-based drivers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    #[default]
    Https,
    Http,
}

impl Scheme {
    /// Well-known port for the scheme.
    pub fn default_port(self) -> u16 {
        match self {
            Scheme::Https => 443,
            Scheme::Http => 80,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Https => "https",
            Scheme::Http => "http",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Build a client honouring the driver's TLS settings.
pub(crate) fn build_client(tls: &TlsConfig, timeout: Duration) -> Result<reqwest::Client, ConnectionError> {
    if tls.skip_verify {
        debug!("http: certificate verification disabled");
    }
    reqwest::ClientBuilder::new()
        .danger_accept_invalid_certs(tls.skip_verify)
        .connect_timeout(timeout)
        .timeout(timeout)
        .build()
        .map_err(ConnectionError::HttpClient)
}

/// Host part of a URL, bracketing bare IPv6 literals.
pub(crate) fn url_host(host: &str) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]")
    } else {
        host.to_string()
    }
}
