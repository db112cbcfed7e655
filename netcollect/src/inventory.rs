//! Device inventory.
//!
//! The inventory is a YAML file with one list of device records per
//! protocol group and an optional `settings` block:
//!
//! ```yaml
//! settings:
//!   timeout_secs: 30
//!   host_key_checking: accept-new
//!   known_hosts: /var/lib/netcollect/known_hosts
//! ssh:
//!   - { hostname: leaf1, ip: 10.0.0.1, type: arista_eos, cmd: show version }
//! http:
//!   - { hostname: leaf1, ip: 10.0.0.1, cmd: "show version, show clock", skip_tls: true }
//! netconf:
//!   - { hostname: pe1, ip: 10.0.0.2, rpc: "<get-config><source><running/></source></get-config>" }
//! gnmi:
//!   - { hostname: spine1, ip: 10.0.0.3, path: /system/state, skip_tls: true }
//! restconf:
//!   - { hostname: sw1, ip: 10.0.0.4, method: GET, endpoint: data/interfaces, skip_tls: true }
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::driver::{RestconfRequest, Scheme, Target};
use crate::error::InventoryError;
use crate::transport::HostKeyVerification;

/// Protocol groups, in processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Shell,
    Http,
    Netconf,
    Gnmi,
    Restconf,
}

impl Protocol {
    /// Every group in the order the collector runs them.
    pub const ALL: [Protocol; 5] = [
        Protocol::Shell,
        Protocol::Http,
        Protocol::Netconf,
        Protocol::Gnmi,
        Protocol::Restconf,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Shell => "ssh",
            Protocol::Http => "http",
            Protocol::Netconf => "netconf",
            Protocol::Gnmi => "gnmi",
            Protocol::Restconf => "restconf",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One inventory entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DeviceRecord {
    /// Display label.
    pub hostname: String,

    /// Connection address.
    pub ip: String,

    /// CLI dialect, for the `ssh` group.
    #[serde(rename = "type")]
    pub dialect: String,

    /// CLI command, or comma separated eAPI commands.
    pub cmd: String,

    /// gNMI path.
    pub path: String,

    /// NETCONF RPC body.
    pub rpc: String,

    pub port: Option<u16>,

    pub skip_tls: bool,

    /// RESTCONF HTTP method.
    pub method: String,

    /// RESTCONF endpoint relative to `/restconf`.
    pub endpoint: String,

    /// URL scheme for the HTTP based groups.
    pub scheme: Option<Scheme>,
}

fn non_empty(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

impl DeviceRecord {
    /// Where to connect.
    pub fn target(&self) -> Target {
        Target::new(self.ip.trim()).with_port(self.port)
    }

    /// The text operation for `protocol`, if populated.
    ///
    /// RESTCONF has no text operation; see [`restconf_request`](Self::restconf_request).
    pub fn text_operation(&self, protocol: Protocol) -> Option<&str> {
        match protocol {
            Protocol::Shell | Protocol::Http => non_empty(&self.cmd),
            Protocol::Netconf => non_empty(&self.rpc),
            Protocol::Gnmi => non_empty(&self.path),
            Protocol::Restconf => None,
        }
    }

    /// The RESTCONF request, if both method and endpoint are populated.
    pub fn restconf_request(&self) -> Option<RestconfRequest> {
        Some(RestconfRequest::new(
            non_empty(&self.method)?,
            non_empty(&self.endpoint)?,
        ))
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// Run-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Connect and request timeout for every protocol.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// SSH host key policy for the `ssh` and `netconf` groups.
    pub host_key_checking: HostKeyVerification,

    /// known_hosts file for host key checks; `~/.ssh/known_hosts` if unset.
    pub known_hosts: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            host_key_checking: HostKeyVerification::default(),
            known_hosts: None,
        }
    }
}

impl Settings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Devices grouped by protocol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Inventory {
    pub settings: Settings,
    pub ssh: Vec<DeviceRecord>,
    pub http: Vec<DeviceRecord>,
    pub netconf: Vec<DeviceRecord>,
    pub gnmi: Vec<DeviceRecord>,
    pub restconf: Vec<DeviceRecord>,
}

impl Inventory {
    /// Read and parse an inventory file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, InventoryError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| InventoryError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// Parse inventory YAML. An empty document is an empty inventory.
    pub fn from_yaml(text: &str) -> Result<Self, InventoryError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Records of one group.
    pub fn group(&self, protocol: Protocol) -> &[DeviceRecord] {
        match protocol {
            Protocol::Shell => &self.ssh,
            Protocol::Http => &self.http,
            Protocol::Netconf => &self.netconf,
            Protocol::Gnmi => &self.gnmi,
            Protocol::Restconf => &self.restconf,
        }
    }

    /// Total number of records across groups.
    pub fn len(&self) -> usize {
        Protocol::ALL.iter().map(|p| self.group(*p).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
