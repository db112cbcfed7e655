//! SSH connection parameters.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;

/// What to do with the server's host key, after OpenSSH's
/// `StrictHostKeyChecking`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostKeyVerification {
    /// Only hosts already in known_hosts are accepted.
    Strict,

    /// Unknown hosts are learned; a changed key is still rejected.
    AcceptNew,

    /// Any key is accepted.
    #[default]
    Disabled,
}

/// Where and how to open one SSH connection.
#[derive(Debug)]
pub struct SshConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,

    /// Bounds the TCP connect plus handshake, and every later read.
    pub timeout: Duration,

    /// Columns and rows of a PTY request.
    pub pty_size: (u32, u32),

    pub host_keys: HostKeyVerification,

    /// `None` means `~/.ssh/known_hosts`.
    pub known_hosts: Option<PathBuf>,
}

impl SshConfig {
    /// Port 22, a 30 second timeout and an 80x24 PTY.
    pub fn new(host: impl Into<String>, username: impl Into<String>, password: SecretString) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: username.into(),
            password,
            timeout: Duration::from_secs(30),
            pty_size: (80, 24),
            host_keys: HostKeyVerification::default(),
            known_hosts: None,
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn pty_size(mut self, columns: u32, rows: u32) -> Self {
        self.pty_size = (columns, rows);
        self
    }

    pub fn host_keys(mut self, mode: HostKeyVerification) -> Self {
        self.host_keys = mode;
        self
    }

    /// Check and learn host keys in `path` instead of `~/.ssh/known_hosts`.
    pub fn known_hosts(mut self, path: Option<PathBuf>) -> Self {
        self.known_hosts = path;
        self
    }

    /// `host:port`, for log lines.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_key_mode_from_settings() {
        let mode: HostKeyVerification = serde_yaml::from_str("accept-new").unwrap();
        assert_eq!(mode, HostKeyVerification::AcceptNew);
        assert_eq!(HostKeyVerification::default(), HostKeyVerification::Disabled);
    }

    #[test]
    fn test_builder() {
        let config = SshConfig::new("pe1.lab", "netops", SecretString::from("secret"))
            .port(830)
            .pty_size(512, 24)
            .host_keys(HostKeyVerification::Strict)
            .known_hosts(Some(PathBuf::from("/etc/netcollect/known_hosts")));

        assert_eq!(config.addr(), "pe1.lab:830");
        assert_eq!(config.known_hosts.as_deref(), Some(std::path::Path::new("/etc/netcollect/known_hosts")));
        assert_eq!(config.pty_size, (512, 24));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.host_keys, HostKeyVerification::Strict);
    }
}
