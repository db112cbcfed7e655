//! Password-authenticated SSH client on russh.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use log::{debug, warn};
use russh::Channel;
use russh::client::{self, Handle, Msg};
use russh::keys::PublicKey;
use secrecy::ExposeSecret;

use super::config::{HostKeyVerification, SshConfig};
use crate::error::ConnectionError;

type Result<T> = std::result::Result<T, ConnectionError>;

/// An authenticated SSH connection that hands out session channels.
pub struct SshTransport {
    handle: Handle<Client>,
    addr: String,
    pty_size: (u32, u32),
}

impl SshTransport {
    /// Connect, verify the host key and log in with the configured password.
    pub async fn connect(config: &SshConfig) -> Result<Self> {
        let rejection = Arc::new(Mutex::new(None));
        let client = Client {
            host: config.host.clone(),
            port: config.port,
            mode: config.host_keys,
            known_hosts: config.known_hosts.clone(),
            rejection: Arc::clone(&rejection),
        };
        let russh_config = Arc::new(client::Config {
            inactivity_timeout: Some(config.timeout),
            ..Default::default()
        });

        debug!("ssh: connecting to {}", config.addr());
        let connecting = client::connect(russh_config, (config.host.as_str(), config.port), client);
        let mut handle = match tokio::time::timeout(config.timeout, connecting).await {
            Err(_) => return Err(ConnectionError::Timeout(config.timeout)),
            Ok(Err(e)) => {
                // russh reports a refused key as UnknownKey; the client kept the reason
                let refused = rejection.lock().ok().and_then(|mut slot| slot.take());
                return Err(refused.unwrap_or_else(|| connect_error(config, e)));
            }
            Ok(Ok(handle)) => handle,
        };

        let auth = handle
            .authenticate_password(&config.username, config.password.expose_secret())
            .await?;
        if !auth.success() {
            return Err(ConnectionError::AuthenticationFailed {
                user: config.username.clone(),
            });
        }

        Ok(Self {
            handle,
            addr: config.addr(),
            pty_size: config.pty_size,
        })
    }

    /// Session channel running an interactive shell on a PTY.
    pub async fn open_shell(&self) -> Result<Channel<Msg>> {
        let channel = self.handle.channel_open_session().await?;
        let (columns, rows) = self.pty_size;

        channel
            .request_pty(true, "xterm", columns, rows, 0, 0, &[])
            .await
            .map_err(|e| ConnectionError::ChannelOpen(format!("pty request: {e}")))?;
        channel
            .request_shell(true)
            .await
            .map_err(|e| ConnectionError::ChannelOpen(format!("shell request: {e}")))?;

        debug!("ssh: shell open on {}", self.addr);
        Ok(channel)
    }

    /// Session channel bound to a subsystem such as `netconf`.
    pub async fn open_subsystem(&self, name: &str) -> Result<Channel<Msg>> {
        let channel = self.handle.channel_open_session().await?;
        channel
            .request_subsystem(true, name)
            .await
            .map_err(|e| ConnectionError::ChannelOpen(format!("subsystem '{name}': {e}")))?;

        debug!("ssh: subsystem '{}' open on {}", name, self.addr);
        Ok(channel)
    }

    pub async fn close(self) -> Result<()> {
        self.handle
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await?;
        debug!("ssh: disconnected from {}", self.addr);
        Ok(())
    }
}

fn connect_error(config: &SshConfig, err: russh::Error) -> ConnectionError {
    match err {
        russh::Error::IO(source) => ConnectionError::ConnectionFailed {
            host: config.host.clone(),
            port: config.port,
            source,
        },
        other => ConnectionError::Ssh(other),
    }
}

/// russh event handler; only host key checking is customised.
struct Client {
    host: String,
    port: u16,
    mode: HostKeyVerification,
    known_hosts: Option<PathBuf>,
    rejection: Arc<Mutex<Option<ConnectionError>>>,
}

impl Client {
    fn verify(&self, key: &PublicKey) -> Result<()> {
        if self.mode == HostKeyVerification::Disabled {
            return Ok(());
        }

        let known = match &self.known_hosts {
            Some(path) => russh::keys::check_known_hosts_path(&self.host, self.port, key, path),
            None => russh::keys::check_known_hosts(&self.host, self.port, key),
        };
        match known {
            Ok(true) => Ok(()),
            Ok(false) if self.mode == HostKeyVerification::AcceptNew => {
                let learned = match &self.known_hosts {
                    Some(path) => {
                        russh::keys::known_hosts::learn_known_hosts_path(&self.host, self.port, key, path)
                    }
                    None => russh::keys::known_hosts::learn_known_hosts(&self.host, self.port, key),
                };
                if let Err(e) = learned {
                    warn!("ssh: could not record host key for {}: {}", self.host, e);
                }
                Ok(())
            }
            Ok(false) => Err(ConnectionError::HostKeyUnknown {
                host: self.host.clone(),
                port: self.port,
            }),
            Err(russh::keys::Error::KeyChanged { line }) => Err(ConnectionError::HostKeyChanged {
                host: self.host.clone(),
                port: self.port,
                line,
            }),
            Err(e) => Err(ConnectionError::KnownHosts(e.to_string())),
        }
    }
}

impl client::Handler for Client {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        match self.verify(server_public_key) {
            Ok(()) => Ok(true),
            Err(e) => {
                if let Ok(mut slot) = self.rejection.lock() {
                    *slot = Some(e);
                }
                Ok(false)
            }
        }
    }
}
