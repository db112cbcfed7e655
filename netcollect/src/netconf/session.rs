//! NETCONF session over an SSH `netconf` subsystem channel.

use std::time::Duration;

use log::{debug, trace, warn};
use russh::client::Msg;
use russh::{Channel, ChannelMsg};

use super::framing::{FrameDecoder, Framing};
use super::message::{self, FIRST_MESSAGE_ID, ServerHello};
use crate::error::{ConnectionError, ExecutionError};
use crate::transport::{SshConfig, SshTransport};

type Result<T> = std::result::Result<T, ExecutionError>;

/// SSH subsystem name.
pub const SUBSYSTEM: &str = "netconf";

/// An established NETCONF session.
pub struct NetconfSession {
    transport: SshTransport,
    channel: Channel<Msg>,
    decoder: FrameDecoder,
    next_message_id: u64,
    timeout: Duration,
    server: ServerHello,
    addr: String,
}

impl NetconfSession {
    /// Connect, open the subsystem and exchange hellos.
    pub async fn open(config: &SshConfig) -> std::result::Result<Self, ConnectionError> {
        let transport = SshTransport::connect(config).await?;
        let channel = match transport.open_subsystem(SUBSYSTEM).await {
            Ok(channel) => channel,
            Err(e) => {
                if let Err(close_err) = transport.close().await {
                    debug!("netconf: disconnect after failed subsystem open: {}", close_err);
                }
                return Err(e);
            }
        };

        let mut session = Self {
            transport,
            channel,
            decoder: FrameDecoder::new(),
            next_message_id: FIRST_MESSAGE_ID,
            timeout: config.timeout,
            server: ServerHello {
                capabilities: Vec::new(),
                session_id: None,
            },
            addr: config.addr(),
        };

        if let Err(e) = session.hello().await {
            let message = e.to_string();
            session.disconnect().await;
            return Err(ConnectionError::Handshake { message });
        }

        Ok(session)
    }

    /// Send our hello, read the server's, and settle the framing.
    async fn hello(&mut self) -> Result<()> {
        self.write(Framing::EndOfMessage, &message::client_hello()).await?;
        let reply = self.read_message().await?;

        self.server = ServerHello::parse(&reply).ok_or_else(|| ExecutionError::Framing {
            message: "server hello carries no capabilities".to_string(),
        })?;

        if self.server.supports_base_1_1() {
            self.decoder.set_framing(Framing::Chunked);
        }
        debug!(
            "netconf: session {:?} on {} using {:?} framing, {} capabilities",
            self.server.session_id,
            self.addr,
            self.decoder.framing(),
            self.server.capabilities.len()
        );
        Ok(())
    }

    /// Issue one RPC and return the reply.
    ///
    /// A reply carrying `<rpc-error>` is an [`ExecutionError::RpcFailed`].
    pub async fn rpc(&mut self, body: &str) -> Result<String> {
        let reply = self.call(body).await?;
        check_reply(reply)
    }

    async fn call(&mut self, body: &str) -> Result<String> {
        let id = self.next_message_id;
        self.next_message_id += 1;

        let request = message::rpc(id, body);
        trace!("netconf: -> {}", request);
        self.write(self.decoder.framing(), &request).await?;

        let reply = self.read_message().await?;
        trace!("netconf: <- {}", reply);
        Ok(reply)
    }

    async fn write(&mut self, framing: Framing, message: &str) -> Result<()> {
        let wire = framing.encode(message);
        self.channel
            .data(&wire[..])
            .await
            .map_err(ExecutionError::Ssh)
    }

    async fn read_message(&mut self) -> Result<String> {
        let timeout = self.timeout;
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(message) = self.decoder.next_message()? {
                return Ok(message);
            }

            let msg = tokio::time::timeout_at(deadline, self.channel.wait())
                .await
                .map_err(|_| ExecutionError::Timeout(timeout))?;
            match msg {
                Some(ChannelMsg::Data { ref data }) => self.decoder.push(data),
                Some(ChannelMsg::ExtendedData { ref data, .. }) => {
                    warn!("netconf: stderr from {}: {}", self.addr, String::from_utf8_lossy(data));
                }
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => {
                    return Err(ExecutionError::ChannelClosed);
                }
                Some(other) => trace!("netconf: ignoring {:?}", other),
            }
        }
    }

    /// Send `<close-session/>` and disconnect.
    ///
    /// The close-session exchange is best-effort; only the SSH disconnect
    /// result is reported.
    pub async fn close(mut self) -> std::result::Result<(), ConnectionError> {
        if let Err(e) = self.call("<close-session/>").await {
            debug!("netconf: close-session on {}: {}", self.addr, e);
        }
        if let Err(e) = self.channel.close().await {
            debug!("netconf: channel close on {}: {}", self.addr, e);
        }
        self.transport.close().await
    }

    async fn disconnect(self) {
        if let Err(e) = self.transport.close().await {
            debug!("netconf: disconnect from {}: {}", self.addr, e);
        }
    }
}

/// Turn a reply carrying `<rpc-error>` into [`ExecutionError::RpcFailed`].
fn check_reply(reply: String) -> Result<String> {
    match message::rpc_error(&reply) {
        Some(message) => Err(ExecutionError::RpcFailed { message }),
        None => Ok(reply),
    }
}
