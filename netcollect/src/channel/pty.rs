//! PTY channel for interactive CLI sessions.

use std::time::Duration;

use log::trace;
use regex::bytes::Regex;
use russh::client::Msg;
use russh::{Channel, ChannelMsg};

use super::buffer::TextBuffer;
use crate::error::ExecutionError;

type Result<T> = std::result::Result<T, ExecutionError>;

/// Trailing bytes searched for a prompt.
const PROMPT_WINDOW: usize = 1000;

/// A russh shell channel read in prompt-delimited exchanges.
pub struct PtyChannel {
    channel: Channel<Msg>,
    buffer: TextBuffer,
}

impl PtyChannel {
    /// Wrap an already-open shell channel.
    pub fn new(channel: Channel<Msg>) -> Self {
        Self {
            channel,
            buffer: TextBuffer::new(PROMPT_WINDOW),
        }
    }

    /// Send a line of input (a newline is appended).
    pub async fn send(&mut self, input: &str) -> Result<()> {
        trace!("pty: send {:?}", input);
        self.write_line(input).await
    }

    /// Like [`send`](Self::send), but never logs the input.
    pub async fn send_secret(&mut self, secret: &str) -> Result<()> {
        trace!("pty: send <redacted>");
        self.write_line(secret).await
    }

    async fn write_line(&mut self, input: &str) -> Result<()> {
        let line = format!("{input}\n");
        self.channel
            .data(line.as_bytes())
            .await
            .map_err(ExecutionError::Ssh)
    }

    /// Read until `pattern` matches the tail of the accumulated output.
    ///
    /// Returns everything read, including the matched text, and resets the
    /// buffer for the next exchange.
    pub async fn read_until_pattern(&mut self, pattern: &Regex, timeout: Duration) -> Result<Vec<u8>> {
        let deadline = tokio::time::Instant::now() + timeout;

        while !self.buffer.tail_matches(pattern) {
            let msg = tokio::time::timeout_at(deadline, self.channel.wait())
                .await
                .map_err(|_| ExecutionError::Timeout(timeout))?;

            match msg {
                Some(ChannelMsg::Data { ref data }) => self.buffer.push(data),
                Some(ChannelMsg::ExtendedData { ref data, .. }) => self.buffer.push(data),
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => {
                    return Err(ExecutionError::ChannelClosed);
                }
                Some(other) => trace!("pty: ignoring {:?}", other),
            }
        }

        Ok(self.buffer.drain())
    }

    /// Signal EOF and close the channel.
    pub async fn close(self) -> Result<()> {
        self.channel.eof().await.map_err(ExecutionError::Ssh)?;
        self.channel.close().await.map_err(ExecutionError::Ssh)?;
        Ok(())
    }
}
