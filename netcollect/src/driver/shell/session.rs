//! Interactive CLI session with deferred channel open.

use std::time::Instant;

use log::{debug, trace, warn};
use regex::bytes::Regex;
use secrecy::ExposeSecret;

use super::privilege::PrivilegeGraph;
use crate::channel::PtyChannel;
use crate::dialect::Dialect;
use crate::error::{ConnectionError, ExecutionError};
use crate::transport::{SshConfig, SshTransport};

type Result<T> = std::result::Result<T, ExecutionError>;

/// A prepared CLI session.
///
/// Construction performs no I/O. The SSH connection and PTY shell are
/// brought up by [`open`](Self::open), which the driver calls on first use.
pub struct ShellSession {
    ssh_config: SshConfig,
    dialect: &'static Dialect,

    /// Matches the prompt of any level.
    prompt: Regex,

    privileges: PrivilegeGraph<'static>,

    /// Transport and shell channel, once opened.
    live: Option<LiveChannel>,
}

struct LiveChannel {
    transport: SshTransport,
    pty: PtyChannel,
}

fn session_open(err: ConnectionError) -> ExecutionError {
    ExecutionError::SessionOpen(Box::new(err))
}

impl ShellSession {
    pub fn new(ssh_config: SshConfig, dialect: &'static Dialect) -> std::result::Result<Self, ConnectionError> {
        let prompt = dialect.any_prompt().map_err(|source| ConnectionError::InvalidDialect {
            name: dialect.name.to_string(),
            source,
        })?;

        Ok(Self {
            ssh_config,
            dialect,
            prompt,
            privileges: PrivilegeGraph::new(&dialect.levels),
            live: None,
        })
    }

    /// Whether the channel is open.
    pub fn is_live(&self) -> bool {
        self.live.is_some()
    }

    /// Level last seen in a prompt.
    pub fn current_privilege(&self) -> Option<&'static str> {
        self.privileges.current()
    }

    /// Open the channel if it is not already open.
    ///
    /// Waits for the first prompt, moves to the dialect's working level and
    /// sends its setup commands.
    pub async fn open(&mut self) -> Result<()> {
        if self.live.is_some() {
            return Ok(());
        }

        let transport = SshTransport::connect(&self.ssh_config)
            .await
            .map_err(session_open)?;
        let channel = match transport.open_shell().await {
            Ok(channel) => channel,
            Err(e) => {
                if let Err(close_err) = transport.close().await {
                    debug!("shell: disconnect after failed channel open: {}", close_err);
                }
                return Err(session_open(e));
            }
        };
        self.live = Some(LiveChannel {
            transport,
            pty: PtyChannel::new(channel),
        });

        // A half-prepared channel must not be reused by a later call
        if let Err(e) = self.prepare().await {
            if let Err(close_err) = self.close().await {
                debug!("shell: disconnect after failed setup: {}", close_err);
            }
            return Err(e);
        }
        Ok(())
    }

    /// Classify the first prompt, reach the working level and run setup.
    async fn prepare(&mut self) -> Result<()> {
        let (_, prompt) = self.read_until_prompt().await?;
        match self.privileges.observe(&prompt) {
            Some(level) => debug!("shell: landed at '{}' ({:?})", level, prompt),
            None => warn!("shell: prompt {:?} is not a known {} level", prompt, self.dialect.name),
        }

        self.acquire_privilege(self.dialect.working_level).await?;

        for command in self.dialect.setup {
            self.send_raw(command).await?;
        }
        Ok(())
    }

    /// Read up to the next prompt, returning (output before prompt, prompt).
    async fn read_until_prompt(&mut self) -> Result<(String, String)> {
        let live = self.live.as_mut().ok_or(ExecutionError::NotConnected)?;
        let data = live
            .pty
            .read_until_pattern(&self.prompt, self.ssh_config.timeout)
            .await?;
        Ok(split_prompt(&self.prompt, &data))
    }

    async fn send_line(&mut self, line: &str) -> Result<()> {
        let live = self.live.as_mut().ok_or(ExecutionError::NotConnected)?;
        live.pty.send(line).await
    }

    /// Send a line and wait for the prompt without inspecting the output.
    async fn send_raw(&mut self, input: &str) -> Result<()> {
        self.send_line(input).await?;
        let (_, prompt) = self.read_until_prompt().await?;
        self.privileges.observe(&prompt);
        Ok(())
    }

    /// Walk the privilege graph to `target`.
    ///
    /// With no route from the current level (Nokia Classic CLI against an
    /// MD-CLI working level) the session stays where it is.
    async fn acquire_privilege(&mut self, target: &'static str) -> Result<()> {
        let Some(current) = self.privileges.current() else {
            return Ok(());
        };
        let Some(route) = self.privileges.route(current, target) else {
            debug!("shell: no route from '{}' to '{}', staying", current, target);
            return Ok(());
        };

        let mut at = current;
        for step in route {
            debug!("shell: '{}' -> '{}' via {:?}", at, step.to, step.command);
            let failed = || ExecutionError::PrivilegeAcquisitionFailed {
                target: step.to.to_string(),
            };
            self.send_line(step.command).await?;

            let prompt = match step.password_prompt {
                Some(password_prompt) => {
                    // Devices without an enable secret answer with the next prompt
                    let either = Regex::new(&format!(
                        "(?:{})|(?:{})",
                        password_prompt.as_str(),
                        self.prompt.as_str()
                    ))
                    .map_err(|_| failed())?;
                    let live = self.live.as_mut().ok_or(ExecutionError::NotConnected)?;
                    let data = live
                        .pty
                        .read_until_pattern(&either, self.ssh_config.timeout)
                        .await?;
                    if password_prompt.is_match(&data) {
                        live.pty.send_secret(self.ssh_config.password.expose_secret()).await?;
                        self.read_until_prompt().await?.1
                    } else {
                        split_prompt(&self.prompt, &data).1
                    }
                }
                None => self.read_until_prompt().await?.1,
            };

            if self.privileges.observe(&prompt) != Some(step.to) {
                return Err(failed());
            }
            at = step.to;
        }

        Ok(())
    }

    /// Send one command and return its normalized output.
    ///
    /// Output containing one of the dialect's failure markers is an error.
    pub async fn send_command(&mut self, command: &str) -> Result<String> {
        let start = Instant::now();
        self.send_line(command).await?;
        let (raw, prompt) = self.read_until_prompt().await?;
        self.privileges.observe(&prompt);

        let mut output = normalize_output(&raw, command);
        if let Some(post_process) = self.dialect.post_process {
            output = post_process(&output);
        }
        trace!("shell: {:?} answered in {:?}", command, start.elapsed());

        match self.dialect.failure_in(&output) {
            Some(marker) => Err(ExecutionError::CommandFailed {
                message: format!("output of {command:?} contains {marker:?}"),
            }),
            None => Ok(output),
        }
    }

    /// Close the channel and disconnect, if open. The privilege level is
    /// forgotten.
    ///
    /// The live handle is taken fresh on every call, so closing twice or
    /// closing a session that never opened is a no-op.
    pub async fn close(&mut self) -> std::result::Result<(), ConnectionError> {
        self.privileges = PrivilegeGraph::new(&self.dialect.levels);
        let Some(live) = self.live.take() else {
            debug!("shell: no open channel to {}, nothing to close", self.ssh_config.addr());
            return Ok(());
        };

        if let Err(e) = live.pty.close().await {
            debug!("shell: channel close on {}: {}", self.ssh_config.addr(), e);
        }
        live.transport.close().await
    }
}

/// Split raw output at the last prompt match.
fn split_prompt(pattern: &Regex, data: &[u8]) -> (String, String) {
    match pattern.find_iter(data).last() {
        Some(m) => (
            String::from_utf8_lossy(&data[..m.start()]).into_owned(),
            String::from_utf8_lossy(&data[m.start()..]).trim().to_string(),
        ),
        None => (String::from_utf8_lossy(data).into_owned(), String::new()),
    }
}

/// Strip the command echo and any trailing partial prompt line.
fn normalize_output(raw: &str, command: &str) -> String {
    let text = raw.replace("\r\n", "\n").replace('\r', "");
    let body = text.rfind('\n').map_or("", |pos| &text[..pos]);

    let mut lines: Vec<&str> = body.split('\n').collect();
    if lines
        .first()
        .is_some_and(|line| line.trim_end().ends_with(command.trim()))
    {
        lines.remove(0);
    }

    lines.join("\n").trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect;

    #[test]
    fn test_normalize_strips_echo_and_prompt() {
        let raw = "show version\r\nArista vEOS\r\nUptime: 1 week\r\n";
        assert_eq!(
            normalize_output(raw, "show version"),
            "Arista vEOS\nUptime: 1 week"
        );
    }

    #[test]
    fn test_normalize_drops_partial_prompt_line() {
        // Linux prompts match only on the trailing `$`
        let raw = "uname -s\r\nLinux\r\nnetops@jump01:~";
        assert_eq!(normalize_output(raw, "uname -s"), "Linux");
    }

    #[test]
    fn test_split_prompt_at_last_match() {
        let pattern = dialect::lookup("arista_eos").unwrap().any_prompt().unwrap();

        let data = b"show clock\r\nFri Oct 18 2024\r\nleaf1#";
        let (output, prompt) = split_prompt(&pattern, data);
        assert_eq!(prompt, "leaf1#");
        assert_eq!(output, "show clock\r\nFri Oct 18 2024\r\n");
    }

    #[test]
    fn test_multiline_prompt_split() {
        let pattern = dialect::lookup("nokia_sros").unwrap().any_prompt().unwrap();

        let data = b"show time\r\nThu Oct 17 12:00:00 UTC 2024\r\n\r\n[/]\r\nA:admin@pe1# ";
        let (output, prompt) = split_prompt(&pattern, data);
        assert!(prompt.starts_with("[/]"));
        assert_eq!(
            normalize_output(&output, "show time"),
            "Thu Oct 17 12:00:00 UTC 2024"
        );
    }

    #[test]
    fn test_new_session_is_not_live() {
        let config = SshConfig::new("192.0.2.1", "admin", "admin".into());
        let session = ShellSession::new(config, dialect::lookup("cisco_iosxe").unwrap()).unwrap();
        assert!(!session.is_live());
        assert_eq!(session.current_privilege(), None);
    }

    #[tokio::test]
    async fn test_failed_open_is_retried() {
        let config = SshConfig::new("127.0.0.1", "admin", "admin".into())
            .port(1)
            .timeout(std::time::Duration::from_secs(2));
        let mut session = ShellSession::new(config, dialect::lookup("arista_eos").unwrap()).unwrap();

        assert!(session.open().await.is_err());
        assert!(!session.is_live());

        // A second attempt reconnects instead of reusing a dead channel
        let err = session.open().await.unwrap_err();
        assert!(matches!(err, ExecutionError::SessionOpen(_)), "{err:?}");
        assert!(!session.is_live());
        assert!(session.send_command("show version").await.is_err());
    }
}
