//! SSH transport on russh.
//!
//! One connection per device session. The CLI driver asks for a PTY shell,
//! the NETCONF driver for the `netconf` subsystem.

mod config;
mod ssh;

pub use config::{HostKeyVerification, SshConfig};
pub use ssh::SshTransport;
