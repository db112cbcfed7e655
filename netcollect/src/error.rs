//! Error types for netcollect.
//!
//! Every driver failure falls into one of three categories: the session
//! could not be established ([`ConnectionError`]), the operation failed
//! against a live session or the device reported failure
//! ([`ExecutionError`]), or the input was rejected before any I/O
//! ([`ValidationError`]). The batch loop branches on [`Error::kind`].

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main error type for netcollect operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Session setup failed; the driver instance is unusable.
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// The remote call failed or signalled failure.
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// Input rejected before any network call.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Inventory could not be loaded.
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),
}

/// Coarse error category, see [`Error::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Connection,
    Execution,
    Validation,
    Inventory,
}

impl Error {
    /// The taxonomy category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Connection(_) => ErrorKind::Connection,
            Error::Execution(_) => ErrorKind::Execution,
            Error::Validation(_) => ErrorKind::Validation,
            Error::Inventory(_) => ErrorKind::Inventory,
        }
    }
}

/// Session setup errors (TCP, SSH handshake, authentication, client construction).
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// Host key is not in known_hosts and strict checking is enabled
    #[error("Host key for {host}:{port} is unknown")]
    HostKeyUnknown { host: String, port: u16 },

    /// Host key does not match the known_hosts entry
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Operation timed out
    #[error("Connection timed out after {0:?}")]
    Timeout(Duration),

    /// No built-in CLI dialect has this name
    #[error("Unknown CLI dialect '{name}'")]
    UnknownDialect { name: String },

    /// Dialect prompts do not combine into one pattern
    #[error("Invalid CLI dialect '{name}': {source}")]
    InvalidDialect {
        name: String,
        #[source]
        source: regex::Error,
    },

    /// Failed to open a session channel or subsystem
    #[error("Failed to open channel: {0}")]
    ChannelOpen(String),

    /// NETCONF hello exchange failed
    #[error("NETCONF handshake failed: {message}")]
    Handshake { message: String },

    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// gRPC channel could not be established
    #[error("gRPC transport error: {0}")]
    Grpc(#[from] tonic::transport::Error),

    /// Credentials cannot be encoded for this protocol
    #[error("Invalid credentials: {message}")]
    InvalidCredentials { message: String },

    /// Target address cannot be turned into an endpoint
    #[error("Invalid endpoint '{endpoint}': {message}")]
    InvalidEndpoint { endpoint: String, message: String },
}

/// Errors raised while running an operation against a connected driver.
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// Driver not connected
    #[error("Driver not connected - call connect() first")]
    NotConnected,

    /// A deferred session could not be brought up
    #[error("Failed to open session: {0}")]
    SessionOpen(#[source] Box<ConnectionError>),

    /// SSH protocol error on a live channel
    #[error("Channel SSH error: {0}")]
    Ssh(#[source] russh::Error),

    /// Channel closed unexpectedly
    #[error("Channel closed")]
    ChannelClosed,

    /// Expected pattern or reply did not arrive in time
    #[error("No response within {0:?}")]
    Timeout(Duration),

    /// Device output matched a failure marker
    #[error("Command failed: {message}")]
    CommandFailed { message: String },

    /// Privilege level could not be reached
    #[error("Failed to acquire privilege level '{target}'")]
    PrivilegeAcquisitionFailed { target: String },

    /// Device reported an RPC-level failure
    #[error("RPC failed: {message}")]
    RpcFailed { message: String },

    /// Malformed protocol framing from the device
    #[error("Framing error: {message}")]
    Framing { message: String },

    /// HTTP request failed in transit
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP response carried an unexpected status
    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// gRPC call failed
    #[error("gRPC error: {0}")]
    Grpc(#[from] tonic::Status),

    /// Response body could not be decoded or encoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Input rejected before any network call.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// gNMI path string could not be parsed
    #[error("Invalid gNMI path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// HTTP method not recognised
    #[error("Invalid HTTP method '{method}'")]
    InvalidMethod { method: String },

    /// URL could not be built from base and endpoint
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Operation is empty after trimming
    #[error("Empty operation")]
    EmptyOperation,
}

/// Inventory loading errors.
#[derive(Error, Debug)]
pub enum InventoryError {
    /// Inventory file could not be read
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Inventory file is not valid YAML for the expected schema
    #[error("Failed to parse inventory: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Result type alias using netcollect's Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_follows_category() {
        let err: Error = ConnectionError::AuthenticationFailed {
            user: "admin".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Connection);

        let err: Error = ExecutionError::NotConnected.into();
        assert_eq!(err.kind(), ErrorKind::Execution);

        let err: Error = ValidationError::EmptyOperation.into();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_http_status_message_carries_body() {
        let err: Error = ExecutionError::HttpStatus {
            status: 401,
            body: "Unauthorized".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Execution error: HTTP status 401: Unauthorized"
        );
    }
}
