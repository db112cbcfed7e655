//! NETCONF message construction and inspection.

use once_cell::sync::Lazy;
use regex::Regex;

/// NETCONF base namespace.
pub const BASE_NAMESPACE: &str = "urn:ietf:params:xml:ns:netconf:base:1.0";

/// base:1.0 capability (end-of-message framing).
pub const CAPABILITY_BASE_1_0: &str = "urn:ietf:params:netconf:base:1.0";

/// base:1.1 capability (chunked framing).
pub const CAPABILITY_BASE_1_1: &str = "urn:ietf:params:netconf:base:1.1";

/// First message-id used on a session.
pub const FIRST_MESSAGE_ID: u64 = 101;

static CAPABILITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<(?:[\w.-]+:)?capability>\s*(.*?)\s*</(?:[\w.-]+:)?capability>")
        .expect("capability pattern is valid")
});

static SESSION_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(?:[\w.-]+:)?session-id>\s*(\d+)\s*</").expect("session-id pattern is valid")
});

static RPC_ERROR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(?:[\w.-]+:)?rpc-error[\s>/]").expect("rpc-error pattern is valid"));

static ERROR_MESSAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<(?:[\w.-]+:)?error-message[^>]*>\s*(.*?)\s*</(?:[\w.-]+:)?error-message>")
        .expect("error-message pattern is valid")
});

/// The client hello, advertising both base versions.
pub fn client_hello() -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <hello xmlns=\"{BASE_NAMESPACE}\"><capabilities>\
         <capability>{CAPABILITY_BASE_1_0}</capability>\
         <capability>{CAPABILITY_BASE_1_1}</capability>\
         </capabilities></hello>"
    )
}

/// Server hello contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerHello {
    pub capabilities: Vec<String>,
    pub session_id: Option<u32>,
}

impl ServerHello {
    /// Parse a `<hello>` message. Returns `None` if it carries no capabilities.
    pub fn parse(message: &str) -> Option<Self> {
        let capabilities: Vec<String> = CAPABILITY
            .captures_iter(message)
            .map(|caps| caps[1].to_string())
            .collect();
        if capabilities.is_empty() {
            return None;
        }

        let session_id = SESSION_ID
            .captures(message)
            .and_then(|caps| caps[1].parse().ok());

        Some(Self {
            capabilities,
            session_id,
        })
    }

    /// Whether the server speaks base:1.1.
    pub fn supports_base_1_1(&self) -> bool {
        self.capabilities.iter().any(|cap| cap == CAPABILITY_BASE_1_1)
    }
}

/// Wrap an operation body in an `<rpc>` element.
pub fn rpc(message_id: u64, body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <rpc xmlns=\"{BASE_NAMESPACE}\" message-id=\"{message_id}\">{}</rpc>",
        body.trim()
    )
}

/// If `reply` reports an `<rpc-error>`, the failure description.
pub fn rpc_error(reply: &str) -> Option<String> {
    if !RPC_ERROR.is_match(reply) {
        return None;
    }
    Some(
        ERROR_MESSAGE
            .captures(reply)
            .map(|caps| caps[1].to_string())
            .unwrap_or_else(|| "rpc-error without error-message".to_string()),
    )
}
