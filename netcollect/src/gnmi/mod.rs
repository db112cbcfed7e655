//! gNMI support: protobuf messages, path parsing, the `Get` client and
//! response formatting.

mod client;
mod format;
mod path;
pub mod proto;

pub use client::{ClientConfig, GnmiClient};
pub use format::{format_get_response, typed_value_to_json};
pub use path::{parse_path, path_to_string};

/// Default gNMI port.
pub const DEFAULT_PORT: u16 = 57400;
