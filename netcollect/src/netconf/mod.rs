//! NETCONF 1.0/1.1 session engine.

mod framing;
mod message;
mod session;

pub use framing::{EOM_DELIMITER, FrameDecoder, Framing};
pub use message::{CAPABILITY_BASE_1_0, CAPABILITY_BASE_1_1, ServerHello, rpc_error};
pub use session::{NetconfSession, SUBSYSTEM};
