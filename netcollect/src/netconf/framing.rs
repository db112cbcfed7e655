//! NETCONF message framing (RFC 6242).
//!
//! Sessions start with end-of-message framing, where every message is
//! terminated by `]]>]]>`. When both peers advertise base:1.1 the session
//! switches to chunked framing: `\n#<size>\n<data>` chunks closed by `\n##\n`.

use bytes::{Buf, BytesMut};
use memchr::memmem;

use crate::error::ExecutionError;

type Result<T> = std::result::Result<T, ExecutionError>;

/// End-of-message delimiter for base:1.0 framing.
pub const EOM_DELIMITER: &[u8] = b"]]>]]>";

/// Largest chunk size RFC 6242 allows.
const MAX_CHUNK_SIZE: usize = 4_294_967_295;

/// Header digits needed for [`MAX_CHUNK_SIZE`].
const MAX_CHUNK_DIGITS: usize = 10;

/// Framing mechanism in use on a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    EndOfMessage,
    Chunked,
}

impl Framing {
    /// Wrap one message for the wire.
    pub fn encode(self, message: &str) -> Vec<u8> {
        match self {
            Framing::EndOfMessage => {
                let mut out = Vec::with_capacity(message.len() + EOM_DELIMITER.len());
                out.extend_from_slice(message.as_bytes());
                out.extend_from_slice(EOM_DELIMITER);
                out
            }
            Framing::Chunked => {
                format!("\n#{}\n{}\n##\n", message.len(), message).into_bytes()
            }
        }
    }
}

fn framing_error(message: impl Into<String>) -> ExecutionError {
    ExecutionError::Framing {
        message: message.into(),
    }
}

/// Incremental decoder for inbound messages.
#[derive(Debug)]
pub struct FrameDecoder {
    framing: Framing,
    buffer: BytesMut,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    /// Decoder in end-of-message mode.
    pub fn new() -> Self {
        Self {
            framing: Framing::EndOfMessage,
            buffer: BytesMut::with_capacity(8192),
        }
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// Change framing for subsequent messages. Buffered bytes are kept.
    pub fn set_framing(&mut self, framing: Framing) {
        self.framing = framing;
    }

    /// Append bytes read from the channel.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Pop the next complete message, if one is buffered.
    pub fn next_message(&mut self) -> Result<Option<String>> {
        match self.framing {
            Framing::EndOfMessage => Ok(self.next_eom()),
            Framing::Chunked => self.next_chunked(),
        }
    }

    fn next_eom(&mut self) -> Option<String> {
        let end = memmem::find(&self.buffer, EOM_DELIMITER)?;
        let message = self.buffer.split_to(end);
        self.buffer.advance(EOM_DELIMITER.len());
        Some(String::from_utf8_lossy(&message).trim().to_string())
    }

    /// Drop whitespace left over from the hello exchange, stopping at a
    /// chunk header. A lone trailing newline is kept since it may begin one.
    fn skip_leading_whitespace(&mut self) {
        loop {
            match self.buffer.first() {
                Some(b' ' | b'\r' | b'\t') => self.buffer.advance(1),
                Some(b'\n') if self.buffer.get(1).is_some_and(|&next| next != b'#') => {
                    self.buffer.advance(1)
                }
                _ => break,
            }
        }
    }

    fn next_chunked(&mut self) -> Result<Option<String>> {
        self.skip_leading_whitespace();

        let mut pos = 0;
        let mut message = Vec::new();
        loop {
            let rest = &self.buffer[pos..];
            if rest.len() < 4 {
                return Ok(None);
            }
            if !rest.starts_with(b"\n#") {
                return Err(framing_error("expected chunk header"));
            }

            if rest[2] == b'#' {
                if rest[3] != b'\n' {
                    return Err(framing_error("malformed end-of-chunks marker"));
                }
                self.buffer.advance(pos + 4);
                return Ok(Some(String::from_utf8_lossy(&message).trim().to_string()));
            }

            let Some(digits_len) = memchr::memchr(b'\n', &rest[2..]) else {
                if rest.len() - 2 > MAX_CHUNK_DIGITS {
                    return Err(framing_error("chunk header too long"));
                }
                return Ok(None);
            };
            let size = std::str::from_utf8(&rest[2..2 + digits_len])
                .ok()
                .and_then(|digits| digits.parse::<usize>().ok())
                .filter(|size| (1..=MAX_CHUNK_SIZE).contains(size))
                .ok_or_else(|| framing_error("invalid chunk size"))?;

            let start = 2 + digits_len + 1;
            if rest.len() < start + size {
                return Ok(None);
            }
            message.extend_from_slice(&rest[start..start + size]);
            pos += start + size;
        }
    }
}
