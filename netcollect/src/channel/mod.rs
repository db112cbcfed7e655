//! Interactive shell channels: prompt-driven reads over a PTY.

mod buffer;
mod pty;

pub use buffer::TextBuffer;
pub use pty::PtyChannel;
