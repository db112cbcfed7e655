//! CLI dialects.
//!
//! A dialect describes how one device family's CLI behaves over an
//! interactive shell: which prompts it prints, how its privilege levels
//! connect, what to send after login to disable paging, and which output
//! substrings mean a command was rejected. The Shell/CLI driver picks one
//! by the inventory `type` field.

mod level;
mod registry;
pub mod vendors;

pub use level::{Escalation, PrivilegeLevel};
pub use registry::{lookup, names};

use indexmap::IndexMap;

/// Privilege levels keyed by name.
///
/// Iteration order is prompt matching priority.
pub type Levels = IndexMap<&'static str, PrivilegeLevel>;

/// Everything the Shell/CLI driver needs to know about one device family.
#[derive(Debug, Clone)]
pub struct Dialect {
    /// Name used in the inventory (e.g. `arista_eos`).
    pub name: &'static str,

    pub levels: Levels,

    /// Level commands are sent from.
    pub working_level: &'static str,

    /// Sent once after login, at the working level.
    pub setup: &'static [&'static str],

    /// Output substrings that mark a failed command.
    pub failure_markers: &'static [&'static str],

    /// PTY size requested from the server.
    pub columns: u32,
    pub rows: u32,

    /// Applied to normalized command output.
    pub post_process: Option<fn(&str) -> String>,
}

impl Dialect {
    /// Index `levels` by name, keeping their order.
    pub fn index(levels: impl IntoIterator<Item = PrivilegeLevel>) -> Levels {
        levels.into_iter().map(|level| (level.name, level)).collect()
    }

    pub fn level(&self, name: &str) -> Option<&PrivilegeLevel> {
        self.levels.get(name)
    }

    /// First failure marker contained in `output`.
    pub fn failure_in(&self, output: &str) -> Option<&'static str> {
        self.failure_markers
            .iter()
            .copied()
            .find(|marker| output.contains(marker))
    }

    /// One pattern matching any level's prompt.
    pub fn any_prompt(&self) -> Result<regex::bytes::Regex, regex::Error> {
        if self.levels.is_empty() {
            return regex::bytes::Regex::new(r"[$#>]\s*$");
        }
        let alternatives: Vec<String> = self
            .levels
            .values()
            .map(|level| format!("(?:{})", level.prompt.as_str()))
            .collect();
        regex::bytes::Regex::new(&alternatives.join("|"))
    }
}
