//! Prompt-identified privilege levels.

use regex::bytes::Regex;

/// The edge between a level and the level it is entered from.
#[derive(Debug, Clone)]
pub struct Escalation {
    /// Level this one is entered from.
    pub from: &'static str,

    /// Command sent at `from` to get here.
    pub enter: &'static str,

    /// Command sent here to fall back to `from`.
    pub leave: &'static str,

    /// Set when the device may ask for a password after `enter`.
    pub password_prompt: Option<Regex>,
}

impl Escalation {
    pub fn new(from: &'static str, enter: &'static str, leave: &'static str) -> Self {
        Self {
            from,
            enter,
            leave,
            password_prompt: None,
        }
    }

    /// Expect a password prompt matching `pattern` after `enter`.
    pub fn with_password_prompt(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.password_prompt = Some(Regex::new(pattern)?);
        Ok(self)
    }
}

/// A CLI mode recognised by its prompt.
///
/// Levels without an [`Escalation`] are roots: a session can land in one
/// but never navigate into it.
#[derive(Debug, Clone)]
pub struct PrivilegeLevel {
    pub name: &'static str,

    /// Matches the prompt printed at this level.
    pub prompt: Regex,

    pub escalation: Option<Escalation>,

    /// Substrings that disqualify an otherwise matching prompt, for
    /// dialects where one prompt pattern is a prefix of another.
    pub excluded: Vec<&'static str>,
}

impl PrivilegeLevel {
    pub fn new(name: &'static str, prompt: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            prompt: Regex::new(prompt)?,
            escalation: None,
            excluded: Vec::new(),
        })
    }

    pub fn reached_by(mut self, escalation: Escalation) -> Self {
        self.escalation = Some(escalation);
        self
    }

    pub fn excluding(mut self, marker: &'static str) -> Self {
        self.excluded.push(marker);
        self
    }

    /// Level this one is entered from, if any.
    pub fn parent(&self) -> Option<&'static str> {
        self.escalation.as_ref().map(|e| e.from)
    }

    pub fn matches_prompt(&self, prompt: &str) -> bool {
        !self.excluded.iter().any(|marker| prompt.contains(marker))
            && self.prompt.is_match(prompt.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excluded_marker_wins_over_pattern() {
        let level = PrivilegeLevel::new("privileged", r"#\s*$")
            .unwrap()
            .excluding("(config");
        assert!(level.matches_prompt("router#"));
        assert!(!level.matches_prompt("router(config)#"));
    }

    #[test]
    fn test_escalation_parent() {
        let root = PrivilegeLevel::new("user", r">\s*$").unwrap();
        assert_eq!(root.parent(), None);

        let level = PrivilegeLevel::new("privileged", r"#\s*$")
            .unwrap()
            .reached_by(
                Escalation::new("user", "enable", "disable")
                    .with_password_prompt(r"[Pp]assword:\s*$")
                    .unwrap(),
            );
        assert_eq!(level.parent(), Some("user"));
        assert!(level.escalation.unwrap().password_prompt.is_some());
    }

    #[test]
    fn test_bad_password_prompt_rejected() {
        assert!(Escalation::new("a", "b", "c").with_password_prompt("(").is_err());
    }
}
