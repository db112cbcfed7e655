//! Cisco IOS-XE.
//!
//! ```text
//! csr1>              exec
//! csr1#              privilege_exec
//! csr1(config-if)#   configuration
//! ```

use crate::dialect::{Dialect, Escalation, PrivilegeLevel};

pub const NAME: &str = "cisco_iosxe";

pub fn dialect() -> Result<Dialect, regex::Error> {
    let exec = PrivilegeLevel::new("exec", r"(?im)^[\w.\-@/:]{1,63}>\s?$")?;

    let enable = Escalation::new("exec", "enable", "disable")
        .with_password_prompt(r"(?im)^(?:enable\s)?password:\s?$")?;
    let privilege_exec = PrivilegeLevel::new("privilege_exec", r"(?im)^[\w.\-@/:]{1,63}#\s?$")?
        .reached_by(enable)
        .excluding("(conf");

    let configuration = PrivilegeLevel::new(
        "configuration",
        r"(?im)^[\w.\-@/:]{1,63}\(conf[\w.\-@/:+]{0,32}\)#\s?$",
    )?
    .reached_by(Escalation::new("privilege_exec", "configure terminal", "end"))
    .excluding("(config-tcl)")
    .excluding("(config-s");

    Ok(Dialect {
        name: NAME,
        levels: Dialect::index([exec, privilege_exec, configuration]),
        working_level: "privilege_exec",
        setup: &["terminal length 0", "terminal width 512"],
        failure_markers: &[
            "% Ambiguous command",
            "% Incomplete command",
            "% Invalid input detected",
            "% Unknown command",
        ],
        columns: 512,
        rows: 24,
        post_process: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts() {
        let ios = dialect().unwrap();
        let matches = |level: &str, prompt: &str| ios.level(level).unwrap().matches_prompt(prompt);

        assert!(matches("exec", "csr1>"));
        assert!(matches("privilege_exec", "csr1#"));
        assert!(!matches("privilege_exec", "csr1(config)#"));
        assert!(matches("configuration", "csr1(config-if)#"));
    }

    #[test]
    fn test_invalid_input_marker() {
        let ios = dialect().unwrap();
        let output = "show vresion\n        ^\n% Invalid input detected at '^' marker.";
        assert_eq!(ios.failure_in(output), Some("% Invalid input detected"));
    }
}
