//! Cisco NX-OS. Maintenance mode adds `(maint-mode)` before the `#`.

use crate::dialect::{Dialect, Escalation, PrivilegeLevel};

pub const NAME: &str = "cisco_nxos";

pub fn dialect() -> Result<Dialect, regex::Error> {
    let exec = PrivilegeLevel::new("exec", r"(?im)^[\w.\-]{1,63}>\s?$")?;

    let privilege_exec = PrivilegeLevel::new(
        "privilege_exec",
        r"(?im)^[\w.\-]{1,63}(?:\(maint-mode\))?#\s?$",
    )?
    .reached_by(
        Escalation::new("exec", "enable", "disable")
            .with_password_prompt(r"(?im)^[pP]assword:\s?$")?,
    )
    .excluding("-tcl");

    let configuration = PrivilegeLevel::new(
        "configuration",
        r"(?im)^[\w.\-]{1,63}(?:\(maint-mode\))?\(config[\w.\-@/:+]{0,32}\)#\s?$",
    )?
    .reached_by(Escalation::new("privilege_exec", "configure terminal", "end"))
    .excluding("-tcl");

    Ok(Dialect {
        name: NAME,
        levels: Dialect::index([exec, privilege_exec, configuration]),
        working_level: "privilege_exec",
        setup: &["terminal length 0", "terminal width 511"],
        failure_markers: &[
            "% Ambiguous command",
            "% Incomplete command",
            "% Invalid input detected",
            "% Invalid command at",
            "% Invalid parameter detected",
            "syntax error, expecting",
        ],
        columns: 511,
        rows: 24,
        post_process: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts() {
        let nxos = dialect().unwrap();
        let enabled = nxos.level("privilege_exec").unwrap();
        let config = nxos.level("configuration").unwrap();

        assert!(enabled.matches_prompt("n9k-spine1#"));
        assert!(enabled.matches_prompt("n9k-spine1(maint-mode)#"));
        assert!(config.matches_prompt("n9k-spine1(config-if)#"));
        assert!(!config.matches_prompt("n9k-spine1#"));
    }
}
