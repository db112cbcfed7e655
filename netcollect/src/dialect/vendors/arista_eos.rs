//! Arista EOS.
//!
//! `switch>` is exec, `switch#` privileged exec, and any `switch(config...)#`
//! is configuration. Configuration sessions (`config-s-...`) are left out so a
//! stray session prompt is never mistaken for plain configuration.

use crate::dialect::{Dialect, Escalation, PrivilegeLevel};

pub const NAME: &str = "arista_eos";

pub fn dialect() -> Result<Dialect, regex::Error> {
    let exec = PrivilegeLevel::new("exec", r"(?mi)^[\w.\-@()/: ]{1,63}>\s?$")?;

    let privilege_exec = PrivilegeLevel::new("privilege_exec", r"(?mi)^[\w.\-@()/: ]{1,63}#\s?$")?
        .reached_by(
            Escalation::new("exec", "enable", "disable")
                .with_password_prompt(r"(?mi)^password:\s?$")?,
        )
        .excluding("(config");

    let configuration = PrivilegeLevel::new(
        "configuration",
        r"(?mi)^[\w.\-@()/: ]{1,63}\(config[\w.\-@/:+]{0,63}\)#\s?$",
    )?
    .reached_by(Escalation::new("privilege_exec", "configure terminal", "end"))
    .excluding("(config-s-");

    Ok(Dialect {
        name: NAME,
        levels: Dialect::index([exec, privilege_exec, configuration]),
        working_level: "privilege_exec",
        setup: &["terminal length 0", "terminal width 32767"],
        failure_markers: &[
            "% Ambiguous command",
            "% Error",
            "% Incomplete command",
            "% Invalid input",
            "% Cannot commit",
            "% Unavailable command",
        ],
        columns: 32767,
        rows: 24,
        post_process: None,
    })
}
