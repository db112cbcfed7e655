//! Nokia SR OS, MD-CLI and Classic CLI.
//!
//! The engine is whichever one the first prompt belongs to. MD-CLI prints a
//! context line (`[/]`) above `A:user@node#`; Classic prints only `A:node#`.
//! Neither engine's levels lead to the other's, so a Classic session stays
//! at `classic_exec` even though MD-CLI `exec` is the working level.

use crate::dialect::{Dialect, Escalation, PrivilegeLevel};

pub const NAME: &str = "nokia_sros";

pub fn dialect() -> Result<Dialect, regex::Error> {
    let exec = PrivilegeLevel::new(
        "exec",
        r"(?mi)^\[.*\]\r?\n\*?[abcd]:[\w._-]+@[\w\s_.-]+#\s?$",
    )?
    .excluding("(ex)")
    .excluding("(ro)")
    .excluding("(gl)")
    .excluding("(pr)");

    let configuration = PrivilegeLevel::new(
        "configuration",
        r"(?mi)^!?\*?\((?:ex|ex:bof)\)\[/?\]\r?\n\*?[abcd]:[\w._-]+@[\w\s_.-]+#\s?$",
    )?
    .reached_by(Escalation::new("exec", "edit-config exclusive", "quit-config"));

    // "@" only appears in the MD-CLI prompt line
    let classic_exec = PrivilegeLevel::new("classic_exec", r"(?mi)^\*?[abcd]:[\w\s_.-]+#\s?$")?
        .excluding("@")
        .excluding(">config");

    Ok(Dialect {
        name: NAME,
        levels: Dialect::index([exec, configuration, classic_exec]),
        working_level: "exec",
        setup: &[
            "environment command-completion space false",
            "environment console width 512",
            "environment more false",
            "//environment no more",
        ],
        failure_markers: &["MINOR:", "MAJOR:", "CRITICAL:", "Error:", "Bad Command:"],
        columns: 512,
        rows: 24,
        post_process: None,
    })
}
