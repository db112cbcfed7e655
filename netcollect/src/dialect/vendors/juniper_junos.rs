//! Juniper Junos.
//!
//! Operational mode ends in `>` and configuration mode in `#`. Both may be
//! preceded by a `{master:0}` routing-engine line, and configuration mode
//! also prints an `[edit]` context line.

use crate::dialect::{Dialect, Escalation, PrivilegeLevel};

pub const NAME: &str = "juniper_junos";

pub fn dialect() -> Result<Dialect, regex::Error> {
    let exec = PrivilegeLevel::new(
        "exec",
        r"(?mi)^(\{\w+(:(\w+)?\d)?\}\r?\n)?[\w\-@()/:\.]{1,63}>\s?$",
    )?;

    let configuration = PrivilegeLevel::new(
        "configuration",
        r"(?mi)^(\{\w+(:(\w+)?\d)?\}\[edit\]\r?\n)?[\w\-@()/:\.]{1,63}#\s?$",
    )?
    .reached_by(Escalation::new("exec", "configure", "exit configuration-mode"));

    Ok(Dialect {
        name: NAME,
        levels: Dialect::index([exec, configuration]),
        working_level: "exec",
        setup: &["set cli screen-length 0", "set cli screen-width 511"],
        failure_markers: &[
            "unknown command",
            "syntax error",
            "is ambiguous",
            "No valid completions",
            "missing mandatory argument",
        ],
        columns: 511,
        rows: 24,
        post_process: Some(strip_context_lines),
    })
}

/// Drop routing-engine and `[edit]` lines that trail or lead the output.
fn strip_context_lines(output: &str) -> String {
    output
        .lines()
        .filter(|line| {
            let line = line.trim();
            !line.starts_with("[edit") && !line.starts_with("{master")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts() {
        let junos = dialect().unwrap();
        let exec = junos.level("exec").unwrap();
        let config = junos.level("configuration").unwrap();

        assert!(exec.matches_prompt("netops@mx1>"));
        assert!(exec.matches_prompt("{master:0}\nnetops@mx1>"));
        assert!(config.matches_prompt("netops@mx1#"));
        assert!(!exec.matches_prompt("netops@mx1#"));
    }

    #[test]
    fn test_context_lines_removed() {
        let junos = dialect().unwrap();
        let process = junos.post_process.unwrap();
        assert_eq!(
            process("{master:0}\nHostname: mx1\nModel: mx204\n[edit]"),
            "Hostname: mx1\nModel: mx204"
        );
    }
}
