//! Generic Linux/Unix shell: `$` for a user, `#` for root.

use crate::dialect::{Dialect, Escalation, PrivilegeLevel};

pub const NAME: &str = "linux";

pub fn dialect() -> Result<Dialect, regex::Error> {
    let root = PrivilegeLevel::new("root", r"[#]\s*$")?.reached_by(
        Escalation::new("user", "sudo -i", "exit").with_password_prompt(r"[Pp]assword[:\s]*$")?,
    );

    Ok(Dialect {
        name: NAME,
        levels: Dialect::index([PrivilegeLevel::new("user", r"[$]\s*$")?, root]),
        working_level: "user",
        setup: &[],
        failure_markers: &[
            "command not found",
            "No such file or directory",
            "Permission denied",
            "Operation not permitted",
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
    fn test_user_and_root_prompts() {
        let linux = dialect().unwrap();
        let user = linux.level("user").unwrap();
        let root = linux.level("root").unwrap();

        assert!(user.matches_prompt("netops@jump01:~$ "));
        assert!(!user.matches_prompt("root@jump01:~# "));
        assert!(root.matches_prompt("root@jump01:~# "));
        assert_eq!(linux.working_level, "user");
    }

    #[test]
    fn test_shell_errors_are_failures() {
        let linux = dialect().unwrap();
        assert_eq!(
            linux.failure_in("bash: ip: command not found"),
            Some("command not found")
        );
        assert_eq!(linux.failure_in("Linux jump01 6.1.0-18-amd64"), None);
    }
}
