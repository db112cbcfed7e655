//! Process-wide table of built-in dialects.

use indexmap::IndexMap;
use log::error;
use once_cell::sync::Lazy;

use super::{Dialect, vendors};

static DIALECTS: Lazy<IndexMap<&'static str, Dialect>> = Lazy::new(|| {
    let mut table = IndexMap::new();
    for built in vendors::builtin() {
        match built {
            Ok(dialect) => {
                table.insert(dialect.name, dialect);
            }
            Err(e) => error!("built-in dialect has a bad prompt pattern: {}", e),
        }
    }
    table
});

/// The built-in dialect called `name`.
pub fn lookup(name: &str) -> Option<&'static Dialect> {
    DIALECTS.get(name.trim())
}

/// Names of every built-in dialect.
pub fn names() -> impl Iterator<Item = &'static str> {
    DIALECTS.keys().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_builtin_compiles() {
        let mut all: Vec<_> = names().collect();
        all.sort_unstable();
        assert_eq!(
            all,
            [
                "arista_eos",
                "cisco_iosxe",
                "cisco_nxos",
                "juniper_junos",
                "linux",
                "nokia_sros"
            ]
        );
    }

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("cisco_iosxe").unwrap().name, "cisco_iosxe");
        assert_eq!(lookup(" linux ").unwrap().name, "linux");
        assert!(lookup("acme_os").is_none());
    }

    #[test]
    fn test_working_level_is_defined() {
        for name in names() {
            let dialect = lookup(name).unwrap();
            assert!(dialect.level(dialect.working_level).is_some(), "{name}");
            for level in dialect.levels.values() {
                if let Some(parent) = level.parent() {
                    assert!(dialect.level(parent).is_some(), "{name}: {}", level.name);
                }
            }
        }
    }
}
