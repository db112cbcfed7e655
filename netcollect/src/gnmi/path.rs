//! Path string parsing and rendering.
//!
//! Grammar: `[origin:]/elem[key=value]/elem/...`. The leading `/` is
//! optional, a trailing `/` is ignored. Inside `[...]`, `\]` and `\\`
//! escape a literal `]` or `\`, and `/` does not split elements.

use std::collections::BTreeMap;

use super::proto::{Path, PathElem};
use crate::error::ValidationError;

type Reason = &'static str;

/// Parse a path string.
pub fn parse_path(input: &str) -> Result<Path, ValidationError> {
    let invalid = |reason: Reason| ValidationError::InvalidPath {
        path: input.to_string(),
        reason: reason.to_string(),
    };

    let (origin, rest) = split_origin(input);
    let elem = split_elements(rest)
        .map_err(invalid)?
        .iter()
        .map(|raw| parse_elem(raw))
        .collect::<Result<Vec<_>, _>>()
        .map_err(invalid)?;

    Ok(Path {
        origin: origin.to_string(),
        elem,
        target: String::new(),
    })
}

/// `origin:` is only recognised before the first `/`, and only when
/// followed by `/` or the end of input.
fn split_origin(input: &str) -> (&str, &str) {
    let Some(colon) = input.find(':') else {
        return ("", input);
    };
    let head = &input[..colon];
    let tail = &input[colon + 1..];
    if head.is_empty() || head.contains('/') || head.contains('[') {
        return ("", input);
    }
    if tail.is_empty() || tail.starts_with('/') {
        (head, tail)
    } else {
        ("", input)
    }
}

fn split_elements(path: &str) -> Result<Vec<String>, Reason> {
    let mut elements = Vec::new();
    let mut current = String::new();
    let mut in_key = false;
    let mut chars = path.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' if in_key => {
                current.push(c);
                current.push(chars.next().ok_or("dangling escape")?);
            }
            '[' if !in_key => {
                in_key = true;
                current.push(c);
            }
            ']' if in_key => {
                in_key = false;
                current.push(c);
            }
            ']' => return Err("unbalanced brackets"),
            '/' if !in_key => elements.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    if in_key {
        return Err("unbalanced brackets");
    }
    elements.push(current);

    if elements.first().is_some_and(String::is_empty) {
        elements.remove(0);
    }
    if elements.last().is_some_and(String::is_empty) {
        elements.pop();
    }
    if elements.iter().any(String::is_empty) {
        return Err("empty element name");
    }
    Ok(elements)
}

fn parse_elem(raw: &str) -> Result<PathElem, Reason> {
    let (name, mut rest) = match raw.find('[') {
        Some(pos) => (&raw[..pos], &raw[pos..]),
        None => (raw, ""),
    };
    if name.is_empty() {
        return Err("empty element name");
    }

    let mut key = BTreeMap::new();
    while !rest.is_empty() {
        let Some(body) = rest.strip_prefix('[') else {
            return Err("unbalanced brackets");
        };

        let eq = body.find(['=', ']']).ok_or("unbalanced brackets")?;
        if body.as_bytes()[eq] == b']' {
            return Err("key without '='");
        }
        let key_name = body[..eq].trim();
        if key_name.is_empty() {
            return Err("empty key name");
        }

        let (value, consumed) = unescape_value(&body[eq + 1..])?;
        key.insert(key_name.to_string(), value);
        rest = &body[eq + 1 + consumed..];
    }

    Ok(PathElem {
        name: name.to_string(),
        key,
    })
}

/// Read a key value up to its closing `]`. Returns the value and the
/// number of bytes consumed, including the `]`.
fn unescape_value(s: &str) -> Result<(String, usize), Reason> {
    let mut value = String::new();
    let mut chars = s.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                let (_, escaped) = chars.next().ok_or("dangling escape")?;
                value.push(escaped);
            }
            ']' => return Ok((value, i + 1)),
            _ => value.push(c),
        }
    }
    Err("unbalanced brackets")
}

/// Render a path as `origin:elem[key=value]/elem`, keys in sorted order.
pub fn path_to_string(path: &Path) -> String {
    let mut out = String::new();
    if !path.origin.is_empty() {
        out.push_str(&path.origin);
        out.push(':');
    }
    let elems: Vec<String> = path.elem.iter().map(elem_to_string).collect();
    out.push_str(&elems.join("/"));
    out
}

fn elem_to_string(elem: &PathElem) -> String {
    let mut out = elem.name.clone();
    for (k, v) in &elem.key {
        out.push('[');
        out.push_str(k);
        out.push('=');
        out.push_str(v);
        out.push(']');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(path: &Path) -> Vec<&str> {
        path.elem.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_plain_path() {
        let path = parse_path("/interfaces/interface/state").unwrap();
        assert_eq!(path.origin, "");
        assert_eq!(names(&path), vec!["interfaces", "interface", "state"]);

        let path = parse_path("system/config/").unwrap();
        assert_eq!(names(&path), vec!["system", "config"]);
    }

    #[test]
    fn test_keys_and_origin() {
        let path = parse_path("openconfig:/interfaces/interface[name=Ethernet1/1]/state").unwrap();
        assert_eq!(path.origin, "openconfig");
        assert_eq!(path.elem[1].key.get("name").map(String::as_str), Some("Ethernet1/1"));
        assert_eq!(
            path_to_string(&path),
            "openconfig:interfaces/interface[name=Ethernet1/1]/state"
        );
    }

    #[test]
    fn test_multiple_keys_and_escapes() {
        let path = parse_path(r"/a/b[x=1][y=a\]b\\c]").unwrap();
        let keys = &path.elem[1].key;
        assert_eq!(keys["x"], "1");
        assert_eq!(keys["y"], r"a]b\c");
    }

    #[test]
    fn test_root_paths() {
        assert!(parse_path("").unwrap().elem.is_empty());
        assert!(parse_path("/").unwrap().elem.is_empty());
        assert_eq!(parse_path("rfc7951:").unwrap().origin, "rfc7951");
    }

    #[test]
    fn test_colon_inside_key_is_not_origin() {
        let path = parse_path("/network-instances/network-instance[name=vrf:red]").unwrap();
        assert_eq!(path.origin, "");
        assert_eq!(path.elem[1].key["name"], "vrf:red");
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in [
            "/a/b[name=x",
            "/a/b]",
            "/a/b[name]",
            "/a/b[=x]",
            "/a//b",
            "/a/[k=v]",
            "/a/b[k=v]c",
        ] {
            let err = parse_path(bad).unwrap_err();
            assert!(
                matches!(err, ValidationError::InvalidPath { .. }),
                "{bad} should be rejected"
            );
        }
    }
}
