//! Identifier and string literal encoding
//!
//! Names made only of `[-a-zA-Z$._0-9]` that do not start with a digit are
//! printed bare; every other name is quoted. Inside quotes, bytes outside
//! printable ASCII as well as `"` and `\` are written as `\XX` (upper-case
//! hex).

use std::fmt::Write;

fn is_ident_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b'-' | b'$' | b'.' | b'_')
}

fn is_plain_ident(name: &str) -> bool {
    let bytes = name.as_bytes();
    match bytes.first() {
        None => false,
        Some(first) if first.is_ascii_digit() => false,
        Some(_) => bytes.iter().all(|&c| is_ident_char(c)),
    }
}

fn escape_into(out: &mut String, bytes: &[u8], keep: impl Fn(u8) -> bool) {
    for &b in bytes {
        if keep(b) {
            out.push(b as char);
        } else {
            // Writing to a String never fails.
            let _ = write!(out, "\\{:02X}", b);
        }
    }
}

/// Escape a byte string for use between double quotes
pub fn escape(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    escape_into(&mut out, bytes, |b| {
        (b' '..=b'~').contains(&b) && b != b'"' && b != b'\\'
    });
    out
}

/// `"text"` with escapes
pub fn quote(s: &str) -> String {
    quote_bytes(s.as_bytes())
}

pub fn quote_bytes(bytes: &[u8]) -> String {
    format!("\"{}\"", escape(bytes))
}

fn ident(prefix: char, name: &str) -> String {
    if is_plain_ident(name) {
        format!("{prefix}{name}")
    } else {
        format!("{prefix}{}", quote(name))
    }
}

/// `@name` or `@"quoted name"`
pub fn global_name(name: &str) -> String {
    ident('@', name)
}

pub fn global_id(id: u64) -> String {
    format!("@{id}")
}

/// `%name` or `%"quoted name"`
pub fn local_name(name: &str) -> String {
    ident('%', name)
}

pub fn local_id(id: u64) -> String {
    format!("%{id}")
}

/// Label name as written at the start of a basic block (without `%`)
pub fn label_name(name: &str) -> String {
    if is_plain_ident(name) {
        name.to_string()
    } else {
        quote(name)
    }
}

pub fn type_name(name: &str) -> String {
    ident('%', name)
}

pub fn comdat_name(name: &str) -> String {
    ident('$', name)
}

pub fn attr_group_id(id: u64) -> String {
    format!("#{id}")
}

/// `!name`; metadata names are never quoted, offending bytes are escaped
/// in place.
pub fn metadata_name(name: &str) -> String {
    let mut out = String::from("!");
    escape_into(&mut out, name.as_bytes(), |b| {
        is_ident_char(b) || b == b'\\'
    });
    out
}

pub fn metadata_id(id: u64) -> String {
    format!("!{id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_and_quoted_names() {
        assert_eq!(global_name("main"), "@main");
        assert_eq!(global_name("foo.bar$1"), "@foo.bar$1");
        assert_eq!(global_name("hello world"), "@\"hello world\"");
        assert_eq!(global_name("42"), "@\"42\"");
        assert_eq!(local_name("1x"), "%\"1x\"");
        assert_eq!(comdat_name("any"), "$any");
    }

    #[test]
    fn test_escape() {
        assert_eq!(quote("a\"b\\c"), "\"a\\22b\\5Cc\"");
        assert_eq!(quote_bytes(b"hi\n\0"), "\"hi\\0A\\00\"");
    }

    #[test]
    fn test_labels_and_metadata() {
        assert_eq!(label_name("entry"), "entry");
        assert_eq!(label_name("0"), "\"0\"");
        assert_eq!(metadata_name("llvm.module.flags"), "!llvm.module.flags");
        assert_eq!(metadata_name("a b"), "!a\\20b");
        assert_eq!(metadata_id(7), "!7");
        assert_eq!(attr_group_id(0), "#0");
    }
}
