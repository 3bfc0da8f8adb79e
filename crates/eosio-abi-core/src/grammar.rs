//! Field type grammar.
//!
//! An ABI field type is a base type name decorated with up to four markers:
//!
//! | marker | meaning |
//! |--------|---------|
//! | `[]`   | list, varuint32 count prefix |
//! | `?`    | optional, one presence byte |
//! | `$`    | binary extension, may be absent at the end of a struct |
//! | `@`    | variant member slot |
//!
//! Markers are independent and may appear in any order (`"foo[]$@"`,
//! `"action_data@$"`). Each marker may appear at most once.

use crate::error::{AbiError, Result};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedType {
    pub base: String,
    pub is_list: bool,
    pub is_optional: bool,
    pub is_extension: bool,
    pub is_variant_member: bool,
}

impl ParsedType {
    /// Type with no markers
    pub fn plain(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            is_list: false,
            is_optional: false,
            is_extension: false,
            is_variant_member: false,
        }
    }

    pub fn has_markers(&self) -> bool {
        self.is_list || self.is_optional || self.is_extension || self.is_variant_member
    }

    /// Merge the markers of an alias target into this type, keeping `base`
    /// from `target`. Used when a field names an alias like `names -> name[]`.
    pub(crate) fn merge_alias(&self, target: &ParsedType, raw: &str) -> Result<ParsedType> {
        if (self.is_list && target.is_list) || (self.is_optional && target.is_optional) {
            return Err(AbiError::MalformedTypeString(raw.to_string()));
        }
        Ok(ParsedType {
            base: target.base.clone(),
            is_list: self.is_list || target.is_list,
            is_optional: self.is_optional || target.is_optional,
            is_extension: self.is_extension || target.is_extension,
            is_variant_member: self.is_variant_member || target.is_variant_member,
        })
    }
}

impl fmt::Display for ParsedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        if self.is_list {
            write!(f, "[]")?;
        }
        if self.is_optional {
            write!(f, "?")?;
        }
        if self.is_extension {
            write!(f, "$")?;
        }
        if self.is_variant_member {
            write!(f, "@")?;
        }
        Ok(())
    }
}

/// Parse a raw ABI field type string
pub fn parse_type(raw: &str) -> Result<ParsedType> {
    let malformed = || AbiError::MalformedTypeString(raw.to_string());
    let mut parsed = ParsedType::plain(String::with_capacity(raw.len()));

    let mut chars = raw.trim().chars().peekable();
    while let Some(c) = chars.next() {
        let flag = match c {
            '[' => {
                if chars.next() != Some(']') {
                    return Err(malformed());
                }
                &mut parsed.is_list
            }
            '?' => &mut parsed.is_optional,
            '$' => &mut parsed.is_extension,
            '@' => &mut parsed.is_variant_member,
            ']' => return Err(malformed()),
            c if c.is_whitespace() => return Err(malformed()),
            c => {
                parsed.base.push(c);
                continue;
            }
        };
        if *flag {
            return Err(malformed());
        }
        *flag = true;
    }

    if parsed.base.is_empty() {
        return Err(malformed());
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_type() {
        let t = parse_type("name").unwrap();
        assert_eq!(t, ParsedType::plain("name"));
        assert!(!t.has_markers());
    }

    #[test]
    fn test_single_markers() {
        assert!(parse_type("asset[]").unwrap().is_list);
        assert!(parse_type("asset?").unwrap().is_optional);
        assert!(parse_type("name$").unwrap().is_extension);
        assert!(parse_type("action_data@").unwrap().is_variant_member);
    }

    #[test]
    fn test_combined_markers_any_order() {
        let a = parse_type("foo[]$@").unwrap();
        let b = parse_type("foo@$[]").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.base, "foo");
        assert!(a.is_list && a.is_extension && a.is_variant_member);
        assert!(!a.is_optional);

        let c = parse_type("asset[]?").unwrap();
        assert!(c.is_list && c.is_optional);

        let d = parse_type("action_data@$").unwrap();
        assert!(d.is_variant_member && d.is_extension);
    }

    #[test]
    fn test_empty_base_is_malformed() {
        for raw in ["", "[]", "?$", "  ", "[]?$@"] {
            assert!(
                matches!(parse_type(raw), Err(AbiError::MalformedTypeString(_))),
                "expected malformed: {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_repeated_or_broken_markers() {
        assert!(parse_type("name[][]").is_err());
        assert!(parse_type("name??").is_err());
        assert!(parse_type("name[").is_err());
        assert!(parse_type("name[5]").is_err());
    }

    #[test]
    fn test_display_is_canonical() {
        let t = parse_type("foo$@[]").unwrap();
        assert_eq!(t.to_string(), "foo[]$@");
    }
}
