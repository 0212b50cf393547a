//! Line-based parser for `typedef enum { … } name;` blocks in C headers.
//!
//! The parser is a small state machine. It waits for a `typedef enum {` line,
//! collects enumerators until the closing `} <name>;` line and ignores every
//! other line of the header. A block closed under a different name is
//! discarded and scanning resumes, so headers declaring several enums are
//! fine. Reaching end of input inside the requested block is an error.

use crate::{CodegenError, Result};
use std::path::Path;

/// Largest enumerator value a lookup table can hold.
pub const MAX_ENUM_VALUE: i64 = 255;

/// One enumerator and its resolved value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumEntry {
    /// Enumerator identifier.
    pub name: String,
    /// Resolved value.
    pub value: u8,
    /// 1-based line the enumerator was declared on.
    pub line: usize,
}

/// A parsed enum block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDefinition {
    /// Typedef name, e.g. `control_ret_t`.
    pub name: String,
    /// Enumerators in declaration order.
    pub entries: Vec<EnumEntry>,
}

impl EnumDefinition {
    /// Value of enumerator `name`.
    pub fn value_of(&self, name: &str) -> Option<u8> {
        self.entries.iter().find(|e| e.name == name).map(|e| e.value)
    }

    /// Highest declared value.
    pub fn max_value(&self) -> Option<u8> {
        self.entries.iter().map(|e| e.value).max()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Searching,
    InBlock { start_line: usize },
}

/// Parse the enum typedef'd as `enum_name` from header text.
pub fn parse_enum(source: &str, enum_name: &str) -> Result<EnumDefinition> {
    let mut state = State::Searching;
    let mut entries: Vec<EnumEntry> = Vec::new();
    let mut in_comment = false;

    for (idx, raw) in source.lines().enumerate() {
        let line_no = idx + 1;
        let line = strip_comments(raw, &mut in_comment);

        match state {
            State::Searching => {
                if let Some(rest) = block_start(&line) {
                    entries.clear();
                    state = State::InBlock {
                        start_line: line_no,
                    };
                    collect_entries(rest, line_no, &mut entries)?;
                }
            }
            State::InBlock { start_line } => {
                if let Some(rest) = block_start(&line) {
                    // A new block before this one closed; restart like a
                    // fresh header would.
                    tracing::warn!(line = line_no, previous = start_line, "nested enum start");
                    entries.clear();
                    state = State::InBlock {
                        start_line: line_no,
                    };
                    collect_entries(rest, line_no, &mut entries)?;
                    continue;
                }

                if let Some((body, closed_name)) = block_end(&line) {
                    if closed_name == enum_name {
                        collect_entries(body, line_no, &mut entries)?;
                        if entries.is_empty() {
                            return Err(CodegenError::EmptyEnum {
                                enum_name: enum_name.to_string(),
                            });
                        }
                        tracing::debug!(
                            enum_name,
                            entries = entries.len(),
                            lines = line_no - start_line + 1,
                            "parsed enum block"
                        );
                        return Ok(EnumDefinition {
                            name: enum_name.to_string(),
                            entries,
                        });
                    }
                    tracing::debug!(closed_name, line = line_no, "skipping unrelated enum");
                    entries.clear();
                    state = State::Searching;
                    continue;
                }

                collect_entries(&line, line_no, &mut entries)?;
            }
        }
    }

    match state {
        State::Searching => Err(CodegenError::NotFound {
            enum_name: enum_name.to_string(),
        }),
        State::InBlock { start_line } => Err(CodegenError::Unterminated {
            enum_name: enum_name.to_string(),
            start_line,
        }),
    }
}

/// Read a header file and parse `enum_name` from it.
pub fn parse_enum_file(path: impl AsRef<Path>, enum_name: &str) -> Result<EnumDefinition> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|e| CodegenError::read_file(path, e))?;
    parse_enum(&source, enum_name)
}

/// Remove `//` and `/* */` comments, tracking block comments across lines.
fn strip_comments(line: &str, in_comment: &mut bool) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    loop {
        if *in_comment {
            match rest.find("*/") {
                Some(end) => {
                    rest = &rest[end + 2..];
                    *in_comment = false;
                }
                None => return out,
            }
        }
        let block = rest.find("/*");
        let single = rest.find("//");
        match (block, single) {
            (Some(b), Some(s)) if s < b => {
                out.push_str(&rest[..s]);
                return out;
            }
            (None, Some(s)) => {
                out.push_str(&rest[..s]);
                return out;
            }
            (Some(b), _) => {
                out.push_str(&rest[..b]);
                out.push(' ');
                rest = &rest[b + 2..];
                *in_comment = true;
            }
            (None, None) => {
                out.push_str(rest);
                return out;
            }
        }
    }
}

/// If `line` opens an enum block, return what follows the `{`.
fn block_start(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix("typedef")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim_start().strip_prefix("enum")?;
    let rest = rest.trim_start().strip_prefix('{')?;
    Some(rest)
}

/// If `line` closes a block as `} name;`, return the text before `}` and the name.
fn block_end(line: &str) -> Option<(&str, &str)> {
    let (body, after) = line.split_once('}')?;
    let name = after.trim().strip_suffix(';')?.trim();
    if is_identifier(name) {
        Some((body, name))
    } else {
        None
    }
}

fn collect_entries(text: &str, line_no: usize, entries: &mut Vec<EnumEntry>) -> Result<()> {
    for piece in text.split(',') {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        let entry = parse_entry(piece, line_no, entries)?;
        entries.push(entry);
    }
    Ok(())
}

fn parse_entry(piece: &str, line_no: usize, previous: &[EnumEntry]) -> Result<EnumEntry> {
    let malformed = || CodegenError::MalformedEntry {
        line: line_no,
        text: piece.to_string(),
    };

    let (name, value_text) = match piece.split_once('=') {
        Some((n, v)) => (n.trim(), Some(v.trim())),
        None => (piece, None),
    };
    if !is_identifier(name) {
        return Err(malformed());
    }

    let value = match value_text {
        Some(text) => parse_value(text, previous).ok_or_else(malformed)?,
        None => previous.last().map_or(0, |e| i64::from(e.value) + 1),
    };

    if value < 0 {
        return Err(CodegenError::NegativeValue {
            name: name.to_string(),
            value,
            line: line_no,
        });
    }
    if value > MAX_ENUM_VALUE {
        return Err(CodegenError::ValueOutOfRange {
            name: name.to_string(),
            value,
            line: line_no,
        });
    }

    Ok(EnumEntry {
        name: name.to_string(),
        value: value as u8,
        line: line_no,
    })
}

/// Decimal, hex (`0x`) or the name of an earlier enumerator, optionally negated
/// and parenthesised.
fn parse_value(text: &str, previous: &[EnumEntry]) -> Option<i64> {
    let text = text.trim();
    let text = text
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .map_or(text, str::trim);

    if let Some(rest) = text.strip_prefix('-') {
        return parse_value(rest, previous).map(|v| -v);
    }

    let digits = text.trim_end_matches(['u', 'U', 'l', 'L']);
    if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        return i64::from_str_radix(hex, 16).ok();
    }
    if digits.starts_with(|c: char| c.is_ascii_digit()) {
        return digits.parse().ok();
    }

    previous
        .iter()
        .find(|e| e.name == text)
        .map(|e| i64::from(e.value))
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
#pragma once
/* status codes */
typedef enum {
    CONTROL_SUCCESS = 0,
    CONTROL_REGISTRATION_FAILED,   // implicit 1
    CONTROL_BAD_COMMAND,
    SERVICER_COMMAND_RETRY = 64,
    SERVICER_WRONG_COMMAND_ID,
    SERVICER_LAST = 0x50 /* hex */
} control_ret_t;
";

    #[test]
    fn implicit_and_explicit_values() {
        let def = parse_enum(SAMPLE, "control_ret_t").unwrap();
        assert_eq!(def.entries.len(), 6);
        assert_eq!(def.value_of("CONTROL_SUCCESS"), Some(0));
        assert_eq!(def.value_of("CONTROL_REGISTRATION_FAILED"), Some(1));
        assert_eq!(def.value_of("CONTROL_BAD_COMMAND"), Some(2));
        assert_eq!(def.value_of("SERVICER_COMMAND_RETRY"), Some(64));
        assert_eq!(def.value_of("SERVICER_WRONG_COMMAND_ID"), Some(65));
        assert_eq!(def.value_of("SERVICER_LAST"), Some(0x50));
        assert_eq!(def.entries[1].line, 5);
    }

    #[test]
    fn first_implicit_value_is_zero() {
        let src = "typedef enum {\n A,\n B\n} e_t;\n";
        let def = parse_enum(src, "e_t").unwrap();
        assert_eq!(def.value_of("A"), Some(0));
        assert_eq!(def.value_of("B"), Some(1));
    }

    #[test]
    fn whitespace_in_markers_is_ignored() {
        let src = "  typedef   enum{ A = 3, B,\n C }   e_t ;\n";
        let def = parse_enum(src, "e_t").unwrap();
        assert_eq!(def.value_of("C"), Some(5));
    }

    #[test]
    fn other_enums_are_skipped() {
        let src = "typedef enum {\n X = 9\n} other_t;\ntypedef enum {\n Y\n} e_t;\n";
        let def = parse_enum(src, "e_t").unwrap();
        assert_eq!(def.entries.len(), 1);
        assert_eq!(def.value_of("X"), None);
    }

    #[test]
    fn references_to_earlier_names_resolve() {
        let src = "typedef enum {\n A = 4,\n B = A,\n C\n} e_t;\n";
        let def = parse_enum(src, "e_t").unwrap();
        assert_eq!(def.value_of("B"), Some(4));
        assert_eq!(def.value_of("C"), Some(5));
    }

    #[test]
    fn multi_line_block_comment_is_skipped() {
        let src = "typedef enum {\n A, /* start\n B = 7,\n end */ C\n} e_t;\n";
        let def = parse_enum(src, "e_t").unwrap();
        assert_eq!(def.value_of("B"), None);
        assert_eq!(def.value_of("C"), Some(1));
    }

    #[test]
    fn unterminated_block_fails() {
        let src = "typedef enum {\n A,\n B,\n";
        let err = parse_enum(src, "e_t").unwrap_err();
        assert!(matches!(err, CodegenError::Unterminated { start_line: 1, .. }));
    }

    #[test]
    fn missing_block_fails() {
        let err = parse_enum("int x;\n", "e_t").unwrap_err();
        assert!(matches!(err, CodegenError::NotFound { .. }));
    }

    #[test]
    fn value_above_255_fails() {
        let src = "typedef enum {\n A = 255,\n B\n} e_t;\n";
        let err = parse_enum(src, "e_t").unwrap_err();
        assert!(matches!(err, CodegenError::ValueOutOfRange { value: 256, line: 3, .. }));
    }

    #[test]
    fn negative_value_fails() {
        let src = "typedef enum {\n A = -1\n} e_t;\n";
        assert!(matches!(
            parse_enum(src, "e_t").unwrap_err(),
            CodegenError::NegativeValue { value: -1, .. }
        ));
    }

    #[test]
    fn malformed_entries_fail() {
        for body in ["1BAD", "A = ", "A = B + 1", "A B"] {
            let src = format!("typedef enum {{\n {body}\n}} e_t;\n");
            assert!(
                matches!(parse_enum(&src, "e_t"), Err(CodegenError::MalformedEntry { .. })),
                "accepted {body:?}"
            );
        }
    }

    #[test]
    fn empty_block_fails() {
        let src = "typedef enum {\n} e_t;\n";
        assert!(matches!(parse_enum(src, "e_t"), Err(CodegenError::EmptyEnum { .. })));
    }
}
