// src/cli/handlers/commons.rs

// Formatting and validation helpers shared by several built-in commands.

use crate::core::commons::{escape_markup, unescape_markup};
use anyhow::{Result, anyhow};
use std::ops::RangeInclusive;

/// SGR sequences used by the built-ins.
pub const BOLD: &str = "\x1b[1m";
/// Dim text.
pub const DIM: &str = "\x1b[2m";
/// Cyan foreground.
pub const CYAN: &str = "\x1b[36m";
/// Yellow foreground.
pub const YELLOW: &str = "\x1b[33m";
/// Resets every attribute.
pub const RESET: &str = "\x1b[0m";

/// Whether `name` is usable as a variable name.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Fails with a user-facing error unless `name` is a valid variable name.
pub fn require_identifier(name: &str) -> Result<()> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(anyhow!("'{}' is not a valid variable name", unescape_markup(name)))
    }
}

/// Returns `value` as an integer when it is a whole number inside `range`.
pub fn whole_number(value: f64, range: RangeInclusive<u32>) -> Option<u32> {
    if value.fract() != 0.0 {
        return None;
    }
    range.into_iter().find(|n| f64::from(*n) == value)
}

/// Formats `(key, value)` rows as two aligned columns. Keys get `key_style`.
/// Both columns are escaped for markup.
pub fn format_columns(rows: &[(String, String)], key_style: &str) -> String {
    let width = rows
        .iter()
        .map(|(key, _)| key.chars().count())
        .max()
        .unwrap_or(0);
    rows.iter()
        .map(|(key, value)| {
            let padding = " ".repeat(width - key.chars().count());
            format!(
                "  {}{}{}{}  {}",
                key_style,
                escape_markup(key),
                RESET,
                padding,
                escape_markup(value)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Formats `NAME=value` lines, sorted as given.
pub fn format_assignments(rows: &[(String, String)]) -> String {
    rows.iter()
        .map(|(name, value)| format!("{}={}", escape_markup(name), escape_markup(value)))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifiers() {
        assert!(is_identifier("PATH"));
        assert!(is_identifier("_x1"));
        assert!(!is_identifier("1x"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("a-b"));
    }

    #[test]
    fn test_whole_number() {
        assert_eq!(whole_number(3.0, 1..=10), Some(3));
        assert_eq!(whole_number(2.5, 1..=10), None);
        assert_eq!(whole_number(11.0, 1..=10), None);
        assert_eq!(whole_number(-1.0, 1..=10), None);
    }

    #[test]
    fn test_columns_are_aligned() {
        let rows = vec![
            ("ls".to_string(), "list".to_string()),
            ("history".to_string(), "show <history>".to_string()),
        ];
        let text = format_columns(&rows, "");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], format!("  ls{}       list", RESET));
        assert_eq!(lines[1], format!("  history{}  show &lt;history&gt;", RESET));
    }
}
