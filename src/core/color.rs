// src/core/color.rs

use crate::models::AnsiColor;
use anyhow::{Result, anyhow};

/// Every color name accepted by `parse_color_name`, in SGR order.
pub const COLOR_NAMES: [&str; 8] = [
    "black", "red", "green", "yellow", "blue", "magenta", "cyan", "white",
];

/// Parses a color name string (e.g., "red", "green") into an `AnsiColor` enum.
pub fn parse_color_name(name: &str) -> Result<AnsiColor> {
    match name.to_lowercase().as_str() {
        "black" => Ok(AnsiColor::Black),
        "red" => Ok(AnsiColor::Red),
        "green" => Ok(AnsiColor::Green),
        "yellow" => Ok(AnsiColor::Yellow),
        "blue" => Ok(AnsiColor::Blue),
        "magenta" => Ok(AnsiColor::Magenta),
        "cyan" => Ok(AnsiColor::Cyan),
        "white" => Ok(AnsiColor::White),
        _ => Err(anyhow!("Unknown color: '{}'", name)),
    }
}

/// Converts an `AnsiColor` into its raw foreground escape code.
pub fn ansi_color_to_code(color: AnsiColor) -> &'static str {
    match color {
        AnsiColor::Black => "\x1b[30m",
        AnsiColor::Red => "\x1b[31m",
        AnsiColor::Green => "\x1b[32m",
        AnsiColor::Yellow => "\x1b[33m",
        AnsiColor::Blue => "\x1b[34m",
        AnsiColor::Magenta => "\x1b[35m",
        AnsiColor::Cyan => "\x1b[36m",
        AnsiColor::White => "\x1b[37m",
    }
}

/// Maps the last digit of an SGR color parameter (30-37, 40-47, 90-97, 100-107).
pub fn color_from_sgr_digit(digit: u16) -> Option<AnsiColor> {
    match digit {
        0 => Some(AnsiColor::Black),
        1 => Some(AnsiColor::Red),
        2 => Some(AnsiColor::Green),
        3 => Some(AnsiColor::Yellow),
        4 => Some(AnsiColor::Blue),
        5 => Some(AnsiColor::Magenta),
        6 => Some(AnsiColor::Cyan),
        7 => Some(AnsiColor::White),
        _ => None,
    }
}

/// The lowercase name used in markup class names.
pub fn color_name(color: AnsiColor) -> &'static str {
    match color {
        AnsiColor::Black => "black",
        AnsiColor::Red => "red",
        AnsiColor::Green => "green",
        AnsiColor::Yellow => "yellow",
        AnsiColor::Blue => "blue",
        AnsiColor::Magenta => "magenta",
        AnsiColor::Cyan => "cyan",
        AnsiColor::White => "white",
    }
}

/// Converts an `AnsiColor` into the `colored` crate's color for terminal output.
pub fn to_terminal_color(color: AnsiColor, bright: bool) -> colored::Color {
    use colored::Color;
    match (color, bright) {
        (AnsiColor::Black, false) => Color::Black,
        (AnsiColor::Red, false) => Color::Red,
        (AnsiColor::Green, false) => Color::Green,
        (AnsiColor::Yellow, false) => Color::Yellow,
        (AnsiColor::Blue, false) => Color::Blue,
        (AnsiColor::Magenta, false) => Color::Magenta,
        (AnsiColor::Cyan, false) => Color::Cyan,
        (AnsiColor::White, false) => Color::White,
        (AnsiColor::Black, true) => Color::BrightBlack,
        (AnsiColor::Red, true) => Color::BrightRed,
        (AnsiColor::Green, true) => Color::BrightGreen,
        (AnsiColor::Yellow, true) => Color::BrightYellow,
        (AnsiColor::Blue, true) => Color::BrightBlue,
        (AnsiColor::Magenta, true) => Color::BrightMagenta,
        (AnsiColor::Cyan, true) => Color::BrightCyan,
        (AnsiColor::White, true) => Color::BrightWhite,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_color_name_round_trips_through_its_code() {
        for (index, name) in COLOR_NAMES.iter().enumerate() {
            let color = parse_color_name(name).unwrap();
            assert_eq!(color_name(color), *name);
            assert_eq!(ansi_color_to_code(color), format!("\x1b[3{}m", index));
        }
        assert!(parse_color_name("chartreuse").is_err());
        assert_eq!(parse_color_name("RED").unwrap(), AnsiColor::Red);
    }
}
