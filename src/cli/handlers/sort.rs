// src/cli/handlers/sort.rs

use crate::core::arg_parser::ParsedArguments;
use crate::core::commons::escape_markup;
use crate::core::registry::{CommandSpec, HandlerFuture, SchemaCommand};
use crate::models::{FlagDefinition, PositionalSpec};
use crate::system::context::CommandContext;
use anyhow::Result;
use std::cmp::Ordering;

/// Builds the `sort` command.
pub fn command() -> CommandSpec {
    SchemaCommand::new("sort", handle)
        .describe("Sort piped input lines, or the given arguments.")
        .flag(
            FlagDefinition::boolean("reverse")
                .alias("r")
                .describe("Sort in descending order."),
        )
        .flag(
            FlagDefinition::boolean("unique")
                .alias("u")
                .describe("Drop duplicate lines."),
        )
        .flag(
            FlagDefinition::boolean("numeric")
                .alias("n")
                .describe("Compare lines by their leading number."),
        )
        .positional(PositionalSpec::optional("line").variadic())
        .into()
}

fn handle(args: ParsedArguments, ctx: CommandContext) -> HandlerFuture {
    Box::pin(run(args, ctx))
}

async fn run(args: ParsedArguments, ctx: CommandContext) -> Result<()> {
    // Positionals arrive escaped already; piped lines do not.
    let mut lines: Vec<String> = match ctx.stdin() {
        Some(input) => input.iter().map(|l| escape_markup(l)).collect(),
        None => args.positionals().to_vec(),
    };

    sort_lines(
        &mut lines,
        args.get_bool("numeric"),
        args.get_bool("reverse"),
        args.get_bool("unique"),
    );

    if !lines.is_empty() {
        ctx.print(&lines.join("\n"));
    }
    Ok(())
}

fn sort_lines(lines: &mut Vec<String>, numeric: bool, reverse: bool, unique: bool) {
    if numeric {
        lines.sort_by(|a, b| compare_numeric(a, b));
    } else {
        lines.sort();
    }
    if unique {
        lines.dedup();
    }
    if reverse {
        lines.reverse();
    }
}

/// Lines without a leading number sort before numbered ones, then by text.
fn compare_numeric(a: &str, b: &str) -> Ordering {
    match (leading_number(a), leading_number(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal).then_with(|| a.cmp(b)),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

fn leading_number(line: &str) -> Option<f64> {
    let trimmed = line.trim_start();
    let end = trimmed
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || *c == '.' || (*i == 0 && (*c == '-' || *c == '+'))))
        .map_or(trimmed.len(), |(i, _)| i);
    trimmed.get(..end)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(input: &[&str], numeric: bool, reverse: bool, unique: bool) -> Vec<String> {
        let mut lines: Vec<String> = input.iter().map(|s| s.to_string()).collect();
        sort_lines(&mut lines, numeric, reverse, unique);
        lines
    }

    #[test]
    fn test_reverse_unique() {
        assert_eq!(sorted(&["b", "a", "a", "c"], false, true, true), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_numeric_ordering() {
        assert_eq!(
            sorted(&["10 apples", "9", "-1", "x", "2.5"], true, false, false),
            vec!["x", "-1", "2.5", "9", "10 apples"]
        );
        assert_eq!(sorted(&["10", "9"], false, false, false), vec!["10", "9"]);
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number("  42 lines"), Some(42.0));
        assert_eq!(leading_number("-3.5"), Some(-3.5));
        assert_eq!(leading_number("v2"), None);
    }
}
