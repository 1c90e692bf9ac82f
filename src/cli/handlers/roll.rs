// src/cli/handlers/roll.rs

use crate::core::arg_parser::ParsedArguments;
use crate::core::commons::unescape_markup;
use crate::core::registry::{CommandSpec, HandlerFuture, SchemaCommand};
use crate::models::PositionalSpec;
use crate::system::context::CommandContext;
use anyhow::{Result, anyhow};
use rand::Rng;
use std::ops::RangeInclusive;

const DICE_COUNT: RangeInclusive<u32> = 1..=100;
const DICE_SIDES: RangeInclusive<u32> = 2..=1000;

/// Builds the `roll` command.
pub fn command() -> CommandSpec {
    SchemaCommand::new("roll", handle)
        .describe("Roll dice in NdM notation (default 1d6).")
        .positional(PositionalSpec::optional("dice").describe("e.g. 3d6 or d20"))
        .into()
}

fn handle(args: ParsedArguments, ctx: CommandContext) -> HandlerFuture {
    Box::pin(run(args, ctx))
}

async fn run(args: ParsedArguments, ctx: CommandContext) -> Result<()> {
    let notation = args.positional(0).unwrap_or("1d6");
    let (count, sides) = parse_notation(notation)?;

    let mut rng = rand::rng();
    let rolls: Vec<u32> = (0..count).map(|_| rng.random_range(1..=sides)).collect();
    let total: u32 = rolls.iter().sum();

    let listed = rolls
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    ctx.print(&format!("Rolls: {}\nTotal: {}", listed, total));
    Ok(())
}

/// Parses `NdM` (or `dM`, meaning one die).
fn parse_notation(notation: &str) -> Result<(u32, u32)> {
    let invalid = || anyhow!("invalid dice '{}' (expected NdM, e.g. 3d6)", unescape_markup(notation));

    let lower = notation.to_lowercase();
    let (count, sides) = lower.split_once('d').ok_or_else(invalid)?;
    let count: u32 = if count.is_empty() {
        1
    } else {
        count.parse().map_err(|_| invalid())?
    };
    let sides: u32 = sides.parse().map_err(|_| invalid())?;

    if !DICE_COUNT.contains(&count) {
        return Err(anyhow!(
            "dice count must be between {} and {}",
            DICE_COUNT.start(),
            DICE_COUNT.end()
        ));
    }
    if !DICE_SIDES.contains(&sides) {
        return Err(anyhow!(
            "dice sides must be between {} and {}",
            DICE_SIDES.start(),
            DICE_SIDES.end()
        ));
    }
    Ok((count, sides))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_notation() {
        assert_eq!(parse_notation("3d6").unwrap(), (3, 6));
        assert_eq!(parse_notation("D20").unwrap(), (1, 20));
        assert!(parse_notation("3x6").is_err());
        assert!(parse_notation("0d6").is_err());
        assert!(parse_notation("2d1").is_err());
        assert!(parse_notation("101d6").is_err());
        assert!(parse_notation("2d").is_err());
    }
}
