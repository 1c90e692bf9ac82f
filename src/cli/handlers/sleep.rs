// src/cli/handlers/sleep.rs

use crate::core::arg_parser::ParsedArguments;
use crate::core::commons::unescape_markup;
use crate::core::registry::{CommandSpec, HandlerFuture, SchemaCommand};
use crate::models::PositionalSpec;
use crate::system::context::CommandContext;
use anyhow::{Result, anyhow};
use std::time::Duration;

/// Builds the `sleep` command.
pub fn command() -> CommandSpec {
    SchemaCommand::new("sleep", handle)
        .describe("Wait for a number of seconds. Ctrl+C stops it.")
        .positional(PositionalSpec::required("seconds"))
        .into()
}

fn handle(args: ParsedArguments, ctx: CommandContext) -> HandlerFuture {
    Box::pin(run(args, ctx))
}

async fn run(args: ParsedArguments, ctx: CommandContext) -> Result<()> {
    let raw = args.positional(0).unwrap_or_default();
    let seconds: f64 = raw
        .parse()
        .ok()
        .filter(|s: &f64| s.is_finite() && *s >= 0.0)
        .ok_or_else(|| anyhow!("invalid duration '{}'", unescape_markup(raw)))?;

    ctx.sleep(Duration::from_secs_f64(seconds)).await?;
    Ok(())
}
