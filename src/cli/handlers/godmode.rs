// src/cli/handlers/godmode.rs

use crate::core::arg_parser::ParsedArguments;
use crate::core::commons::unescape_markup;
use crate::core::registry::{CommandSpec, HandlerFuture, SchemaCommand};
use crate::models::PositionalSpec;
use crate::system::context::CommandContext;
use anyhow::{Result, anyhow};

use super::commons::{BOLD, RESET, YELLOW};

/// Builds the `godmode` command.
pub fn command() -> CommandSpec {
    SchemaCommand::new("godmode", handle)
        .describe("Toggle the privileged mode shared by every session.")
        .hidden()
        .positional(PositionalSpec::optional("state").describe("on or off; toggles when omitted"))
        .into()
}

fn handle(args: ParsedArguments, ctx: CommandContext) -> HandlerFuture {
    Box::pin(run(args, ctx))
}

async fn run(args: ParsedArguments, ctx: CommandContext) -> Result<()> {
    let enabled = match args.positional(0) {
        None => !ctx.god_mode(),
        Some("on") => true,
        Some("off") => false,
        Some(other) => return Err(anyhow!("expected 'on' or 'off', got '{}'", unescape_markup(other))),
    };
    ctx.set_god_mode(enabled);
    if enabled {
        ctx.print(&format!("{}{}God mode enabled.{}", BOLD, YELLOW, RESET));
    } else {
        ctx.print("God mode disabled.");
    }
    Ok(())
}
