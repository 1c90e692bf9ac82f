// src/cli/handlers/read.rs

use crate::core::arg_parser::ParsedArguments;
use crate::core::registry::{CommandSpec, HandlerFuture, SchemaCommand};
use crate::models::{FlagDefinition, PositionalSpec};
use crate::system::context::CommandContext;
use anyhow::Result;

use super::commons::require_identifier;

/// Builds the `read` command.
pub fn command() -> CommandSpec {
    SchemaCommand::new("read", handle)
        .describe("Read the next input line into a session variable.")
        .flag(
            FlagDefinition::string("prompt")
                .alias("p")
                .describe("Text to print before waiting."),
        )
        .positional(PositionalSpec::required("name"))
        .into()
}

fn handle(args: ParsedArguments, ctx: CommandContext) -> HandlerFuture {
    Box::pin(run(args, ctx))
}

async fn run(args: ParsedArguments, ctx: CommandContext) -> Result<()> {
    let name = args.positional(0).unwrap_or_default();
    require_identifier(name)?;

    if let Some(prompt) = args.get_str("prompt") {
        ctx.print(prompt);
    }
    let line = ctx.read_input().await?;
    ctx.set_var(name, &line);
    Ok(())
}
