// src/cli/handlers/clear.rs

use crate::core::arg_parser::ParsedArguments;
use crate::core::registry::{CommandSpec, HandlerFuture, SchemaCommand};
use crate::system::context::CommandContext;

/// Builds the `clear` command.
pub fn command() -> CommandSpec {
    SchemaCommand::new("clear", handle)
        .describe("Clear the console.")
        .into()
}

fn handle(_args: ParsedArguments, ctx: CommandContext) -> HandlerFuture {
    Box::pin(async move {
        ctx.clear();
        Ok(())
    })
}
