// src/cli/handlers/exit.rs

use crate::core::arg_parser::ParsedArguments;
use crate::core::registry::{CommandSpec, HandlerFuture, SchemaCommand};
use crate::system::context::CommandContext;

/// Builds the `exit` command.
pub fn command() -> CommandSpec {
    SchemaCommand::new("exit", handle)
        .describe("Close this console session.")
        .into()
}

fn handle(_args: ParsedArguments, ctx: CommandContext) -> HandlerFuture {
    Box::pin(async move {
        ctx.request_exit();
        Ok(())
    })
}
