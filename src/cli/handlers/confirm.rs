// src/cli/handlers/confirm.rs

use crate::core::arg_parser::ParsedArguments;
use crate::core::registry::{CommandSpec, HandlerFuture, SchemaCommand};
use crate::models::PositionalSpec;
use crate::system::context::CommandContext;
use anyhow::Result;

/// Builds the `confirm` command.
pub fn command() -> CommandSpec {
    SchemaCommand::new("confirm", handle)
        .describe("Ask a yes/no question and print the answer.")
        .positional(PositionalSpec::optional("message").variadic())
        .into()
}

fn handle(args: ParsedArguments, ctx: CommandContext) -> HandlerFuture {
    Box::pin(run(args, ctx))
}

async fn run(args: ParsedArguments, ctx: CommandContext) -> Result<()> {
    let message = if args.positionals().is_empty() {
        "Continue?".to_string()
    } else {
        args.positionals().join(" ")
    };

    let answer = ctx.confirm(&message).await?;
    ctx.print(if answer { "yes" } else { "no" });
    Ok(())
}
