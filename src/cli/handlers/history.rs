// src/cli/handlers/history.rs

use crate::core::arg_parser::ParsedArguments;
use crate::core::commons::escape_markup;
use crate::core::registry::{CommandSpec, HandlerFuture, SchemaCommand};
use crate::models::FlagDefinition;
use crate::system::context::CommandContext;
use anyhow::Result;

use super::commons::{DIM, RESET};

/// Builds the `history` command.
pub fn command() -> CommandSpec {
    SchemaCommand::new("history", handle)
        .describe("List the lines entered in this session.")
        .flag(
            FlagDefinition::boolean("clear")
                .alias("c")
                .describe("Forget the history instead."),
        )
        .into()
}

fn handle(args: ParsedArguments, ctx: CommandContext) -> HandlerFuture {
    Box::pin(run(args, ctx))
}

async fn run(args: ParsedArguments, ctx: CommandContext) -> Result<()> {
    if args.get_bool("clear") {
        ctx.clear_history();
        return Ok(());
    }

    let history = ctx.history();
    let width = history.len().to_string().len();
    let lines: Vec<String> = history
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{}{:>width$}{}  {}", DIM, i + 1, RESET, escape_markup(line)))
        .collect();
    ctx.print(&lines.join("\n"));
    Ok(())
}
