// src/cli/handlers/echo.rs

use crate::core::arg_parser::ParsedArguments;
use crate::core::color::{COLOR_NAMES, ansi_color_to_code, parse_color_name};
use crate::core::registry::{CommandSpec, HandlerFuture, SchemaCommand};
use crate::models::{FlagDefinition, PositionalSpec};
use crate::system::context::CommandContext;
use anyhow::Result;

use super::commons::RESET;

/// Builds the `echo` command.
pub fn command() -> CommandSpec {
    SchemaCommand::new("echo", handle)
        .describe("Print text to the console.")
        .flag(
            FlagDefinition::string("color")
                .alias("c")
                .choices(&COLOR_NAMES)
                .describe("Print in one of the eight ANSI colors."),
        )
        .flag(
            FlagDefinition::boolean("error")
                .alias("e")
                .describe("Print as an error."),
        )
        .positional(PositionalSpec::optional("text").variadic())
        .into()
}

fn handle(args: ParsedArguments, ctx: CommandContext) -> HandlerFuture {
    Box::pin(run(args, ctx))
}

async fn run(args: ParsedArguments, ctx: CommandContext) -> Result<()> {
    let text = args.positionals().join(" ");
    let text = match args.get_str("color") {
        Some(name) => format!("{}{}{}", ansi_color_to_code(parse_color_name(name)?), text, RESET),
        None => text,
    };

    if args.get_bool("error") {
        ctx.print_error(&text);
    } else {
        ctx.print(&text);
    }
    Ok(())
}
