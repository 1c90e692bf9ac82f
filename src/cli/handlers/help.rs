// src/cli/handlers/help.rs

use crate::core::arg_parser::ParsedArguments;
use crate::core::commons::{escape_markup, unescape_markup};
use crate::core::registry::{Command, CommandSpec, HandlerFuture, SchemaCommand};
use crate::models::{FlagDefinition, FlagType, PositionalSpec};
use crate::system::context::CommandContext;
use anyhow::{Result, anyhow};

use super::commons::{BOLD, CYAN, RESET, format_columns};

/// Builds the `help` command.
pub fn command() -> CommandSpec {
    SchemaCommand::new("help", handle)
        .describe("List commands, or show how to use one.")
        .positional(PositionalSpec::optional("command"))
        .into()
}

fn handle(args: ParsedArguments, ctx: CommandContext) -> HandlerFuture {
    Box::pin(run(args, ctx))
}

async fn run(args: ParsedArguments, ctx: CommandContext) -> Result<()> {
    match args.positional(0) {
        None => {
            let rows: Vec<(String, String)> = ctx
                .commands(false)
                .iter()
                .map(|c| (c.name.clone(), c.description.clone()))
                .collect();
            ctx.print(&format!(
                "{}Commands:{}\n{}",
                BOLD,
                RESET,
                format_columns(&rows, CYAN)
            ));
        }
        Some(name) => {
            let name = unescape_markup(name);
            let command = ctx
                .command(&name)
                .filter(|c| !c.hidden)
                .ok_or_else(|| anyhow!("no help for '{}'", name))?;
            ctx.print(&describe_command(&command));
        }
    }
    Ok(())
}

fn describe_command(command: &Command) -> String {
    let mut text = format!("{}usage:{} {}", BOLD, RESET, escape_markup(&command.usage()));
    if !command.description.is_empty() {
        text.push_str(&format!("\n{}", escape_markup(&command.description)));
    }

    let rows: Vec<(String, String)> = command
        .visible_flags()
        .into_iter()
        .map(|def| (flag_synopsis(def), flag_details(def)))
        .collect();
    if !rows.is_empty() {
        text.push_str(&format!("\n{}Flags:{}\n{}", BOLD, RESET, format_columns(&rows, CYAN)));
    }
    text
}

fn flag_synopsis(def: &FlagDefinition) -> String {
    let mut names: Vec<String> = def
        .aliases
        .iter()
        .map(|a| {
            if a.chars().count() == 1 {
                format!("-{}", a)
            } else {
                format!("--{}", a)
            }
        })
        .collect();
    names.push(format!("--{}", def.name));
    let names = names.join(", ");
    match def.value_type {
        FlagType::Boolean => names,
        other => format!("{} <{}>", names, other),
    }
}

fn flag_details(def: &FlagDefinition) -> String {
    let mut details = def.description.clone().unwrap_or_default();
    if let Some(choices) = &def.choices {
        details.push_str(&format!(" [{}]", choices.join("|")));
    }
    if let Some(default) = &def.default {
        details.push_str(&format!(" (default: {})", default));
    }
    if def.required {
        details.push_str(" (required)");
    }
    details.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_synopsis() {
        let def = FlagDefinition::number("limit").alias("n");
        assert_eq!(flag_synopsis(&def), "-n, --limit <number>");
        assert_eq!(flag_synopsis(&FlagDefinition::boolean("all")), "--all");
    }

    #[test]
    fn test_flag_details() {
        let def = FlagDefinition::string("color")
            .choices(&["red", "blue"])
            .default_value("red")
            .describe("Pick one.");
        assert_eq!(flag_details(&def), "Pick one. [red|blue] (default: red)");
        assert_eq!(flag_details(&FlagDefinition::boolean("x").required()), "(required)");
    }
}
