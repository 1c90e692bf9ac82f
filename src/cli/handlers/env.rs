// src/cli/handlers/env.rs

// Listing and removing variables. Assignments (`NAME=value`, `export NAME=value`)
// never reach these handlers: the shell applies them before dispatch.

use crate::core::arg_parser::ParsedArguments;
use crate::core::registry::{CommandSpec, HandlerFuture, SchemaCommand};
use crate::models::{FlagDefinition, PositionalSpec};
use crate::system::context::CommandContext;
use anyhow::{Result, anyhow};

use super::commons::{format_assignments, require_identifier};

/// Builds the `env` command.
pub fn env_command() -> CommandSpec {
    SchemaCommand::new("env", handle_env)
        .describe("List environment variables.")
        .into()
}

/// Builds the `export` command.
pub fn export_command() -> CommandSpec {
    SchemaCommand::new("export", handle_export)
        .describe("List environment variables, or export session variables.")
        .positional(PositionalSpec::optional("name").variadic())
        .into()
}

/// Builds the `set` command.
pub fn set_command() -> CommandSpec {
    SchemaCommand::new("set", handle_set)
        .describe("List session variables.")
        .into()
}

/// Builds the `unset` command.
pub fn unset_command() -> CommandSpec {
    SchemaCommand::new("unset", handle_unset)
        .describe("Remove session variables (or environment variables with -e).")
        .flag(
            FlagDefinition::boolean("env")
                .alias("e")
                .describe("Remove from the environment instead."),
        )
        .positional(PositionalSpec::required("name").variadic())
        .into()
}

fn handle_env(_args: ParsedArguments, ctx: CommandContext) -> HandlerFuture {
    Box::pin(async move {
        print_assignments(&ctx, &ctx.env_vars());
        Ok(())
    })
}

fn handle_export(args: ParsedArguments, ctx: CommandContext) -> HandlerFuture {
    Box::pin(run_export(args, ctx))
}

fn handle_set(_args: ParsedArguments, ctx: CommandContext) -> HandlerFuture {
    Box::pin(async move {
        print_assignments(&ctx, &ctx.vars());
        Ok(())
    })
}

fn handle_unset(args: ParsedArguments, ctx: CommandContext) -> HandlerFuture {
    Box::pin(run_unset(args, ctx))
}

/// `export NAME` copies a session variable into the environment.
async fn run_export(args: ParsedArguments, ctx: CommandContext) -> Result<()> {
    if args.positionals().is_empty() {
        print_assignments(&ctx, &ctx.env_vars());
        return Ok(());
    }
    for name in args.positionals() {
        require_identifier(name)?;
        let value = ctx
            .get_var(name)
            .ok_or_else(|| anyhow!("{}: no such session variable", name))?;
        ctx.set_env(name, &value);
    }
    Ok(())
}

/// Unknown names are ignored, like in other shells.
async fn run_unset(args: ParsedArguments, ctx: CommandContext) -> Result<()> {
    let from_env = args.get_bool("env");
    for name in args.positionals() {
        require_identifier(name)?;
        if from_env {
            ctx.unset_env(name);
        } else {
            ctx.unset_var(name);
        }
    }
    Ok(())
}

fn print_assignments(ctx: &CommandContext, rows: &[(String, String)]) {
    if !rows.is_empty() {
        ctx.print(&format_assignments(rows));
    }
}
