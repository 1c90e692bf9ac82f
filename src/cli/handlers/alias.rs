//! # Handlers for `alias` and `unalias`
//!
//! Both take their arguments raw: `alias ll='help -a'` arrives as the single
//! token `ll=help -a`. Targets are stored unescaped, since they are tokenized
//! again whenever the alias is used.

use crate::core::arg_parser::ParsedArguments;
use crate::core::commons::{escape_markup, quote_for_display, unescape_markup};
use crate::core::registry::{CommandSpec, HandlerFuture, RawCommand};
use crate::system::context::CommandContext;
use anyhow::{Result, anyhow};

/// Builds the `alias` command.
pub fn command() -> CommandSpec {
    RawCommand::new("alias", handle_alias)
        .describe("List aliases, show one, or define NAME=TARGET.")
        .into()
}

/// Builds the `unalias` command.
pub fn unalias_command() -> CommandSpec {
    RawCommand::new("unalias", handle_unalias)
        .describe("Remove aliases.")
        .into()
}

fn handle_alias(args: ParsedArguments, ctx: CommandContext) -> HandlerFuture {
    Box::pin(run_alias(args, ctx))
}

fn handle_unalias(args: ParsedArguments, ctx: CommandContext) -> HandlerFuture {
    Box::pin(run_unalias(args, ctx))
}

async fn run_alias(args: ParsedArguments, ctx: CommandContext) -> Result<()> {
    if args.positionals().is_empty() {
        let lines: Vec<String> = ctx
            .aliases()
            .iter()
            .map(|(name, target)| format_alias(name, target))
            .collect();
        if !lines.is_empty() {
            ctx.print(&lines.join("\n"));
        }
        return Ok(());
    }

    for arg in args.positionals() {
        let arg = unescape_markup(arg);
        match arg.split_once('=') {
            Some((name, target)) => {
                validate_alias_name(name)?;
                if target.trim().is_empty() {
                    return Err(anyhow!("alias '{}' needs a target", name));
                }
                ctx.set_alias(name, target);
            }
            None => match ctx.alias(&arg) {
                Some(target) => {
                    ctx.print(&format_alias(&arg, &target));
                }
                None => return Err(anyhow!("{}: not found", arg)),
            },
        }
    }
    Ok(())
}

async fn run_unalias(args: ParsedArguments, ctx: CommandContext) -> Result<()> {
    if args.positionals().is_empty() {
        return Err(anyhow!("usage: unalias NAME..."));
    }
    for arg in args.positionals() {
        let name = unescape_markup(arg);
        if !ctx.remove_alias(&name) {
            return Err(anyhow!("{}: not found", name));
        }
    }
    Ok(())
}

fn validate_alias_name(name: &str) -> Result<()> {
    if name.is_empty() || name.chars().any(|c| c.is_whitespace() || c == '=' || c == '$') {
        return Err(anyhow!("invalid alias name '{}'", name));
    }
    Ok(())
}

fn format_alias(name: &str, target: &str) -> String {
    escape_markup(&format!("alias {}={}", name, quote_for_display(target)))
}
