// src/cli/handlers/progress.rs

//! # Handler for the `progress` command
//!
//! Draws a progress bar as one output group and redraws it in place after each
//! step. When the run ends the bar is replaced by a one-line summary, or by a
//! cancellation notice if the scope was cancelled mid-way.

use crate::core::arg_parser::ParsedArguments;
use crate::core::registry::{CommandSpec, HandlerFuture, SchemaCommand};
use crate::models::FlagDefinition;
use crate::system::context::CommandContext;
use anyhow::{Result, anyhow};
use std::time::Duration;

use super::commons::{CYAN, DIM, RESET, whole_number};

const BAR_WIDTH: u32 = 20;
const MAX_STEPS: u32 = 1000;

/// Builds the `progress` command.
pub fn command() -> CommandSpec {
    SchemaCommand::new("progress", handle)
        .describe("Show a progress bar that updates in place.")
        .flag(
            FlagDefinition::number("steps")
                .alias("s")
                .default_value("10")
                .describe("Number of steps."),
        )
        .flag(
            FlagDefinition::number("delay")
                .alias("d")
                .default_value("100")
                .describe("Milliseconds between steps."),
        )
        .into()
}

fn handle(args: ParsedArguments, ctx: CommandContext) -> HandlerFuture {
    Box::pin(run(args, ctx))
}

async fn run(args: ParsedArguments, ctx: CommandContext) -> Result<()> {
    let steps = args
        .get_number("steps")
        .and_then(|n| whole_number(n, 1..=MAX_STEPS))
        .ok_or_else(|| anyhow!("--steps must be a whole number from 1 to {}", MAX_STEPS))?;
    let delay = args.get_number("delay").unwrap_or(100.0);
    if !delay.is_finite() || delay < 0.0 {
        return Err(anyhow!("--delay must be a non-negative number of milliseconds"));
    }
    let delay = Duration::from_secs_f64(delay / 1000.0);

    let group = ctx.print(&render_bar(0, steps));
    for done in 1..=steps {
        if let Err(cancelled) = ctx.sleep(delay).await {
            ctx.update_message(
                group,
                &format!("{}{} cancelled at {}/{}{}", render_bar(done - 1, steps), DIM, done - 1, steps, RESET),
            );
            return Err(cancelled.into());
        }
        ctx.update_message(group, &render_bar(done, steps));
    }
    ctx.update_message(group, &format!("Done: {} steps completed.", steps));
    Ok(())
}

fn render_bar(done: u32, total: u32) -> String {
    let filled = (done * BAR_WIDTH / total.max(1)).min(BAR_WIDTH);
    let percent = done * 100 / total.max(1);
    format!(
        "[{}{}{}{}] {:>3}%",
        CYAN,
        "#".repeat(filled as usize),
        RESET,
        " ".repeat((BAR_WIDTH - filled) as usize),
        percent
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::render::render_line;

    #[test]
    fn test_render_bar() {
        assert_eq!(render_line(&render_bar(0, 4)).plain(), format!("[{}]   0%", " ".repeat(20)));
        assert_eq!(
            render_line(&render_bar(2, 4)).plain(),
            format!("[{}{}]  50%", "#".repeat(10), " ".repeat(10))
        );
        assert_eq!(render_line(&render_bar(4, 4)).plain(), format!("[{}] 100%", "#".repeat(20)));
    }
}
