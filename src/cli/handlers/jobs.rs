// src/cli/handlers/jobs.rs

//! # Handlers for job control: `jobs`, `kill` and `fg`
//!
//! - `jobs` lists running jobs (`-a` for all) or clears finished ones.
//! - `kill` marks a running job killed and fires its cancellation token. The
//!   job's task stops only when it next checks that token.
//! - `fg` waits for a job to settle, then copies its captured output into the
//!   console. Ctrl+C stops the wait, not the job.

use crate::core::arg_parser::ParsedArguments;
use crate::core::commons::escape_markup;
use crate::core::jobs::{JobFilter, JobSnapshot, KillOutcome, parse_job_id};
use crate::core::registry::{CommandSpec, HandlerFuture, SchemaCommand};
use crate::core::scope::Cancelled;
use crate::models::{FlagDefinition, JobStatus, PositionalSpec};
use crate::system::context::CommandContext;
use anyhow::Result;
use std::rc::Rc;

use super::commons::{DIM, RESET, YELLOW};

/// Builds the `jobs` command.
pub fn command() -> CommandSpec {
    SchemaCommand::new("jobs", handle_jobs)
        .describe("List background jobs.")
        .flag(
            FlagDefinition::boolean("all")
                .alias("a")
                .conflicts_with("clear")
                .describe("Include finished jobs."),
        )
        .flag(FlagDefinition::boolean("clear").describe("Remove every finished job."))
        .into()
}

/// Builds the `kill` command.
pub fn kill_command() -> CommandSpec {
    SchemaCommand::new("kill", handle_kill)
        .describe("Kill a running background job (N or %N).")
        .positional(PositionalSpec::required("job"))
        .into()
}

/// Builds the `fg` command.
pub fn fg_command() -> CommandSpec {
    SchemaCommand::new("fg", handle_fg)
        .describe("Wait for a background job, then show its output.")
        .positional(PositionalSpec::required("job"))
        .into()
}

fn handle_jobs(args: ParsedArguments, ctx: CommandContext) -> HandlerFuture {
    Box::pin(run_jobs(args, ctx))
}

fn handle_kill(args: ParsedArguments, ctx: CommandContext) -> HandlerFuture {
    Box::pin(run_kill(args, ctx))
}

fn handle_fg(args: ParsedArguments, ctx: CommandContext) -> HandlerFuture {
    Box::pin(run_fg(args, ctx))
}

async fn run_jobs(args: ParsedArguments, ctx: CommandContext) -> Result<()> {
    let jobs = ctx.jobs();
    if args.get_bool("clear") {
        let removed = jobs.clear_finished();
        ctx.print(&format!("Removed {} finished job(s).", removed));
        return Ok(());
    }

    let filter = if args.get_bool("all") {
        JobFilter::All
    } else {
        JobFilter::Running
    };
    let listed = jobs.list(filter);
    if listed.is_empty() {
        ctx.print(&format!("{}No jobs.{}", DIM, RESET));
        return Ok(());
    }
    let lines: Vec<String> = listed.iter().map(describe_job).collect();
    ctx.print(&lines.join("\n"));
    Ok(())
}

async fn run_kill(args: ParsedArguments, ctx: CommandContext) -> Result<()> {
    let id = parse_job_id(args.positional(0).unwrap_or_default())?;
    match ctx.jobs().kill_job(id)? {
        KillOutcome::Killed => {
            ctx.print(&format!("[{}] killed", id));
        }
        KillOutcome::AlreadyFinished(status) => {
            ctx.print(&format!("[{}] already {}", id, status));
        }
    }
    Ok(())
}

async fn run_fg(args: ParsedArguments, ctx: CommandContext) -> Result<()> {
    let id = parse_job_id(args.positional(0).unwrap_or_default())?;
    let jobs = Rc::clone(ctx.jobs());

    let job = tokio::select! {
        job = jobs.wait(id) => job?,
        _ = ctx.cancellation().cancelled() => return Err(Cancelled.into()),
    };

    ctx.replay(&job);
    ctx.print(&describe_job(&job));
    Ok(())
}

fn describe_job(job: &JobSnapshot) -> String {
    let status = match job.status {
        JobStatus::Running => format!("{}{:<9}{}", YELLOW, job.status, RESET),
        _ => format!("{:<9}", job.status),
    };
    let mut line = format!(
        "[{}] {} {} {}({}s){}",
        job.id,
        status,
        escape_markup(&job.command),
        DIM,
        job.elapsed().num_seconds(),
        RESET
    );
    if let Some(error) = &job.error {
        line.push_str(&format!("\n    error: {}", escape_markup(error)));
    }
    line
}
