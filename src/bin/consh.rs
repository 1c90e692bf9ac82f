// src/bin/consh.rs

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use consh::cli::Cli;
use consh::core::config::load_config;
use consh::models::SessionId;
use consh::system::terminal::Terminal;
use consh::{InputOutcome, Shell, ShellError};
use std::io::{self, IsTerminal, Write};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::{JoinError, JoinHandle, LocalSet};

use consh::core::render::OutputEvent;

type Foreground = Option<JoinHandle<Result<(), ShellError>>>;

/// One wake-up of the interactive loop.
enum Step {
    Event(OutputEvent),
    Finished(Result<Result<(), ShellError>, JoinError>),
    Interrupt,
    Line(io::Result<Option<String>>),
}

/// Entry point: sets up logging and the single-threaded runtime, then hands
/// off to `run_cli`. Any error that escapes is reported once, here.
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    if cli.no_color {
        colored::control::set_override(false);
    }

    let local = LocalSet::new();
    match local.run_until(run_cli(cli)).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

async fn run_cli(cli: Cli) -> Result<i32> {
    log::debug!("CLI args parsed: {:?}", cli);

    let config = load_config(cli.config.as_deref())?;
    let shell = Shell::with_builtins(config).context("Failed to register built-in commands")?;
    let session = shell.open_session();
    let events = shell.subscribe();
    let ansi = !cli.no_color && io::stdout().is_terminal();
    let terminal = Terminal::new(session, ansi);

    let code = match cli.command {
        Some(line) => run_once(&shell, session, &line, events, terminal).await?,
        None => run_repl(&shell, session, events, terminal).await?,
    };
    shell.close_session(session);
    Ok(code)
}

/// `consh -c LINE`: exit status 1 when the line failed.
async fn run_once(
    shell: &Shell,
    session: SessionId,
    line: &str,
    mut events: UnboundedReceiver<OutputEvent>,
    mut terminal: Terminal,
) -> Result<i32> {
    let result = shell.execute(session, line).await;
    drain(&mut events, &mut terminal)?;
    Ok(if result.is_ok() { 0 } else { 1 })
}

async fn run_repl(
    shell: &Shell,
    session: SessionId,
    mut events: UnboundedReceiver<OutputEvent>,
    mut terminal: Terminal,
) -> Result<i32> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut foreground: Foreground = None;
    let mut stdout = io::stdout();

    print_prompt(shell, session, &mut terminal)?;
    loop {
        let step = tokio::select! {
            Some(event) = events.recv() => Step::Event(event),
            finished = join(&mut foreground), if foreground.is_some() => Step::Finished(finished),
            _ = tokio::signal::ctrl_c() => Step::Interrupt,
            line = lines.next_line() => Step::Line(line),
        };

        match step {
            Step::Event(event) => terminal.apply(&event, &mut stdout)?,
            Step::Finished(finished) => {
                foreground = None;
                if let Err(e) = finished {
                    log::warn!("Foreground task failed: {}", e);
                }
                drain(&mut events, &mut terminal)?;
                if shell.take_exit_request(session) {
                    break;
                }
                print_prompt(shell, session, &mut terminal)?;
            }
            Step::Interrupt => {
                log::debug!("Interrupt: {:?}", shell.cancel(session));
            }
            Step::Line(line) => {
                let Some(line) = line.context("Failed to read standard input")? else {
                    break;
                };
                match shell.handle_input(session, &line) {
                    InputOutcome::Consumed => {}
                    InputOutcome::Dispatched(handle) => foreground = Some(handle),
                }
            }
        }
    }

    if let Some(handle) = foreground.take() {
        shell.cancel(session);
        let _ = handle.await;
    }
    drain(&mut events, &mut terminal)?;
    Ok(0)
}

async fn join(foreground: &mut Foreground) -> Result<Result<(), ShellError>, JoinError> {
    match foreground {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

/// Writes every event already queued.
fn drain(events: &mut UnboundedReceiver<OutputEvent>, terminal: &mut Terminal) -> Result<()> {
    let mut stdout = io::stdout();
    while let Ok(event) = events.try_recv() {
        terminal.apply(&event, &mut stdout)?;
    }
    Ok(())
}

fn print_prompt(shell: &Shell, session: SessionId, terminal: &mut Terminal) -> Result<()> {
    let mut stdout = io::stdout();
    write!(stdout, "{}", shell.prompt(session))?;
    stdout.flush()?;
    terminal.detach();
    Ok(())
}
