// src/cli/mod.rs

use crate::core::arg_parser::SchemaError;
use crate::core::registry::CommandSpec;
use crate::system::shell::Shell;
use clap::Parser;

/// One module per built-in command.
pub mod handlers;

/// consh: an interactive command interpreter with background jobs.
///
/// Without `-c`, reads lines from standard input until `exit` or end of input.
/// Append `&` to a line to run it as a background job; use `jobs`, `fg` and
/// `kill` to manage it. Ctrl+C cancels the command in the foreground.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a config file to use instead of ~/.config/consh/config.toml.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Disable colored output.
    #[arg(long)]
    pub no_color: bool,

    /// Log runtime diagnostics (same as RUST_LOG=debug).
    #[arg(short, long)]
    pub verbose: bool,

    /// Run a single command line and exit.
    #[arg(short = 'c', long = "command", value_name = "LINE")]
    pub command: Option<String>,
}

/// Every built-in command. To add one, write its module under `handlers/`
/// and list its constructor here.
static BUILTIN_COMMANDS: &[fn() -> CommandSpec] = &[
    handlers::alias::command,
    handlers::alias::unalias_command,
    handlers::clear::command,
    handlers::confirm::command,
    handlers::echo::command,
    handlers::env::env_command,
    handlers::env::export_command,
    handlers::env::set_command,
    handlers::env::unset_command,
    handlers::exit::command,
    handlers::godmode::command,
    handlers::help::command,
    handlers::history::command,
    handlers::jobs::command,
    handlers::jobs::fg_command,
    handlers::jobs::kill_command,
    handlers::progress::command,
    handlers::read::command,
    handlers::roll::command,
    handlers::sleep::command,
    handlers::sort::command,
];

/// Registers the built-in command set on `shell`.
pub fn register_builtins(shell: &Shell) -> Result<(), SchemaError> {
    for build in BUILTIN_COMMANDS {
        shell.register(build())?;
    }
    log::debug!("Registered {} built-in commands", BUILTIN_COMMANDS.len());
    Ok(())
}
