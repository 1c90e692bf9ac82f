//! consh: a single-threaded command interpreter with typed flags, aliases,
//! cooperative cancellation, background jobs and mutable output groups.

/// Command-line arguments of the binary and the built-in command set.
pub mod cli;
/// Limits, file names and default values.
pub mod constants;
/// The interpreter engine: tokenizing, parsing, registry, scopes, jobs, input and output.
pub mod core;
/// Identifiers, flag declarations and the config model shared across modules.
pub mod models;
/// Shell-wide mutable state.
pub mod state;
pub mod system;

pub use crate::system::shell::{InputOutcome, Shell, ShellError};
