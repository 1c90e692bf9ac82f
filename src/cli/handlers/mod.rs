// src/cli/handlers/mod.rs

// One module per built-in command. Each exposes `command() -> CommandSpec`.

/// Formatting and validation helpers shared by the built-ins.
pub mod commons;

pub mod alias;
/// The `clear` built-in.
pub mod clear;
/// The `confirm` built-in.
pub mod confirm;
/// The `echo` built-in.
pub mod echo;
/// The `env`, `export`, `set` and `unset` built-ins.
pub mod env;
/// The `exit` built-in.
pub mod exit;
/// The `godmode` built-in.
pub mod godmode;
/// The `help` built-in.
pub mod help;
/// The `history` built-in.
pub mod history;
pub mod jobs;
pub mod progress;
/// The `read` built-in.
pub mod read;
/// The `roll` built-in.
pub mod roll;
/// The `sleep` built-in.
pub mod sleep;
/// The `sort` built-in.
pub mod sort;
