//! # Runtime Layer
//!
//! Wires the engine leaves in `core` into a running interpreter.
//!
//! ## Modules
//!
//! - **`shell`**: Owns sessions, the registry, scopes, jobs and console output,
//!   and runs the dispatch pipeline for each input line.
//! - **`context`**: The capability struct handed to every command handler.
//! - **`terminal`**: Draws output events on an ANSI terminal for the binary.

pub mod context;
pub mod shell;
pub mod terminal;
