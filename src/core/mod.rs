// src/core/mod.rs

/// Flag schemas and the argument parser.
pub mod arg_parser;
/// ANSI color names and codes.
pub mod color;
/// Markup escaping and display quoting.
pub mod commons;
/// Loading `config.toml` and rendering the prompt.
pub mod config;
pub mod interceptor;
pub mod jobs;
/// Config directory resolution and user path expansion.
pub mod paths;
/// Command definitions, the registry and alias resolution.
pub mod registry;
pub mod render;
pub mod scope;
/// Splitting input lines into arguments.
pub mod tokenizer;
/// Session and environment variables, expansion and assignments.
pub mod variables;
