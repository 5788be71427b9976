//! pipesh: a small shell with a pipeline compiler and a fork/exec engine.
//!
//! A raw line is split into tokens, compiled into a [`Chain`](parse::Chain)
//! of pipelines whose pipes and redirection files are already open, and then
//! run stage by stage: builtins in-process with their standard streams
//! temporarily rebound, everything else in a forked child.
//!
//! # Architecture
//!
//! - **[`parse`]**: Tokenizer, token classifier, and the chain builder.
//! - **[`exec`]**: Execution engine: chain/wait policies, process spawning, background reaping.
//! - **[`builtins`]**: `cd`, `pwd`, `exit`, `prompt`, and `history`.
//! - **[`shell`]**: Interpreter state and the read-record-run loop.
//! - **[`config`]**: Configuration loading: embedded defaults + user overlay merge.
//! - **[`logging`]**: Diagnostic logging to stderr or a file.

/// In-process builtins and their dispatch table.
pub mod builtins;
/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// Error types for parsing, execution, and builtins.
pub mod error;
/// Execution engine.
pub mod exec;
/// Recorded command lines.
pub mod history;
/// Line sources: line editor and script files.
pub mod input;
/// Logger setup.
pub mod logging;
/// Tokenizing and chain building.
pub mod parse;
/// Interpreter state and main loop.
pub mod shell;
/// Signal dispositions for the interpreter process.
pub mod signals;

pub use shell::Shell;

/// Run one line against a fresh interpreter built from the default config.
///
/// This is the main entry point for tests and simple usage.
pub fn run(line: &str) -> Result<i32, error::ExecError> {
    Shell::new(config::Config::default_config()).run_line(line)
}
