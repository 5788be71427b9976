//! Error types for each layer of the shell.
//!
//! Every error is handled at the boundary where it is detected: parse errors
//! reject the whole line, builtin errors become a non-zero status, and only a
//! failure to restore the interpreter's own standard streams ends the loop.

use std::io;

use nix::errno::Errno;
use thiserror::Error;

use crate::parse::Stream;

/// Rejection of a line before anything runs.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("parse error near '|': pipe with no preceding command")]
    PipeWithoutCommand,
    #[error("parse error near '|': cannot pipe to multiple commands")]
    MultiplePipeTargets,
    #[error("parse error near '|': pipe with no following command")]
    DanglingPipe,
    #[error("parse error near '{op}': redirection before command")]
    RedirectWithoutCommand { op: String },
    #[error("cannot redirect {} to multiple targets", stream.as_str())]
    DuplicateRedirect { stream: Stream },
    #[error("parse error near '{op}': missing file name")]
    MissingRedirectTarget { op: String },
    #[error("{path}: {source}")]
    Open { path: String, source: io::Error },
    #[error("failed to create pipe: {0}")]
    Pipe(Errno),
    #[error("glob '{pattern}' matched a path that is not valid UTF-8")]
    InvalidGlobMatch { pattern: String },
}

/// Failure while realizing a chain as processes.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("fork: {0}")]
    Fork(Errno),
    #[error("waitpid: {0}")]
    Wait(Errno),
    #[error("cannot redirect {}: {source}", stream.as_str())]
    Redirect { stream: Stream, source: Errno },
    #[error("cannot restore standard {}: {source}", stream.as_str())]
    Restore { stream: Stream, source: Errno },
    #[error("{0}: argument contains a NUL byte")]
    Nul(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ExecError {
    /// The interpreter's standard streams are in an unknown state.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExecError::Restore { .. })
    }
}

/// Failure reported by a builtin; the stage exits 1 and the loop continues.
#[derive(Debug, Error)]
pub enum BuiltinError {
    #[error("too many arguments")]
    TooManyArguments,
    #[error("too few arguments")]
    TooFewArguments,
    #[error("expects a numerical argument")]
    NotNumeric,
    #[error("invalid index")]
    InvalidIndex,
    #[error("no matching command found")]
    NoMatch,
    #[error("replay nested too deeply")]
    ReplayTooDeep,
    #[error("HOME is not set")]
    NoHome,
    #[error("{path}: {source}")]
    Path { path: String, source: io::Error },
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Exec(#[from] ExecError),
}

/// Failure that ends the interpreter loop.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error("reading input: {0}")]
    Input(#[from] io::Error),
}
