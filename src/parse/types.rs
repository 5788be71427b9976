//! Types produced by the pipeline builder and consumed by the execution engine.
//!
//! Every descriptor a stage overrides is an [`OwnedFd`]: dropping a stage,
//! pipeline, or chain closes whatever it still holds, so a rejected line or a
//! pipeline cut short by a failing stage never leaks descriptors.

use std::os::fd::{AsFd, BorrowedFd, OwnedFd};

use nix::unistd::Pid;

use crate::builtins::Builtin;

/// Chaining operator that closes a pipeline and links it to the next one.
///
/// Pipes never appear here: they connect stages inside a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `;`: sequencing
    Semi,
    /// `&`: run the pipeline in the background
    Background,
    /// `&&`: conditional on success
    And,
    /// `||`: conditional on failure
    Or,
}

impl Operator {
    /// Recognize a chaining operator token.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            ";" => Some(Operator::Semi),
            "&" => Some(Operator::Background),
            "&&" => Some(Operator::And),
            "||" => Some(Operator::Or),
            _ => None,
        }
    }

    /// The operator's shell syntax.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Semi => ";",
            Operator::Background => "&",
            Operator::And => "&&",
            Operator::Or => "||",
        }
    }
}

/// One of the three standard streams a stage can override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Input,
    Output,
    Error,
}

impl Stream {
    /// Descriptor number of the interpreter's own stream.
    pub fn fileno(self) -> i32 {
        match self {
            Stream::Input => libc::STDIN_FILENO,
            Stream::Output => libc::STDOUT_FILENO,
            Stream::Error => libc::STDERR_FILENO,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stream::Input => "input",
            Stream::Output => "output",
            Stream::Error => "stderr",
        }
    }
}

/// What runs a stage, bound once when the stage is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Runner {
    /// In-process builtin.
    Builtin(Builtin),
    /// Fork and exec the program named by the first argument.
    External,
}

/// One program invocation within a pipeline.
#[derive(Debug)]
pub struct Stage {
    args: Vec<String>,
    stdin: Option<OwnedFd>,
    stdout: Option<OwnedFd>,
    stderr: Option<OwnedFd>,
    pub(crate) deferred_wait: bool,
    runner: Runner,
    pub(crate) pid: Option<Pid>,
}

impl Default for Stage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage {
    pub fn new() -> Self {
        Self {
            args: Vec::new(),
            stdin: None,
            stdout: None,
            stderr: None,
            deferred_wait: false,
            runner: Runner::External,
            pid: None,
        }
    }

    /// Append an argument. The first one pushed is the program name.
    pub fn push(&mut self, word: impl Into<String>) {
        self.args.push(word.into());
    }

    /// Program name, once at least one argument has been pushed.
    pub fn name(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    /// All arguments, program name first.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn argc(&self) -> usize {
        self.args.len()
    }

    pub fn runner(&self) -> Runner {
        self.runner
    }

    /// True when the engine will not block on this stage.
    pub fn deferred_wait(&self) -> bool {
        self.deferred_wait
    }

    /// Process id, set once an external stage has been spawned.
    pub fn pid(&self) -> Option<Pid> {
        self.pid
    }

    /// Resolve the runner from the program name: a builtin if the name is
    /// in the dispatch table, otherwise an external process.
    pub(crate) fn bind_runner(&mut self) {
        self.runner = match self.name().and_then(Builtin::lookup) {
            Some(builtin) => Runner::Builtin(builtin),
            None => Runner::External,
        };
    }

    fn slot(&self, stream: Stream) -> &Option<OwnedFd> {
        match stream {
            Stream::Input => &self.stdin,
            Stream::Output => &self.stdout,
            Stream::Error => &self.stderr,
        }
    }

    /// True when `stream` is bound to something other than the interpreter's own stream.
    pub fn is_overridden(&self, stream: Stream) -> bool {
        self.slot(stream).is_some()
    }

    /// The overriding descriptor for `stream`, if any.
    pub fn fd(&self, stream: Stream) -> Option<BorrowedFd<'_>> {
        self.slot(stream).as_ref().map(|fd| fd.as_fd())
    }

    pub(crate) fn set_fd(&mut self, stream: Stream, fd: OwnedFd) {
        let slot = match stream {
            Stream::Input => &mut self.stdin,
            Stream::Output => &mut self.stdout,
            Stream::Error => &mut self.stderr,
        };
        *slot = Some(fd);
    }

    /// Close every overriding descriptor this stage still holds.
    pub(crate) fn close_fds(&mut self) {
        self.stdin = None;
        self.stdout = None;
        self.stderr = None;
    }
}

/// Stages connected left to right by pipes, scheduled as one unit.
#[derive(Debug)]
pub struct Pipeline {
    pub stages: Vec<Stage>,
    pub background: bool,
    /// Operator that closed this pipeline; `None` at end of line.
    pub chained_by: Option<Operator>,
}

/// All pipelines parsed from one input line, in textual order.
#[derive(Debug, Default)]
pub struct Chain {
    pub pipelines: Vec<Pipeline>,
}

impl Chain {
    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }
}
