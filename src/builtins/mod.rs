//! Commands that run inside the interpreter instead of a child process.
//!
//! Each builtin reports its own failures as `name: message` on stderr and
//! yields status 1. Only a fatal [`ExecError`] (the interpreter's standard
//! streams could not be restored) escapes to the engine.

pub mod history;
pub mod simple;

use crate::error::{BuiltinError, ExecError};
use crate::parse::Stage;
use crate::shell::Shell;

/// Status a builtin yields after printing its own diagnostic.
pub const FAILURE: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Cd,
    Exit,
    Pwd,
    History,
    Prompt,
}

impl Builtin {
    pub const ALL: [Builtin; 5] = [
        Builtin::Cd,
        Builtin::Exit,
        Builtin::Pwd,
        Builtin::History,
        Builtin::Prompt,
    ];

    /// Match a program name against the dispatch table. Case-sensitive.
    pub fn lookup(name: &str) -> Option<Self> {
        match name {
            "cd" => Some(Builtin::Cd),
            "exit" => Some(Builtin::Exit),
            "pwd" => Some(Builtin::Pwd),
            "history" => Some(Builtin::History),
            "prompt" => Some(Builtin::Prompt),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Cd => "cd",
            Builtin::Exit => "exit",
            Builtin::Pwd => "pwd",
            Builtin::History => "history",
            Builtin::Prompt => "prompt",
        }
    }
}

/// Run `builtin` for `stage` and return its status.
pub fn run(builtin: Builtin, stage: &Stage, shell: &mut Shell) -> Result<i32, ExecError> {
    log::debug!("builtin {} {:?}", builtin.name(), &stage.args()[1..]);
    let result = match builtin {
        Builtin::Cd => simple::cd(stage),
        Builtin::Pwd => simple::pwd(stage),
        Builtin::Exit => simple::exit(stage, shell),
        Builtin::Prompt => simple::prompt(stage, shell),
        Builtin::History => history::history(stage, shell),
    };
    match result {
        Ok(status) => Ok(status),
        Err(BuiltinError::Exec(e)) if e.is_fatal() => Err(e),
        Err(e) => {
            eprintln!("{}: {e}", builtin.name());
            Ok(FAILURE)
        }
    }
}
