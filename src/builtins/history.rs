use std::io::{self, Write};

use crate::error::BuiltinError;
use crate::exec::StdioGuard;
use crate::history::History;
use crate::parse::Stage;
use crate::shell::Shell;

/// `history`: list every recorded line.
/// `history <n>` or `history <prefix>`: run a recorded line again.
pub fn history(stage: &Stage, shell: &mut Shell) -> Result<i32, BuiltinError> {
    match stage.args() {
        [_] => list(stage, shell.history()),
        [_, reference] => replay(stage, shell, reference),
        _ => Err(BuiltinError::TooManyArguments),
    }
}

fn list(stage: &Stage, history: &History) -> Result<i32, BuiltinError> {
    let guard = StdioGuard::redirect(stage)?;
    let written = write_listing(&mut io::stdout().lock(), history);
    guard.restore()?;
    written?;
    Ok(0)
}

fn write_listing(out: &mut impl Write, history: &History) -> io::Result<()> {
    for (i, line) in history.iter().enumerate() {
        writeln!(out, "{} {line}", i + 1)?;
    }
    out.flush()
}

fn replay(stage: &Stage, shell: &mut Shell, reference: &str) -> Result<i32, BuiltinError> {
    let line = resolve(shell.history(), reference)?.to_string();
    if shell.replay_depth() >= shell.config().shell.max_replay_depth {
        return Err(BuiltinError::ReplayTooDeep);
    }
    log::debug!("replaying {line:?}");

    // The replayed line's stages inherit this stage's redirections.
    let guard = StdioGuard::redirect(stage)?;
    let status = shell.replay(&line);
    guard.restore()?;
    Ok(status?)
}

/// Find the line a reference names: an all-digit reference is a 1-based
/// index, anything else is a prefix matched against the newest line first.
pub fn resolve<'h>(history: &'h History, reference: &str) -> Result<&'h str, BuiltinError> {
    if reference.bytes().all(|b| b.is_ascii_digit()) {
        let index: usize = reference.parse().map_err(|_| BuiltinError::InvalidIndex)?;
        history.get(index).ok_or(BuiltinError::InvalidIndex)
    } else {
        history
            .find_latest_with_prefix(reference)
            .ok_or(BuiltinError::NoMatch)
    }
}
