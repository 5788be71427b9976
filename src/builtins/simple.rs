use std::io::{self, Write};
use std::path::PathBuf;

use crate::error::BuiltinError;
use crate::exec::StdioGuard;
use crate::parse::Stage;
use crate::shell::Shell;

/// `cd [dir]`: change the working directory, to `$HOME` when no directory is given.
pub fn cd(stage: &Stage) -> Result<i32, BuiltinError> {
    let target = match stage.args() {
        [_] => std::env::var_os("HOME")
            .filter(|home| !home.is_empty())
            .map(PathBuf::from)
            .ok_or(BuiltinError::NoHome)?,
        [_, dir] => PathBuf::from(dir),
        _ => return Err(BuiltinError::TooManyArguments),
    };
    std::env::set_current_dir(&target).map_err(|source| BuiltinError::Path {
        path: target.display().to_string(),
        source,
    })?;
    log::debug!("cwd is now {}", target.display());
    Ok(0)
}

/// `pwd`: print the working directory to the stage's output.
pub fn pwd(stage: &Stage) -> Result<i32, BuiltinError> {
    if stage.argc() > 1 {
        return Err(BuiltinError::TooManyArguments);
    }
    let cwd = std::env::current_dir()?;

    let guard = StdioGuard::redirect(stage)?;
    let written = writeln!(io::stdout(), "{}", cwd.display());
    guard.restore()?;
    written?;
    Ok(0)
}

/// `exit [n]`: ask the interpreter loop to stop with status `n` (default 0).
pub fn exit(stage: &Stage, shell: &mut Shell) -> Result<i32, BuiltinError> {
    let code = match stage.args() {
        [_] => 0,
        [_, arg] => exit_code(arg)?,
        _ => return Err(BuiltinError::TooManyArguments),
    };
    let _ = writeln!(io::stdout(), "exit");
    shell.request_exit(code);
    Ok(code)
}

/// Parse a decimal exit status. Values wrap modulo 256 like the kernel's.
fn exit_code(arg: &str) -> Result<i32, BuiltinError> {
    if arg.is_empty() || !arg.bytes().all(|b| b.is_ascii_digit()) {
        return Err(BuiltinError::NotNumeric);
    }
    let n: u64 = arg.parse().map_err(|_| BuiltinError::NotNumeric)?;
    Ok((n % 256) as i32)
}

/// `prompt <text>`: replace the prompt string.
pub fn prompt(stage: &Stage, shell: &mut Shell) -> Result<i32, BuiltinError> {
    match stage.args() {
        [_] => Err(BuiltinError::TooFewArguments),
        [_, text] => {
            shell.set_prompt(text.clone());
            Ok(0)
        }
        _ => Err(BuiltinError::TooManyArguments),
    }
}
