//! Spawning external stages and collecting their statuses.

use std::ffi::CString;

use nix::errno::Errno;
use nix::sys::signal::{SigHandler, Signal, signal};
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{self, ForkResult, Pid};

use super::stdio;
use crate::error::ExecError;
use crate::parse::Stage;

/// Status of a child whose program could not be found.
pub const NOT_FOUND: i32 = 127;
/// Status of a child whose program was found but could not be executed.
pub const NOT_EXECUTABLE: i32 = 126;
/// A child killed by signal `n` reports `SIGNAL_BASE + n`.
pub const SIGNAL_BASE: i32 = 128;

/// Fork a child that binds the stage's streams and execs its program,
/// searching `PATH`. Records and returns the child's pid.
pub fn spawn(stage: &mut Stage) -> Result<Pid, ExecError> {
    let name = stage.name().unwrap_or_default().to_string();
    let argv = stage
        .args()
        .iter()
        .map(|arg| CString::new(arg.as_bytes()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| ExecError::Nul(name))?;

    stdio::flush_std();
    // SAFETY: the interpreter is single-threaded, and the child only touches
    // descriptors and signal dispositions before exec or _exit.
    match unsafe { unistd::fork() }.map_err(ExecError::Fork)? {
        ForkResult::Child => exec_child(stage, &argv),
        ForkResult::Parent { child } => {
            log::debug!("spawned {child} for {:?}", stage.args());
            stage.pid = Some(child);
            Ok(child)
        }
    }
}

fn exec_child(stage: &Stage, argv: &[CString]) -> ! {
    if let Err(e) = stdio::bind(stage) {
        eprintln!("pipesh: {e}");
        // SAFETY: _exit skips the parent's atexit handlers and buffers.
        unsafe { libc::_exit(1) }
    }
    // The runtime ignores SIGPIPE; exec keeps ignored dispositions.
    // SAFETY: restoring the default disposition installs no handler.
    let _ = unsafe { signal(Signal::SIGPIPE, SigHandler::SigDfl) };

    let err = match unistd::execvp(&argv[0], argv) {
        Ok(never) => match never {},
        Err(e) => e,
    };
    eprintln!("{}: {}", argv[0].to_string_lossy(), err.desc());
    let code = if err == Errno::ENOENT {
        NOT_FOUND
    } else {
        NOT_EXECUTABLE
    };
    // SAFETY: see above.
    unsafe { libc::_exit(code) }
}

/// Block until `pid` terminates and map its wait status to a shell status.
pub fn wait(pid: Pid) -> Result<i32, ExecError> {
    loop {
        match waitpid(pid, None) {
            Ok(status) => {
                if let Some(code) = shell_status(status) {
                    log::debug!("{pid} finished with {code}");
                    return Ok(code);
                }
            }
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(ExecError::Wait(e)),
        }
    }
}

/// Shell status of a terminated child; `None` while it is still alive.
pub fn shell_status(status: WaitStatus) -> Option<i32> {
    match status {
        WaitStatus::Exited(_, code) => Some(code),
        WaitStatus::Signaled(_, signal, _) => Some(SIGNAL_BASE + signal as i32),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(args: &[&str]) -> Stage {
        let mut stage = Stage::new();
        for arg in args {
            stage.push(*arg);
        }
        stage
    }

    #[test]
    fn exit_status_passes_through() {
        let mut ok = stage(&["true"]);
        let pid = spawn(&mut ok).unwrap();
        assert_eq!(ok.pid(), Some(pid));
        assert_eq!(wait(pid).unwrap(), 0);

        let mut fail = stage(&["false"]);
        let pid = spawn(&mut fail).unwrap();
        assert_ne!(wait(pid).unwrap(), 0);
    }

    #[test]
    fn missing_program_is_127() {
        let mut missing = stage(&["pipesh-no-such-program"]);
        let pid = spawn(&mut missing).unwrap();
        assert_eq!(wait(pid).unwrap(), NOT_FOUND);
    }

    #[test]
    fn nul_in_argument_is_rejected_before_fork() {
        let mut bad = stage(&["echo", "a\0b"]);
        assert!(matches!(spawn(&mut bad), Err(ExecError::Nul(_))));
        assert_eq!(bad.pid(), None);
    }

    #[test]
    fn signal_maps_above_128() {
        let pid = Pid::from_raw(1);
        assert_eq!(shell_status(WaitStatus::Exited(pid, 3)), Some(3));
        assert_eq!(
            shell_status(WaitStatus::Signaled(pid, Signal::SIGKILL, false)),
            Some(137)
        );
        assert_eq!(shell_status(WaitStatus::StillAlive), None);
    }
}
