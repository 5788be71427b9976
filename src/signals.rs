//! Signal dispositions for the interactive interpreter.
//!
//! Keyboard signals are caught by a handler that does nothing, so the
//! interpreter survives them while its children, whose caught handlers are
//! reset by exec, still get the default action. SIGCHLD reaps background
//! children.

use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};

use crate::exec::reaper;

extern "C" fn swallow(_: libc::c_int) {}

pub fn install() -> nix::Result<()> {
    let keyboard = SigAction::new(
        SigHandler::Handler(swallow),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    for signal in [Signal::SIGINT, Signal::SIGQUIT, Signal::SIGTSTP] {
        // SAFETY: the handler touches no state.
        unsafe { sigaction(signal, &keyboard) }?;
    }

    let child = SigAction::new(
        SigHandler::Handler(reaper::on_sigchld),
        SaFlags::SA_RESTART | SaFlags::SA_NOCLDSTOP,
        SigSet::empty(),
    );
    // SAFETY: the handler only uses waitpid, atomics and errno.
    unsafe { sigaction(Signal::SIGCHLD, &child) }?;
    log::debug!("signal handlers installed");
    Ok(())
}
