//! Binding a stage's overridden streams onto descriptors 0, 1 and 2.

use std::io::{self, Write};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};

use nix::fcntl::{FcntlArg, fcntl};
use nix::unistd::dup2;

use crate::error::ExecError;
use crate::parse::{Stage, Stream};

/// Saved copies are placed at or above this number, clear of the standard three.
const SAVE_FLOOR: RawFd = 10;

const STREAMS: [Stream; 3] = [Stream::Input, Stream::Output, Stream::Error];

/// Install a stage's overrides in a freshly forked child. Nothing is saved:
/// the child execs or exits right after.
pub fn bind(stage: &Stage) -> Result<(), ExecError> {
    for stream in STREAMS {
        if let Some(fd) = stage.fd(stream) {
            dup2(fd.as_raw_fd(), stream.fileno())
                .map_err(|source| ExecError::Redirect { stream, source })?;
        }
    }
    Ok(())
}

/// The interpreter's own standard streams, temporarily pointed at a stage's
/// overrides while a builtin runs.
///
/// Call [`StdioGuard::restore`] to learn whether restoring worked; dropping
/// the guard restores on a best-effort basis.
#[derive(Debug)]
pub struct StdioGuard {
    saved: Vec<(Stream, OwnedFd)>,
}

impl StdioGuard {
    pub fn redirect(stage: &Stage) -> Result<Self, ExecError> {
        flush_std();
        let mut guard = Self { saved: Vec::new() };
        for stream in STREAMS {
            let Some(fd) = stage.fd(stream) else {
                continue;
            };
            let copy = fcntl(stream.fileno(), FcntlArg::F_DUPFD_CLOEXEC(SAVE_FLOOR))
                .map_err(|source| ExecError::Redirect { stream, source })?;
            // SAFETY: fcntl just returned this descriptor and nothing else owns it.
            let copy = unsafe { OwnedFd::from_raw_fd(copy) };
            guard.saved.push((stream, copy));
            dup2(fd.as_raw_fd(), stream.fileno())
                .map_err(|source| ExecError::Redirect { stream, source })?;
        }
        Ok(guard)
    }

    /// Put the saved streams back.
    pub fn restore(mut self) -> Result<(), ExecError> {
        self.restore_saved()
    }

    fn restore_saved(&mut self) -> Result<(), ExecError> {
        flush_std();
        let mut result = Ok(());
        while let Some((stream, copy)) = self.saved.pop() {
            if let Err(source) = dup2(copy.as_raw_fd(), stream.fileno()) {
                log::error!("cannot restore standard {}: {source}", stream.as_str());
                result = Err(ExecError::Restore { stream, source });
            }
        }
        result
    }
}

impl Drop for StdioGuard {
    fn drop(&mut self) {
        if !self.saved.is_empty() {
            let _ = self.restore_saved();
        }
    }
}

/// Push buffered output through before descriptors change underneath it.
pub(crate) fn flush_std() {
    let _ = io::stdout().flush();
    let _ = io::stderr().flush();
}
