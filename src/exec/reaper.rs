//! Reaping of background children.
//!
//! Background pids live in a fixed table of atomics so the SIGCHLD handler
//! can reap them without locking or allocating. The handler only ever waits
//! on pids from the table, so it never collects a foreground child the
//! engine is blocked on. Pids that do not fit in the table go to an overflow
//! list that only [`sweep`] reads, once per prompt.

use std::sync::Mutex;
use std::sync::atomic::{AtomicI32, Ordering};

use nix::errno::Errno;
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;

const SLOTS: usize = 64;

/// Zero marks a free slot.
static BACKGROUND: [AtomicI32; SLOTS] = [const { AtomicI32::new(0) }; SLOTS];

static OVERFLOW: Mutex<Vec<Pid>> = Mutex::new(Vec::new());

/// Track a background child until it is reaped.
pub fn register(pid: Pid) {
    for slot in &BACKGROUND {
        if slot
            .compare_exchange(0, pid.as_raw(), Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
        {
            log::debug!("background {pid} registered");
            return;
        }
    }
    log::warn!("background table full; {pid} is reaped at the next prompt");
    if let Ok(mut overflow) = OVERFLOW.lock() {
        overflow.push(pid);
    }
}

/// True when `pid` has terminated (and is now reaped) or no longer exists.
fn try_reap(pid: Pid) -> bool {
    match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
        Ok(WaitStatus::StillAlive) => false,
        Ok(_) | Err(Errno::ECHILD) => true,
        Err(_) => false,
    }
}

/// Reap every registered child that has terminated. Async-signal-safe.
fn reap_registered() -> usize {
    let mut reaped = 0;
    for slot in &BACKGROUND {
        let raw = slot.load(Ordering::Acquire);
        if raw == 0 {
            continue;
        }
        if try_reap(Pid::from_raw(raw))
            && slot
                .compare_exchange(raw, 0, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
        {
            reaped += 1;
        }
    }
    reaped
}

/// SIGCHLD handler.
pub extern "C" fn on_sigchld(_: libc::c_int) {
    let saved = Errno::last_raw();
    reap_registered();
    Errno::set_raw(saved);
}

/// Reap whatever the handler has not, including overflow pids.
pub fn sweep() {
    let mut reaped = reap_registered();
    if let Ok(mut overflow) = OVERFLOW.lock() {
        let before = overflow.len();
        overflow.retain(|&pid| !try_reap(pid));
        reaped += before - overflow.len();
    }
    if reaped > 0 {
        log::debug!("reaped {reaped} background child(ren)");
    }
}

/// Number of background children still tracked.
pub fn pending() -> usize {
    let tracked = BACKGROUND
        .iter()
        .filter(|slot| slot.load(Ordering::Acquire) != 0)
        .count();
    tracked + OVERFLOW.lock().map(|o| o.len()).unwrap_or(0)
}
