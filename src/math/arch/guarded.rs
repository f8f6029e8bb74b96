//! Guarded execution: run a probe that may fault in a forked child and report
//! whether it finished.
//!
//! The parent never touches its own signal dispositions. The child restores
//! the default `SIGILL` action, disables core dumps, runs the probe and exits
//! with `_exit` so no parent state (stdio buffers, atexit hooks, test harness)
//! is flushed twice.

use nix::errno::Errno;
use nix::sys::resource::{Resource, setrlimit};
use nix::sys::signal::{SigHandler, Signal, signal};
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{ForkResult, fork};

/// `true` when `probe` ran to completion in the child. Signals, a nonzero
/// exit and every fork/wait failure read as `false`.
pub(crate) fn run(probe: fn()) -> bool {
    match try_run(probe) {
        Ok(completed) => completed,
        Err(err) => {
            log::warn!("guarded probe could not run: {err}");
            false
        }
    }
}

fn try_run(probe: fn()) -> nix::Result<bool> {
    // SAFETY: the child only resets its own signal state, sets a resource
    // limit, runs `probe` and leaves through `_exit`
    match unsafe { fork() }? {
        ForkResult::Child => {
            // SAFETY: restoring the default disposition installs no handler
            unsafe {
                let _ = signal(Signal::SIGILL, SigHandler::SigDfl);
            }
            let _ = setrlimit(Resource::RLIMIT_CORE, 0, 0);
            let code = match std::panic::catch_unwind(probe) {
                Ok(()) => 0,
                Err(_) => 1,
            };
            // SAFETY: terminates the child without running parent-owned
            // destructors or exit hooks
            unsafe { nix::libc::_exit(code) }
        }
        ForkResult::Parent { child } => loop {
            match waitpid(child, None) {
                Ok(WaitStatus::Exited(_, code)) => return Ok(code == 0),
                Ok(WaitStatus::Signaled(_, sig, _)) => {
                    log::debug!("guarded probe terminated by {sig}");
                    return Ok(false);
                }
                Ok(_) | Err(Errno::EINTR) => continue,
                Err(err) => return Err(err),
            }
        },
    }
}
