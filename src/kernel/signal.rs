use crate::config::types::{BridgeError, Result};
use crate::kernel::platform::ProcessGroupId;
use log::info;
/// Interrupt relay from the launcher to the child's process group
///
/// The handler is async-signal-safe: it loads an atomic, issues one break
/// call and bumps a counter. No allocation, no locks, no I/O.
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

/// Group that interrupts are relayed to. Zero until armed.
static FORWARD_GROUP: AtomicU32 = AtomicU32::new(0);

/// Number of break events successfully delivered.
static FORWARDED: AtomicUsize = AtomicUsize::new(0);

/// Armed interrupt relay for one child process group.
#[derive(Debug)]
pub struct SignalBridge {
    group: ProcessGroupId,
}

impl SignalBridge {
    /// Record the target group, then install the handler.
    /// The group is written before the handler can observe it.
    pub fn arm(group: ProcessGroupId) -> Result<Self> {
        if group == 0 {
            return Err(BridgeError::Signal("invalid process group 0".to_string()));
        }

        FORWARD_GROUP.store(group, Ordering::SeqCst);
        imp::install_handler()?;

        info!("Interrupt relay armed for process group {}", group);
        Ok(Self { group })
    }

    pub fn group(&self) -> ProcessGroupId {
        self.group
    }
}

/// Break events delivered since process start.
pub fn forwarded_count() -> usize {
    FORWARDED.load(Ordering::SeqCst)
}

/// Handler body. Safe to call from signal context.
fn relay_interrupt() -> bool {
    relay_to(FORWARD_GROUP.load(Ordering::SeqCst))
}

fn relay_to(group: ProcessGroupId) -> bool {
    if group == 0 {
        return false;
    }
    if imp::send_break(group) {
        FORWARDED.fetch_add(1, Ordering::SeqCst);
        true
    } else {
        false
    }
}

/// Keep interrupts off the calling thread so they land on the main thread.
pub fn block_interrupt_on_current_thread() -> Result<()> {
    imp::block_interrupt()
}

#[cfg(unix)]
mod imp {
    use crate::config::types::{BridgeError, Result};
    use crate::kernel::platform::ProcessGroupId;
    use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, SigmaskHow, Signal};

    pub(super) fn install_handler() -> Result<()> {
        let action = SigAction::new(
            SigHandler::Handler(on_interrupt),
            SaFlags::SA_RESTART,
            SigSet::empty(),
        );

        // SAFETY: on_interrupt only touches atomics and calls kill(2).
        unsafe { signal::sigaction(Signal::SIGINT, &action) }
            .map_err(|e| BridgeError::Signal(format!("SIGINT: {}", e)))?;
        Ok(())
    }

    extern "C" fn on_interrupt(_signal: libc::c_int) {
        super::relay_interrupt();
    }

    pub(super) fn send_break(group: ProcessGroupId) -> bool {
        // SAFETY: kill(2) is async-signal-safe; a negative pid addresses the group.
        unsafe { libc::kill(-(group as libc::pid_t), libc::SIGINT) == 0 }
    }

    pub(super) fn block_interrupt() -> Result<()> {
        let mut mask = SigSet::empty();
        mask.add(Signal::SIGINT);
        signal::pthread_sigmask(SigmaskHow::SIG_BLOCK, Some(&mask), None)
            .map_err(|e| BridgeError::Signal(format!("Failed to block SIGINT: {}", e)))
    }
}

#[cfg(windows)]
mod imp {
    use crate::config::types::{BridgeError, Result};
    use crate::kernel::platform::{last_platform_error, ProcessGroupId};

    const CTRL_C_EVENT: u32 = 0;
    const CTRL_BREAK_EVENT: u32 = 1;
    const TRUE: i32 = 1;
    const FALSE: i32 = 0;

    #[link(name = "kernel32")]
    extern "system" {
        fn SetConsoleCtrlHandler(
            handler: Option<unsafe extern "system" fn(u32) -> i32>,
            add: i32,
        ) -> i32;
        fn GenerateConsoleCtrlEvent(ctrl_event: u32, process_group_id: u32) -> i32;
    }

    pub(super) fn install_handler() -> Result<()> {
        // SAFETY: on_control is a valid handler for the life of the process.
        if unsafe { SetConsoleCtrlHandler(Some(on_control), TRUE) } == FALSE {
            return Err(BridgeError::Signal(last_platform_error()));
        }
        Ok(())
    }

    unsafe extern "system" fn on_control(ctrl_type: u32) -> i32 {
        if ctrl_type == CTRL_C_EVENT {
            super::relay_interrupt();
            TRUE
        } else {
            FALSE
        }
    }

    pub(super) fn send_break(group: ProcessGroupId) -> bool {
        // SAFETY: plain Win32 call, no pointers involved.
        unsafe { GenerateConsoleCtrlEvent(CTRL_BREAK_EVENT, group) != FALSE }
    }

    // Console control handlers run on their own thread.
    pub(super) fn block_interrupt() -> Result<()> {
        Ok(())
    }
}
