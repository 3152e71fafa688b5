//! The few process-creation details that differ per host.

use std::process::{Command, ExitStatus};

/// Identifier of the child's process group. Equal to the child's pid: the
/// child is created as the leader of a fresh group.
pub type ProcessGroupId = u32;

/// `CREATE_NEW_PROCESS_GROUP` creation flag.
#[cfg(windows)]
const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;

/// Platform diagnostic for the calling thread's last OS error.
pub fn last_platform_error() -> String {
    describe_os_error(&std::io::Error::last_os_error())
}

/// Render an OS error with the platform's own message text.
pub fn describe_os_error(err: &std::io::Error) -> String {
    match err.raw_os_error() {
        // std formats raw codes through strerror / FormatMessageW
        Some(code) => std::io::Error::from_raw_os_error(code).to_string(),
        None => err.to_string(),
    }
}

/// Make the spawned child the leader of a new process group.
///
/// On POSIX hosts the child also starts with the default `SIGINT`
/// disposition, so an ignored interrupt inherited by the launcher does not
/// swallow relayed ones.
pub fn place_in_new_group(cmd: &mut Command) {
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
        // SAFETY: signal(2) is async-signal-safe and touches no parent state.
        unsafe {
            cmd.pre_exec(|| {
                if libc::signal(libc::SIGINT, libc::SIG_DFL) == libc::SIG_ERR {
                    return Err(std::io::Error::last_os_error());
                }
                Ok(())
            });
        }
    }

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        cmd.creation_flags(CREATE_NEW_PROCESS_GROUP);
    }
}

/// Map a child's termination to the bridge's own exit status.
///
/// A POSIX child killed by a signal reports `128 + signo`.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    crate::config::types::BRIDGE_FAILURE_STATUS
}
