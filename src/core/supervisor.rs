use crate::config::types::{BridgeError, Result};
use crate::core::cmdline::split_program;
use crate::kernel::platform::{describe_os_error, exit_code, place_in_new_group, ProcessGroupId};
use crate::kernel::signal::{self, SignalBridge};
use crate::utils::env_translate::EnvBlock;
/// Child lifecycle: spawn, arm, wait
///
/// The launch is a type-state machine so the ordering cannot drift:
/// 1. `Launch<Prepared>`: command line and translated environment
/// 2. `spawn()` -> `Launch<Spawned>`: child running in its own process group
/// 3. `arm_bridge()` -> `Launch<Armed>`: interrupts now relay to that group
/// 4. `await_exit()`: waiter thread owns the child; main thread joins it
use std::marker::PhantomData;
use std::process::{Child, Command, ExitStatus};
use std::thread;

const WAITER_THREAD_NAME: &str = "child-waiter";

/// Command line and environment ready for process creation
pub struct Prepared;

/// Child created, no interrupt relay yet
pub struct Spawned;

/// Interrupt relay installed for the child's group
pub struct Armed;

/// One child process moving through its lifecycle.
pub struct Launch<S> {
    command_line: String,
    env: Option<EnvBlock>,
    child: Option<Child>,
    bridge: Option<SignalBridge>,
    _state: PhantomData<S>,
}

impl Launch<Prepared> {
    pub fn new(command_line: impl Into<String>, env: EnvBlock) -> Self {
        Self {
            command_line: command_line.into(),
            env: Some(env),
            child: None,
            bridge: None,
            _state: PhantomData,
        }
    }

    /// Create the child in a new process group with the translated environment.
    ///
    /// The environment block is released before returning on both paths.
    pub fn spawn(mut self) -> Result<Launch<Spawned>> {
        let env = self
            .env
            .take()
            .ok_or_else(|| BridgeError::Spawn("environment already consumed".to_string()))?;

        let (program, rest) = split_program(&self.command_line)
            .ok_or_else(|| BridgeError::Spawn("empty command line".to_string()))?;

        let mut cmd = Command::new(&program);
        apply_arguments(&mut cmd, rest);
        cmd.env_clear().envs(env.pairs());
        place_in_new_group(&mut cmd);

        let spawned = cmd.spawn();
        drop(env);

        let child = spawned.map_err(|e| {
            let diagnostic = describe_os_error(&e);
            log::warn!("Failed to create '{}': {}", program, diagnostic);
            BridgeError::Spawn(format!("{}: {}", program, diagnostic))
        })?;

        log::info!(
            "Spawned '{}' as pid {} in its own process group",
            program,
            child.id()
        );

        Ok(Launch {
            command_line: self.command_line,
            env: None,
            child: Some(child),
            bridge: None,
            _state: PhantomData,
        })
    }
}

#[cfg(windows)]
fn apply_arguments(cmd: &mut Command, rest: &str) {
    use std::os::windows::process::CommandExt;
    // the target runtime does its own tokenizing
    if !rest.is_empty() {
        cmd.raw_arg(rest);
    }
}

#[cfg(not(windows))]
fn apply_arguments(cmd: &mut Command, rest: &str) {
    cmd.args(crate::core::cmdline::split_arguments(rest));
}

impl Launch<Spawned> {
    /// Child's process group, the address for relayed interrupts.
    pub fn group(&self) -> ProcessGroupId {
        self.child.as_ref().map(Child::id).unwrap_or(0)
    }

    /// Install the interrupt relay for the child's group.
    ///
    /// If the relay cannot be installed the child is killed and reaped.
    pub fn arm_bridge(mut self) -> Result<Launch<Armed>> {
        let group = self.group();
        let bridge = match SignalBridge::arm(group) {
            Ok(bridge) => bridge,
            Err(e) => {
                if let Some(mut child) = self.child.take() {
                    log::warn!("Killing pid {} after relay setup failed: {}", group, e);
                    let _ = child.kill();
                    let _ = child.wait();
                }
                return Err(e);
            }
        };

        Ok(Launch {
            command_line: self.command_line,
            env: None,
            child: self.child.take(),
            bridge: Some(bridge),
            _state: PhantomData,
        })
    }
}

impl Launch<Armed> {
    /// Wait for the child on a dedicated thread and return its exit status.
    ///
    /// The main thread only joins, so it stays free to run the interrupt
    /// handler while the waiter is parked in the native wait.
    pub fn await_exit(mut self) -> Result<i32> {
        let child = self
            .child
            .take()
            .ok_or_else(|| BridgeError::Wait("no child to wait for".to_string()))?;

        let waiter = thread::Builder::new()
            .name(WAITER_THREAD_NAME.to_string())
            .spawn(move || wait_for_child(child))
            .map_err(|e| BridgeError::Wait(format!("failed to start waiter thread: {}", e)))?;

        let status = waiter
            .join()
            .map_err(|_| BridgeError::Wait("waiter thread panicked".to_string()))??;

        let code = exit_code(status);
        log::info!(
            "Child in group {} exited with status {} ({} interrupts relayed)",
            self.bridge.as_ref().map(SignalBridge::group).unwrap_or(0),
            code,
            signal::forwarded_count()
        );
        Ok(code)
    }
}

/// Waiter body. Owns the child; its handles close when it drops here.
fn wait_for_child(mut child: Child) -> Result<ExitStatus> {
    if let Err(e) = signal::block_interrupt_on_current_thread() {
        log::warn!("{}", e);
    }

    child
        .wait()
        .map_err(|e| BridgeError::Wait(describe_os_error(&e)))
}

/// Spawn `command_line`, relay interrupts to it, and return its exit status.
pub fn run(command_line: &str, env: EnvBlock) -> Result<i32> {
    Launch::new(command_line, env)
        .spawn()?
        .arm_bridge()?
        .await_exit()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::BridgeConfig;
    use crate::utils::env_translate::translate_environment;
    use crate::utils::path_convert::PathConverter;

    fn env_block(raw: &[&str]) -> EnvBlock {
        let entries: Vec<Vec<u8>> = raw.iter().map(|e| e.as_bytes().to_vec()).collect();
        translate_environment(&entries, &PathConverter::new(&BridgeConfig::default())).unwrap()
    }

    #[test]
    #[serial_test::serial]
    fn test_exit_status_propagates() {
        for expected in [0, 3, 255] {
            let cmd = format!("/bin/sh -c \"exit {}\"", expected);
            assert_eq!(run(&cmd, env_block(&[])).unwrap(), expected);
        }
    }

    #[test]
    fn test_spawn_failure_reports_platform_diagnostic() {
        let result = Launch::new("/nonexistent/tool --flag", env_block(&[])).spawn();
        match result {
            Err(BridgeError::Spawn(msg)) => {
                assert!(msg.starts_with("/nonexistent/tool: "), "got: {}", msg);
                assert!(msg.contains("os error"), "got: {}", msg);
            }
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("spawn of a missing binary succeeded"),
        }
    }

    #[test]
    fn test_empty_command_line_is_spawn_error() {
        let result = Launch::new("   ", env_block(&[])).spawn();
        assert!(matches!(result, Err(BridgeError::Spawn(_))));
    }

    #[test]
    fn test_child_leads_its_own_group() {
        let spawned = Launch::new("/bin/sh -c \"exit 0\"", env_block(&[]))
            .spawn()
            .unwrap();
        let pid = spawned.group() as libc::pid_t;
        let pgid = unsafe { libc::getpgid(pid) };
        // the child may already be gone; a live child must lead its group
        if pgid != -1 {
            assert_eq!(pgid, pid);
        }
        assert_ne!(unsafe { libc::getpgrp() }, pid);
    }

    #[test]
    #[serial_test::serial]
    fn test_child_sees_translated_environment() {
        let env = env_block(&["PATH=/usr/bin:/bin", "MARKER=kept as-is"]);
        let cmd = r#"/bin/sh -c "test \"$PATH\" = 'C:\cygwin64\usr\bin;C:\cygwin64\bin' && test \"$MARKER\" = 'kept as-is'""#;
        assert_eq!(run(cmd, env).unwrap(), 0);
    }

    #[test]
    #[serial_test::serial]
    fn test_environment_is_not_inherited_past_block() {
        std::env::set_var("BREAKBRIDGE_TEST_LEAK", "1");
        let cmd = r#"/bin/sh -c "test -z \"$BREAKBRIDGE_TEST_LEAK\"""#;
        let code = run(cmd, env_block(&[])).unwrap();
        std::env::remove_var("BREAKBRIDGE_TEST_LEAK");
        assert_eq!(code, 0);
    }
}
