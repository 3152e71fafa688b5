//! breakbridge: run one child in its own process group and relay interrupts to it
//!
//! The launcher speaks the POSIX interrupt model (`SIGINT`, `:`-separated
//! `/`-rooted path lists). The child runs under the Win32 console model
//! (`CTRL_BREAK_EVENT` addressed to a process group, `;`-separated
//! drive-letter path lists). The bridge rewrites the environment, spawns the
//! child, forwards each interrupt as one break event, and exits with the
//! child's status.
//!
//! # Architecture
//!
//! ## Kernel Primitives ([`kernel`])
//! - [`kernel::signal`]: Interrupt relay (async-signal-safe handler)
//! - [`kernel::platform`]: Process-group creation flag, OS diagnostics, exit mapping
//!
//! ## Supervision ([`core`])
//! - [`core::cmdline`]: Program/argument tokenization with Win32 rules
//! - [`core::supervisor`]: Type-state launch: spawn, arm, wait
//!
//! ## Environment ([`utils`])
//! - [`utils::path_convert`]: POSIX to Win32 path-list conversion
//! - [`utils::env_translate`]: Double-NUL-terminated environment block
//!
//! ## Configuration ([`config`])
//! - [`config::loader`]: Mount table from `breakbridge.json` and env overrides
//! - [`config::types`]: Error taxonomy
//!
//! # Design Principles
//!
//! 1. **Ownership over sharing** - the child handle moves into the waiter thread
//! 2. **Types prevent errors** - the relay cannot be armed before the child exists
//! 3. **Minimal unsafe** - thin wrappers with explicit preconditions
//! 4. **Fail closed** - a path that cannot be converted stops the launch

// Kernel Primitives
pub mod kernel;

// Supervision
pub mod core;

// Configuration
pub mod config;

// Utilities
pub mod utils;

// CLI entrypoint
pub mod cli;

pub use config::types::{BridgeError, ConversionError, Result};
pub use crate::core::supervisor::Launch;
pub use utils::env_translate::EnvBlock;
