//! Configuration and error taxonomy.

pub mod loader;
pub mod types;

pub use loader::{BridgeConfig, MountEntry};
