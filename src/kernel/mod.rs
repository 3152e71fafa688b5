//! Thin wrappers around host process and signal primitives.
//!
//! All `unsafe` code is concentrated here with explicit SAFETY comments.

pub mod platform;
pub mod signal;
