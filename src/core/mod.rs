//! Process supervision core.
//!
//! Owns command-line interpretation and the child's lifecycle from
//! creation to exit-status retrieval.

pub mod cmdline;
pub mod supervisor;
