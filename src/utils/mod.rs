//! Utilities
//!
//! Path-list conversion and environment block construction.

pub mod env_translate;
pub mod path_convert;
