//! Utility module.

pub mod cache;
pub mod debounce;
