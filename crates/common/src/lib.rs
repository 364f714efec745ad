//! Shared runtime helpers for the expense workspace.

pub mod utils;

pub use utils::logging;
