//! Utility modules for file operations and path handling.
//!
//! # Modules
//!
//! - [`files`]: Async file discovery, reading, writing, and copying
//! - [`paths`]: Path resolution helpers (project root discovery, tilde expansion)

pub mod files;
pub mod paths;
