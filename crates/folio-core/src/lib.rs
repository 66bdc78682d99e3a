//! Folio Core: shared types, traits, errors, and utilities.
//!
//! This crate provides the foundational types used across all folio crates.
//! It has no internal folio dependencies.
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`traits`]: Configuration abstraction shared by the CLI and the site builder
//! - [`util`]: Async file and path utilities

pub mod error;
pub mod traits;
pub mod util;

// Re-export key types at crate root for convenience
pub use error::{Error, Result};
pub use traits::ConfigProvider;
