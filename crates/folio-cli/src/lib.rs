//! Command-line front end for the folio site builder.
//!
//! # Key Abstractions
//!
//! - [`FolioCli`]: loads configuration, installs logging, dispatches commands
//! - [`FolioConfig`]: file, environment, and default configuration
//! - [`CliArgs`]: the clap argument tree

pub mod app;
pub mod cli;
pub mod config;
pub mod config_handlers;

pub use app::{FolioCli, Outcome};
pub use cli::{CaptionsArgs, CliArgs, Command, ConfigAction, ConfigCommand, RewriteArgs};
pub use config::{FolioConfig, SiteConfig};
