//! Markdown loading, rendering, and authoring tools.
//!
//! This crate provides the content half of the folio pipeline:
//!
//! - [`loader`]: read a post and rewrite figure references for a base path
//! - [`markdown`]: render Markdown to HTML with figures, footnotes and math
//! - [`tools`]: line-based rewriters used while preparing post sources

pub mod loader;
pub mod markdown;
pub mod tools;

pub use loader::{load_document, rewrite_asset_paths, BasePath};
pub use markdown::{render, render_document, RenderOptions, RenderedDocument};
