//! Page assembly and static output for folio.
//!
//! # Modules
//!
//! - [`scroll`]: reading-progress computation, the listener-owning meter, and its client script
//! - [`seo`]: title, description, Open Graph and Twitter tags
//! - [`layout`]: the HTML document wrapped around a rendered post
//! - [`build`]: the static build writing `{output}/{route}/index.html`
//! - [`assets`]: stylesheet and scripts bundled into every build

pub mod assets;
pub mod build;
pub mod layout;
pub mod scroll;
pub mod seo;

pub use build::{BuildReport, Page, SiteBuilder};
pub use layout::Header;
pub use seo::SeoMeta;
