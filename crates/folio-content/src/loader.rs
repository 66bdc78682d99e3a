//! Content loading and asset-path rewriting.
//!
//! Markdown sources reference figures with root-relative paths such as
//! `/assets/figures/figure_1.gif`. When the site is served from a subpath
//! (a project-pages deployment), those references must carry the
//! deployment prefix. [`rewrite_asset_paths`] does that as a plain string
//! substitution over two forms:
//!
//! - raw HTML: `src="/assets/figures/…"`
//! - Markdown destinations: `](/assets/figures/…`
//!
//! # Known limitation
//!
//! The rewrite has no dedup guard and is only safe to apply once. Output
//! that still contains a matchable reference is rewritten again on a second
//! pass, so a prefix can double. Callers apply it exactly once, at load time.

use std::fmt;
use std::path::Path;

use folio_core::util::files::read_file;
use folio_core::{Error, Result};
use log::debug;

/// Root-relative prefix of figure references.
pub const FIGURES_PREFIX: &str = "/assets/figures/";

/// Markers that introduce an asset reference, in the order they are rewritten.
const REFERENCE_MARKERS: [&str; 2] = ["src=\"", "]("];

/// A URL path prefix for subpath deployments.
///
/// Either empty (served from a domain root) or a path starting with `/`
/// without a trailing `/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BasePath(String);

impl BasePath {
    /// The empty base path used for root deployments.
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Validate and wrap a base path.
    ///
    /// A single trailing `/` is trimmed, so `"/proj/"` and `"/proj"` are
    /// equivalent and `"/"` is the root.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the path is non-empty and does not
    /// start with `/`, or contains whitespace or quotes.
    pub fn new(raw: impl AsRef<str>) -> Result<Self> {
        let raw = raw.as_ref().trim();
        let trimmed = raw.strip_suffix('/').unwrap_or(raw);

        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        if !trimmed.starts_with('/') {
            return Err(Error::config(format!(
                "base path '{raw}' must be empty or start with '/'"
            )));
        }
        if trimmed.ends_with('/') {
            return Err(Error::config(format!(
                "base path '{raw}' must not end with '//'"
            )));
        }
        if trimmed.chars().any(|c| c.is_whitespace() || c == '"' || c == '\'') {
            return Err(Error::config(format!(
                "base path '{raw}' contains whitespace or quotes"
            )));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// True for root deployments.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The prefix as a string slice (`""` for root deployments).
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefix a root-relative path (`/assets/site.css`) with this base.
    pub fn join(&self, path: &str) -> String {
        format!("{}{}", self.0, path)
    }
}

impl fmt::Display for BasePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rewrite every figure reference to include `base`.
///
/// Every `src="/assets/figures/X` becomes `src="{base}/assets/figures/X`
/// and every `](/assets/figures/X` becomes `]({base}/assets/figures/X`.
/// No other substring is altered. With a root base the input is returned
/// unchanged.
///
/// # Example
///
/// ```
/// use folio_content::loader::{rewrite_asset_paths, BasePath};
///
/// let base = BasePath::new("/proj").unwrap();
/// let out = rewrite_asset_paths(r#"![a](/assets/figures/f1.png "t")"#, &base);
/// assert_eq!(out, r#"![a](/proj/assets/figures/f1.png "t")"#);
/// ```
pub fn rewrite_asset_paths(source: &str, base: &BasePath) -> String {
    if base.is_root() {
        return source.to_string();
    }

    let mut out = source.to_string();
    for marker in REFERENCE_MARKERS {
        let from = format!("{marker}{FIGURES_PREFIX}");
        let to = format!("{marker}{}{FIGURES_PREFIX}", base.as_str());
        out = out.replace(&from, &to);
    }
    out
}

/// Read a Markdown document and rewrite its asset references.
///
/// # Errors
///
/// Returns an error if the file cannot be read. A missing source fails the
/// build rather than producing an empty page.
pub async fn load_document(path: &Path, base: &BasePath) -> Result<String> {
    let raw = read_file(path).await?;
    debug!(
        "loaded {} ({} bytes), base path '{}'",
        path.display(),
        raw.len(),
        base
    );
    Ok(rewrite_asset_paths(&raw, base))
}
