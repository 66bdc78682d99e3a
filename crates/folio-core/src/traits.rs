//! Core traits shared across folio crates.
//!
//! The primary trait is [`ConfigProvider`], which abstracts where a site
//! project keeps its sources and where the build writes its output. The CLI
//! implements it with a TOML-backed config; tests implement it with a
//! throwaway struct pointing at a temp directory.

use std::path::PathBuf;

use crate::Result;

/// Content roots a [`ConfigProvider`] can resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    /// Directory holding the Markdown sources.
    Content,
    /// Directory holding static assets (figures, stylesheets).
    Assets,
    /// Directory the static build writes into.
    Output,
}

impl ContentKind {
    /// Default directory name relative to the project root.
    pub fn default_dir(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Assets => "static/assets",
            Self::Output => "docs",
        }
    }
}

/// Trait for project configuration.
///
/// # Bounds
///
/// - `Send + Sync`: configuration is shared with async build tasks
/// - `Clone`: configuration is handed to subsystems by value
/// - `'static`: configuration lifetime is not borrowed
///
/// # Example
///
/// ```
/// use std::path::PathBuf;
/// use folio_core::traits::{ConfigProvider, ContentKind};
/// use folio_core::Result;
///
/// #[derive(Clone)]
/// struct PostConfig {
///     root: PathBuf,
/// }
///
/// impl ConfigProvider for PostConfig {
///     fn project_name(&self) -> &str {
///         "rl-excursions"
///     }
///
///     fn project_root(&self) -> Result<PathBuf> {
///         Ok(self.root.clone())
///     }
///
///     fn content_path(&self, kind: ContentKind) -> Result<PathBuf> {
///         Ok(self.root.join(kind.default_dir()))
///     }
/// }
///
/// let config = PostConfig { root: PathBuf::from("/site") };
/// assert_eq!(
///     config.content_path(ContentKind::Output).unwrap(),
///     PathBuf::from("/site/docs")
/// );
/// ```
pub trait ConfigProvider: Send + Sync + Clone + 'static {
    /// The project name, used in log output and the default config path.
    fn project_name(&self) -> &str;

    /// Root directory of the site project.
    ///
    /// Relative content paths are resolved against this directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be determined.
    fn project_root(&self) -> Result<PathBuf>;

    /// Path for a specific content root.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be resolved.
    fn content_path(&self, kind: ContentKind) -> Result<PathBuf>;
}
