//! Configuration for the folio CLI.
//!
//! Provides the [`FolioConfig`] struct that loads from TOML files,
//! environment variables, and defaults using the `confyg` crate.
//!
//! # Loading Priority
//!
//! 1. Explicit `--config <path>` flag
//! 2. `FOLIO_CONFIG` environment variable
//! 3. `folio.toml` in the working directory or one of its parents
//! 4. XDG default: `~/.config/folio/config.toml`
//! 5. Built-in defaults
//!
//! `FOLIO_<SECTION>_<KEY>` environment variables override file values.
//!
//! # Base path
//!
//! The deployment base path is chosen by [`FolioConfig::resolve_base_path`]:
//! the `--base-path` flag, then `site.base_path`, then the GitHub Pages
//! switch (`GITHUB_PAGES` set to any non-empty value, or
//! `site.github_pages = true`) selecting `site.pages_base_path`, and
//! finally the empty root path.

use std::path::{Path, PathBuf};

use confyg::{env, Confygery};
use folio_content::BasePath;
use folio_core::traits::{ConfigProvider, ContentKind};
use folio_core::util::paths::{find_dir_with_marker, resolve_against};
use folio_core::{Error, Result};
use folio_site::{Header, Page};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Project-local configuration file name.
pub const PROJECT_MARKER: &str = "folio.toml";

/// Environment flag selecting the GitHub Pages base path.
pub const GITHUB_PAGES_ENV: &str = "GITHUB_PAGES";

/// Base path used for GitHub Pages project deployments.
pub const DEFAULT_PAGES_BASE_PATH: &str = "/rl-excursions-during-pretraining";

/// Prefix of environment variables overlaid on the config file.
pub const ENV_PREFIX: &str = "FOLIO";

/// Sections whose keys can be set from `FOLIO_<SECTION>_<KEY>`.
pub const ENV_SECTIONS: [&str; 2] = ["site", "header"];

// ============================================================================
// Configuration structs
// ============================================================================

/// Main configuration for the folio CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    /// Project name, used in log output.
    pub project_name: String,

    /// Site project root. Defaults to the directory of the loaded
    /// `folio.toml`, or the working directory.
    pub project_root: Option<String>,

    /// Directories and deployment settings.
    pub site: SiteConfig,

    /// Post header shown on every page.
    pub header: Header,

    /// Pages to build.
    pub pages: Vec<Page>,

    /// Directory of the config file this was loaded from.
    #[serde(skip)]
    config_dir: Option<PathBuf>,
}

/// Directories and deployment settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Explicit deployment base path (`""` or `/…`).
    pub base_path: Option<String>,

    /// Deploying to GitHub Pages; selects `pages_base_path`.
    #[serde(deserialize_with = "flag")]
    pub github_pages: bool,

    /// Base path used for GitHub Pages deployments.
    pub pages_base_path: String,

    /// Markdown sources, relative to the project root.
    pub content_dir: String,

    /// Static assets copied to `{output}/assets/`.
    pub assets_dir: String,

    /// Build output directory.
    pub output_dir: String,

    /// Public origin (`https://user.github.io`) for canonical URLs.
    pub site_url: Option<String>,
}

// ============================================================================
// Default implementations
// ============================================================================

impl Default for FolioConfig {
    fn default() -> Self {
        Self {
            project_name: "folio".to_string(),
            project_root: None,
            site: SiteConfig::default(),
            header: Header::default(),
            pages: vec![
                Page::new("/", "index.md"),
                Page::new("/rl-excursions/", "rl_excursions.md"),
            ],
            config_dir: None,
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_path: None,
            github_pages: false,
            pages_base_path: DEFAULT_PAGES_BASE_PATH.to_string(),
            content_dir: ContentKind::Content.default_dir().to_string(),
            assets_dir: ContentKind::Assets.default_dir().to_string(),
            output_dir: ContentKind::Output.default_dir().to_string(),
            site_url: None,
        }
    }
}

// ============================================================================
// Config loading
// ============================================================================

impl FolioConfig {
    /// Load configuration from file, environment, and defaults.
    ///
    /// A missing config file is not an error; defaults apply.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder =
            Confygery::new().map_err(|e| Error::config(format!("config init: {e}")))?;

        let mut config_dir = None;
        if let Some(path) = Self::resolve_config_path(config_path) {
            if path.exists() {
                builder
                    .add_file(&path.to_string_lossy())
                    .map_err(|e| Error::config(format!("config file: {e}")))?;
                config_dir = path.parent().map(Path::to_path_buf);
                log::debug!("loading config from {}", path.display());
            }
        }

        let mut env_opts = env::Options::with_top_level(ENV_PREFIX);
        for section in ENV_SECTIONS {
            env_opts.add_section(section);
        }
        builder
            .add_env(env_opts)
            .map_err(|e| Error::config(format!("config env: {e}")))?;

        let mut config: Self = builder
            .build()
            .map_err(|e| Error::config(format!("config build: {e}")))?;
        config.config_dir = config_dir;

        Ok(config)
    }

    /// Resolve the config file path from explicit flag, env var, project
    /// marker, or XDG default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        // 1. Explicit --config flag
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }

        // 2. FOLIO_CONFIG env var
        if let Ok(path) = std::env::var("FOLIO_CONFIG") {
            return Some(PathBuf::from(path));
        }

        // 3. Project-local folio.toml
        if let Some(dir) = std::env::current_dir()
            .ok()
            .and_then(|cwd| find_dir_with_marker(cwd, PROJECT_MARKER))
        {
            return Some(dir.join(PROJECT_MARKER));
        }

        // 4. XDG default
        Self::default_config_path()
    }

    /// Return the XDG default config path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("folio").join("config.toml"))
    }

    /// Serialize this config to a pretty-printed TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// The `FOLIO_*` variables that reproduce this config through [`load`].
    ///
    /// Only scalars at the top level and in [`ENV_SECTIONS`] can be
    /// overlaid; arrays (`pages`, `header.affiliations`) are left out.
    ///
    /// [`load`]: FolioConfig::load
    pub fn to_env_vars(&self) -> Result<Vec<(String, String)>> {
        let value = toml::Value::try_from(self).map_err(|e| Error::config(e.to_string()))?;
        let Some(table) = value.as_table() else {
            return Ok(Vec::new());
        };

        let mut vars = Vec::new();
        for (key, val) in table {
            match val {
                toml::Value::Table(section) if ENV_SECTIONS.contains(&key.as_str()) => {
                    let prefix = env_name(&[ENV_PREFIX, key.as_str()]);
                    for (field, val) in section {
                        if let Some(scalar) = env_scalar(val) {
                            vars.push((env_name(&[prefix.as_str(), field.as_str()]), scalar));
                        }
                    }
                }
                other => {
                    if let Some(scalar) = env_scalar(other) {
                        vars.push((env_name(&[ENV_PREFIX, key.as_str()]), scalar));
                    }
                }
            }
        }
        Ok(vars)
    }

    /// Choose the deployment base path, reading `GITHUB_PAGES` from the
    /// environment.
    pub fn resolve_base_path(&self, flag: Option<&str>) -> Result<BasePath> {
        let github_pages = std::env::var(GITHUB_PAGES_ENV).ok();
        self.resolve_base_path_with(flag, github_pages.as_deref())
    }

    /// Choose the deployment base path given the value of `GITHUB_PAGES`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the chosen path is not a valid
    /// base path.
    pub fn resolve_base_path_with(
        &self,
        flag: Option<&str>,
        github_pages_env: Option<&str>,
    ) -> Result<BasePath> {
        let pages_flag = github_pages_env.is_some_and(|v| !v.is_empty());

        let raw = match (flag, &self.site.base_path) {
            (Some(flag), _) => flag,
            (None, Some(configured)) => configured.as_str(),
            (None, None) if pages_flag || self.site.github_pages => {
                self.site.pages_base_path.as_str()
            }
            (None, None) => "",
        };

        BasePath::new(raw)
    }
}

// ============================================================================
// ConfigProvider implementation
// ============================================================================

impl ConfigProvider for FolioConfig {
    fn project_name(&self) -> &str {
        &self.project_name
    }

    fn project_root(&self) -> Result<PathBuf> {
        let cwd = || {
            std::env::current_dir()
                .map_err(|e| Error::config(format!("Could not determine project root: {e}")))
        };
        let anchor = match &self.config_dir {
            Some(dir) => dir.clone(),
            None => cwd()?,
        };
        match &self.project_root {
            Some(root) => Ok(resolve_against(&anchor, root)),
            None => Ok(anchor),
        }
    }

    fn content_path(&self, kind: ContentKind) -> Result<PathBuf> {
        let configured = match kind {
            ContentKind::Content => &self.site.content_dir,
            ContentKind::Assets => &self.site.assets_dir,
            ContentKind::Output => &self.site.output_dir,
        };
        Ok(resolve_against(&self.project_root()?, configured))
    }
}

// ============================================================================
// Environment helpers
// ============================================================================

/// `FOLIO`, `site`, `output_dir` become `FOLIO_SITE_OUTPUT_DIR`.
fn env_name(parts: &[&str]) -> String {
    parts.join("_").to_uppercase().replace('-', "_")
}

/// Env form of a scalar; `None` for arrays, tables, and dates.
fn env_scalar(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Booleans arrive from the environment overlay as strings.
fn flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" | "" => Ok(false),
            other => Err(D::Error::custom(format!("invalid boolean '{other}'"))),
        },
    }
}

// ============================================================================
// Tests
// ============================================================================
