//! Static site build.
//!
//! Each configured page is loaded, rendered, laid out and written to
//! `{output}/{route}/index.html`. Routes always end in `/`, so every page is
//! a directory index and works on static hosts without rewrite rules.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use folio_content::markdown::{render_document, RenderOptions, IMAGE_PLACEHOLDER};
use folio_content::{load_document, BasePath};
use folio_core::traits::{ConfigProvider, ContentKind};
use folio_core::util::files::{copy_dir, exists, write_file};
use folio_core::{Error, Result};
use log::{debug, info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::assets;
use crate::layout::{render_page, Header, PageContext};
use crate::seo::SeoMeta;

/// File that tells GitHub Pages to skip Jekyll processing.
pub const NOJEKYLL: &str = ".nojekyll";

static LOCAL_ASSET_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:src|href)="(?P<url>[^"]*/assets/[^"]*)""#).expect("asset ref regex is valid")
});

/// One page of the site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// URL route, e.g. `/` or `/rl-excursions/`.
    pub route: String,
    /// Markdown source, relative to the content directory.
    pub source: PathBuf,
    /// SEO title. Defaults to the first `#` heading of the source.
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Preview image URL for link cards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Page {
    pub fn new(route: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            route: route.into(),
            source: source.into(),
            title: String::new(),
            description: String::new(),
            image: None,
        }
    }

    pub fn with_seo(mut self, title: impl Into<String>, description: impl Into<String>) -> Self {
        self.title = title.into();
        self.description = description.into();
        self
    }
}

/// Normalise a route to `/segment/…/`.
///
/// # Errors
///
/// Returns a configuration error for routes with empty, `.` or `..`
/// segments, or characters that do not belong in a URL path.
pub fn normalize_route(route: &str) -> Result<String> {
    let trimmed = route.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Ok("/".to_string());
    }

    for segment in trimmed.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(Error::config(format!("invalid route '{route}'")));
        }
        if segment
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '?' | '#' | '\\'))
        {
            return Err(Error::config(format!("invalid route '{route}'")));
        }
    }

    Ok(format!("/{trimmed}/"))
}

/// Output file for a normalised route.
pub fn route_output_path(output_dir: &Path, route: &str) -> PathBuf {
    let mut path = output_dir.to_path_buf();
    for segment in route.split('/').filter(|s| !s.is_empty()) {
        path.push(segment);
    }
    path.join("index.html")
}

/// Outcome of a successful build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// HTML files written, in page order.
    pub pages: Vec<PathBuf>,
    /// Files copied from the assets directory.
    pub assets_copied: usize,
    /// Root-relative asset paths referenced by a page but absent from the output.
    pub missing_assets: Vec<String>,
}

/// Builds the static site.
///
/// # Example
///
/// ```no_run
/// # use folio_site::build::{Page, SiteBuilder};
/// # async fn example() -> folio_core::Result<()> {
/// let report = SiteBuilder::new("docs")
///     .content_dir("content")
///     .assets_dir("static/assets")
///     .page(Page::new("/rl-excursions/", "rl_excursions.md"))
///     .build()
///     .await?;
/// println!("{} pages", report.pages.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SiteBuilder {
    output_dir: PathBuf,
    content_dir: PathBuf,
    assets_dir: Option<PathBuf>,
    base: BasePath,
    site_url: Option<String>,
    header: Header,
    pages: Vec<Page>,
    render_options: RenderOptions,
}

impl SiteBuilder {
    /// Create a builder writing into `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            content_dir: PathBuf::from(ContentKind::Content.default_dir()),
            assets_dir: None,
            base: BasePath::root(),
            site_url: None,
            header: Header::default(),
            pages: Vec::new(),
            render_options: RenderOptions::default(),
        }
    }

    /// Create a builder with directories resolved by `config`.
    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        Ok(Self::new(config.content_path(ContentKind::Output)?)
            .content_dir(config.content_path(ContentKind::Content)?)
            .assets_dir(config.content_path(ContentKind::Assets)?))
    }

    pub fn content_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.content_dir = dir.into();
        self
    }

    pub fn assets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.assets_dir = Some(dir.into());
        self
    }

    pub fn base_path(mut self, base: BasePath) -> Self {
        self.base = base;
        self
    }

    /// Public origin (`https://example.org`) used for canonical URLs.
    pub fn site_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.site_url = (!url.is_empty()).then(|| url.trim_end_matches('/').to_string());
        self
    }

    pub fn header(mut self, header: Header) -> Self {
        self.header = header;
        self
    }

    pub fn page(mut self, page: Page) -> Self {
        self.pages.push(page);
        self
    }

    pub fn pages(mut self, pages: impl IntoIterator<Item = Page>) -> Self {
        self.pages.extend(pages);
        self
    }

    pub fn render_options(mut self, options: RenderOptions) -> Self {
        self.render_options = options;
        self
    }

    /// Replace the output directory.
    pub fn output(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Check pages before anything is written.
    fn validated_routes(&self) -> Result<Vec<String>> {
        if self.pages.is_empty() {
            return Err(Error::config("no pages configured"));
        }

        let mut seen = HashSet::new();
        let mut routes = Vec::with_capacity(self.pages.len());
        for page in &self.pages {
            let route = normalize_route(&page.route)?;
            if !seen.insert(route.clone()) {
                return Err(Error::config(format!("duplicate route '{route}'")));
            }
            routes.push(route);
        }
        Ok(routes)
    }

    fn seo_for(&self, page: &Page, route: &str, fallback_title: Option<&str>) -> SeoMeta {
        let title = if page.title.is_empty() {
            fallback_title.unwrap_or(&self.header.title).to_string()
        } else {
            page.title.clone()
        };
        let mut seo = SeoMeta::new(title, page.description.clone());
        if let Some(origin) = &self.site_url {
            seo = seo.with_canonical_url(format!("{origin}{}", self.base.join(route)));
        }
        if let Some(image) = &page.image {
            seo = seo.with_image(image.clone());
        }
        seo
    }

    /// Copy the assets directory and write bundled files it does not override.
    async fn write_assets(&self) -> Result<usize> {
        let target = self.output_dir.join("assets");
        let mut copied = Vec::new();

        match &self.assets_dir {
            Some(dir) if exists(dir).await => {
                copied = copy_dir(dir, &target).await?;
                info!("copied {} assets from {}", copied.len(), dir.display());
            }
            Some(dir) => debug!("assets directory {} not found, skipping", dir.display()),
            None => {}
        }

        for (path, contents) in assets::bundled() {
            let relative = Path::new(path).strip_prefix("assets").unwrap_or(Path::new(path));
            if copied.iter().any(|c| c == relative) {
                debug!("{path} provided by the site, not overwriting");
                continue;
            }
            write_file(&self.output_dir.join(path), contents).await?;
        }

        Ok(copied.len())
    }

    /// Root-relative asset paths referenced by `html` that are missing from
    /// the output directory.
    async fn missing_assets(&self, html: &str) -> Vec<String> {
        let mut missing = BTreeSet::new();

        for caps in LOCAL_ASSET_REF.captures_iter(html) {
            let url = &caps["url"];
            if url.contains(IMAGE_PLACEHOLDER) || !url.starts_with('/') || url.starts_with("//") {
                continue;
            }
            let url = url.split(['?', '#']).next().unwrap_or(url);
            let path = url.strip_prefix(self.base.as_str()).unwrap_or(url);
            let Some(relative) = path.strip_prefix('/') else {
                continue;
            };

            let file = self.output_dir.join(relative.replace("%20", " "));
            if !exists(&file).await {
                missing.insert(path.to_string());
            }
        }

        missing.into_iter().collect()
    }

    /// Run the build.
    ///
    /// # Errors
    ///
    /// Fails on invalid or duplicate routes, a missing Markdown source, or
    /// any I/O error while writing. Missing images only produce warnings.
    pub async fn build(&self) -> Result<BuildReport> {
        let routes = self.validated_routes()?;
        info!(
            "building {} pages into {} (base path '{}')",
            routes.len(),
            self.output_dir.display(),
            self.base
        );

        let mut report = BuildReport {
            assets_copied: self.write_assets().await?,
            ..BuildReport::default()
        };

        let mut missing = BTreeSet::new();
        for (page, route) in self.pages.iter().zip(&routes) {
            let source_path = self.content_dir.join(&page.source);
            let source = load_document(&source_path, &self.base).await.map_err(|e| {
                if e.is_not_found() {
                    Error::not_found(format!(
                        "source for route '{route}' not found: {}",
                        source_path.display()
                    ))
                } else {
                    e
                }
            })?;

            let rendered = render_document(&source, &self.render_options);
            let seo = self.seo_for(page, route, rendered.title());
            let html = render_page(&PageContext {
                seo: &seo,
                header: &self.header,
                body_html: &rendered.html,
                base: &self.base,
            });

            let out_path = route_output_path(&self.output_dir, route);
            write_file(&out_path, html).await?;
            info!("wrote {route} -> {}", out_path.display());

            missing.extend(self.missing_assets(&rendered.html).await);
            report.pages.push(out_path);
        }

        write_file(&self.output_dir.join(NOJEKYLL), "").await?;

        for path in &missing {
            warn!("missing asset referenced by a page: {path}");
        }
        report.missing_assets = missing.into_iter().collect();

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_route() {
        assert_eq!(normalize_route("").unwrap(), "/");
        assert_eq!(normalize_route("/").unwrap(), "/");
        assert_eq!(normalize_route("rl-excursions").unwrap(), "/rl-excursions/");
        assert_eq!(normalize_route("/rl-excursions").unwrap(), "/rl-excursions/");
        assert_eq!(normalize_route("/a/b/").unwrap(), "/a/b/");
    }

    #[test]
    fn test_normalize_route_rejects() {
        assert!(normalize_route("/a//b/").is_err());
        assert!(normalize_route("/../etc/").is_err());
        assert!(normalize_route("/a b/").is_err());
        assert!(normalize_route("/a?x").is_err());
    }

    #[test]
    fn test_route_output_path() {
        let out = Path::new("docs");
        assert_eq!(route_output_path(out, "/"), PathBuf::from("docs/index.html"));
        assert_eq!(
            route_output_path(out, "/rl-excursions/"),
            PathBuf::from("docs/rl-excursions/index.html")
        );
    }

    #[test]
    fn test_no_pages_is_config_error() {
        let err = SiteBuilder::new("docs").validated_routes().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_duplicate_route_rejected() {
        let builder = SiteBuilder::new("docs")
            .page(Page::new("/post", "a.md"))
            .page(Page::new("/post/", "b.md"));
        let err = builder.validated_routes().unwrap_err();
        assert!(err.to_string().contains("duplicate route '/post/'"));
    }

    #[test]
    fn test_seo_title_fallbacks() {
        let builder = SiteBuilder::new("docs")
            .site_url("https://example.org/")
            .base_path(BasePath::new("/proj").unwrap())
            .header(Header {
                title: "Header title".to_string(),
                ..Header::default()
            });

        let page = Page::new("/", "a.md");
        assert_eq!(builder.seo_for(&page, "/", Some("Doc title")).title, "Doc title");
        assert_eq!(builder.seo_for(&page, "/", None).title, "Header title");

        let page = page.with_seo("Explicit", "d");
        let seo = builder.seo_for(&page, "/post/", Some("Doc title"));
        assert_eq!(seo.title, "Explicit");
        assert_eq!(seo.canonical_url.as_deref(), Some("https://example.org/proj/post/"));
    }

    #[test]
    fn test_page_deserialize_defaults() {
        let page: Page = serde_json::from_str(r#"{"route": "/", "source": "index.md"}"#).unwrap();
        assert_eq!(page, Page::new("/", "index.md"));
    }
}
