//! `<head>` metadata for search engines and link previews.

use std::fmt::Write;

use folio_content::markdown::escape_attr;
use folio_content::markdown::escape_html;
use serde::{Deserialize, Serialize};

/// Title, description and preview metadata of a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeoMeta {
    pub title: String,
    pub description: String,
    /// Absolute URL of the page, used for `og:url` and the canonical link.
    pub canonical_url: Option<String>,
    /// Absolute URL of the preview image.
    pub image: Option<String>,
}

impl SeoMeta {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn with_canonical_url(mut self, url: impl Into<String>) -> Self {
        self.canonical_url = Some(url.into());
        self
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image = Some(url.into());
        self
    }

    /// Render the `<title>` element and meta tags, one per line.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        let title = escape_attr(&self.title);
        let description = escape_attr(&self.description);
        let card = if self.image.is_some() {
            "summary_large_image"
        } else {
            "summary"
        };

        // Writing into a String cannot fail.
        let _ = writeln!(out, "<title>{}</title>", escape_html(&self.title));
        let _ = writeln!(out, r#"<meta name="description" content="{description}">"#);
        let _ = writeln!(out, r#"<meta property="og:type" content="article">"#);
        let _ = writeln!(out, r#"<meta property="og:title" content="{title}">"#);
        let _ = writeln!(out, r#"<meta property="og:description" content="{description}">"#);
        if let Some(url) = &self.canonical_url {
            let url = escape_attr(url);
            let _ = writeln!(out, r#"<meta property="og:url" content="{url}">"#);
            let _ = writeln!(out, r#"<link rel="canonical" href="{url}">"#);
        }
        if let Some(image) = &self.image {
            let _ = writeln!(out, r#"<meta property="og:image" content="{}">"#, escape_attr(image));
        }
        let _ = writeln!(out, r#"<meta name="twitter:card" content="{card}">"#);
        let _ = writeln!(out, r#"<meta name="twitter:title" content="{title}">"#);
        let _ = writeln!(out, r#"<meta name="twitter:description" content="{description}">"#);
        if let Some(image) = &self.image {
            let _ = writeln!(out, r#"<meta name="twitter:image" content="{}">"#, escape_attr(image));
        }

        out
    }
}
