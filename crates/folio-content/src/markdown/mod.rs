//! Markdown to HTML rendering.
//!
//! The renderer walks a `pulldown-cmark` event stream and rewrites a few
//! constructs before handing the stream to the stock HTML writer:
//!
//! - headings get unique slug anchors
//! - titled images become `<figure>` blocks with a rendered caption
//! - `__IMAGE_PLACEHOLDER__` images become a placeholder box
//! - `mermaid` fences become `<pre class="mermaid">`
//! - footnote references are numbered by first use and their definitions
//!   are gathered into a trailing references section
//!
//! Raw HTML (`<details>`, `<figure>`, `<sub>`, comments) passes through
//! untouched. Rendering never fails; malformed input degrades to text.

mod escape;
mod render;
mod slug;

pub use escape::{escape_attr, escape_href, escape_html};
pub use render::{render, render_document, render_inline};
pub use slug::{slugify, SlugSet};

/// Destination that marks an image as a placeholder for a missing figure.
pub const IMAGE_PLACEHOLDER: &str = "__IMAGE_PLACEHOLDER__";

/// Options controlling HTML output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Image destination rendered as a placeholder box instead of `<img>`.
    pub image_placeholder: String,
    /// Heading of the trailing footnotes section.
    pub footnotes_heading: String,
    /// Add `loading="lazy"` to images.
    pub lazy_images: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            image_placeholder: IMAGE_PLACEHOLDER.to_string(),
            footnotes_heading: "References".to_string(),
            lazy_images: true,
        }
    }
}

/// One entry of the document outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    /// Heading level, 1 through 6.
    pub level: u8,
    /// Anchor id assigned to the heading.
    pub id: String,
    /// Plain text of the heading.
    pub text: String,
}

/// A footnote as it appears in the references section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footnote {
    /// Label used in the source (`[^label]`), lowercased.
    pub label: String,
    /// Display number.
    pub number: usize,
    /// Number of references to it in the document.
    pub references: usize,
}

/// Result of rendering a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedDocument {
    /// HTML ready for insertion into a page.
    pub html: String,
    /// Headings in document order.
    pub outline: Vec<Heading>,
    /// Footnotes in display order.
    pub footnotes: Vec<Footnote>,
}

impl RenderedDocument {
    /// Text of the first level-1 heading, if any.
    pub fn title(&self) -> Option<&str> {
        self.outline
            .iter()
            .find(|h| h.level == 1)
            .map(|h| h.text.as_str())
    }
}
