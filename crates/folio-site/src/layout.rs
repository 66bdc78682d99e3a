//! Full HTML document around a rendered post.

use folio_content::BasePath;
use folio_content::markdown::{escape_attr, escape_html};
use serde::{Deserialize, Serialize};

use crate::assets::{RENDER_JS_PATH, SITE_CSS_PATH};
use crate::scroll::client_script;
use crate::seo::SeoMeta;

/// Selector of the element holding the rendered Markdown.
pub const CONTAINER_SELECTOR: &str = ".md-output";

const KATEX_VERSION: &str = "0.16.11";
const MERMAID_VERSION: &str = "11";

/// Post header shown above the article.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Header {
    pub title: String,
    /// Author line, including affiliation markers.
    pub authors: String,
    /// One entry per affiliation or footnote line (`¹ UC San Diego`).
    pub affiliations: Vec<String>,
    pub date: String,
}

impl Header {
    pub fn is_empty(&self) -> bool {
        self.title.is_empty()
            && self.authors.is_empty()
            && self.affiliations.is_empty()
            && self.date.is_empty()
    }

    fn to_html(&self) -> String {
        if self.is_empty() {
            return String::new();
        }

        let mut out = String::from("<header class=\"site-header\">\n");
        if !self.title.is_empty() {
            out.push_str(&format!("<h1>{}</h1>\n", escape_html(&self.title)));
        }
        if !self.authors.is_empty() {
            out.push_str(&format!(
                "<p class=\"authors\">{}</p>\n",
                escape_html(&self.authors)
            ));
        }
        if !self.affiliations.is_empty() {
            out.push_str("<ul class=\"affiliations\">\n");
            for line in &self.affiliations {
                out.push_str(&format!("<li>{}</li>\n", escape_html(line)));
            }
            out.push_str("</ul>\n");
        }
        if !self.date.is_empty() {
            out.push_str(&format!("<p class=\"date\">{}</p>\n", escape_html(&self.date)));
        }
        out.push_str("</header>\n");
        out
    }
}

/// Everything a page needs besides the shared header.
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    pub seo: &'a SeoMeta,
    pub header: &'a Header,
    /// Rendered Markdown, inserted as-is.
    pub body_html: &'a str,
    pub base: &'a BasePath,
}

fn head(ctx: &PageContext<'_>) -> String {
    let stylesheet = escape_attr(&ctx.base.join(&format!("/{SITE_CSS_PATH}")));
    let render_js = escape_attr(&ctx.base.join(&format!("/{RENDER_JS_PATH}")));

    let mut out = String::from(
        "<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
    );
    out.push_str(&ctx.seo.to_html());
    out.push_str(&format!(
        "<link rel=\"stylesheet\" href=\"https://cdn.jsdelivr.net/npm/katex@{KATEX_VERSION}/dist/katex.min.css\">\n\
         <link rel=\"stylesheet\" href=\"{stylesheet}\">\n\
         <script defer src=\"https://cdn.jsdelivr.net/npm/katex@{KATEX_VERSION}/dist/katex.min.js\"></script>\n\
         <script defer src=\"https://cdn.jsdelivr.net/npm/mermaid@{MERMAID_VERSION}/dist/mermaid.min.js\"></script>\n\
         <script defer src=\"{render_js}\"></script>\n"
    ));
    out
}

/// Render a complete HTML document.
///
/// The body HTML is trusted build-time output and is not sanitized.
pub fn render_page(ctx: &PageContext<'_>) -> String {
    let container_class = CONTAINER_SELECTOR.trim_start_matches('.');

    let mut out = String::with_capacity(ctx.body_html.len() + 4096);
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    out.push_str(&head(ctx));
    out.push_str("</head>\n<body>\n");
    out.push_str(
        "<div class=\"scroll-progress\" role=\"progressbar\" aria-label=\"Reading progress\" \
         aria-valuemin=\"0\" aria-valuemax=\"100\" aria-valuenow=\"0\"></div>\n",
    );
    out.push_str(&ctx.header.to_html());
    out.push_str(&format!("<main>\n<article class=\"{container_class}\">\n"));
    out.push_str(ctx.body_html);
    if !ctx.body_html.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("</article>\n</main>\n<script>\n");
    out.push_str(&client_script(CONTAINER_SELECTOR));
    out.push_str("</script>\n</body>\n</html>\n");
    out
}
