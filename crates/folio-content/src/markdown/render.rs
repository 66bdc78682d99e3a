//! Event-stream renderer built on `pulldown-cmark`.

use std::collections::HashMap;

use log::debug;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use super::escape::{escape_attr, escape_href, escape_html};
use super::slug::{slugify, SlugSet};
use super::{Footnote, Heading, RenderOptions, RenderedDocument};

/// Markdown extensions enabled for every document.
fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_MATH
}

/// Render Markdown to HTML with default options.
///
/// # Example
///
/// ```
/// let html = folio_content::markdown::render("# Title\n\nSome *text*.");
/// assert!(html.contains(r#"<h1 id="title">Title</h1>"#));
/// assert!(html.contains("<em>text</em>"));
/// ```
pub fn render(source: &str) -> String {
    render_document(source, &RenderOptions::default()).html
}

/// Render Markdown to HTML, returning the outline and footnotes as well.
pub fn render_document(source: &str, options: &RenderOptions) -> RenderedDocument {
    let (body, definitions) = split_footnotes(Parser::new_ext(source, parser_options()));

    let mut renderer = Renderer::new(options, definitions);
    let events = renderer.transform(body);

    let mut html_out = String::with_capacity(source.len() + source.len() / 2);
    html::push_html(&mut html_out, events.into_iter());
    renderer.push_footnotes(&mut html_out);

    debug!(
        "rendered {} headings, {} footnotes",
        renderer.outline.len(),
        renderer.order.len()
    );

    RenderedDocument {
        html: html_out,
        footnotes: renderer.footnotes(),
        outline: renderer.outline,
    }
}

/// Render a short inline fragment (a caption) without the paragraph wrapper.
pub fn render_inline(source: &str) -> String {
    let mut out = String::new();
    html::push_html(&mut out, Parser::new_ext(source, parser_options()));
    let trimmed = out.trim_end();
    match trimmed
        .strip_prefix("<p>")
        .and_then(|s| s.strip_suffix("</p>"))
    {
        Some(inner) if !inner.contains("<p>") => inner.to_string(),
        _ => trimmed.to_string(),
    }
}

// ============================================================================
// Footnote definitions
// ============================================================================

/// Footnote labels match case-insensitively, as in the parser.
fn label_key(label: &str) -> String {
    label.to_lowercase()
}

/// Footnote definitions lifted out of the body, in definition order,
/// keyed by [`label_key`].
#[derive(Default)]
struct Definitions<'a> {
    labels: Vec<String>,
    events: HashMap<String, Vec<Event<'a>>>,
}

impl<'a> Definitions<'a> {
    fn insert(&mut self, label: String, events: Vec<Event<'a>>) {
        let label = label_key(&label);
        // First definition wins.
        if self.events.contains_key(&label) {
            return;
        }
        self.labels.push(label.clone());
        self.events.insert(label, events);
    }

    fn contains(&self, key: &str) -> bool {
        self.events.contains_key(key)
    }

    fn take(&mut self, key: &str) -> Vec<Event<'a>> {
        self.events.remove(key).unwrap_or_default()
    }

    fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

fn split_footnotes<'a>(events: impl Iterator<Item = Event<'a>>) -> (Vec<Event<'a>>, Definitions<'a>) {
    let mut body = Vec::new();
    let mut definitions = Definitions::default();
    let mut current: Option<(String, Vec<Event<'a>>)> = None;

    for event in events {
        match event {
            Event::Start(Tag::FootnoteDefinition(label)) => {
                if let Some((label, events)) = current.take() {
                    definitions.insert(label, events);
                }
                current = Some((label.to_string(), Vec::new()));
            }
            Event::End(TagEnd::FootnoteDefinition) => {
                if let Some((label, events)) = current.take() {
                    definitions.insert(label, events);
                }
            }
            other => match current.as_mut() {
                Some((_, events)) => events.push(other),
                None => body.push(other),
            },
        }
    }

    if let Some((label, events)) = current.take() {
        definitions.insert(label, events);
    }

    (body, definitions)
}

// ============================================================================
// Renderer
// ============================================================================

struct Renderer<'o, 'a> {
    options: &'o RenderOptions,
    definitions: Definitions<'a>,
    numbers: HashMap<String, usize>,
    order: Vec<String>,
    reference_counts: HashMap<String, usize>,
    anchors: HashMap<String, String>,
    anchor_slugs: SlugSet,
    slugs: SlugSet,
    outline: Vec<Heading>,
}

impl<'o, 'a> Renderer<'o, 'a> {
    fn new(options: &'o RenderOptions, definitions: Definitions<'a>) -> Self {
        Self {
            options,
            definitions,
            numbers: HashMap::new(),
            order: Vec::new(),
            reference_counts: HashMap::new(),
            anchors: HashMap::new(),
            anchor_slugs: SlugSet::new(),
            slugs: SlugSet::new(),
            outline: Vec::new(),
        }
    }

    fn transform(&mut self, events: Vec<Event<'a>>) -> Vec<Event<'a>> {
        let mut out = Vec::with_capacity(events.len());
        let mut iter = events.into_iter();

        while let Some(event) = iter.next() {
            match event {
                Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }) => {
                    let inner = collect_until_end(&mut iter);
                    let inner = self.transform(inner);
                    let text = plain_text(&inner);
                    let anchor = match id {
                        Some(explicit) => self.slugs.claim(&explicit),
                        None => self.slugs.claim(&slugify(&text)),
                    };
                    self.outline.push(Heading {
                        level: level_number(level),
                        id: anchor.clone(),
                        text,
                    });
                    out.push(Event::Start(Tag::Heading {
                        level,
                        id: Some(CowStr::from(anchor)),
                        classes,
                        attrs,
                    }));
                    out.extend(inner);
                    out.push(Event::End(TagEnd::Heading(level)));
                }
                Event::Start(Tag::Image {
                    dest_url, title, ..
                }) => {
                    let alt = plain_text(&collect_until_end(&mut iter));
                    let markup = self.image(&dest_url, &title, &alt);

                    // An image alone in its paragraph is lifted out of the <p>.
                    let standalone = matches!(out.last(), Some(Event::Start(Tag::Paragraph)))
                        && matches!(iter.as_slice().first(), Some(Event::End(TagEnd::Paragraph)));
                    if standalone {
                        out.pop();
                        iter.next();
                        out.push(Event::Html(CowStr::from(format!("{markup}\n"))));
                    } else {
                        out.push(Event::InlineHtml(CowStr::from(markup)));
                    }
                }
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(ref lang))) if is_mermaid(lang) => {
                    let code = plain_text(&collect_until_end(&mut iter));
                    out.push(Event::Html(CowStr::from(format!(
                        "<pre class=\"mermaid\">{}</pre>\n",
                        escape_html(&code)
                    ))));
                }
                Event::FootnoteReference(label) => out.push(self.footnote_reference(&label)),
                other => out.push(other),
            }
        }

        out
    }

    fn image(&self, dest: &str, title: &str, alt: &str) -> String {
        let caption = if title.trim().is_empty() {
            None
        } else {
            Some(render_inline(title))
        };

        if dest == self.options.image_placeholder {
            let mut markup = format!(
                "<div class=\"md-image-placeholder\" role=\"img\" aria-label=\"{}\"><span class=\"md-image-placeholder-alt\">{}</span>",
                escape_attr(alt),
                escape_html(alt)
            );
            if let Some(caption) = caption {
                markup.push_str(&format!("<span class=\"md-figcaption\">{caption}</span>"));
            }
            markup.push_str("</div>");
            return markup;
        }

        let title_attr = if title.is_empty() {
            String::new()
        } else {
            format!(" title=\"{}\"", escape_attr(title))
        };
        let loading = if self.options.lazy_images {
            " loading=\"lazy\""
        } else {
            ""
        };
        let img = format!(
            "<img src=\"{}\" alt=\"{}\"{title_attr}{loading} />",
            escape_href(dest),
            escape_attr(alt)
        );

        match caption {
            Some(caption) => format!(
                "<figure class=\"md-figure\">{img}<figcaption class=\"md-figcaption\">{caption}</figcaption></figure>"
            ),
            None => img,
        }
    }

    /// Number a footnote on first use and give it a unique anchor slug.
    fn number(&mut self, key: &str) -> usize {
        if let Some(n) = self.numbers.get(key) {
            return *n;
        }
        self.order.push(key.to_string());
        let n = self.order.len();
        self.numbers.insert(key.to_string(), n);

        let base = slugify(key);
        let base = if base.is_empty() { "note" } else { base.as_str() };
        let anchor = self.anchor_slugs.claim(base);
        self.anchors.insert(key.to_string(), anchor);
        n
    }

    fn anchor(&self, key: &str) -> &str {
        self.anchors.get(key).map_or("note", String::as_str)
    }

    fn footnote_reference(&mut self, label: &str) -> Event<'a> {
        let key = label_key(label);
        if !self.definitions.contains(&key) {
            return Event::Text(CowStr::from(format!("[^{label}]")));
        }

        let number = self.number(&key);
        let count = self.reference_counts.entry(key.clone()).or_insert(0);
        *count += 1;
        let count = *count;

        let slug = self.anchor(&key);
        let ref_id = if count == 1 {
            format!("fnref-{slug}")
        } else {
            format!("fnref-{slug}-{count}")
        };

        Event::InlineHtml(CowStr::from(format!(
            "<sup class=\"footnote-ref\"><a href=\"#fn-{slug}\" id=\"{ref_id}\">[{number}]</a></sup>"
        )))
    }

    fn push_footnotes(&mut self, out: &mut String) {
        if self.definitions.is_empty() {
            return;
        }

        let mut items: Vec<(String, String)> = Vec::new();
        let mut next = 0;
        loop {
            // Definitions may reference further footnotes, growing `order`.
            while next < self.order.len() {
                let label = self.order[next].clone();
                let events = self.definitions.take(&label);
                let events = self.transform(events);
                let mut body = String::new();
                html::push_html(&mut body, events.into_iter());
                items.push((label, body));
                next += 1;
            }

            let unreferenced = self
                .definitions
                .labels
                .iter()
                .find(|l| !self.numbers.contains_key(*l))
                .cloned();
            match unreferenced {
                Some(label) => {
                    self.number(&label);
                }
                None => break,
            }
        }

        out.push_str("<section class=\"footnotes\">\n");
        out.push_str(&format!(
            "<h2 class=\"footnotes-title\">{}</h2>\n<ol class=\"footnotes-list\">\n",
            escape_html(&self.options.footnotes_heading)
        ));
        for (label, body) in items {
            let slug = self.anchor(&label).to_string();
            let mut body = body;
            if self.reference_counts.contains_key(&label) {
                let backref = format!(
                    " <a href=\"#fnref-{slug}\" class=\"footnote-backref\" aria-label=\"Back to reference\">↩</a>"
                );
                match body.rfind("</p>") {
                    Some(pos) => body.insert_str(pos, &backref),
                    None => body.push_str(&backref),
                }
            }
            out.push_str(&format!(
                "<li id=\"fn-{slug}\" class=\"footnote-item\">\n{body}</li>\n"
            ));
        }
        out.push_str("</ol>\n</section>\n");
    }

    fn footnotes(&self) -> Vec<Footnote> {
        self.order
            .iter()
            .enumerate()
            .map(|(i, label)| Footnote {
                label: label.clone(),
                number: i + 1,
                references: self.reference_counts.get(label).copied().unwrap_or(0),
            })
            .collect()
    }
}

// ============================================================================
// Event helpers
// ============================================================================

/// Collect events up to (not including) the `End` matching an already
/// consumed `Start`.
fn collect_until_end<'a>(iter: &mut impl Iterator<Item = Event<'a>>) -> Vec<Event<'a>> {
    let mut depth = 0usize;
    let mut inner = Vec::new();

    for event in iter.by_ref() {
        match &event {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            _ => {}
        }
        inner.push(event);
    }

    inner
}

fn plain_text(events: &[Event<'_>]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::Text(t) | Event::Code(t) | Event::InlineMath(t) | Event::DisplayMath(t) => {
                text.push_str(t)
            }
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            _ => {}
        }
    }
    text
}

fn is_mermaid(lang: &str) -> bool {
    lang.split_whitespace().next() == Some("mermaid")
}

fn level_number(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headings_get_unique_anchors() {
        let doc = render_document(
            "# Hello World\n\n## Hello World\n\n### Setup `code`\n",
            &RenderOptions::default(),
        );
        assert!(doc.html.contains(r#"<h1 id="hello-world">Hello World</h1>"#));
        assert!(doc.html.contains(r#"<h2 id="hello-world-1">Hello World</h2>"#));
        assert_eq!(doc.outline.len(), 3);
        assert_eq!(doc.outline[2].id, "setup-code");
        assert_eq!(doc.outline[2].level, 3);
        assert_eq!(doc.title(), Some("Hello World"));
    }

    #[test]
    fn test_emphasis_and_links() {
        let html = render("Some *em* and **strong** and [a link](https://example.com).");
        assert!(html.contains("<em>em</em>"));
        assert!(html.contains("<strong>strong</strong>"));
        assert!(html.contains(r#"<a href="https://example.com">a link</a>"#));
    }

    #[test]
    fn test_titled_image_becomes_figure() {
        let html = render(r#"![GSM8K results](/assets/figures/g.png "Figure 2. **Bold** caption")"#);
        assert!(html.starts_with(
            r#"<figure class="md-figure"><img src="/assets/figures/g.png" alt="GSM8K results" title="Figure 2. **Bold** caption" loading="lazy" />"#
        ));
        assert!(html.contains(
            r#"<figcaption class="md-figcaption">Figure 2. <strong>Bold</strong> caption</figcaption></figure>"#
        ));
        assert!(!html.contains("<p><figure"));
    }

    #[test]
    fn test_untitled_image_is_plain_img() {
        let html = render("Inline ![alt *text*](/a.png) here.");
        assert!(html.contains(r#"<img src="/a.png" alt="alt text" loading="lazy" />"#));
        assert!(html.starts_with("<p>Inline "));
        assert!(!html.contains("<figure"));
    }

    #[test]
    fn test_lazy_images_option() {
        let options = RenderOptions {
            lazy_images: false,
            ..Default::default()
        };
        let doc = render_document("![a](/a.png)", &options);
        assert!(!doc.html.contains("loading="));
    }

    #[test]
    fn test_placeholder_image() {
        let html = render(r#"![Rollout scaling](__IMAGE_PLACEHOLDER__ "Figure 6. Trade-offs")"#);
        assert!(html.contains(r#"<div class="md-image-placeholder" role="img" aria-label="Rollout scaling">"#));
        assert!(html.contains(r#"<span class="md-figcaption">Figure 6. Trade-offs</span>"#));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn test_fenced_code_escaped() {
        let html = render("```rust\nlet x = a < b;\n```\n");
        assert!(html.contains(r#"<pre><code class="language-rust">let x = a &lt; b;"#));
    }

    #[test]
    fn test_mermaid_fence() {
        let html = render("```mermaid\ngraph TD; A-->B;\n```\n");
        assert!(html.contains("<pre class=\"mermaid\">graph TD; A--&gt;B;\n</pre>"));
        assert!(!html.contains("language-mermaid"));
    }

    #[test]
    fn test_math_spans() {
        let html = render("Inline $x^2$ math.\n\n$$\\sum_i x_i$$\n");
        assert!(html.contains(r#"<span class="math math-inline">x^2</span>"#));
        assert!(html.contains(r#"<span class="math math-display">"#));
    }

    #[test]
    fn test_details_passthrough() {
        let source = "<details>\n<summary>Pretraining details</summary>\n\n- **Architecture:** OLMo2 1B\n\n</details>\n";
        let html = render(source);
        assert!(html.contains("<details>"));
        assert!(html.contains("<summary>Pretraining details</summary>"));
        assert!(html.contains("<strong>Architecture:</strong>"));
        assert!(html.contains("</details>"));
    }

    #[test]
    fn test_unclosed_details_renders_partial_output() {
        let html = render("<details>\n<summary>More</summary>\n\nHidden *text* here.\n");
        assert!(html.contains("<details>"));
        assert!(html.contains("<em>text</em>"));
        assert!(!html.contains("</details>"));
    }

    #[test]
    fn test_malformed_markdown_degrades_to_text() {
        let html = render("A [broken]( link and ![bad]( image and **unclosed");
        assert!(html.contains("[broken]("));
        assert!(html.contains("**unclosed"));
    }

    #[test]
    fn test_footnotes_numbered_by_first_reference() {
        let source = "Text one[^b] and two[^a] and again[^b].\n\n\
                      [^a]: Alpha def.\n\n\
                      [^b]: Beta def.\n\n\
                      [^c]: Unused def.\n";
        let doc = render_document(source, &RenderOptions::default());
        let html = &doc.html;

        assert!(html.contains(r##"<a href="#fn-b" id="fnref-b">[1]</a>"##));
        assert!(html.contains(r##"<a href="#fn-a" id="fnref-a">[2]</a>"##));
        assert!(html.contains(r##"<a href="#fn-b" id="fnref-b-2">[1]</a>"##));

        let b = html.find(r#"<li id="fn-b""#).unwrap();
        let a = html.find(r#"<li id="fn-a""#).unwrap();
        let c = html.find(r#"<li id="fn-c""#).unwrap();
        assert!(b < a && a < c);
        assert!(html.contains(r##"href="#fnref-b""##));
        assert!(!html.contains(r##"href="#fnref-c""##));
        assert!(html.contains(r#"<h2 class="footnotes-title">References</h2>"#));

        let labels: Vec<_> = doc.footnotes.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, ["b", "a", "c"]);
        assert_eq!(doc.footnotes[0].references, 2);
        assert_eq!(doc.footnotes[2].references, 0);
        assert_eq!(doc.footnotes[2].number, 3);
    }

    #[test]
    fn test_footnote_labels_match_case_insensitively() {
        let doc = render_document(
            "Ref[^Note].\n\n[^note]: Defined lowercase.\n",
            &RenderOptions::default(),
        );
        assert!(doc.html.contains(r##"<a href="#fn-note" id="fnref-note">[1]</a>"##));
        assert!(!doc.html.contains("[^Note]"));
        assert!(doc.html.contains(r##"href="#fnref-note" class="footnote-backref""##));
        assert_eq!(doc.footnotes.len(), 1);
        assert_eq!(doc.footnotes[0].references, 1);
    }

    #[test]
    fn test_footnote_anchors_are_unique() {
        let html = render("One[^x.y] two[^x-y].\n\n[^x.y]: First.\n\n[^x-y]: Second.\n");
        assert!(html.contains(r##"<a href="#fn-x-y" id="fnref-x-y">[1]</a>"##));
        assert!(html.contains(r##"<a href="#fn-x-y-1" id="fnref-x-y-1">[2]</a>"##));
        assert_eq!(html.matches(r#"<li id="fn-x-y" "#).count(), 1);
        assert_eq!(html.matches(r#"<li id="fn-x-y-1" "#).count(), 1);
    }

    #[test]
    fn test_punctuation_footnote_label_gets_anchor() {
        let html = render("Odd[^!!].\n\n[^!!]: Bang.\n");
        assert!(html.contains(r##"<a href="#fn-note" id="fnref-note">[1]</a>"##));
        assert!(html.contains(r#"<li id="fn-note" class="footnote-item">"#));
        assert!(!html.contains(r##"href="#fn-""##));
    }

    #[test]
    fn test_undefined_footnote_reference_is_literal() {
        let html = render("See this[^missing].");
        assert!(html.contains("[^missing]"));
        assert!(!html.contains("footnote-ref"));
        assert!(!html.contains("class=\"footnotes\""));
    }

    #[test]
    fn test_footnote_definition_with_link() {
        let source = "Claim[^x].\n\n[^x]: Chen et al. (2021). [Codex](https://arxiv.org/abs/2107.03374).\n";
        let html = render(source);
        assert!(html.contains(r#"<a href="https://arxiv.org/abs/2107.03374">Codex</a>"#));
        assert!(html.contains("class=\"footnote-backref\""));
    }

    #[test]
    fn test_render_inline_strips_paragraph() {
        assert_eq!(render_inline("Figure 1. *Emph*"), "Figure 1. <em>Emph</em>");
        assert_eq!(render_inline("a < b"), "a &lt; b");
    }

    #[test]
    fn test_empty_input() {
        let doc = render_document("", &RenderOptions::default());
        assert!(doc.html.is_empty());
        assert!(doc.outline.is_empty());
        assert!(doc.title().is_none());
    }
}
