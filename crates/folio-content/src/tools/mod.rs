//! Line-based authoring tools for post sources.
//!
//! These are pragmatic rewriters, not Markdown parsers. All of them leave
//! fenced code blocks alone.
//!
//! - [`captions`]: move `Figure N:` caption paragraphs into image titles
//! - [`footnotes`]: turn external links into footnote references
//! - [`lint`]: normalise Unicode, strip image paths, and report suspicious syntax

pub mod captions;
pub mod footnotes;
pub mod lint;

/// True if `line` opens or closes a fenced code block.
pub(crate) fn is_fence_line(line: &str) -> bool {
    line.trim_start().starts_with("```")
}

/// Join lines back together, keeping a trailing newline if `original` had one.
pub(crate) fn join_lines(lines: &[String], original: &str) -> String {
    let mut out = lines.join("\n");
    if original.ends_with('\n') {
        out.push('\n');
    }
    out
}
