//! Move figure-caption paragraphs into image titles.
//!
//! The renderer shows an image title as the figure caption, so sources
//! exported with captions as separate paragraphs:
//!
//! ```text
//! ![alt](/assets/figures/f.png)
//!
//! **Figure 2:** Results across checkpoints.
//! ```
//!
//! are rewritten to `![alt](/assets/figures/f.png "Figure 2: Results across checkpoints.")`.

use std::sync::LazyLock;

use regex::Regex;

use super::{is_fence_line, join_lines};

static IMAGE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?x)^
        (?P<prefix>\s*)!
        \[(?P<alt>[^\]]*)\]
        \(
          (?P<url>[^)\s]+)
          (?P<title>\s+(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)'))?
        \)
        (?P<attrs>\{[^}]*\})?
        \s*$"#,
    )
    .expect("image line regex is valid")
});

static CAPTION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?xi)^\s*
        (?:\*\*)?
        Figure\s+
        (?P<num>\d+(?:\([a-z]\))?)
        \s*[:.]\s*
        (?P<body>.+?)
        (?:\*\*)?
        \s*$",
    )
    .expect("caption regex is valid")
});

static SPLIT_REMAINDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<cap>.*?\.)\s+(?P<rest>(?:Beyond|We|In|This)\b.*)$")
        .expect("split regex is valid")
});

static LEADING_BOLD_FIGURE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\*\*Figure\s+").expect("figure prefix regex is valid"));

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));

/// Counts of edits made by [`captions_to_titles`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptionStats {
    /// Images that received a caption as their title.
    pub images_titled: usize,
    /// Caption paragraphs removed.
    pub captions_removed: usize,
    /// Captions split because trailing prose followed them.
    pub captions_split: usize,
}

impl CaptionStats {
    /// True if any edit was made.
    pub fn changed(&self) -> bool {
        self.captions_removed > 0
    }
}

/// Options for [`normalize_images`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Prefix `assets/…` image URLs with `/`.
    pub asset_paths: bool,
    /// Clean leftover bold markers and whitespace from existing titles.
    pub titles: bool,
}

/// Strip bold markers and collapse whitespace in a caption.
pub fn clean_caption(raw: &str) -> String {
    let mut s = raw.trim();
    if s.len() >= 4 && s.starts_with("**") && s.ends_with("**") {
        s = s[2..s.len() - 2].trim();
    }
    let replaced = LEADING_BOLD_FIGURE.replace(s, "Figure ");
    let s: &str = &replaced;
    let s = s.strip_suffix("**").unwrap_or(s).trim();
    let s = s.replace("**", "").replace("__", "");
    WHITESPACE_RUN.replace_all(&s, " ").trim().to_string()
}

fn quote_title(title: &str) -> String {
    format!(" \"{}\"", title.replace('"', "&quot;"))
}

/// Move caption paragraphs that follow images into the image titles.
///
/// Images that already carry a title keep it; the duplicate caption
/// paragraph is still removed.
pub fn captions_to_titles(text: &str) -> (String, CaptionStats) {
    let lines: Vec<&str> = text.lines().collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut stats = CaptionStats::default();
    let mut in_fence = false;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        if is_fence_line(line) {
            in_fence = !in_fence;
            out.push(line.to_string());
            i += 1;
            continue;
        }

        let image = match IMAGE_LINE.captures(line) {
            Some(caps) if !in_fence => caps,
            _ => {
                out.push(line.to_string());
                i += 1;
                continue;
            }
        };

        let mut j = i + 1;
        while j < lines.len() && lines[j].trim().is_empty() {
            j += 1;
        }
        let Some(caption_caps) = lines.get(j).and_then(|l| CAPTION_LINE.captures(l)) else {
            out.push(line.to_string());
            i += 1;
            continue;
        };

        let cleaned = clean_caption(&format!(
            "Figure {}: {}",
            &caption_caps["num"],
            caption_caps["body"].trim()
        ));
        let (caption, remainder) = match SPLIT_REMAINDER.captures(&cleaned) {
            Some(split) => (
                split["cap"].trim().to_string(),
                Some(split["rest"].trim().to_string()),
            ),
            None => (cleaned.clone(), None),
        };
        if remainder.is_some() {
            stats.captions_split += 1;
        }

        if image.name("title").is_some() {
            out.push(line.to_string());
        } else {
            out.push(format!(
                "{}![{}]({}{}){}",
                &image["prefix"],
                &image["alt"],
                &image["url"],
                quote_title(&caption),
                image.name("attrs").map_or("", |m| m.as_str())
            ));
            stats.images_titled += 1;
        }
        stats.captions_removed += 1;

        if j > i + 1 {
            out.push(String::new());
        }
        if let Some(rest) = remainder {
            out.push(rest);
        }

        i = j + 1;
    }

    (join_lines(&out, text), stats)
}

/// Normalise image lines outside fenced code.
pub fn normalize_images(text: &str, options: NormalizeOptions) -> String {
    let mut out = Vec::new();
    let mut in_fence = false;

    for line in text.lines() {
        if is_fence_line(line) {
            in_fence = !in_fence;
            out.push(line.to_string());
            continue;
        }
        let image = match IMAGE_LINE.captures(line) {
            Some(caps) if !in_fence => caps,
            _ => {
                out.push(line.to_string());
                continue;
            }
        };

        let mut url = image["url"].to_string();
        if options.asset_paths && url.starts_with("assets/") {
            url.insert(0, '/');
        }

        let title = image
            .name("dq")
            .or_else(|| image.name("sq"))
            .map(|m| m.as_str().to_string());
        let title = match title {
            Some(t) if options.titles => Some(clean_caption(&t)),
            other => other,
        };

        out.push(format!(
            "{}![{}]({}{}){}",
            &image["prefix"],
            &image["alt"],
            url,
            title.as_deref().map(quote_title).unwrap_or_default(),
            image.name("attrs").map_or("", |m| m.as_str())
        ));
    }

    join_lines(&out, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bold_label_caption_moves_into_title() {
        let text = "![GSM8K](/assets/figures/g.png)\n\n**Figure 2:** GSM8K results across checkpoints.\n\nNext para.\n";
        let (out, stats) = captions_to_titles(text);
        assert_eq!(
            out,
            "![GSM8K](/assets/figures/g.png \"Figure 2: GSM8K results across checkpoints.\")\n\n\nNext para.\n"
        );
        assert_eq!(stats.images_titled, 1);
        assert_eq!(stats.captions_removed, 1);
        assert!(stats.changed());
    }

    #[test]
    fn test_fully_bold_caption() {
        let text = "![x](/a.png)\n**Figure 4: Training dynamics.**";
        let (out, _) = captions_to_titles(text);
        assert_eq!(out, "![x](/a.png \"Figure 4: Training dynamics.\")");
    }

    #[test]
    fn test_existing_title_kept_and_caption_removed() {
        let text = "![x](/a.png \"Original\")\n\nFigure 1: Duplicate.\n";
        let (out, stats) = captions_to_titles(text);
        assert_eq!(out, "![x](/a.png \"Original\")\n\n");
        assert_eq!(stats.images_titled, 0);
        assert_eq!(stats.captions_removed, 1);
    }

    #[test]
    fn test_caption_with_trailing_prose_is_split() {
        let text = "![m](/m.png)\n\nFigure 3: MATH results. We see a gap on harder problems.\n";
        let (out, stats) = captions_to_titles(text);
        assert_eq!(
            out,
            "![m](/m.png \"Figure 3: MATH results.\")\n\nWe see a gap on harder problems.\n"
        );
        assert_eq!(stats.captions_split, 1);
    }

    #[test]
    fn test_quotes_escaped_in_title() {
        let text = "![q](/q.png)\nFigure 5: The \"expansion\" effect.";
        let (out, _) = captions_to_titles(text);
        assert_eq!(out, "![q](/q.png \"Figure 5: The &quot;expansion&quot; effect.\")");
    }

    #[test]
    fn test_attrs_preserved() {
        let text = "![q](/q.png){width=50%}\nFigure 6(a): Sub.";
        let (out, _) = captions_to_titles(text);
        assert_eq!(out, "![q](/q.png \"Figure 6(a): Sub.\"){width=50%}");
    }

    #[test]
    fn test_fenced_code_untouched() {
        let text = "```\n![x](/a.png)\nFigure 1: inside code\n```\n";
        let (out, stats) = captions_to_titles(text);
        assert_eq!(out, text);
        assert!(!stats.changed());
    }

    #[test]
    fn test_image_without_caption_untouched() {
        let text = "![x](/a.png)\n\nPlain paragraph.\n";
        let (out, stats) = captions_to_titles(text);
        assert_eq!(out, text);
        assert_eq!(stats, CaptionStats::default());
    }

    #[test]
    fn test_clean_caption() {
        assert_eq!(clean_caption("**Figure 1: A  **bold**  cap**"), "Figure 1: A bold cap");
        assert_eq!(clean_caption("  __x__  y "), "x y");
    }

    #[test]
    fn test_normalize_images() {
        let text = "![a](assets/figures/a.png \"**Figure 1:** cap\")\n![b](/b.png)\n";
        let out = normalize_images(
            text,
            NormalizeOptions {
                asset_paths: true,
                titles: true,
            },
        );
        assert_eq!(
            out,
            "![a](/assets/figures/a.png \"Figure 1: cap\")\n![b](/b.png)\n"
        );
    }
}
