//! Unicode normalisation, image-path stripping, and syntax checks.
//!
//! Notion exports carry inline base64 images, Unicode spacing that KaTeX
//! warns about, and image syntax the renderer cannot parse. The functions
//! here clean up the first two and report the rest.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Longest excerpt carried by an [`Issue`], in characters.
pub const EXCERPT_LEN: usize = 220;

static IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"!\[(?P<alt>[^\]]*)\]\((?P<url>[^)\s]+)(?P<title>\s+"[^"]*")?\)"#)
        .expect("image regex is valid")
});

static IMAGE_WITH_ATTRS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)\{[^}]*\}").expect("attrs regex is valid"));

static DATA_URI_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\[\]\(data:image/[^;]+;base64,[^)]+\)\s*$").expect("data uri regex is valid")
});

static DETAILS_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<details[\s>]").expect("details regex is valid"));

static DETAILS_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</details\s*>").expect("details regex is valid"));

/// Replacement for a Unicode character KaTeX trips over, or `None` if the
/// character is fine.
fn unicode_replacement(c: char) -> Option<&'static str> {
    match c {
        '\u{00A0}' | '\u{2005}' | '\u{2009}' | '\u{200A}' => Some(" "),
        '\u{200B}' | '\u{2060}' | '\u{2063}' | '\u{FEFF}' => Some(""),
        _ => None,
    }
}

fn has_odd_unicode(s: &str) -> bool {
    s.chars().any(|c| unicode_replacement(c).is_some())
}

/// Per-character counts of what [`normalize_unicode`] replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnicodeCounts(BTreeMap<char, usize>);

impl UnicodeCounts {
    /// Total characters replaced.
    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Counts ordered by frequency, then code point.
    pub fn by_frequency(&self) -> Vec<(char, usize)> {
        let mut counts: Vec<_> = self.0.iter().map(|(c, n)| (*c, *n)).collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        counts
    }
}

impl fmt::Display for UnicodeCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .by_frequency()
            .into_iter()
            .map(|(c, n)| format!("U+{:04X} x{n}", c as u32))
            .collect();
        write!(f, "{} ({})", self.total(), parts.join(", "))
    }
}

/// Replace Unicode spaces with ASCII space and drop zero-width characters.
pub fn normalize_unicode(text: &str) -> (String, UnicodeCounts) {
    let mut counts = BTreeMap::new();
    let mut out = String::with_capacity(text.len());

    for c in text.chars() {
        match unicode_replacement(c) {
            Some(rep) => {
                *counts.entry(c).or_insert(0) += 1;
                out.push_str(rep);
            }
            None => out.push(c),
        }
    }

    (out, UnicodeCounts(counts))
}

/// Replace every image URL with `placeholder`, keeping alt text and title.
///
/// Standalone `[](data:image/…;base64,…)` lines are dropped and Unicode is
/// normalised. Returns the new text and the number of images and data-URI
/// lines touched.
pub fn strip_image_paths(text: &str, placeholder: &str) -> (String, usize) {
    let mut replaced = 0;

    let mut kept = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        if DATA_URI_LINE.is_match(line.trim_end_matches(['\n', '\r'])) {
            replaced += 1;
            continue;
        }
        kept.push_str(line);
    }

    let (normalized, _) = normalize_unicode(&kept);

    let out = IMAGE.replace_all(&normalized, |caps: &Captures<'_>| {
        replaced += 1;
        format!(
            "![{}]({}{})",
            &caps["alt"],
            placeholder,
            caps.name("title").map_or("", |m| m.as_str())
        )
    });

    (out.into_owned(), replaced)
}

/// Kinds of problems reported by [`find_issues`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    InlineBase64DataUri,
    KatexUnicodeWhitespace,
    UnparsedImageSyntax,
    UnclosedParenAfterLink,
    SuspiciousQuoteCount,
    UnclosedAttrsBrace,
    UnbalancedDetails,
}

impl IssueKind {
    /// Stable snake_case name used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InlineBase64DataUri => "inline_base64_data_uri",
            Self::KatexUnicodeWhitespace => "katex_unicode_whitespace",
            Self::UnparsedImageSyntax => "unparsed_image_syntax",
            Self::UnclosedParenAfterLink => "unclosed_paren_after_link",
            Self::SuspiciousQuoteCount => "suspicious_quote_count_in_image_parens",
            Self::UnclosedAttrsBrace => "unclosed_image_attrs_brace",
            Self::UnbalancedDetails => "unbalanced_details",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A suspicious line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// 1-based line number.
    pub line: usize,
    pub kind: IssueKind,
    /// Start of the offending line.
    pub excerpt: String,
}

impl Issue {
    fn new(line: usize, kind: IssueKind, text: &str) -> Self {
        Self {
            line,
            kind,
            excerpt: text.chars().take(EXCERPT_LEN).collect(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.line, self.kind, self.excerpt)
    }
}

/// Quote count inside the first `](…)` span, if the line has one.
fn quotes_in_first_parens(s: &str) -> Option<usize> {
    let start = s.find("](")? + 2;
    let len = s[start..].find(')')?;
    Some(s[start..start + len].matches('"').count())
}

/// Report lines likely to break rendering.
///
/// Checks run on the raw text, so Unicode problems are reported even though
/// [`strip_image_paths`] fixes them.
pub fn find_issues(text: &str) -> Vec<Issue> {
    let mut issues = Vec::new();
    let mut open_details: Vec<usize> = Vec::new();

    for (ix, s) in text.lines().enumerate() {
        let n = ix + 1;

        if DATA_URI_LINE.is_match(s) {
            issues.push(Issue::new(n, IssueKind::InlineBase64DataUri, s));
            continue;
        }

        if has_odd_unicode(s) {
            issues.push(Issue::new(n, IssueKind::KatexUnicodeWhitespace, s));
        }

        let has_image = s.contains("![");
        let has_link = s.contains("](");

        if has_image && has_link && !IMAGE.is_match(s) && !IMAGE_WITH_ATTRS.is_match(s) {
            issues.push(Issue::new(n, IssueKind::UnparsedImageSyntax, s));
        }

        if has_image && s.matches("](").count() > s.matches(')').count() {
            issues.push(Issue::new(n, IssueKind::UnclosedParenAfterLink, s));
        }

        if has_image && has_link && s.contains('"') {
            if let Some(q) = quotes_in_first_parens(s) {
                if q != 0 && q != 2 {
                    issues.push(Issue::new(n, IssueKind::SuspiciousQuoteCount, s));
                }
            }
        }

        if s.contains("){") && !s.contains('}') {
            issues.push(Issue::new(n, IssueKind::UnclosedAttrsBrace, s));
        }

        for _ in DETAILS_OPEN.find_iter(s) {
            open_details.push(n);
        }
        for _ in DETAILS_CLOSE.find_iter(s) {
            if open_details.pop().is_none() {
                issues.push(Issue::new(n, IssueKind::UnbalancedDetails, s));
            }
        }
    }

    let lines: Vec<&str> = text.lines().collect();
    for n in open_details {
        issues.push(Issue::new(n, IssueKind::UnbalancedDetails, lines[n - 1]));
    }
    issues.sort_by_key(|i| i.line);

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::IMAGE_PLACEHOLDER;

    #[test]
    fn test_normalize_unicode() {
        let (out, counts) = normalize_unicode("a\u{00A0}b\u{2009}c\u{200B}d\u{FEFF}\u{2009}");
        assert_eq!(out, "a b cd ");
        assert_eq!(counts.total(), 4 + 1);
        assert_eq!(counts.by_frequency()[0], ('\u{2009}', 2));
        assert_eq!(counts.to_string(), "5 (U+2009 x2, U+00A0 x1, U+200B x1, U+FEFF x1)");
    }

    #[test]
    fn test_normalize_unicode_clean_text() {
        let (out, counts) = normalize_unicode("plain $x^2$");
        assert_eq!(out, "plain $x^2$");
        assert!(counts.is_empty());
    }

    #[test]
    fn test_strip_image_paths() {
        let text = "![a](/assets/figures/a.png)\n![b](/b.png \"Figure 1: b\")\ntext\n";
        let (out, n) = strip_image_paths(text, IMAGE_PLACEHOLDER);
        assert_eq!(n, 2);
        assert_eq!(
            out,
            "![a](__IMAGE_PLACEHOLDER__)\n![b](__IMAGE_PLACEHOLDER__ \"Figure 1: b\")\ntext\n"
        );
    }

    #[test]
    fn test_strip_image_paths_drops_data_uri_lines() {
        let text = "before\n[](data:image/png;base64,AAAA)\nafter\u{00A0}x\n";
        let (out, n) = strip_image_paths(text, "P");
        assert_eq!(n, 1);
        assert_eq!(out, "before\nafter x\n");
    }

    #[test]
    fn test_find_issues_data_uri_only_reported_once() {
        let issues = find_issues("[](data:image/png;base64,AAAA\u{00A0})");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::InlineBase64DataUri);
    }

    #[test]
    fn test_find_issues_unparsed_image() {
        let issues = find_issues("ok\n![alt](/a b.png)\n");
        let kinds: Vec<_> = issues.iter().map(|i| (i.line, i.kind)).collect();
        assert_eq!(kinds, vec![(2, IssueKind::UnparsedImageSyntax)]);
    }

    #[test]
    fn test_find_issues_quotes_and_parens() {
        let issues = find_issues("![a](/a.png \"one\" \"two\")");
        assert!(issues.iter().any(|i| i.kind == IssueKind::SuspiciousQuoteCount));

        let issues = find_issues("![a](/a.png");
        assert!(issues.iter().any(|i| i.kind == IssueKind::UnclosedParenAfterLink));
    }

    #[test]
    fn test_find_issues_attrs_brace() {
        let issues = find_issues("![a](/a.png){width=50%");
        assert!(issues.iter().any(|i| i.kind == IssueKind::UnclosedAttrsBrace));
    }

    #[test]
    fn test_find_issues_details_balance() {
        assert!(find_issues("<details>\n<summary>x</summary>\n</details>\n").is_empty());

        let issues = find_issues("<details>\nbody\n");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::UnbalancedDetails);
        assert_eq!(issues[0].line, 1);

        let issues = find_issues("text\n</details>\n");
        assert_eq!(issues[0].line, 2);
    }

    #[test]
    fn test_issue_display_and_excerpt() {
        let long = format!("![a](/a.png{}", "x".repeat(400));
        let issues = find_issues(&long);
        assert!(issues.iter().all(|i| i.excerpt.chars().count() == EXCERPT_LEN));
        assert!(issues[0].to_string().starts_with("1:"));
    }

    #[test]
    fn test_clean_document_has_no_issues() {
        let text = "# Title\n\n![a](/a.png \"cap\"){width=50%}\n\nSee [x](https://x.org).\n";
        assert!(find_issues(text).is_empty());
    }
}
