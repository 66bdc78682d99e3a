//! Convert external links into footnote references.
//!
//! `[label](https://…)` in running text becomes `label[^id]` and a
//! definition `[^id]: label. https://…` is appended at the end of the file.
//! The same URL always maps to the same id, including URLs that already
//! appear in existing definitions. Images, fenced code, and existing
//! definition blocks are left alone.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::{is_fence_line, join_lines};
use crate::markdown::slugify;

static FOOTNOTE_DEF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[\^([^\]]+)\]:\s*(.*)$").expect("definition regex is valid"));

static FOOTNOTE_CONTINUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\s{2,}|\t).+").expect("continuation regex is valid"));

// The optional `!` is captured so image links can be skipped.
static EXTERNAL_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?P<bang>!?)\[(?P<label>[^\]]+)\]\((?P<url>https?://[^)\s]+)(?P<title>\s+"[^"]*")?\)"#)
        .expect("link regex is valid")
});

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("url regex is valid"));

/// Longest id derived from a URL, before uniquifying.
const MAX_ID_LEN: usize = 48;

#[derive(Debug, Default)]
struct ExistingDefinitions {
    /// id → definition text, in source order.
    defs: Vec<(String, String)>,
    /// Line indices that belong to definition blocks.
    lines: HashSet<usize>,
}

fn parse_existing(lines: &[&str]) -> ExistingDefinitions {
    let mut found = ExistingDefinitions::default();
    let mut current: Option<(String, Vec<String>, Vec<usize>)> = None;

    let flush = |current: &mut Option<(String, Vec<String>, Vec<usize>)>,
                 found: &mut ExistingDefinitions| {
        if let Some((id, text, idxs)) = current.take() {
            found.defs.push((id, text.join(" ")));
            found.lines.extend(idxs);
        }
    };

    for (ix, line) in lines.iter().enumerate() {
        if let Some(caps) = FOOTNOTE_DEF.captures(line) {
            flush(&mut current, &mut found);
            current = Some((caps[1].to_string(), vec![caps[2].to_string()], vec![ix]));
            continue;
        }

        if let Some((_, text, idxs)) = current.as_mut() {
            if line.trim().is_empty() || FOOTNOTE_CONTINUATION.is_match(line) {
                text.push(line.to_string());
                idxs.push(ix);
                continue;
            }
        }

        flush(&mut current, &mut found);
    }
    flush(&mut current, &mut found);

    found
}

/// Build a readable id (`domain-lastsegment`) for a URL, unique within `used`.
pub fn id_for_url(url: &str, used: &mut HashSet<String>) -> String {
    let stripped = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    let (domain, rest) = stripped.split_once('/').unwrap_or((stripped, ""));
    let rest = rest.trim_start_matches('/');
    let last = if rest.is_empty() {
        domain
    } else {
        rest.rsplit('/').next().unwrap_or(domain)
    };

    let mut base: String = slugify(&format!("{domain}-{last}"))
        .chars()
        .take(MAX_ID_LEN)
        .collect();
    if base.is_empty() {
        base = "ext".to_string();
    }

    let mut candidate = base.clone();
    let mut k = 2;
    while used.contains(&candidate) {
        candidate = format!("{base}-{k}");
        k += 1;
    }
    used.insert(candidate.clone());
    candidate
}

/// Rewrite external links as footnote references.
///
/// Returns the new text and the number of links rewritten.
pub fn links_to_footnotes(text: &str) -> (String, usize) {
    let lines: Vec<&str> = text.lines().collect();
    let existing = parse_existing(&lines);

    let mut url_to_id: HashMap<String, String> = HashMap::new();
    for (id, body) in &existing.defs {
        if let Some(m) = URL.find(body) {
            let url = m.as_str().trim_end_matches([')', '.', ',', ';']);
            url_to_id.entry(url.to_string()).or_insert_with(|| id.clone());
        }
    }

    let mut used: HashSet<String> = existing.defs.iter().map(|(id, _)| id.clone()).collect();
    let mut new_defs: Vec<(String, String, String)> = Vec::new();
    let mut rewritten_links = 0;
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut in_code = false;

    for (ix, line) in lines.iter().enumerate() {
        if is_fence_line(line) {
            in_code = !in_code;
            out.push(line.to_string());
            continue;
        }
        if in_code || existing.lines.contains(&ix) {
            out.push(line.to_string());
            continue;
        }

        let rewritten = EXTERNAL_LINK.replace_all(line, |caps: &Captures<'_>| {
            if !caps["bang"].is_empty() {
                return caps[0].to_string();
            }
            let label = caps["label"].trim().to_string();
            let url = caps["url"].to_string();

            let id = match url_to_id.get(&url) {
                Some(id) => id.clone(),
                None => {
                    let id = id_for_url(&url, &mut used);
                    url_to_id.insert(url.clone(), id.clone());
                    new_defs.push((id.clone(), label.clone(), url));
                    id
                }
            };

            rewritten_links += 1;
            format!("{label}[^{id}]")
        });
        out.push(rewritten.into_owned());
    }

    if !new_defs.is_empty() {
        if out.last().is_some_and(|l| !l.trim().is_empty()) {
            out.push(String::new());
        }
        for (id, label, url) in &new_defs {
            let line = if label.is_empty() {
                format!("[^{id}]: {url}")
            } else if label.ends_with(['.', '!', '?', ':', ';']) {
                format!("[^{id}]: {label} {url}")
            } else {
                format!("[^{id}]: {label}. {url}")
            };
            out.push(line);
        }
        let mut joined = out.join("\n");
        joined.push('\n');
        return (joined, rewritten_links);
    }

    (join_lines(&out, text), rewritten_links)
}
