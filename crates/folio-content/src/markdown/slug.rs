//! Anchor slugs for headings and footnotes.

use std::collections::HashMap;

/// Turn arbitrary text into a lowercase, hyphen-separated anchor.
///
/// Alphanumeric characters (any script) are kept, runs of anything else
/// collapse into a single `-`, and leading/trailing hyphens are trimmed.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Hands out unique anchors within one document.
#[derive(Debug, Default)]
pub struct SlugSet {
    seen: HashMap<String, usize>,
}

impl SlugSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `base` (or `section` when empty), suffixing `-1`, `-2`, … on reuse.
    pub fn claim(&mut self, base: &str) -> String {
        let base = if base.is_empty() { "section" } else { base };

        let mut n = match self.seen.get(base) {
            Some(n) => *n,
            None => {
                self.seen.insert(base.to_string(), 0);
                return base.to_string();
            }
        };

        loop {
            n += 1;
            let candidate = format!("{base}-{n}");
            if !self.seen.contains_key(&candidate) {
                self.seen.insert(base.to_string(), n);
                self.seen.insert(candidate.clone(), 0);
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Result 1: RL works surprisingly early."), "result-1-rl-works-surprisingly-early");
        assert_eq!(slugify("  Sharpening vs. expansion  "), "sharpening-vs-expansion");
        assert_eq!(slugify("SFT→RL"), "sft-rl");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_slug_set_dedups() {
        let mut set = SlugSet::new();
        assert_eq!(set.claim("intro"), "intro");
        assert_eq!(set.claim("intro"), "intro-1");
        assert_eq!(set.claim("intro"), "intro-2");
        assert_eq!(set.claim(""), "section");
        assert_eq!(set.claim(""), "section-1");
    }

    #[test]
    fn test_slug_set_suffix_collision() {
        let mut set = SlugSet::new();
        assert_eq!(set.claim("a-1"), "a-1");
        assert_eq!(set.claim("a"), "a");
        assert_eq!(set.claim("a"), "a-2");
    }
}
