//! Resolution-page slug sanitisation, spec §4.9 "Resolution pages":
//! lowercase, collapse runs of non-alphanumerics to a single `_`, truncate
//! to 48 characters, disambiguate repeats with `.1`, `.2`, … suffixes.

use std::collections::HashMap;

const MAX_LEN: usize = 48;

/// Sanitises one keyword-list identifier into a slug. Does not
/// disambiguate — that needs the set of slugs already emitted, tracked by
/// `SlugRegistry`.
pub fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_was_sep = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            out.extend(ch.to_lowercase());
            last_was_sep = false;
        } else if !last_was_sep {
            out.push('_');
            last_was_sep = true;
        }
    }
    let trimmed = out.trim_matches('_');
    let truncated: String = trimmed.chars().take(MAX_LEN).collect();
    if truncated.is_empty() {
        "_".to_string()
    } else {
        truncated
    }
}

/// Tracks every slug handed out so far so repeats get `.1`, `.2`, …
/// disambiguating suffixes, per keyword-list identity (the same keyword
/// list reuses its first slug; a distinct list colliding with it gets the
/// next free suffix).
#[derive(Debug, Default)]
pub struct SlugRegistry {
    assigned: HashMap<Vec<String>, String>,
    used_slugs: HashMap<String, usize>,
}

impl SlugRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the slug for `keywords`, reusing a prior assignment for the
    /// exact same sorted keyword list, or minting and disambiguating a new
    /// one.
    pub fn slug_for(&mut self, keywords: &[String]) -> String {
        if let Some(existing) = self.assigned.get(keywords) {
            return existing.clone();
        }
        let mut sorted = keywords.to_vec();
        sorted.sort();
        let base = sanitize(&sorted.join("_"));
        let slug = match self.used_slugs.get(&base) {
            None => base.clone(),
            Some(count) => format!("{base}.{}", count + 1),
        };
        *self.used_slugs.entry(base).or_insert(0) += 1;
        self.assigned.insert(keywords.to_vec(), slug.clone());
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_collapses_separators() {
        assert_eq!(sanitize("Win95 UI / Title Page!!"), "win95_ui_title_page");
    }

    #[test]
    fn truncates_to_48_chars() {
        let long = "a".repeat(60);
        assert_eq!(sanitize(&long).len(), 48);
    }

    #[test]
    fn disambiguates_colliding_slugs() {
        let mut reg = SlugRegistry::new();
        let a = reg.slug_for(&["Intro".to_string()]);
        let b = reg.slug_for(&["INTRO".to_string()]);
        assert_eq!(a, "intro");
        assert_eq!(b, "intro.1");
    }

    #[test]
    fn reuses_slug_for_identical_keyword_list() {
        let mut reg = SlugRegistry::new();
        let a = reg.slug_for(&["Intro".to_string(), "Overview".to_string()]);
        let b = reg.slug_for(&["Intro".to_string(), "Overview".to_string()]);
        assert_eq!(a, b);
    }
}
