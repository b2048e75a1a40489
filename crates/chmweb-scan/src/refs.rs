//! Reference classification, spec §4.9 steps 1-7: the part of resolving a
//! raw `href`/`src` string that is shared between the tree scanner's
//! discovery pass (C8, which only cares whether a reference stays inside the
//! tree) and the rewriter (C9, which additionally needs the Link Map and
//! contents-tree membership for steps 8-10). Kept here, not in
//! `chmweb-render`, so C8 can use it without depending on the rewriter.

use chmweb_fs::doc_to_root;
use chmweb_toc::ArchiveRegistry;
use chmweb_types::{DocRelPath, RootPath};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefKind {
    /// `#…`: an in-page anchor, returned unchanged by callers.
    SameDocAnchor,
    /// A non-fragment scheme other than the ITS/MSITStore family.
    ExternalScheme,
    /// `ms-its:`/`mk:@MSITStore:`-tagged reference into a known archive.
    CrossArchive { root: RootPath, anchor: Option<String> },
    /// Same scheme, but its archive name isn't in the registry — spec §7
    /// "Unknown archive in scheme-tagged reference".
    UnknownArchiveScheme,
    /// A plain (possibly absolute) reference resolved to a root-relative
    /// path that stays inside the output tree.
    Plain { root: RootPath, anchor: Option<String> },
    /// A plain reference whose `..` segments climbed above the output root.
    Escaped,
}

/// Classifies `href` as it appears inside `doc`, whose owning archive is
/// rooted at `owning_subdir` (empty string for the root archive).
pub fn classify(href: &str, doc: &RootPath, owning_subdir: &str, registry: &ArchiveRegistry) -> RefKind {
    if href.starts_with('#') {
        return RefKind::SameDocAnchor;
    }

    if let Some((archive, url)) = its_scheme_target(href) {
        return match registry.subdir_by_stem(&archive) {
            Some(subdir) => {
                let (path, anchor) = split_anchor(url);
                RefKind::CrossArchive {
                    root: RootPath::join(subdir, path.trim_start_matches('/')),
                    anchor,
                }
            }
            None => RefKind::UnknownArchiveScheme,
        };
    }

    if has_scheme(href) {
        return RefKind::ExternalScheme;
    }

    let (path, anchor) = split_anchor(href);
    if path.is_empty() {
        return RefKind::Plain { root: doc.clone(), anchor };
    }

    let resolved = if let Some(stripped) = path.strip_prefix('/') {
        // Anchor a synthetic document at the archive's own subdirectory so
        // `doc_to_root`'s "base is doc's directory" rule resolves absolute
        // refs against the subdirectory instead of `doc`'s own directory.
        let synthetic_doc = RootPath::join(owning_subdir, "_");
        doc_to_root(&DocRelPath::new(stripped.to_string()), &synthetic_doc)
    } else {
        doc_to_root(&DocRelPath::new(path.to_string()), doc)
    };

    match resolved {
        Ok(root) => RefKind::Plain { root, anchor },
        Err(_) => RefKind::Escaped,
    }
}

fn split_anchor(s: &str) -> (&str, Option<String>) {
    match s.split_once('#') {
        Some((path, anchor)) => (path, Some(anchor.to_string())),
        None => (s, None),
    }
}

/// Recognises `ms-its:NAME::URL` and `mk:@MSITStore:NAME::URL`, both
/// case-insensitively on the scheme prefix — spec §4.9 step 2.
fn its_scheme_target(href: &str) -> Option<(String, String)> {
    let rest = strip_ci_prefix(href, "ms-its:").or_else(|| strip_ci_prefix(href, "mk:@msitstore:"))?;
    let (name, url) = rest.split_once("::")?;
    Some((name.to_string(), url.to_string()))
}

fn strip_ci_prefix<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() >= prefix.len() && s.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes()) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

/// `[A-Za-z][A-Za-z0-9]*:`, spec §4.9 step 3 — covers `javascript:`,
/// `http:`, `mailto:`, etc. `ms-its:`/`mk:` are handled earlier and never
/// reach this check.
fn has_scheme(s: &str) -> bool {
    match s.find(':') {
        Some(idx) if idx > 0 => {
            let prefix = &s[..idx];
            prefix.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
                && prefix.chars().all(|c| c.is_ascii_alphanumeric())
        }
        _ => false,
    }
}
