//! Path types, per spec §3 "Path": a forward-slash separated sequence of
//! non-empty segments, in two flavours (root-relative and document-relative).
//!
//! These types are deliberately dumb containers — segment splitting/joining
//! only. The actual path algebra (`doc_to_root`, `root_to_doc`,
//! `resolve_mixed_case`) lives in `chmweb-fs`, which is the crate that also
//! owns the filesystem cache those algorithms consult.

use std::fmt;

/// A path rooted at the output directory: `html/chpt06-02.htm`, never `..`,
/// never a leading `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct RootPath(String);

impl RootPath {
    /// Build from already-normalised, `/`-joined segments. Does not validate;
    /// callers that accept untrusted input should go through `chmweb_fs`'s
    /// `doc_to_root`/`resolve_mixed_case` instead.
    pub fn new(s: impl Into<String>) -> Self {
        let s = s.into();
        debug_assert!(!s.starts_with('/'), "root path must not start with '/': {s}");
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    pub fn join(prefix: &str, rest: &str) -> Self {
        if prefix.is_empty() {
            Self::new(rest.to_string())
        } else if rest.is_empty() {
            Self::new(prefix.trim_end_matches('/').to_string())
        } else {
            Self::new(format!("{}/{}", prefix.trim_end_matches('/'), rest))
        }
    }

    /// The directory part (everything before the final segment), without a
    /// trailing slash. Empty string for a root-level file.
    pub fn dir(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }

    pub fn file_name(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    /// Returns a copy with the file extension replaced, preserving directory
    /// and stem: used for the `name.ext` -> `name.content.ext` rewrite of
    /// spec §4.9 step 9 and the wrapper/content split of §4.9 "Wrapper pages".
    pub fn with_infix_before_extension(&self, infix: &str) -> Self {
        let file = self.file_name();
        let dir = self.dir();
        let renamed = match file.rfind('.') {
            Some(idx) => format!("{}{}{}", &file[..idx], infix, &file[idx..]),
            None => format!("{file}{infix}"),
        };
        if dir.is_empty() {
            Self::new(renamed)
        } else {
            Self::new(format!("{dir}/{renamed}"))
        }
    }
}

impl fmt::Display for RootPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A reference to a target as it appears inside one particular document:
/// may contain `.` and `..` segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocRelPath(String);

impl DocRelPath {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl fmt::Display for DocRelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
