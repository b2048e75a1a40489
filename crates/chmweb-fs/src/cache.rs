//! Filesystem Cache, spec §4.1 (C1): a process-lifetime cache of filesystem
//! queries rooted at a path. Lives only in the parent control thread (spec
//! §5 "Shared-resource policy") — workers never see it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::warn;

#[derive(Debug, Default)]
pub struct FsCache {
    root: PathBuf,
    exists: DashMap<PathBuf, bool>,
    is_dir: DashMap<PathBuf, bool>,
    children: DashMap<PathBuf, Arc<Vec<String>>>,
    warned: DashMap<PathBuf, ()>,
}

impl FsCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full(&self, rel: &Path) -> PathBuf {
        self.root.join(rel)
    }

    pub fn exists(&self, rel: &Path) -> bool {
        if let Some(cached) = self.exists.get(rel) {
            return *cached;
        }
        let found = self.full(rel).exists();
        self.exists.insert(rel.to_path_buf(), found);
        found
    }

    pub fn is_dir(&self, rel: &Path) -> bool {
        if let Some(cached) = self.is_dir.get(rel) {
            return *cached;
        }
        let found = self.full(rel).is_dir();
        self.is_dir.insert(rel.to_path_buf(), found);
        found
    }

    /// Entry names of `rel` (excluding `.`/`..`); empty on a non-directory or
    /// an inaccessible directory, which raises a warning exactly once per
    /// directory — spec §4.1.
    pub fn children(&self, rel: &Path) -> Arc<Vec<String>> {
        if let Some(cached) = self.children.get(rel) {
            return Arc::clone(&cached);
        }
        let full = self.full(rel);
        let listing = match std::fs::read_dir(&full) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .filter_map(|e| e.file_name().into_string().ok())
                .collect::<Vec<_>>(),
            Err(e) => {
                if self.warned.insert(rel.to_path_buf(), ()).is_none() {
                    warn!(
                        source = "fs-access-denied",
                        path = %full.display(),
                        "could not list directory: {e}"
                    );
                }
                Vec::new()
            }
        };
        let listing = Arc::new(listing);
        self.children.insert(rel.to_path_buf(), Arc::clone(&listing));
        listing
    }

    /// Every entry of `rel` whose name compares equal to `name` under
    /// Unicode case folding — spec §4.1.
    pub fn case_insensitive_children(&self, rel: &Path, name: &str) -> Vec<String> {
        self.children(rel)
            .iter()
            .filter(|entry| chmweb_util::case_fold_eq(entry, name))
            .cloned()
            .collect()
    }

    /// Drops every memoised result. Callers must call this explicitly if the
    /// filesystem changes underneath the cache — spec §4.1.
    pub fn reset(&self) {
        self.exists.clear();
        self.is_dir.clear();
        self.children.clear();
        self.warned.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn memoises_existence_and_children() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Fig6-2.gif"), b"x").unwrap();
        fs::create_dir(dir.path().join("html")).unwrap();

        let cache = FsCache::new(dir.path());
        assert!(cache.exists(Path::new("Fig6-2.gif")));
        assert!(!cache.exists(Path::new("missing.gif")));
        assert!(cache.is_dir(Path::new("html")));
        assert!(!cache.is_dir(Path::new("Fig6-2.gif")));

        // Mutate on disk after caching; cached answer should stick until reset.
        fs::remove_file(dir.path().join("Fig6-2.gif")).unwrap();
        assert!(cache.exists(Path::new("Fig6-2.gif")));
        cache.reset();
        assert!(!cache.exists(Path::new("Fig6-2.gif")));
    }

    #[test]
    fn case_insensitive_children_matches_unicode_fold() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Fig6-2.GIF"), b"x").unwrap();
        fs::write(dir.path().join("other.gif"), b"x").unwrap();

        let cache = FsCache::new(dir.path());
        let hits = cache.case_insensitive_children(Path::new(""), "fig6-2.gif");
        assert_eq!(hits, vec!["Fig6-2.GIF".to_string()]);
    }

    #[test]
    fn missing_directory_warns_once_and_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FsCache::new(dir.path());
        assert!(cache.children(Path::new("nope")).is_empty());
        assert!(cache.children(Path::new("nope")).is_empty());
    }
}
