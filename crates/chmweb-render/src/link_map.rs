//! Link Map, spec §3: "built once after discovery", a partial function from
//! root-relative reference path to its canonically-cased filesystem path.
//! Any reference not in the discovery closure is, by construction, broken —
//! the map is not a live filesystem lookup.

use std::collections::HashMap;
use std::path::Path;

use chmweb_fs::{resolve_mixed_case, FsCache};
use chmweb_scan::TreeData;
use chmweb_types::RootPath;

#[derive(Debug, Default)]
pub struct LinkMap {
    entries: HashMap<RootPath, RootPath>,
}

impl LinkMap {
    /// Resolves every page and asset path C8's discovery found against the
    /// real filesystem, once. References discovered but never actually
    /// present on disk (a dangling HHC entry, a deleted asset) are simply
    /// absent from the map — resolved later as broken references.
    pub fn build(cache: &FsCache, data: &TreeData) -> Self {
        let mut entries = HashMap::new();
        for path in data.pages.keys().chain(data.assets.iter()) {
            let canonical = if cache.exists(Path::new(path.as_str())) {
                Some(path.clone())
            } else {
                resolve_mixed_case(cache, path)
            };
            if let Some(canonical) = canonical {
                entries.insert(path.clone(), canonical);
            }
        }
        Self { entries }
    }

    /// Builds a map directly from known-good pairs, bypassing the
    /// filesystem-facing `build` — useful to unit-test resolution logic
    /// without a real directory tree on disk.
    pub fn from_entries(entries: Vec<(RootPath, RootPath)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, path: &RootPath) -> Option<&RootPath> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chmweb_toc::{ArchiveRegistry, ContentsTree};
    use chmweb_types::{KeywordMap, PageRecord};

    #[test]
    fn only_discovered_paths_present_on_disk_are_mapped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("HTML")).unwrap();
        std::fs::write(dir.path().join("HTML").join("Fig.GIF"), b"x").unwrap();

        let mut data = TreeData::new(
            ArchiveRegistry::new(),
            ContentsTree::new(),
            KeywordMap::default(),
            KeywordMap::default(),
        );
        data.assets.insert(RootPath::new("html/fig.gif".to_string()));
        data.assets.insert(RootPath::new("html/missing.gif".to_string()));
        let page_path = RootPath::new("index.htm".to_string());
        data.pages.insert(page_path.clone(), PageRecord::new("stem".into(), page_path));

        let cache = FsCache::new(dir.path());
        let map = LinkMap::build(&cache, &data);
        assert_eq!(
            map.get(&RootPath::new("html/fig.gif".to_string())).unwrap().as_str(),
            "HTML/Fig.GIF"
        );
        assert!(map.get(&RootPath::new("html/missing.gif".to_string())).is_none());
        assert!(map.get(&RootPath::new("index.htm".to_string())).is_none());
    }
}
