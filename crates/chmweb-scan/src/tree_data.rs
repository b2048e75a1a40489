//! Tree Data, spec §3: the aggregate the tree scanner (C8) builds and the
//! rewriter (C9) consumes. Frozen in spirit after discovery finishes — the
//! archive registry, contents tree and keyword maps never change again —
//! but the rewriter still inserts into `pages` (Page Records it builds for
//! synthetic toc/resolution pages that were never part of discovery) and
//! into the two resolution-page maps as it lazily emits them, so the fields
//! stay `pub` rather than being locked behind a builder.

use std::collections::{BTreeSet, HashMap};

use chmweb_toc::{ArchiveRegistry, ContentsTree};
use chmweb_types::{KeywordMap, PageRecord, RootPath};

#[derive(Debug)]
pub struct TreeData {
    pub registry: ArchiveRegistry,
    pub tree: ContentsTree,
    pub alink: KeywordMap,
    pub klink: KeywordMap,

    /// Every page reached by the discovery fixed point, keyed by its
    /// canonical root-relative path.
    pub pages: HashMap<RootPath, PageRecord>,
    /// Every non-page asset (image, stylesheet, script) reached the same
    /// way.
    pub assets: BTreeSet<RootPath>,

    /// Keyword-list -> emitted resolution-page path, populated by the
    /// rewriter the first time a multi-topic A-link/K-link object is seen
    /// for that exact sorted list of topics (spec §4.9 "resolution pages").
    pub alink_resolution_pages: HashMap<Vec<String>, RootPath>,
    pub klink_resolution_pages: HashMap<Vec<String>, RootPath>,
}

impl TreeData {
    pub fn new(registry: ArchiveRegistry, tree: ContentsTree, alink: KeywordMap, klink: KeywordMap) -> Self {
        Self {
            registry,
            tree,
            alink,
            klink,
            pages: HashMap::new(),
            assets: BTreeSet::new(),
            alink_resolution_pages: HashMap::new(),
            klink_resolution_pages: HashMap::new(),
        }
    }
}
