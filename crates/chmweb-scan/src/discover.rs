//! Tree Scanner, spec §4.8 (C8): the fixed-point discovery pass that seeds a
//! pending-set from the keyword maps, resolves every contents-tree archive
//! placeholder by dispatching its HHC to the worker pool, then drains C7
//! page-scan jobs in rounds until no round discovers a new path.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;

use tracing::warn;

use chmweb_fs::{resolve_mixed_case, FsCache};
use chmweb_pool::Pool;
use chmweb_toc::{DetachedNode, NodeIndex, NodeKind};
use chmweb_types::{PageRecord, RootPath, Topic};

use crate::error::ScanError;
use crate::job::{Job, JobResponse};
use crate::page::ScannedPage;
use crate::refs::{classify, RefKind};
use crate::tree_data::TreeData;

/// Runs C8 to completion: after this returns, `data.tree` has no more
/// `ArchivePlaceholder` nodes reachable from any placeholder this function
/// could resolve, and `data.pages`/`data.assets` hold the full discovery
/// closure reachable from the keyword maps and the contents tree.
pub fn discover(cache: &FsCache, pool: &Pool<JobResponse>, data: &mut TreeData) -> Result<(), ScanError> {
    let mut pending: VecDeque<RootPath> = VecDeque::new();

    seed_from_keyword_maps(data, &mut pending);
    resolve_placeholders(cache, pool, data, &mut pending)?;

    let mut scanned: HashSet<RootPath> = HashSet::new();
    run_fixed_point(cache, pool, data, &mut pending, &mut scanned)?;

    stamp_contents_tree_paths(data);
    Ok(())
}

/// spec §4.8 step 1: every local topic named by either keyword map seeds
/// the pending-set, regardless of whether it is also reachable from the
/// contents tree.
fn seed_from_keyword_maps(data: &TreeData, pending: &mut VecDeque<RootPath>) {
    for topic in data.alink.values().chain(data.klink.values()) {
        if let Topic::Local { path, .. } = topic {
            pending.push_back(path.clone());
        }
    }
}

/// spec §4.8 step 2: every `ArchivePlaceholder` currently in the tree (no
/// matter how it got there — flat CLI multi-archive mode or nested under a
/// `.col`-derived folder) gets its HHC parsed and grafted in.
fn resolve_placeholders(
    cache: &FsCache,
    pool: &Pool<JobResponse>,
    data: &mut TreeData,
    pending: &mut VecDeque<RootPath>,
) -> Result<(), ScanError> {
    let placeholders: Vec<(NodeIndex, String)> = data
        .tree
        .walk()
        .filter_map(|idx| match data.tree.kind(idx) {
            NodeKind::ArchivePlaceholder { stem } => Some((idx, stem.clone())),
            _ => None,
        })
        .collect();

    let mut by_stem: HashMap<String, NodeIndex> = HashMap::new();
    for (idx, stem) in placeholders {
        let Some(subdir) = data.registry.subdir_by_stem(&stem).map(str::to_string) else {
            warn!(
                source = "unknown-archive",
                archive = %stem,
                "contents placeholder references an unregistered archive"
            );
            continue;
        };
        let Some(hhc_path) = find_hhc(cache, &subdir, &stem) else {
            warn!(
                source = "unresolved-reference",
                archive = %stem,
                "no .hhc file found for archive"
            );
            continue;
        };
        let src = chmweb_util::io::read_to_string(cache.root().join(hhc_path.as_str()))?;
        pool.submit(&Job::ParseHhc { stem: stem.clone(), src })?;
        by_stem.insert(stem, idx);
    }

    for delivered in pool.drain()? {
        if let JobResponse::Hhc { stem, nodes } = delivered.response {
            let Some(&placeholder) = by_stem.get(&stem) else { continue };
            let subdir = data.registry.subdir_by_stem(&stem).unwrap_or("").to_string();
            let canonicalised: Vec<DetachedNode> = nodes
                .into_iter()
                .map(|n| canonicalise_node(cache, n, &subdir, &stem, pending))
                .collect();
            let new_roots = data.tree.graft_subtree(canonicalised);
            data.tree.replace(placeholder, new_roots);
        }
    }
    Ok(())
}

/// Locates the `.hhc` belonging to an archive's extracted tree: the
/// conventional `<stem>.hhc` name first (case-insensitively), then any
/// `.hhc` file at the archive subdirectory's top level.
fn find_hhc(cache: &FsCache, subdir: &str, stem: &str) -> Option<RootPath> {
    let exact = RootPath::join(subdir, &format!("{stem}.hhc"));
    if cache.exists(Path::new(exact.as_str())) {
        return Some(exact);
    }
    if let Some(found) = resolve_mixed_case(cache, &exact) {
        return Some(found);
    }
    cache
        .children(Path::new(subdir))
        .iter()
        .find(|name| name.to_ascii_lowercase().ends_with(".hhc"))
        .map(|name| RootPath::join(subdir, name))
}

/// Rewrites a `Page` leaf's HHC-local filename into its canonical
/// root-relative path (prefixing the archive subdirectory, then resolving
/// mixed case against the real tree) and queues it for scanning — spec
/// §4.8 step 2. Non-`Page` nodes (folders) are walked but left alone.
fn canonicalise_node(
    cache: &FsCache,
    mut node: DetachedNode,
    subdir: &str,
    archive_stem: &str,
    pending: &mut VecDeque<RootPath>,
) -> DetachedNode {
    if let NodeKind::Page { filename, .. } = &mut node.kind {
        let raw = RootPath::join(subdir, filename.as_str());
        *filename = match canonicalise_or_warn(cache, &raw, archive_stem) {
            Some(canon) => {
                pending.push_back(canon.clone());
                canon
            }
            None => raw,
        };
    }
    node.children = node
        .children
        .into_iter()
        .map(|child| canonicalise_node(cache, child, subdir, archive_stem, pending))
        .collect();
    node
}

fn canonicalise_or_warn(cache: &FsCache, raw: &RootPath, archive_stem: &str) -> Option<RootPath> {
    if cache.exists(Path::new(raw.as_str())) {
        return Some(raw.clone());
    }
    match resolve_mixed_case(cache, raw) {
        Some(found) => Some(found),
        None => {
            warn!(
                source = "unresolved-reference",
                archive = archive_stem,
                page = raw.as_str(),
                "contents entry not found on disk"
            );
            None
        }
    }
}

/// spec §4.8 step 3, in rounds rather than one item at a time: each round
/// submits every not-yet-scanned pending path, drains the pool, and folds
/// the discovered asset/page links of every scanned page back into the
/// pending-set for the next round. Terminates once a round discovers
/// nothing new, which must happen because the universe of root-relative
/// paths is finite.
fn run_fixed_point(
    cache: &FsCache,
    pool: &Pool<JobResponse>,
    data: &mut TreeData,
    pending: &mut VecDeque<RootPath>,
    scanned: &mut HashSet<RootPath>,
) -> Result<(), ScanError> {
    loop {
        let batch: Vec<RootPath> = std::mem::take(pending)
            .into_iter()
            .filter(|path| scanned.insert(path.clone()))
            .collect();
        if batch.is_empty() {
            break;
        }

        for path in &batch {
            let full = cache.root().join(path.as_str());
            match chmweb_util::io::read_to_string(&full) {
                Ok(html) => pool.submit(&Job::ScanPage { path: path.clone(), html })?,
                Err(e) => warn!(source = "fs-access-denied", page = path.as_str(), "{e}"),
            }
        }

        for delivered in pool.drain()? {
            if let JobResponse::Page { path, page } = delivered.response {
                fold_scanned_page(cache, data, path, page, pending);
            }
        }
    }
    Ok(())
}

/// Resolves a `classify()`-produced root-relative target against the real
/// filesystem before it is queued, mirroring `canonicalise_or_warn`: a link
/// discovered inside a page preserves the href's original case, which on a
/// case-sensitive filesystem may not match the file `run_fixed_point` later
/// tries to open. Falls back to the as-written path when no case-insensitive
/// match exists either; the subsequent open attempt then warns as usual.
fn resolve_link_target(cache: &FsCache, root: &RootPath) -> RootPath {
    if cache.exists(Path::new(root.as_str())) {
        root.clone()
    } else {
        resolve_mixed_case(cache, root).unwrap_or_else(|| root.clone())
    }
}

fn fold_scanned_page(cache: &FsCache, data: &mut TreeData, path: RootPath, page: ScannedPage, pending: &mut VecDeque<RootPath>) {
    let archive_stem = data.registry.reverse_lookup(&path).unwrap_or_default().to_string();
    let subdir = data
        .registry
        .subdir_by_stem(&archive_stem)
        .unwrap_or_default()
        .to_string();

    let mut record = data
        .pages
        .remove(&path)
        .unwrap_or_else(|| PageRecord::new(archive_stem.clone(), path.clone()));
    record.title = page.title;
    record.objects = page.objects;

    for asset in page.asset_links {
        if let RefKind::Plain { root, .. } = classify(&asset.href, &path, &subdir, &data.registry) {
            data.assets.insert(root);
        }
        record.asset_links.push(asset);
    }

    for link in page.page_links {
        if let RefKind::Plain { root, .. } = classify(&link.href, &path, &subdir, &data.registry) {
            pending.push_back(resolve_link_target(cache, &root));
        }
        record.page_links.push(link);
    }

    data.pages.insert(path, record);
}

/// spec §4.8 step 4: stamps each `Page` node's canonicalised path into its
/// Page Record, once the tree is fully resolved. Pages never placed in the
/// contents tree (reached only via a link) keep `contents_tree_path: None`.
fn stamp_contents_tree_paths(data: &mut TreeData) {
    let stamped: Vec<(Vec<usize>, RootPath)> = data
        .tree
        .walk()
        .filter_map(|idx| match data.tree.kind(idx) {
            NodeKind::Page { filename, .. } => data.tree.path(idx).map(|path| (path, filename.clone())),
            _ => None,
        })
        .collect();
    for (tree_path, filename) in stamped {
        if let Some(record) = data.pages.get_mut(&filename) {
            record.contents_tree_path = Some(tree_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chmweb_toc::ArchiveRegistry;
    use chmweb_types::KeywordMap;

    fn write(dir: &std::path::Path, rel: &str, contents: &str) {
        let full = dir.join(rel);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, contents).unwrap();
    }

    #[test]
    fn find_hhc_falls_back_to_any_hhc_file_in_subdir() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "manual/Help.hhc", "<ul></ul>");
        let cache = FsCache::new(dir.path());
        let found = find_hhc(&cache, "manual", "manual").unwrap();
        assert_eq!(found.as_str(), "manual/Help.hhc");
    }

    #[test]
    fn seed_from_keyword_maps_collects_local_topics_only() {
        let mut alink = KeywordMap::default();
        alink.insert(
            "Intro".to_string(),
            Topic::Local {
                display_name: Some("Intro".into()),
                path: RootPath::new("intro.htm"),
            },
        );
        alink.insert(
            "External".to_string(),
            Topic::External {
                display_name: Some("Ext".into()),
                url: "https://example.com".into(),
                frame: None,
            },
        );
        let data = TreeData::new(ArchiveRegistry::new(), chmweb_toc::ContentsTree::new(), alink, KeywordMap::default());

        let mut pending = VecDeque::new();
        seed_from_keyword_maps(&data, &mut pending);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].as_str(), "intro.htm");
    }
}
