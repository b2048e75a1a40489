//! COL (collection) parsing, spec §4.6: a flat sequence of folder records
//! (each an `<object>` carrying `Title` and `FolderOrder` params, the same
//! idiom HHC uses for its `<li>` entries) sorted by their explicit
//! `FolderOrder`. A title starting with `=` names a member archive and
//! becomes an `ArchivePlaceholder`; every other title becomes a `Folder`.

use chmweb_sgml::{scan_all, Event};

use crate::tree::{DetachedNode, NodeKind};

#[derive(Default)]
struct WipFolder {
    title: Option<String>,
    order: Option<i64>,
}

pub fn parse_col(src: &str) -> Vec<DetachedNode> {
    let mut current: Option<WipFolder> = None;
    let mut folders: Vec<WipFolder> = Vec::new();

    for event in scan_all(src) {
        match event {
            Event::StartTag(tag) if tag.name.eq_ignore_ascii_case("object") => {
                if let Some(done) = current.take() {
                    folders.push(done);
                }
                current = Some(WipFolder::default());
            }
            Event::StartTag(tag) if tag.name.eq_ignore_ascii_case("param") => {
                let Some(wip) = current.as_mut() else {
                    continue;
                };
                let pname = tag.attr("name").unwrap_or_default();
                let pvalue = tag.attr("value").unwrap_or_default();
                if pname.eq_ignore_ascii_case("title") {
                    wip.title = Some(pvalue.to_string());
                } else if pname.eq_ignore_ascii_case("folderorder") {
                    wip.order = pvalue.trim().parse::<i64>().ok();
                }
            }
            _ => {}
        }
    }
    if let Some(done) = current.take() {
        folders.push(done);
    }

    folders.sort_by_key(|f| f.order.unwrap_or(i64::MAX));

    folders
        .into_iter()
        .filter_map(|f| f.title)
        .map(|title| {
            let kind = match title.strip_prefix('=') {
                Some(stem) => NodeKind::ArchivePlaceholder {
                    stem: stem.to_string(),
                },
                None => NodeKind::Folder { title },
            };
            DetachedNode::leaf(kind)
        })
        .collect()
}
