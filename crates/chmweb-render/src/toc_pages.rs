//! Contents pages, spec §4.9 "Contents pages": one `_toc/tocX_Y_Z.html` per
//! interior container, expanded along the path to that container with
//! collapsed siblings linking to their own contents pages; a root
//! `_toc/toc.html` is always emitted.

use std::path::Path;

use chmweb_fs::root_to_doc;
use chmweb_toc::{ContentsTree, NodeIndex, NodeKind, ROOT};
use chmweb_types::RootPath;

use crate::error::RenderError;
use crate::link_map::LinkMap;
use crate::wrapper::{node_anchor_id, CONTENT_FRAME};

/// Root-relative path of the contents page for the container at
/// `tree_path` (the empty path names the always-emitted toc root).
pub fn toc_page_path(tree_path: &[usize]) -> RootPath {
    if tree_path.is_empty() {
        RootPath::new("_toc/toc.html".to_string())
    } else {
        let suffix = tree_path.iter().map(usize::to_string).collect::<Vec<_>>().join("_");
        RootPath::new(format!("_toc/toc{suffix}.html"))
    }
}

/// Emits every interior container's contents page plus the always-present
/// root page.
pub fn render_all(tree: &ContentsTree, link_map: &LinkMap, out_root: &Path) -> Result<(), RenderError> {
    render_one(tree, &[], link_map, out_root)?;
    for idx in tree.walk() {
        if idx == ROOT || tree.children(idx).is_empty() {
            continue;
        }
        if let Some(tree_path) = tree.path(idx) {
            render_one(tree, &tree_path, link_map, out_root)?;
        }
    }
    Ok(())
}

fn render_one(tree: &ContentsTree, target_path: &[usize], link_map: &LinkMap, out_root: &Path) -> Result<(), RenderError> {
    let page_path = toc_page_path(target_path);
    let mut body = String::new();
    render_node(tree, ROOT, &[], target_path, link_map, &page_path, &mut body);
    let html = format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>Contents</title></head><body>\n<ul>\n{body}</ul>\n</body></html>\n"
    );
    chmweb_util::io::write(out_root.join(page_path.as_str()), html)
}

/// `node_prefix` is `idx`'s own path from the root. Recurses into children
/// only while `node_prefix` is a prefix of (or equal to) `target_path` —
/// that is the "expanded along the path" rule; every other child becomes a
/// collapsed link to its own contents page (folders and non-leaf pages) or
/// a direct content link (leaf pages).
fn render_node(
    tree: &ContentsTree,
    idx: NodeIndex,
    node_prefix: &[usize],
    target_path: &[usize],
    link_map: &LinkMap,
    page_path: &RootPath,
    out: &mut String,
) {
    for (position, &child) in tree.children(idx).iter().enumerate() {
        let mut child_path = node_prefix.to_vec();
        child_path.push(position);
        let is_current = child_path == target_path;
        let on_path = target_path.starts_with(&child_path);
        let title = node_title(tree.kind(child));

        out.push_str("<li");
        if is_current {
            out.push_str(&format!(" id=\"{}\"", node_anchor_id(&child_path)));
        }
        out.push('>');

        match tree.kind(child) {
            NodeKind::Page { filename, anchor, .. } => {
                push_content_link(out, filename, anchor.as_deref(), link_map, page_path, &title);
            }
            NodeKind::Folder { .. } => {
                push_folder_link(out, &child_path, on_path, page_path, &title);
            }
            NodeKind::Root | NodeKind::ArchivePlaceholder { .. } => {
                out.push_str(&html_escape::encode_text(&title));
            }
        }

        if !tree.children(child).is_empty() {
            if on_path {
                out.push_str("\n<ul>\n");
                render_node(tree, child, &child_path, target_path, link_map, page_path, out);
                out.push_str("</ul>\n");
            } else if matches!(tree.kind(child), NodeKind::Page { .. }) {
                // Collapsed pages with children still need a way in; point
                // at their own contents page rather than silently dropping
                // the subtree.
                out.push_str(&format!(
                    " (<a href=\"{}\">expand</a>)",
                    html_escape::encode_double_quoted_attribute(
                        root_to_doc(&toc_page_path(&child_path), page_path).as_str()
                    )
                ));
            }
        }
        out.push_str("</li>\n");
    }
}

fn node_title(kind: &NodeKind) -> String {
    match kind {
        NodeKind::Root => "Contents".to_string(),
        NodeKind::Folder { title } => title.clone(),
        NodeKind::Page { title, filename, .. } => title.clone().unwrap_or_else(|| filename.as_str().to_string()),
        NodeKind::ArchivePlaceholder { stem } => stem.clone(),
    }
}

fn push_content_link(
    out: &mut String,
    filename: &RootPath,
    anchor: Option<&str>,
    link_map: &LinkMap,
    page_path: &RootPath,
    title: &str,
) {
    let canonical = link_map.get(filename).cloned().unwrap_or_else(|| filename.clone());
    let content_target = canonical.with_infix_before_extension(".content");
    let mut href = root_to_doc(&content_target, page_path).as_str().to_string();
    if let Some(a) = anchor {
        href.push('#');
        href.push_str(a);
    }
    out.push_str(&format!(
        "<a href=\"{}\" target=\"{}\">{}</a>",
        html_escape::encode_double_quoted_attribute(&href),
        CONTENT_FRAME,
        html_escape::encode_text(title)
    ));
}

fn push_folder_link(out: &mut String, child_path: &[usize], on_path: bool, page_path: &RootPath, title: &str) {
    if on_path {
        out.push_str(&html_escape::encode_text(title));
        return;
    }
    let href = root_to_doc(&toc_page_path(child_path), page_path).as_str().to_string();
    out.push_str(&format!(
        "<a href=\"{}\">{}</a>",
        html_escape::encode_double_quoted_attribute(&href),
        html_escape::encode_text(title)
    ));
}
