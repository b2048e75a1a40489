//! Wrapper pages, spec §4.9 "Wrapper pages": for every discovered page, a
//! two-frame HTML file at the page's own path hosting a contents pane
//! (`_toc/…#anchor`) and a content pane (the page's `*.content.ext`). The
//! original page content moves to the `.content`-infixed path.

use std::path::Path;

use chmweb_fs::root_to_doc;
use chmweb_types::RootPath;

use crate::error::RenderError;
use crate::toc_pages::toc_page_path;

/// Name of the frame hosting the contents pane, referenced by toc page
/// links that switch the content frame without reloading the wrapper.
pub const TOC_FRAME: &str = "chmweb-toc";
/// Name of the frame hosting the content pane.
pub const CONTENT_FRAME: &str = "chmweb-content";

/// Emits the two-frame wrapper at `page`'s own path, with the content frame
/// pointing at `page`'s own `.content`-infixed variant. `tree_path` is the
/// page's contents-tree path (anchor target in the toc page), `None` for
/// pages reachable only by link (no contents-tree entry, so no toc anchor
/// to break out to — the wrapper still works, it just opens the toc root).
pub fn emit_wrapper(page: &RootPath, tree_path: Option<&[usize]>, out_root: &Path) -> Result<(), RenderError> {
    let content_path = page.with_infix_before_extension(".content");
    emit_wrapper_for(page, &content_path, tree_path, out_root)
}

/// Emits the two-frame wrapper at `out_path`, with the content frame
/// pointing at the independently-chosen `content_path` — used for
/// `index.html`, whose content target is another page's `.content`
/// variant rather than its own.
pub fn emit_wrapper_for(
    out_path: &RootPath,
    content_path: &RootPath,
    tree_path: Option<&[usize]>,
    out_root: &Path,
) -> Result<(), RenderError> {
    let toc_path = toc_page_path(tree_path.unwrap_or(&[]));
    let toc_href = root_to_doc(&toc_path, out_path);
    let anchor = tree_path.map(node_anchor_id).unwrap_or_default();
    let content_href = root_to_doc(content_path, out_path);

    let html = format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{title}</title></head>\n\
         <frameset cols=\"25%,75%\">\n\
         <frame name=\"{toc_frame}\" src=\"{toc_href}{anchor_suffix}\">\n\
         <frame name=\"{content_frame}\" src=\"{content_href}\">\n\
         </frameset>\n\
         </html>\n",
        title = html_escape::encode_text(out_path.as_str()),
        toc_frame = TOC_FRAME,
        toc_href = html_escape::encode_double_quoted_attribute(toc_href.as_str()),
        anchor_suffix = if anchor.is_empty() { String::new() } else { format!("#{anchor}") },
        content_frame = CONTENT_FRAME,
        content_href = html_escape::encode_double_quoted_attribute(content_href.as_str()),
    );
    chmweb_util::io::write(out_root.join(out_path.as_str()), html)
}

/// Emits a bare redirect page at `out_path` pointing at `target` — the
/// fallback for `index.html` when no contents-tree leaf is discoverable at
/// all (spec does not describe a homepage when the tree is empty).
pub fn emit_redirect(out_path: &RootPath, target: &RootPath, out_root: &Path) -> Result<(), RenderError> {
    let href = root_to_doc(target, out_path);
    let html = format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">\
         <meta http-equiv=\"refresh\" content=\"0; url={href}\"></head>\n\
         <body><a href=\"{href}\">Contents</a></body></html>\n",
        href = html_escape::encode_double_quoted_attribute(href.as_str()),
    );
    chmweb_util::io::write(out_root.join(out_path.as_str()), html)
}

/// Anchor id for a contents-tree node at `tree_path`, shared between
/// `toc_pages` (which emits the id) and this module (which references it).
pub fn node_anchor_id(tree_path: &[usize]) -> String {
    if tree_path.is_empty() {
        "root".to_string()
    } else {
        format!("node_{}", tree_path.iter().map(usize::to_string).collect::<Vec<_>>().join("_"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapper_frames_point_at_toc_and_content_variant() {
        let dir = tempfile::tempdir().unwrap();
        let page = RootPath::new("chpt06/intro.htm".to_string());
        emit_wrapper(&page, Some(&[1, 2]), dir.path()).unwrap();
        let written = std::fs::read_to_string(dir.path().join("chpt06/intro.htm")).unwrap();
        assert!(written.contains("node_1_2"));
        assert!(written.contains("intro.content.htm"));
        assert!(written.contains(TOC_FRAME));
        assert!(written.contains(CONTENT_FRAME));
    }
}
