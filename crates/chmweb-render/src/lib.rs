//! Link Rewriter, spec §4.9 (C9): resolves every reference a discovered
//! page contains, splices the rewritten markup in place, and emits the
//! contents/wrapper/resolution pages that turn the discovery closure into
//! a browsable static site.

mod alink;
mod error;
mod link_map;
mod resolution_pages;
mod resolve;
mod rewrite;
mod sanitize;
mod splice;
mod toc_pages;
mod wrapper;

pub use error::RenderError;
pub use link_map::LinkMap;
pub use resolution_pages::LinkKind;
pub use resolve::{resolve_reference, Resolution};
pub use rewrite::render_pages;
pub use sanitize::{sanitize, SlugRegistry};
pub use splice::{apply_splices, Splice};
pub use toc_pages::toc_page_path;
pub use wrapper::{emit_wrapper, node_anchor_id, CONTENT_FRAME, TOC_FRAME};
