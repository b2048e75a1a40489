//! ALink/KLink object dereference, spec §4.9 "ALink object dereference":
//! looks a display name up in a keyword map and classifies the result
//! (zero/one/many topics, local/external, `SeeAlso` indirection) into a
//! single resolved [`Resolution`].

use std::path::Path;

use tracing::warn;

use chmweb_fs::root_to_doc;
use chmweb_scan::TreeData;
use chmweb_types::{KeywordMap, RootPath, Topic};

use crate::error::RenderError;
use crate::link_map::LinkMap;
use crate::resolution_pages::{LinkKind, ResolutionPages};
use crate::resolve::{finish, resolve_reference, Resolution};

/// Marker class added to links emitted by a multi-topic dereference, spec
/// §4.9 "Element rewrites" and concrete scenario 5.
pub const MULTI_LINK_CLASS: &str = "chmweb-multi-link";

/// Dereferences `key` against `map` (the page's A-link or K-link map, per
/// `kind`), following `SeeAlso` indirection, per spec §4.9. Mutates `data`
/// only to register a newly-minted resolution page's keyword-list -> path
/// memoisation.
#[allow(clippy::too_many_arguments)]
pub fn dereference(
    kind: LinkKind,
    map: &KeywordMap,
    key: &str,
    fallback: Option<&str>,
    doc: &RootPath,
    page_line: usize,
    data: &mut TreeData,
    link_map: &LinkMap,
    pages: &mut ResolutionPages,
    out_root: &Path,
) -> Result<Resolution, RenderError> {
    dereference_inner(kind, map, key, fallback, doc, page_line, data, link_map, pages, out_root, 0)
}

#[allow(clippy::too_many_arguments)]
fn dereference_inner(
    kind: LinkKind,
    map: &KeywordMap,
    key: &str,
    fallback: Option<&str>,
    doc: &RootPath,
    page_line: usize,
    data: &mut TreeData,
    link_map: &LinkMap,
    pages: &mut ResolutionPages,
    out_root: &Path,
    depth: u32,
) -> Result<Resolution, RenderError> {
    // SeeAlso chains are not expected to be long; bound the recursion so a
    // cyclic keyword map cannot hang the rewriter.
    if depth > 16 {
        return Ok(broken());
    }

    let topics = map.lookup(key).to_vec();
    match topics.as_slice() {
        [] => {
            warn!(
                source = "unresolved-reference",
                page = doc.as_str(),
                line = page_line,
                key,
                "ALink/KLink key has no topics"
            );
            Ok(match fallback {
                Some(fb) => resolve_reference(fb, doc, page_line, data, link_map),
                None => broken(),
            })
        }
        [Topic::SeeAlso { target }] => {
            let target = target.clone();
            dereference_inner(kind, map, &target, fallback, doc, page_line, data, link_map, pages, out_root, depth + 1)
        }
        [Topic::Local { path, .. }] => Ok(finish(path.clone(), None, doc, page_line, data, link_map)),
        [Topic::External { url, frame, .. }] => Ok(Resolution {
            rewritten: url.clone(),
            target: frame.clone(),
            class: None,
        }),
        multiple => {
            // A single ALink/KLink object names one display-name key; the
            // resolution page's keyword-list identity is therefore this
            // singleton, matching the "two topics under the same key"
            // phrasing of the pinned scenario rather than a multi-key list.
            let keywords = vec![key.to_string()];
            let resolution_path = pages.emit_or_reuse(kind, &keywords, multiple, out_root, data, link_map)?;
            let rel = root_to_doc(&resolution_path, doc).as_str().to_string();
            Ok(Resolution {
                rewritten: rel,
                target: Some("_top".to_string()),
                class: Some(MULTI_LINK_CLASS.to_string()),
            })
        }
    }
}

fn broken() -> Resolution {
    Resolution {
        rewritten: "#".to_string(),
        target: None,
        class: None,
    }
}
