//! Resolution pages, spec §4.9 "Resolution pages": for each distinct sorted
//! sequence of keyword names referenced by a multi-topic ALink/KLink
//! object, a listing page at `_alinks/<slug>.html` (respectively
//! `_klinks/<slug>.html`) of hyperlinks to every topic, each `target=_top`.

use std::path::Path;

use chmweb_fs::root_to_doc;
use chmweb_scan::TreeData;
use chmweb_types::{RootPath, Topic};

use crate::error::RenderError;
use crate::link_map::LinkMap;
use crate::sanitize::SlugRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    ALink,
    KLink,
}

impl LinkKind {
    fn dirname(self) -> &'static str {
        match self {
            LinkKind::ALink => "_alinks",
            LinkKind::KLink => "_klinks",
        }
    }
}

/// Tracks the per-kind slug registries across the whole render; the
/// keyword-list -> path memoisation itself lives on `TreeData`.
#[derive(Debug, Default)]
pub struct ResolutionPages {
    alink_slugs: SlugRegistry,
    klink_slugs: SlugRegistry,
}

impl ResolutionPages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the root-relative path of the resolution page for this
    /// exact sorted keyword list, writing it out the first time it is
    /// needed and reusing the prior path on every subsequent call.
    pub fn emit_or_reuse(
        &mut self,
        kind: LinkKind,
        keywords: &[String],
        topics: &[Topic],
        out_root: &Path,
        data: &mut TreeData,
        link_map: &LinkMap,
    ) -> Result<RootPath, RenderError> {
        let mut sorted = keywords.to_vec();
        sorted.sort();

        let registered = match kind {
            LinkKind::ALink => &mut data.alink_resolution_pages,
            LinkKind::KLink => &mut data.klink_resolution_pages,
        };
        if let Some(existing) = registered.get(&sorted) {
            return Ok(existing.clone());
        }

        let slug = match kind {
            LinkKind::ALink => self.alink_slugs.slug_for(&sorted),
            LinkKind::KLink => self.klink_slugs.slug_for(&sorted),
        };
        let path = RootPath::new(format!("{}/{slug}.html", kind.dirname()));
        let body = render_listing(topics, &path, link_map);
        chmweb_util::io::write(out_root.join(path.as_str()), body)?;

        let registered = match kind {
            LinkKind::ALink => &mut data.alink_resolution_pages,
            LinkKind::KLink => &mut data.klink_resolution_pages,
        };
        registered.insert(sorted, path.clone());
        Ok(path)
    }
}

fn render_listing(topics: &[Topic], resolution_page: &RootPath, link_map: &LinkMap) -> String {
    let mut items = String::new();
    for topic in topics {
        match topic {
            Topic::Local { display_name, path } => {
                let target = link_map.get(path).cloned().unwrap_or_else(|| path.clone());
                let href = root_to_doc(&target, resolution_page).as_str().to_string();
                let label = display_name.clone().unwrap_or_else(|| path.as_str().to_string());
                push_link(&mut items, &href, &label);
            }
            Topic::External { display_name, url, .. } => {
                let label = display_name.clone().unwrap_or_else(|| url.clone());
                push_link(&mut items, url, &label);
            }
            Topic::SeeAlso { target } => {
                items.push_str("<li>");
                items.push_str(&html_escape::encode_text(&format!("See also: {target}")));
                items.push_str("</li>\n");
            }
        }
    }
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>Related topics</title></head><body>\n<ul>\n{items}</ul>\n</body></html>\n"
    )
}

fn push_link(items: &mut String, href: &str, label: &str) {
    items.push_str(&format!(
        "<li><a href=\"{}\" target=\"_top\">{}</a></li>\n",
        html_escape::encode_double_quoted_attribute(href),
        html_escape::encode_text(label)
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chmweb_toc::{ArchiveRegistry, ContentsTree};
    use chmweb_types::KeywordMap;

    #[test]
    fn reuses_page_for_same_keyword_list() {
        let dir = tempfile::tempdir().unwrap();
        let mut data = TreeData::new(ArchiveRegistry::new(), ContentsTree::new(), KeywordMap::default(), KeywordMap::default());
        let link_map = LinkMap::default();
        let topics = vec![
            Topic::Local { display_name: Some("A".into()), path: RootPath::new("a.htm".to_string()) },
            Topic::Local { display_name: Some("B".into()), path: RootPath::new("b.htm".to_string()) },
        ];
        let mut pages = ResolutionPages::new();
        let keywords = vec!["B".to_string(), "A".to_string()];

        let first = pages
            .emit_or_reuse(LinkKind::ALink, &keywords, &topics, dir.path(), &mut data, &link_map)
            .unwrap();
        let second = pages
            .emit_or_reuse(LinkKind::ALink, &keywords, &topics, dir.path(), &mut data, &link_map)
            .unwrap();
        assert_eq!(first, second);
        assert!(dir.path().join(first.as_str()).exists());
    }
}
