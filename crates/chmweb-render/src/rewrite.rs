//! Link Rewriter, spec §4.9 (C9): the per-page pass that splices every
//! resolved reference into the original markup, renames the original
//! content to its `.content`-infixed path, and emits the wrapper frameset
//! in its place. Orchestrates `resolve`, `alink` and `resolution_pages`
//! against the byte-accurate events `chmweb-sgml` re-parses per page —
//! the page scanner's `PageLink`/`AssetLink` records only carry a tag's
//! start offset, not the whole-tag span a splice needs to reconstruct.

use std::collections::HashSet;
use std::path::Path;

use chmweb_scan::TreeData;
use chmweb_sgml::{scan_all, Event, StartTag};
use chmweb_toc::NodeKind;
use chmweb_types::{EmbeddedObject, KeywordMap, PageRecord, RootPath};

use crate::alink;
use crate::error::RenderError;
use crate::link_map::LinkMap;
use crate::resolution_pages::{LinkKind, ResolutionPages};
use crate::resolve::{resolve_reference, Resolution};
use crate::splice::{apply_splices, Splice};
use crate::toc_pages;
use crate::wrapper;

/// Runs C9 over every page `discover` found, then emits the contents pages
/// and the `index.html` entry point. `data.pages`/`data.tree` are read but
/// not mutated here except through `data.alink_resolution_pages` /
/// `data.klink_resolution_pages`, which `alink::dereference` updates as it
/// lazily emits resolution pages.
pub fn render_pages(data: &mut TreeData, link_map: &LinkMap, out_root: &Path) -> Result<(), RenderError> {
    // `dereference` needs `&mut TreeData` to memoise resolution pages, but
    // also needs the keyword maps it mutates are themselves fields of. Clone
    // them once up front rather than fighting the borrow checker per object.
    let alink_map = data.alink.clone();
    let klink_map = data.klink.clone();
    let mut pages = ResolutionPages::new();

    let paths: Vec<RootPath> = data.pages.keys().cloned().collect();
    for path in &paths {
        let Some(record) = data.pages.get(path).cloned() else {
            continue;
        };
        render_page(path, &record, &alink_map, &klink_map, data, link_map, &mut pages, out_root)?;
    }

    toc_pages::render_all(&data.tree, link_map, out_root)?;
    emit_index(data, link_map, out_root)?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn render_page(
    path: &RootPath,
    record: &PageRecord,
    alink_map: &KeywordMap,
    klink_map: &KeywordMap,
    data: &mut TreeData,
    link_map: &LinkMap,
    pages: &mut ResolutionPages,
    out_root: &Path,
) -> Result<(), RenderError> {
    let canonical = link_map.get(path).cloned().unwrap_or_else(|| path.clone());
    let html = chmweb_util::io::read_to_string(out_root.join(canonical.as_str()))?;

    let mut splices = Vec::new();
    // Byte offset up to which events are skipped: an HTML-Help-control
    // object whose span was just replaced still yields `<param>`/text/
    // `</object>` events nested inside that span, which must not also
    // attempt a splice (apply_splices asserts no overlap).
    let mut consumed_until = 0usize;

    for event in scan_all(&html) {
        if event.byte_offset() < consumed_until {
            continue;
        }
        let Event::StartTag(tag) = event else { continue };
        let lname = tag.name.to_ascii_lowercase();
        match lname.as_str() {
            "a" => {
                if let Some(href) = tag.attr("href") {
                    let href = href.to_string();
                    if let Some(splice) =
                        rewrite_anchor(&tag, &href, record, &canonical, alink_map, klink_map, data, link_map, pages, out_root)?
                    {
                        splices.push(splice);
                    }
                }
            }
            "img" | "script" => {
                if let Some(splice) = rewrite_simple_ref(&tag, "src", &canonical, data, link_map) {
                    splices.push(splice);
                }
            }
            "link" => {
                if let Some(splice) = rewrite_simple_ref(&tag, "href", &canonical, data, link_map) {
                    splices.push(splice);
                }
            }
            "object" => {
                if let Some(obj) = record.objects.iter().find(|o| o.start_byte_offset == tag.byte_offset) {
                    if obj.is_html_help_control() {
                        if let Some(splice) =
                            rewrite_object(obj, &canonical, alink_map, klink_map, data, link_map, pages, out_root)?
                        {
                            consumed_until = obj.start_byte_offset + obj.total_byte_length;
                            splices.push(splice);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    let rewritten = apply_splices(html.as_bytes(), splices);
    let content_path = canonical.with_infix_before_extension(".content");
    chmweb_util::io::write(out_root.join(content_path.as_str()), rewritten)?;
    wrapper::emit_wrapper(&canonical, record.contents_tree_path.as_deref(), out_root)?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn rewrite_anchor(
    tag: &StartTag,
    href: &str,
    record: &PageRecord,
    doc: &RootPath,
    alink_map: &KeywordMap,
    klink_map: &KeywordMap,
    data: &mut TreeData,
    link_map: &LinkMap,
    pages: &mut ResolutionPages,
    out_root: &Path,
) -> Result<Option<Splice>, RenderError> {
    let resolution = if let Some(id) = javascript_click_id(href) {
        let target_object = record
            .objects
            .iter()
            .find(|o| o.attr("id").is_some_and(|v| v.eq_ignore_ascii_case(id)) && o.is_html_help_control());
        match target_object {
            Some(obj) => match resolve_object_link(obj, doc, tag.line as usize, alink_map, klink_map, data, link_map, pages, out_root)? {
                Some(res) => res,
                // `Command` isn't ALink/KLink: not ours to dereference, leave
                // the element untouched (falls through as an external link).
                None => return Ok(None),
            },
            None => return Ok(None),
        }
    } else {
        resolve_reference(href, doc, tag.line as usize, data, link_map)
    };

    if resolution.rewritten == href && resolution.target.is_none() && resolution.class.is_none() {
        return Ok(None);
    }

    let mut add_if_absent = Vec::new();
    if let Some(target) = &resolution.target {
        if tag.attr("target").is_none() {
            add_if_absent.push(("target", target.clone()));
        }
    }
    let new_tag = rebuild_start_tag(
        tag,
        &[("href", resolution.rewritten)],
        &add_if_absent,
        resolution.class.as_deref(),
    );
    Ok(Some(Splice::new(tag.byte_offset, tag.end_byte_offset - tag.byte_offset, new_tag)))
}

fn rewrite_simple_ref(tag: &StartTag, attr_name: &str, doc: &RootPath, data: &TreeData, link_map: &LinkMap) -> Option<Splice> {
    let href = tag.attr(attr_name)?;
    let resolution = resolve_reference(href, doc, tag.line as usize, data, link_map);
    if resolution.rewritten == href {
        return None;
    }
    let new_tag = rebuild_start_tag(tag, &[(attr_name, resolution.rewritten)], &[], None);
    Some(Splice::new(tag.byte_offset, tag.end_byte_offset - tag.byte_offset, new_tag))
}

/// spec §4.9 "Element rewrites": a `Text`-param object becomes an `<a>`
/// wrapping that text; a `Button`-param object becomes a minimal link
/// (icon/bitmap/chiclet shape is cosmetic and not reproduced in static
/// HTML) or, lacking a usable label, an empty replacement — either way the
/// whole span is consumed so no object residue survives in the output.
#[allow(clippy::too_many_arguments)]
fn rewrite_object(
    obj: &EmbeddedObject,
    doc: &RootPath,
    alink_map: &KeywordMap,
    klink_map: &KeywordMap,
    data: &mut TreeData,
    link_map: &LinkMap,
    pages: &mut ResolutionPages,
    out_root: &Path,
) -> Result<Option<Splice>, RenderError> {
    let replacement = if let Some(text) = obj.param("Text") {
        let resolution = resolve_object_link(obj, doc, obj.start_line, alink_map, klink_map, data, link_map, pages, out_root)?
            .unwrap_or_else(broken);
        Some(render_anchor(&resolution, text, None))
    } else if let Some(button) = obj.param("Button") {
        let label = button.split(',').next().unwrap_or(button).trim();
        if label.is_empty() {
            Some(String::new())
        } else {
            match resolve_object_link(obj, doc, obj.start_line, alink_map, klink_map, data, link_map, pages, out_root)? {
                Some(resolution) => Some(render_anchor(&resolution, label, Some("chmweb-button"))),
                None => Some(String::new()),
            }
        }
    } else {
        None
    };

    Ok(replacement.map(|text| Splice::new(obj.start_byte_offset, obj.total_byte_length, text)))
}

fn render_anchor(resolution: &Resolution, label: &str, extra_class: Option<&str>) -> String {
    let mut out = format!("<a href=\"{}\"", html_escape::encode_double_quoted_attribute(&resolution.rewritten));
    if let Some(target) = &resolution.target {
        out.push_str(&format!(" target=\"{target}\""));
    }
    let class = match (extra_class, resolution.class.as_deref()) {
        (Some(a), Some(b)) => Some(format!("{a} {b}")),
        (Some(a), None) => Some(a.to_string()),
        (None, Some(b)) => Some(b.to_string()),
        (None, None) => None,
    };
    if let Some(class) = class {
        out.push_str(&format!(" class=\"{class}\""));
    }
    out.push('>');
    out.push_str(&html_escape::encode_text(label));
    out.push_str("</a>");
    out
}

fn broken() -> Resolution {
    Resolution {
        rewritten: "#".to_string(),
        target: None,
        class: None,
    }
}

/// spec §4.9 "ALink object dereference", shared by the `JavaScript:ID.Click()`
/// object-mediated path and the `Text`/`Button`-param object rewrite — both
/// dispatch on the object's `Command` param and dereference `ITEM2` against
/// the matching keyword map. Returns `None` when `Command` names neither
/// ALink nor KLink, meaning this object isn't one of ours to rewrite.
#[allow(clippy::too_many_arguments)]
fn resolve_object_link(
    obj: &EmbeddedObject,
    doc: &RootPath,
    page_line: usize,
    alink_map: &KeywordMap,
    klink_map: &KeywordMap,
    data: &mut TreeData,
    link_map: &LinkMap,
    pages: &mut ResolutionPages,
    out_root: &Path,
) -> Result<Option<Resolution>, RenderError> {
    let command = obj.param("Command").unwrap_or_default().to_ascii_lowercase();
    let (kind, map) = if command.starts_with("klink") {
        (LinkKind::KLink, klink_map)
    } else if command.starts_with("alink") {
        (LinkKind::ALink, alink_map)
    } else {
        return Ok(None);
    };
    let key = obj.param("ITEM2").unwrap_or_default();
    let fallback = obj.param("DEFAULTTOPIC");
    let resolution = alink::dereference(kind, map, key, fallback, doc, page_line, data, link_map, pages, out_root)?;
    Ok(Some(resolution))
}

/// spec §9 open question: matches only the exact `javascript:ID.Click()`
/// form (case-insensitive on the scheme and the `.Click()` suffix); any
/// other `javascript:` URL is left to `resolve_reference`, which classifies
/// it as an external scheme and leaves it unchanged.
fn javascript_click_id(href: &str) -> Option<&str> {
    let rest = strip_prefix_ci(href, "javascript:")?;
    let id = strip_suffix_ci(rest, ".click()")?;
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() >= prefix.len() && s.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes()) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

fn strip_suffix_ci<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    if s.len() >= suffix.len() && s.as_bytes()[s.len() - suffix.len()..].eq_ignore_ascii_case(suffix.as_bytes()) {
        Some(&s[..s.len() - suffix.len()])
    } else {
        None
    }
}

/// Reconstructs a start tag's full markup, preserving the original
/// attribute order and capitalisation (spec §9 "Ordered, case-insensitive
/// attribute lookups"). `overrides` replaces a named attribute's value in
/// place; `add_if_absent` appends attributes only the original tag lacked;
/// `add_class` merges into an existing `class` attribute's token list or is
/// appended as a new attribute.
fn rebuild_start_tag(tag: &StartTag, overrides: &[(&str, String)], add_if_absent: &[(&str, String)], add_class: Option<&str>) -> String {
    let mut out = String::with_capacity(tag.end_byte_offset - tag.byte_offset + 16);
    out.push('<');
    out.push_str(&tag.name);

    let mut seen: HashSet<String> = HashSet::new();
    let mut has_class = false;
    for attr in &tag.attrs {
        seen.insert(attr.name.to_ascii_lowercase());
        out.push(' ');
        out.push_str(&attr.name);
        out.push_str("=\"");
        if let Some((_, value)) = overrides.iter().find(|(name, _)| attr.name.eq_ignore_ascii_case(name)) {
            out.push_str(&html_escape::encode_double_quoted_attribute(value));
        } else if attr.name.eq_ignore_ascii_case("class") {
            has_class = true;
            match add_class {
                Some(marker) if !attr.value.split_whitespace().any(|token| token == marker) => {
                    out.push_str(&html_escape::encode_double_quoted_attribute(&format!("{} {marker}", attr.value)));
                }
                _ => out.push_str(&html_escape::encode_double_quoted_attribute(&attr.value)),
            }
        } else {
            out.push_str(&html_escape::encode_double_quoted_attribute(&attr.value));
        }
        out.push('"');
    }

    for (name, value) in add_if_absent {
        if !seen.contains(&name.to_ascii_lowercase()) {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&html_escape::encode_double_quoted_attribute(value));
            out.push('"');
        }
    }
    if !has_class {
        if let Some(marker) = add_class {
            out.push_str(&format!(" class=\"{marker}\""));
        }
    }

    if tag.self_closing {
        out.push_str(" /");
    }
    out.push('>');
    out
}

/// Emits `index.html` as a wrapper for the first contents-tree leaf found
/// (spec's persisted output layout: "wrapper for the first discoverable
/// contents leaf"), or a bare redirect to `_toc/toc.html` when the tree has
/// no pages at all — supplemented behaviour, spec §4.8 leaves an empty
/// tree's homepage unspecified.
fn emit_index(data: &TreeData, link_map: &LinkMap, out_root: &Path) -> Result<(), RenderError> {
    let leaf = data.tree.walk().find_map(|idx| match data.tree.kind(idx) {
        NodeKind::Page { filename, .. } => data.tree.path(idx).map(|tree_path| (filename.clone(), tree_path)),
        _ => None,
    });

    match leaf {
        Some((filename, tree_path)) => {
            let canonical = link_map.get(&filename).cloned().unwrap_or(filename);
            let content_path = canonical.with_infix_before_extension(".content");
            wrapper::emit_wrapper_for(
                &RootPath::new("index.html".to_string()),
                &content_path,
                Some(&tree_path),
                out_root,
            )
        }
        None => wrapper::emit_redirect(
            &RootPath::new("index.html".to_string()),
            &toc_pages::toc_page_path(&[]),
            out_root,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chmweb_toc::{ArchiveRegistry, ContentsTree};
    use chmweb_types::{Attr, HTML_HELP_CLSID};

    fn empty_data() -> TreeData {
        TreeData::new(ArchiveRegistry::new(), ContentsTree::new(), KeywordMap::default(), KeywordMap::default())
    }

    #[test]
    fn concrete_scenario_one_case_normalisation_preserves_siblings() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("html")).unwrap();
        std::fs::write(dir.path().join("html/fig6-2.gif"), b"x").unwrap();
        let source = r#"<IMG SRC="/HTML/Fig6-2.gif" WIDTH="10">"#;
        std::fs::write(dir.path().join("html/chpt06-02.htm"), source).unwrap();

        let path = RootPath::new("html/chpt06-02.htm".to_string());
        let mut data = empty_data();
        data.pages.insert(path.clone(), PageRecord::new("stem".into(), path.clone()));

        // Mirrors what discovery would have recorded: the asset path exactly
        // as the href spelled it, before any case resolution against disk.
        let scanned = chmweb_scan::scan_page(source);
        match chmweb_scan::classify(&scanned.asset_links[0].href, &path, "", &data.registry) {
            chmweb_scan::RefKind::Plain { root, .. } => {
                data.assets.insert(root);
            }
            other => panic!("expected Plain, got {other:?}"),
        }

        let cache = chmweb_fs::FsCache::new(dir.path());
        let mut link_map = LinkMap::build(&cache, &data);
        // `LinkMap::build` only resolves assets/pages it knows about; the
        // page itself also needs an identity entry for its own rewrite.
        let mut entries: Vec<(RootPath, RootPath)> = data.assets.iter().filter_map(|a| link_map.get(a).map(|c| (a.clone(), c.clone()))).collect();
        entries.push((path.clone(), path.clone()));
        link_map = LinkMap::from_entries(entries);

        render_pages(&mut data, &link_map, dir.path()).unwrap();

        let content = std::fs::read_to_string(dir.path().join("html/chpt06-02.content.htm")).unwrap();
        assert!(content.contains(r#"SRC="fig6-2.gif""#), "content was: {content}");
        assert!(content.contains(r#"WIDTH="10""#));
    }

    #[test]
    fn javascript_click_dispatches_to_alink_object() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("html")).unwrap();
        std::fs::write(dir.path().join("html/target.htm"), b"target").unwrap();
        let html = format!(
            r#"<a href="javascript:Ctl.Click()">Go</a>
               <object id="Ctl" type="application/x-oleobject" classid="{clsid}">
                 <param name="Command" value="ALink">
                 <param name="ITEM2" value="thekey">
               </object>"#,
            clsid = HTML_HELP_CLSID
        );
        std::fs::write(dir.path().join("html/p.htm"), &html).unwrap();

        let path = RootPath::new("html/p.htm".to_string());
        let mut data = empty_data();
        data.alink.insert(
            "thekey".to_string(),
            chmweb_types::Topic::Local {
                display_name: Some("Target".into()),
                path: RootPath::new("html/target.htm".to_string()),
            },
        );
        let record = chmweb_scan::scan_page(&html);
        let mut page_record = PageRecord::new("stem".into(), path.clone());
        page_record.objects = record.objects;
        data.pages.insert(path.clone(), page_record);

        let link_map = LinkMap::from_entries(vec![
            (path.clone(), path.clone()),
            (RootPath::new("html/target.htm".to_string()), RootPath::new("html/target.htm".to_string())),
        ]);

        render_pages(&mut data, &link_map, dir.path()).unwrap();

        let content = std::fs::read_to_string(dir.path().join("html/p.content.htm")).unwrap();
        assert!(content.contains(r#"href="target.htm""#), "content was: {content}");
    }

    #[test]
    fn rebuild_preserves_order_and_case_while_replacing_one_attribute() {
        let tag = StartTag {
            name: "IMG".to_string(),
            attrs: vec![Attr::new("SRC", "/HTML/Fig.gif"), Attr::new("Width", "10")],
            self_closing: false,
            byte_offset: 0,
            end_byte_offset: 30,
            line: 1,
        };
        let out = rebuild_start_tag(&tag, &[("SRC", "fig.gif".to_string())], &[], None);
        assert_eq!(out, r#"<IMG SRC="fig.gif" Width="10">"#);
    }

    #[test]
    fn rebuild_adds_target_only_when_absent() {
        let tag = StartTag {
            name: "a".to_string(),
            attrs: vec![Attr::new("href", "x.htm")],
            self_closing: false,
            byte_offset: 0,
            end_byte_offset: 20,
            line: 1,
        };
        let out = rebuild_start_tag(&tag, &[("href", "y.htm".to_string())], &[("target", "_top".to_string())], None);
        assert_eq!(out, r#"<a href="y.htm" target="_top">"#);
    }
}
