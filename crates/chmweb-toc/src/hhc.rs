//! HHC (HTML Help contents) parsing, spec §4.6: nested `<ul>/<li>/<param>`
//! events build a typed tree of folders and pages. `<param>`s are read
//! case-insensitively; an `<object>` wrapping them (the real-world
//! `<OBJECT type="text/sitemap">` idiom) is transparent — it pushes no frame
//! of its own, so its `<param>` children still attach to the innermost open
//! `<li>`.
//!
//! Malformed sources that close a parent `<li>` before opening its child
//! `<ul>` make the SGML parser manufacture a wrapper node with no fields of
//! its own; per spec §4.6 / §9 such a wrapper is flattened into its previous
//! sibling, or, if there is no previous sibling, kept as an empty folder
//! (spec §9 "Open questions" — this matches observed source behaviour and is
//! pinned by a test here).

use chmweb_sgml::{scan_all, Event};
use chmweb_types::RootPath;

use crate::tree::{DetachedNode, NodeKind};

#[derive(Default)]
struct WipItem {
    name: Option<String>,
    local: Option<String>,
    children: Vec<DetachedNode>,
}

enum Frame {
    List(Vec<DetachedNode>),
    Item(WipItem),
}

/// Parses one HHC document into the top-level list of nodes it describes.
/// The returned nodes are detached; the caller grafts them into the real
/// contents tree via `ContentsTree::graft_subtree` and attaches them with
/// `ContentsTree::replace`.
pub fn parse_hhc(src: &str) -> Vec<DetachedNode> {
    let mut stack: Vec<Frame> = vec![Frame::List(Vec::new())];

    for event in scan_all(src) {
        match event {
            Event::StartTag(tag) => {
                let name = tag.name.to_ascii_lowercase();
                match name.as_str() {
                    "ul" => stack.push(Frame::List(Vec::new())),
                    "li" => stack.push(Frame::Item(WipItem::default())),
                    "param" => {
                        if let Some(Frame::Item(item)) = stack.last_mut() {
                            let pname = tag.attr("name").unwrap_or_default();
                            let pvalue = tag.attr("value").unwrap_or_default().to_string();
                            if pname.eq_ignore_ascii_case("name") {
                                item.name = Some(pvalue);
                            } else if pname.eq_ignore_ascii_case("local") {
                                item.local = Some(pvalue);
                            }
                        }
                    }
                    _ => {}
                }
            }
            Event::EndTag(tag) => {
                let name = tag.name.to_ascii_lowercase();
                match name.as_str() {
                    "li" => {
                        if matches!(stack.last(), Some(Frame::Item(_))) {
                            let Some(Frame::Item(item)) = stack.pop() else {
                                unreachable!()
                            };
                            let node = item_to_node(item);
                            if let Some(Frame::List(list)) = stack.last_mut() {
                                list.push(node);
                            }
                        }
                    }
                    "ul" => {
                        if matches!(stack.last(), Some(Frame::List(_))) {
                            let Some(Frame::List(children)) = stack.pop() else {
                                unreachable!()
                            };
                            if stack.len() == 1 {
                                // Only the document-root sentinel list remains:
                                // this was a top-level `<ul>`, not a dangling
                                // sibling of some enclosing `<li>` — its
                                // children become top-level entries directly.
                                if let Some(Frame::List(root)) = stack.last_mut() {
                                    root.extend(children);
                                }
                            } else {
                                attach_ul_children(&mut stack, children);
                            }
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(_) => {}
        }
    }

    match stack.into_iter().next() {
        Some(Frame::List(children)) => children,
        _ => Vec::new(),
    }
}

fn attach_ul_children(stack: &mut [Frame], children: Vec<DetachedNode>) {
    match stack.last_mut() {
        Some(Frame::Item(item)) => item.children.extend(children),
        Some(Frame::List(list)) => match list.last_mut() {
            Some(previous_sibling) => previous_sibling.children.extend(children),
            None => list.push(DetachedNode {
                kind: NodeKind::Folder {
                    title: String::new(),
                },
                children,
            }),
        },
        None => {}
    }
}

fn item_to_node(item: WipItem) -> DetachedNode {
    let kind = match item.local {
        Some(local) => {
            let (path, anchor) = match local.split_once('#') {
                Some((p, a)) => (p.to_string(), Some(a.to_string())),
                None => (local, None),
            };
            NodeKind::Page {
                title: item.name,
                filename: RootPath::new(path),
                anchor,
            }
        }
        None => NodeKind::Folder {
            title: item.name.unwrap_or_default(),
        },
    };
    DetachedNode {
        kind,
        children: item.children,
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn parses_nested_folders_and_pages() {
        let hhc = indoc! {r#"
            <ul>
              <li><object type="text/sitemap">
                    <param name="Name" value="Chapter 1">
                  </object>
                <ul>
                  <li><object type="text/sitemap">
                        <param name="Name" value="Intro">
                        <param name="Local" value="html/intro.htm">
                      </object>
                  </li>
                </ul>
              </li>
            </ul>
        "#};
        let nodes = parse_hhc(hhc);
        assert_eq!(nodes.len(), 1);
        let NodeKind::Folder { title } = &nodes[0].kind else {
            panic!("expected folder")
        };
        assert_eq!(title, "Chapter 1");
        assert_eq!(nodes[0].children.len(), 1);
        let NodeKind::Page { title, filename, .. } = &nodes[0].children[0].kind else {
            panic!("expected page")
        };
        assert_eq!(title.as_deref(), Some("Intro"));
        assert_eq!(filename.as_str(), "html/intro.htm");
    }

    #[test]
    fn splits_anchor_from_local() {
        let hhc = r#"<ul><li><param name="Name" value="X"><param name="Local" value="a.htm#frag"></li></ul>"#;
        let nodes = parse_hhc(hhc);
        let NodeKind::Page { anchor, filename, .. } = &nodes[0].kind else {
            panic!("expected page")
        };
        assert_eq!(anchor.as_deref(), Some("frag"));
        assert_eq!(filename.as_str(), "a.htm");
    }

    #[test]
    fn dangling_ul_flattens_into_previous_sibling() {
        // <li> for "A" closes, then a <ul> opens at the same level without
        // an intervening <li> — the synthetic wrapper's children fold into A.
        let hhc = indoc! {r#"
            <ul>
              <li><param name="Name" value="A"></li>
              <ul>
                <li><param name="Name" value="A-child"></li>
              </ul>
            </ul>
        "#};
        let nodes = parse_hhc(hhc);
        assert_eq!(nodes.len(), 1);
        let NodeKind::Folder { title } = &nodes[0].kind else {
            panic!("expected folder")
        };
        assert_eq!(title, "A");
        assert_eq!(nodes[0].children.len(), 1);
    }

    #[test]
    fn dangling_ul_with_no_previous_sibling_is_kept_empty() {
        let hhc = indoc! {r#"
            <ul>
              <ul>
                <li><param name="Name" value="Orphan"></li>
              </ul>
            </ul>
        "#};
        let nodes = parse_hhc(hhc);
        assert_eq!(nodes.len(), 1);
        let NodeKind::Folder { title } = &nodes[0].kind else {
            panic!("expected synthetic empty folder")
        };
        assert!(title.is_empty());
        assert_eq!(nodes[0].children.len(), 1);
    }
}
