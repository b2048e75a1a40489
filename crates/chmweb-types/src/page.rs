//! Page Record / Embedded Object, per spec §3.

use serde::{Deserialize, Serialize};

use crate::path::RootPath;

/// An HTML attribute, preserving source order and original capitalisation —
/// spec §9 "Ordered, case-insensitive attribute lookups".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attr {
    pub name: String,
    pub value: String,
}

impl Attr {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Linear, case-insensitive lookup over an ordered attribute list. Never
/// lower-cases the stored name: round-tripping the original markup matters
/// more than O(1) lookup for attribute lists that are a handful of items.
pub fn attr_value<'a>(attrs: &'a [Attr], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|a| a.name.eq_ignore_ascii_case(name))
        .map(|a| a.value.as_str())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedObject {
    pub attributes: Vec<Attr>,
    pub parameters: Vec<Attr>,
    pub start_byte_offset: usize,
    pub start_line: usize,
    pub total_byte_length: usize,
}

/// The HTML Help ActiveX control CLSID, per spec §3 "Embedded Object".
pub const HTML_HELP_CLSID: &str = "clsid:adb880a6-d8ff-11cf-9377-00aa003b7a11";

impl EmbeddedObject {
    pub fn attr(&self, name: &str) -> Option<&str> {
        attr_value(&self.attributes, name)
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        attr_value(&self.parameters, name)
    }

    /// Classified as an HTML-Help control iff `type=application/x-oleobject`
    /// and `classid` equals the known CLSID, case-insensitively — spec §3.
    pub fn is_html_help_control(&self) -> bool {
        let is_oleobject = self
            .attr("type")
            .is_some_and(|t| t.eq_ignore_ascii_case("application/x-oleobject"));
        let matches_clsid = self
            .attr("classid")
            .is_some_and(|c| c.eq_ignore_ascii_case(HTML_HELP_CLSID));
        is_oleobject && matches_clsid
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLink {
    pub byte_offset: usize,
    pub line: usize,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetLink {
    pub byte_offset: usize,
    pub line: usize,
    pub href: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    pub archive_stem: String,
    pub path: RootPath,
    /// Contents-tree path, stamped in by the tree scanner's finalisation
    /// pass (spec §4.8 step 4); absent until then, and absent forever for
    /// pages reachable only via links (never placed in the contents tree).
    pub contents_tree_path: Option<Vec<usize>>,
    pub title: Option<String>,
    pub asset_links: Vec<AssetLink>,
    pub page_links: Vec<PageLink>,
    pub objects: Vec<EmbeddedObject>,
}

impl PageRecord {
    pub fn new(archive_stem: String, path: RootPath) -> Self {
        Self {
            archive_stem,
            path,
            contents_tree_path: None,
            title: None,
            asset_links: Vec::new(),
            page_links: Vec::new(),
            objects: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_help_control_requires_both_type_and_clsid() {
        let obj = EmbeddedObject {
            attributes: vec![
                Attr::new("TYPE", "Application/X-OleObject"),
                Attr::new("CLASSID", HTML_HELP_CLSID.to_uppercase()),
            ],
            parameters: vec![],
            start_byte_offset: 0,
            start_line: 1,
            total_byte_length: 0,
        };
        assert!(obj.is_html_help_control());

        let not_ole = EmbeddedObject {
            attributes: vec![Attr::new("classid", HTML_HELP_CLSID)],
            ..obj.clone()
        };
        assert!(!not_ole.is_html_help_control());
    }

    #[test]
    fn attr_lookup_is_case_insensitive_and_order_preserving() {
        let attrs = vec![Attr::new("SRC", "a.gif"), Attr::new("Width", "10")];
        assert_eq!(attr_value(&attrs, "src"), Some("a.gif"));
        assert_eq!(attrs[0].name, "SRC");
    }
}
