//! Page Scanner, spec §4.7 (C7): extracts title, page/asset links, and
//! embedded-object records (with byte spans) from one HTML page. Runs inside
//! a worker — pure function of the page bytes, no filesystem or archive
//! state consulted.

use serde::{Deserialize, Serialize};

use chmweb_sgml::{scan_all, Event};
use chmweb_types::{Attr, AssetLink, EmbeddedObject, PageLink};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScannedPage {
    pub title: Option<String>,
    pub asset_links: Vec<AssetLink>,
    pub page_links: Vec<PageLink>,
    pub objects: Vec<EmbeddedObject>,
}

struct OpenObject {
    attributes: Vec<Attr>,
    parameters: Vec<Attr>,
    start_byte_offset: usize,
    start_line: usize,
}

/// Extracts a `ScannedPage` from raw HTML, per spec §4.7's element-keyed
/// extraction rules. Case-folds element and attribute names only; values are
/// preserved verbatim.
pub fn scan_page(html: &str) -> ScannedPage {
    let mut page = ScannedPage::default();
    let mut in_title = false;
    let mut title_buf = String::new();
    let mut object_stack: Vec<OpenObject> = Vec::new();

    for event in scan_all(html) {
        match event {
            Event::StartTag(tag) => {
                let name = tag.name.to_ascii_lowercase();
                match name.as_str() {
                    "title" => {
                        in_title = true;
                        title_buf.clear();
                    }
                    "a" => {
                        if let Some(href) = tag.attr("href") {
                            if !href.starts_with('#') {
                                page.page_links.push(PageLink {
                                    byte_offset: tag.byte_offset,
                                    line: tag.line as usize,
                                    href: href.to_string(),
                                });
                            }
                        }
                    }
                    "img" | "link" => {
                        let attr = if name == "img" { "src" } else { "href" };
                        if let Some(href) = tag.attr(attr) {
                            page.asset_links.push(AssetLink {
                                byte_offset: tag.byte_offset,
                                line: tag.line as usize,
                                href: href.to_string(),
                            });
                        }
                    }
                    "script" => {
                        if let Some(src) = tag.attr("src") {
                            page.asset_links.push(AssetLink {
                                byte_offset: tag.byte_offset,
                                line: tag.line as usize,
                                href: src.to_string(),
                            });
                        }
                    }
                    "object" => {
                        object_stack.push(OpenObject {
                            attributes: tag.attrs.clone(),
                            parameters: Vec::new(),
                            start_byte_offset: tag.byte_offset,
                            start_line: tag.line as usize,
                        });
                    }
                    "param" => {
                        if let Some(current) = object_stack.last_mut() {
                            let pname = tag.attr("name").unwrap_or_default().to_string();
                            let pvalue = tag.attr("value").unwrap_or_default().to_string();
                            current.parameters.push(Attr::new(pname, pvalue));
                        }
                    }
                    _ => {}
                }
            }
            Event::EndTag(tag) => {
                let name = tag.name.to_ascii_lowercase();
                match name.as_str() {
                    "title" => {
                        if in_title {
                            page.title = Some(std::mem::take(&mut title_buf));
                            in_title = false;
                        }
                    }
                    "object" => {
                        if let Some(open) = object_stack.pop() {
                            let total_byte_length = tag.end_byte_offset - open.start_byte_offset;
                            let object = EmbeddedObject {
                                attributes: open.attributes,
                                parameters: open.parameters,
                                start_byte_offset: open.start_byte_offset,
                                start_line: open.start_line,
                                total_byte_length,
                            };
                            if let Some(default_topic) = alink_default_topic(&object) {
                                page.page_links.push(PageLink {
                                    byte_offset: object.start_byte_offset,
                                    line: object.start_line,
                                    href: default_topic.to_string(),
                                });
                            }
                            page.objects.push(object);
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(text) => {
                if in_title {
                    title_buf.push_str(&text.text);
                }
            }
        }
    }

    page
}

/// spec §4.7: an HTML-Help-control object whose `Command` param begins
/// `ALink` contributes its `DEFAULTTOPIC` param as a discovery root.
fn alink_default_topic(object: &EmbeddedObject) -> Option<&str> {
    if !object.is_html_help_control() {
        return None;
    }
    let is_alink_command = object
        .param("Command")
        .is_some_and(|c| c.to_ascii_lowercase().starts_with("alink"));
    if !is_alink_command {
        return None;
    }
    object.param("DEFAULTTOPIC")
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use chmweb_types::HTML_HELP_CLSID;

    #[test]
    fn extracts_title_and_links() {
        let html = indoc! {r#"
            <title>Chapter 6</title>
            <img src="/HTML/Fig6-2.gif">
            <a href="next.htm">next</a>
            <a href="#section">skip me</a>
        "#};
        let page = scan_page(html);
        assert_eq!(page.title.as_deref(), Some("Chapter 6"));
        assert_eq!(page.asset_links.len(), 1);
        assert_eq!(page.asset_links[0].href, "/HTML/Fig6-2.gif");
        assert_eq!(page.page_links.len(), 1);
        assert_eq!(page.page_links[0].href, "next.htm");
    }

    #[test]
    fn object_span_covers_start_to_end_tag() {
        let html = r#"<p>x</p><object type="x"><param name="a" value="b"></object>"#;
        let page = scan_page(html);
        assert_eq!(page.objects.len(), 1);
        let obj = &page.objects[0];
        assert_eq!(obj.param("a"), Some("b"));
        assert_eq!(&html[obj.start_byte_offset..obj.start_byte_offset + obj.total_byte_length],
            r#"<object type="x"><param name="a" value="b"></object>"#);
    }

    #[test]
    fn alink_control_default_topic_becomes_page_link() {
        let html = format!(
            r#"<object type="application/x-oleobject" classid="{clsid}">
                 <param name="Command" value="ALink">
                 <param name="DEFAULTTOPIC" value="html/fallback.htm">
               </object>"#,
            clsid = HTML_HELP_CLSID
        );
        let page = scan_page(&html);
        assert_eq!(page.objects.len(), 1);
        assert_eq!(page.page_links.len(), 1);
        assert_eq!(page.page_links[0].href, "html/fallback.htm");
    }

    #[test]
    fn script_body_never_contributes_links_or_objects() {
        let html = r#"<script>var a = '<a href="nope.htm">';</script>"#;
        let page = scan_page(html);
        assert!(page.page_links.is_empty());
        assert!(page.objects.is_empty());
    }
}
