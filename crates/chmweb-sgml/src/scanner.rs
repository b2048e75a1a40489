//! A tolerant, byte-offset-tracking HTML/SGML tokenizer.
//!
//! CHM help pages are written against the loose, DTD-free SGML profile
//! Internet Explorer 4/5 accepted: unquoted attributes, unclosed `<p>`/`<li>`
//! tags, and the odd stray `<`. Full conformance is not the goal here —
//! byte-accurate event offsets are, since the link rewriter (spec §4.9)
//! splices replacement text directly into the original bytes and a single
//! off-by-one corrupts the page. A hand-rolled scanner over the raw byte
//! offsets gives that guarantee directly, the same way the binary table
//! decoders in `chmweb-chm` work from explicit byte slices rather than a
//! higher-level abstraction that would hide the offsets.
//!
//! There is no DTD, so internal/external subset defaulting never applies;
//! `<!...>` and `<?...>` markup declarations are skipped as opaque spans.

use std::collections::VecDeque;

use chmweb_types::Attr;

use crate::entities::decode;
use crate::event::{EndTag, Event, StartTag, Text};

const RAW_TEXT_ELEMENTS: [&str; 2] = ["script", "style"];

pub struct Scanner<'a> {
    src: &'a str,
    pos: usize,
    line: u32,
    pending: VecDeque<Event>,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            pending: VecDeque::new(),
        }
    }

    pub fn next_event(&mut self) -> Option<Event> {
        if let Some(ev) = self.pending.pop_front() {
            return Some(ev);
        }
        loop {
            if self.pos >= self.src.len() {
                return None;
            }
            let rest = &self.src[self.pos..];
            if rest.starts_with("<!--") {
                let skip = rest.find("-->").map(|i| i + 3).unwrap_or(rest.len());
                self.consume(skip);
                continue;
            }
            if rest.starts_with("<!") || rest.starts_with("<?") {
                let skip = rest.find('>').map(|i| i + 1).unwrap_or(rest.len());
                self.consume(skip);
                continue;
            }
            if rest.starts_with("</") {
                return self.scan_end_tag();
            }
            if rest.starts_with('<') && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
                return self.scan_start_tag();
            }
            return self.scan_text();
        }
    }

    fn consume(&mut self, n: usize) -> &'a str {
        let n = n.min(self.src.len() - self.pos);
        let s = &self.src[self.pos..self.pos + n];
        self.pos += n;
        self.line += s.matches('\n').count() as u32;
        s
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.src[self.pos..];
        let n = rest.find(|c: char| !c.is_whitespace()).unwrap_or(rest.len());
        self.consume(n);
    }

    fn consume_name(&mut self) -> String {
        let rest = &self.src[self.pos..];
        let n = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | ':' | '_' | '.')))
            .unwrap_or(rest.len());
        self.consume(n).to_string()
    }

    fn scan_text(&mut self) -> Option<Event> {
        let start = self.pos;
        let line = self.line;
        let rest = &self.src[self.pos..];
        let n = rest.find('<').unwrap_or(rest.len());
        let raw = self.consume(n);
        if raw.is_empty() {
            return None;
        }
        Some(Event::Text(Text {
            text: decode(raw),
            byte_offset: start,
            end_byte_offset: self.pos,
            line,
        }))
    }

    fn scan_end_tag(&mut self) -> Option<Event> {
        let start = self.pos;
        let line = self.line;
        self.consume(2);
        let name = self.consume_name();
        self.skip_whitespace();
        let rest = &self.src[self.pos..];
        let skip = rest.find('>').map(|i| i + 1).unwrap_or(rest.len());
        self.consume(skip);
        Some(Event::EndTag(EndTag {
            name,
            byte_offset: start,
            end_byte_offset: self.pos,
            line,
        }))
    }

    fn scan_start_tag(&mut self) -> Option<Event> {
        let start = self.pos;
        let line = self.line;
        self.consume(1);
        let name = self.consume_name();
        let mut attrs = Vec::new();

        let (self_closing, tag_end) = loop {
            self.skip_whitespace();
            if self.src[self.pos..].starts_with("/>") {
                self.consume(2);
                break (true, self.pos);
            }
            if self.src[self.pos..].starts_with('>') {
                self.consume(1);
                break (false, self.pos);
            }
            if self.pos >= self.src.len() {
                break (false, self.pos);
            }
            match self.scan_attr() {
                Some(attr) => attrs.push(attr),
                None => {
                    self.consume(1);
                }
            }
        };

        let tag = StartTag {
            name: name.clone(),
            attrs,
            self_closing,
            byte_offset: start,
            end_byte_offset: tag_end,
            line,
        };

        if !self_closing && RAW_TEXT_ELEMENTS.iter().any(|e| name.eq_ignore_ascii_case(e)) {
            self.consume_raw_text_body(&name);
        }

        Some(Event::StartTag(tag))
    }

    fn scan_attr(&mut self) -> Option<Attr> {
        let name = self.consume_name();
        if name.is_empty() {
            return None;
        }
        self.skip_whitespace();
        if self.src[self.pos..].starts_with('=') {
            self.consume(1);
            self.skip_whitespace();
            let value = self.scan_attr_value();
            Some(Attr::new(name, decode(&value)))
        } else {
            Some(Attr::new(name, String::new()))
        }
    }

    fn scan_attr_value(&mut self) -> String {
        let rest = &self.src[self.pos..];
        match rest.chars().next() {
            Some(q @ ('"' | '\'')) => {
                self.consume(1);
                let rest = &self.src[self.pos..];
                let n = rest.find(q).unwrap_or(rest.len());
                let value = self.consume(n).to_string();
                if self.src[self.pos..].starts_with(q) {
                    self.consume(1);
                }
                value
            }
            _ => {
                let n = rest
                    .find(|c: char| c.is_whitespace() || c == '>')
                    .unwrap_or(rest.len());
                self.consume(n).to_string()
            }
        }
    }

    /// Consumes everything up to (and including) the matching `</name>` as
    /// one opaque `Text` event followed by the `EndTag` event, both queued
    /// for the next two calls to `next_event` — per-tag content of
    /// `<script>`/`<style>` is never interpreted as markup.
    fn consume_raw_text_body(&mut self, name: &str) {
        let content_start = self.pos;
        let content_line = self.line;
        let marker = format!("</{}", name.to_ascii_lowercase());
        let rest = &self.src[self.pos..];
        let content_len = find_case_insensitive(rest, &marker).unwrap_or(rest.len());
        let content = self.consume(content_len).to_string();
        if !content.is_empty() {
            self.pending.push_back(Event::Text(Text {
                text: content,
                byte_offset: content_start,
                end_byte_offset: self.pos,
                line: content_line,
            }));
        }
        if self.src[self.pos..].starts_with("</") {
            if let Some(end_event) = self.scan_end_tag() {
                self.pending.push_back(end_event);
            }
        }
    }
}

fn find_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let pat = needle.as_bytes();
    if pat.is_empty() || pat.len() > hay.len() {
        return None;
    }
    (0..=hay.len() - pat.len()).find(|&start| {
        pat.iter()
            .enumerate()
            .all(|(i, b)| hay[start + i].to_ascii_lowercase() == *b)
    })
}

pub fn scan_all(src: &str) -> Vec<Event> {
    let mut scanner = Scanner::new(src);
    let mut events = Vec::new();
    while let Some(ev) = scanner.next_event() {
        events.push(ev);
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_simple_document() {
        let html = "<html><body><p>Hi</p></body></html>";
        let events = scan_all(html);
        let names: Vec<String> = events
            .iter()
            .map(|e| match e {
                Event::StartTag(t) => format!("+{}", t.name),
                Event::EndTag(t) => format!("-{}", t.name),
                Event::Text(t) => format!("#{}", t.text),
            })
            .collect();
        assert_eq!(names, vec!["+html", "+body", "+p", "#Hi", "-p", "-body", "-html"]);
    }

    #[test]
    fn captures_byte_offsets_and_lines() {
        let html = "<a\nhref=\"x.htm\">link</a>";
        let events = scan_all(html);
        let Event::StartTag(a) = &events[0] else { panic!("expected start tag") };
        assert_eq!(a.byte_offset, 0);
        assert_eq!(a.line, 1);
        assert_eq!(a.attr("href"), Some("x.htm"));
        assert_eq!(&html[a.byte_offset..a.end_byte_offset], "<a\nhref=\"x.htm\">");

        let Event::Text(text) = &events[1] else { panic!("expected text") };
        assert_eq!(text.line, 2);
    }

    #[test]
    fn unquoted_and_boolean_attributes() {
        let html = "<input type=checkbox checked>";
        let events = scan_all(html);
        let Event::StartTag(tag) = &events[0] else { panic!() };
        assert_eq!(tag.attr("type"), Some("checkbox"));
        assert_eq!(tag.attr("checked"), Some(""));
    }

    #[test]
    fn self_closing_tag() {
        let html = "<img src=\"a.gif\"/>";
        let events = scan_all(html);
        let Event::StartTag(tag) = &events[0] else { panic!() };
        assert!(tag.self_closing);
        assert_eq!(tag.attr("src"), Some("a.gif"));
    }

    #[test]
    fn script_body_is_opaque() {
        let html = "<script>if (a < b) { x.Click(); }</script>after";
        let events = scan_all(html);
        assert_eq!(events.len(), 4);
        let Event::Text(body) = &events[1] else { panic!("expected script body") };
        assert_eq!(body.text, "if (a < b) { x.Click(); }");
        let Event::EndTag(end) = &events[2] else { panic!("expected end tag") };
        assert_eq!(end.name, "script");
    }

    #[test]
    fn comments_and_doctype_are_skipped() {
        let html = "<!DOCTYPE html><!-- note --><p>ok</p>";
        let events = scan_all(html);
        assert_eq!(events.len(), 3);
    }

    #[test]
    fn entity_decoding_in_text_and_attrs() {
        let html = "<a title=\"Tom &amp; Jerry\">A &lt; B</a>";
        let events = scan_all(html);
        let Event::StartTag(tag) = &events[0] else { panic!() };
        assert_eq!(tag.attr("title"), Some("Tom & Jerry"));
        let Event::Text(text) = &events[1] else { panic!() };
        assert_eq!(text.text, "A < B");
    }
}
