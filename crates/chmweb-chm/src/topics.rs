//! `#TOPICS` / `#STRINGS` / `#URLTBL` / `#URLSTR` decoding, spec §4.5 step 1-3.

use chmweb_types::{RootPath, Topic};

use crate::bytes::{cstring_utf8, u32_le};
use crate::error::ChmError;

const TOPICS_ENTRY_LEN: usize = 16;
const ABSENT_STRING_OFFSET: u32 = 0xFFFF_FFFF;

/// Raw bytes of the four side-tables for one archive, borrowed just long
/// enough to decode into an owned `Vec<Topic>`.
pub struct TopicTableSource<'a> {
    pub topics: &'a [u8],
    pub strings: &'a [u8],
    pub urltbl: &'a [u8],
    pub urlstr: &'a [u8],
}

/// Decodes every `#TOPICS` slot into a `Topic`, per spec §4.5 steps 1-3.
/// `subdir` is the archive's output subdirectory, prefixed onto local
/// filenames so they become root-relative.
pub fn decode_topics(source: &TopicTableSource<'_>, subdir: &str) -> Result<Vec<Topic>, ChmError> {
    if source.topics.len() % TOPICS_ENTRY_LEN != 0 {
        return Err(ChmError::Truncated {
            table: "#TOPICS",
            offset: source.topics.len(),
            needed: TOPICS_ENTRY_LEN,
            have: source.topics.len() % TOPICS_ENTRY_LEN,
        });
    }
    let count = source.topics.len() / TOPICS_ENTRY_LEN;
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        out.push(decode_one_topic(source, i as u32, subdir)?);
    }
    Ok(out)
}

fn decode_one_topic(source: &TopicTableSource<'_>, index: u32, subdir: &str) -> Result<Topic, ChmError> {
    let base = index as usize * TOPICS_ENTRY_LEN;
    let display_name_offset = u32_le(source.topics, "#TOPICS", base + 4)?;
    let urltbl_offset = u32_le(source.topics, "#TOPICS", base + 8)?;

    let display_name = if display_name_offset == ABSENT_STRING_OFFSET {
        None
    } else {
        Some(cstring_utf8(source.strings, "#STRINGS", display_name_offset as usize)?.0.to_string())
    };

    let slot_echo = u32_le(source.urltbl, "#URLTBL", urltbl_offset as usize + 4)?;
    if slot_echo != index {
        return Err(ChmError::Corrupt {
            table: "#URLTBL",
            index,
            reason: format!("echoed slot {slot_echo} does not match topic index {index}"),
        });
    }
    let urlstr_offset = u32_le(source.urltbl, "#URLTBL", urltbl_offset as usize + 8)?;

    let url_offset = u32_le(source.urlstr, "#URLSTR", urlstr_offset as usize)?;
    let frame_offset = u32_le(source.urlstr, "#URLSTR", urlstr_offset as usize + 4)?;

    if url_offset == 0 && frame_offset == 0 {
        let (filename, _) = cstring_utf8(source.urlstr, "#URLSTR", urlstr_offset as usize + 8)?;
        let path = if subdir.is_empty() {
            RootPath::new(filename.to_string())
        } else {
            RootPath::join(subdir, filename)
        };
        Ok(Topic::Local {
            display_name,
            path,
        })
    } else {
        let (url, _) = cstring_utf8(source.strings, "#STRINGS", url_offset as usize)?;
        let frame = if frame_offset == 0 {
            None
        } else {
            Some(cstring_utf8(source.strings, "#STRINGS", frame_offset as usize)?.0.to_string())
        };
        Ok(Topic::External {
            display_name,
            url: url.to_string(),
            frame,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_table(entries: &[(Option<&str>, LocalOrExternal)]) -> (Vec<u8>, Vec<u8>, Vec<u8>, Vec<u8>) {
        let mut topics = Vec::new();
        let mut strings = Vec::new();
        let mut urltbl = Vec::new();
        let mut urlstr = Vec::new();

        for (i, (name, target)) in entries.iter().enumerate() {
            let name_offset = match name {
                Some(n) => {
                    let off = strings.len() as u32;
                    strings.extend_from_slice(n.as_bytes());
                    strings.push(0);
                    off
                }
                None => ABSENT_STRING_OFFSET,
            };

            let urltbl_offset = urltbl.len() as u32;
            let urlstr_offset = urlstr.len() as u32;
            urltbl.extend_from_slice(&0u32.to_le_bytes());
            urltbl.extend_from_slice(&(i as u32).to_le_bytes());
            urltbl.extend_from_slice(&urlstr_offset.to_le_bytes());

            match target {
                LocalOrExternal::Local(filename) => {
                    urlstr.extend_from_slice(&0u32.to_le_bytes());
                    urlstr.extend_from_slice(&0u32.to_le_bytes());
                    urlstr.extend_from_slice(filename.as_bytes());
                    urlstr.push(0);
                }
                LocalOrExternal::External(url) => {
                    let url_off = strings.len() as u32;
                    strings.extend_from_slice(url.as_bytes());
                    strings.push(0);
                    urlstr.extend_from_slice(&url_off.to_le_bytes());
                    urlstr.extend_from_slice(&0u32.to_le_bytes());
                }
            }

            topics.extend_from_slice(&0u32.to_le_bytes());
            topics.extend_from_slice(&name_offset.to_le_bytes());
            topics.extend_from_slice(&urltbl_offset.to_le_bytes());
            topics.extend_from_slice(&0u32.to_le_bytes());
        }

        (topics, strings, urltbl, urlstr)
    }

    enum LocalOrExternal<'a> {
        Local(&'a str),
        External(&'a str),
    }

    #[test]
    fn decodes_local_and_external_topics() {
        let (topics, strings, urltbl, urlstr) = build_table(&[
            (Some("Intro"), LocalOrExternal::Local("intro.htm")),
            (None, LocalOrExternal::External("https://example.com")),
        ]);
        let source = TopicTableSource {
            topics: &topics,
            strings: &strings,
            urltbl: &urltbl,
            urlstr: &urlstr,
        };

        let decoded = decode_topics(&source, "html").unwrap();
        assert_eq!(decoded.len(), 2);
        match &decoded[0] {
            Topic::Local { display_name, path } => {
                assert_eq!(display_name.as_deref(), Some("Intro"));
                assert_eq!(path.as_str(), "html/intro.htm");
            }
            other => panic!("expected local topic, got {other:?}"),
        }
        match &decoded[1] {
            Topic::External { display_name, url, .. } => {
                assert_eq!(*display_name, None);
                assert_eq!(url, "https://example.com");
            }
            other => panic!("expected external topic, got {other:?}"),
        }
    }

    #[test]
    fn mismatched_slot_echo_is_corrupt() {
        let (topics, strings, mut urltbl, urlstr) =
            build_table(&[(Some("A"), LocalOrExternal::Local("a.htm"))]);
        urltbl[4..8].copy_from_slice(&99u32.to_le_bytes());
        let source = TopicTableSource {
            topics: &topics,
            strings: &strings,
            urltbl: &urltbl,
            urlstr: &urlstr,
        };
        assert!(decode_topics(&source, "").is_err());
    }
}
