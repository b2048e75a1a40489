//! Topic table types, per spec §3 "Topic" / "Topic Table" / "Keyword Map".

use std::collections::HashMap;

use crate::path::RootPath;

/// Width of the per-archive slot window in multi-archive (`.chw`) topic
/// addressing, per spec §4.5 "Multi-archive (chw) layout".
pub const CHW_WINDOW: u32 = 1_048_576;

#[derive(Debug, Clone, PartialEq)]
pub enum Topic {
    Local {
        display_name: Option<String>,
        path: RootPath,
    },
    External {
        display_name: Option<String>,
        url: String,
        frame: Option<String>,
    },
    SeeAlso {
        target: String,
    },
}

impl Topic {
    pub fn display_name(&self) -> Option<&str> {
        match self {
            Topic::Local { display_name, .. } | Topic::External { display_name, .. } => {
                display_name.as_deref()
            }
            Topic::SeeAlso { .. } => None,
        }
    }
}

/// An index into the Topic Table: a contiguous slot in single-archive mode,
/// or an archive-ordinal/slot split in multi-archive (`.chw`) mode — spec
/// §3 "Topic Table".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicIndex {
    Simple(u32),
    Split { archive_ord: u32, slot: u32 },
}

impl TopicIndex {
    /// Flatten to a single `u32` usable as a dense array index, consistent
    /// with the windowing scheme described in spec §4.5: archive ordinal
    /// `n` (1-based) occupies `[n * CHW_WINDOW, (n+1) * CHW_WINDOW)`.
    pub fn flatten(self) -> u32 {
        match self {
            TopicIndex::Simple(i) => i,
            TopicIndex::Split { archive_ord, slot } => archive_ord * CHW_WINDOW + slot,
        }
    }
}

/// Associative (A-link) or keyword (K-link) map: display name -> ordered
/// list of Topics, per spec §3 "Keyword Map".
#[derive(Debug, Clone, Default)]
pub struct KeywordMap {
    entries: HashMap<String, Vec<Topic>>,
}

impl KeywordMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: String, topic: Topic) {
        self.entries.entry(name).or_default().push(topic);
    }

    pub fn lookup(&self, name: &str) -> &[Topic] {
        self.entries.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Every topic across every keyword, in arbitrary order — the tree
    /// scanner's discovery seed (spec §4.8 step 1) walks all of them, not
    /// just one keyword's.
    pub fn values(&self) -> impl Iterator<Item = &Topic> {
        self.entries.values().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_index_flattens_into_window() {
        let idx = TopicIndex::Split {
            archive_ord: 2,
            slot: 5,
        };
        assert_eq!(idx.flatten(), 2 * CHW_WINDOW + 5);
    }

    #[test]
    fn keyword_map_accumulates_multiple_topics() {
        let mut map = KeywordMap::new();
        map.insert(
            "Foo".into(),
            Topic::Local {
                display_name: Some("Foo".into()),
                path: RootPath::new("a.htm"),
            },
        );
        map.insert(
            "Foo".into(),
            Topic::Local {
                display_name: Some("Foo".into()),
                path: RootPath::new("b.htm"),
            },
        );
        assert_eq!(map.lookup("Foo").len(), 2);
        assert!(map.lookup("Bar").is_empty());
    }
}
