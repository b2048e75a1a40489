//! AK-Link Table, spec §4.5 (C5): ties together the `#TOPICS` decoder, the
//! `$HHTitleMap` archive list, and the associative/keyword B-trees into the
//! queryable surface the tree scanner (C8) and rewriter (C9) consume.

use chmweb_types::{KeywordMap, Topic, TopicIndex};

use crate::btree::{decode_btree, BTreeEntry};
use crate::error::ChmError;
use crate::table::TopicTable;
use crate::topics::{decode_topics, TopicTableSource};

#[derive(Debug, Default)]
pub struct AkLinkTable {
    topics: TopicTable,
    alink: KeywordMap,
    klink: KeywordMap,
}

impl AkLinkTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-archive mode: `archive_ord` of 0 addresses topics with
    /// `TopicIndex::Simple`.
    pub fn add_archive_topics(
        &mut self,
        archive_ord: u32,
        source: &TopicTableSource<'_>,
        subdir: &str,
    ) -> Result<(), ChmError> {
        let topics = decode_topics(source, subdir)?;
        self.topics.insert_archive(archive_ord, topics);
        Ok(())
    }

    /// Decodes one B-tree and merges its entries into `alink` or `klink`,
    /// resolving each entry's topic indices against the already-loaded
    /// topic table (spec §4.5: "Topic indices are resolved via `topic()`").
    pub fn merge_btree(&mut self, data: &[u8], map: BTreeKind) -> Result<(), ChmError> {
        let entries = decode_btree(data)?;
        for entry in entries {
            self.merge_entry(entry, map);
        }
        Ok(())
    }

    fn merge_entry(&mut self, entry: BTreeEntry, map: BTreeKind) {
        let target = match map {
            BTreeKind::ALink => &mut self.alink,
            BTreeKind::KLink => &mut self.klink,
        };
        if let Some(see_also_target) = entry.see_also {
            target.insert(
                entry.full_keyword,
                Topic::SeeAlso {
                    target: see_also_target,
                },
            );
            return;
        }
        for flat in entry.topics {
            if let Some(topic) = self.topics.get_flat(flat) {
                target.insert(entry.full_keyword.clone(), topic.clone());
            }
        }
    }

    pub fn all_topics(&self) -> impl Iterator<Item = &Topic> {
        self.topics.all_topics()
    }

    pub fn topic(&self, index: TopicIndex) -> Option<&Topic> {
        self.topics.get(index)
    }

    pub fn alink(&self, name: &str) -> &[Topic] {
        self.alink.lookup(name)
    }

    pub fn klink(&self, name: &str) -> &[Topic] {
        self.klink.lookup(name)
    }

    pub fn alink_keys(&self) -> impl Iterator<Item = &str> {
        self.alink.keys()
    }

    pub fn klink_keys(&self) -> impl Iterator<Item = &str> {
        self.klink.keys()
    }

    /// The whole A-link keyword map, for callers (the tree scanner) that
    /// need to seed a discovery pass from every local topic rather than
    /// look one keyword up at a time.
    pub fn alink_map(&self) -> &KeywordMap {
        &self.alink
    }

    pub fn klink_map(&self) -> &KeywordMap {
        &self.klink
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BTreeKind {
    ALink,
    KLink,
}
