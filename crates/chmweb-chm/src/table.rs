//! The Topic Table, spec §3 "Topic Table": addressable by contiguous index
//! in single-archive mode, or by an archive-ordinal/slot split index in
//! multi-archive (chw) mode. Both modes are stored in one flat map keyed by
//! `TopicIndex::flatten()` so callers never need to branch on which mode
//! they're in once the table is built.

use std::collections::BTreeMap;

use chmweb_types::{Topic, TopicIndex};

#[derive(Debug, Default)]
pub struct TopicTable {
    topics: BTreeMap<u32, Topic>,
}

impl TopicTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the decoded `#TOPICS` slots of a single archive at flat
    /// indices `0..len` (single-archive mode) or at the window reserved for
    /// `archive_ord` (multi-archive mode, `archive_ord >= 1`).
    pub fn insert_archive(&mut self, archive_ord: u32, topics: Vec<Topic>) {
        for (slot, topic) in topics.into_iter().enumerate() {
            let flat = if archive_ord == 0 {
                TopicIndex::Simple(slot as u32).flatten()
            } else {
                TopicIndex::Split {
                    archive_ord,
                    slot: slot as u32,
                }
                .flatten()
            };
            self.topics.insert(flat, topic);
        }
    }

    pub fn get(&self, index: TopicIndex) -> Option<&Topic> {
        self.topics.get(&index.flatten())
    }

    /// Looks up by an already-flattened index, as stored directly inside
    /// B-tree entries (spec §4.5 "the aggregate B-trees ... reference
    /// topics via the split index" — the on-disk value *is* the flat form).
    pub fn get_flat(&self, flat: u32) -> Option<&Topic> {
        self.topics.get(&flat)
    }

    /// Iteration in on-disk order: flat index order, which for a
    /// single-archive table is exactly `#TOPICS` slot order.
    pub fn all_topics(&self) -> impl Iterator<Item = &Topic> {
        self.topics.values()
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chmweb_types::RootPath;

    fn local(name: &str) -> Topic {
        Topic::Local {
            display_name: Some(name.to_string()),
            path: RootPath::new(format!("{name}.htm")),
        }
    }

    #[test]
    fn single_archive_uses_simple_flattening() {
        let mut table = TopicTable::new();
        table.insert_archive(0, vec![local("a"), local("b")]);
        assert_eq!(table.get(TopicIndex::Simple(1)), Some(&local("b")));
        assert_eq!(table.get_flat(1), Some(&local("b")));
    }

    #[test]
    fn multi_archive_windows_dont_collide() {
        let mut table = TopicTable::new();
        table.insert_archive(1, vec![local("a0")]);
        table.insert_archive(2, vec![local("b0")]);
        assert_eq!(
            table.get(TopicIndex::Split {
                archive_ord: 1,
                slot: 0
            }),
            Some(&local("a0"))
        );
        assert_eq!(
            table.get(TopicIndex::Split {
                archive_ord: 2,
                slot: 0
            }),
            Some(&local("b0"))
        );
        assert_eq!(table.len(), 2);
    }
}
