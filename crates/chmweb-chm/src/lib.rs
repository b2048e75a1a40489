//! AK-Link Table decoder, spec §4.5 (C5): the binary topic table and the
//! associative/keyword B-tree index, covering both single-archive and
//! multi-archive (chw) layouts.

pub mod btree;
pub mod bytes;
pub mod chw;
pub mod error;
pub mod link_table;
pub mod table;
pub mod topics;

pub use btree::{decode_btree, BTreeEntry};
pub use chw::decode_title_map;
pub use error::ChmError;
pub use link_table::{AkLinkTable, BTreeKind};
pub use table::TopicTable;
pub use topics::{decode_topics, TopicTableSource};
