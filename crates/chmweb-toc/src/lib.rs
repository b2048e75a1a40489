//! The Contents Tree: parsing HHC/COL source files into it (spec §4.6) and
//! the arena-indexed tree type itself (spec §9), plus the Archive Registry
//! (spec §3) that maps archive stems to output subdirectories.

pub mod col;
pub mod error;
pub mod hhc;
pub mod registry;
pub mod tree;

pub use col::parse_col;
pub use error::TocError;
pub use hhc::parse_hhc;
pub use registry::ArchiveRegistry;
pub use tree::{ContentsTree, DetachedNode, Node, NodeIndex, NodeKind, ROOT};
