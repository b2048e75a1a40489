//! Page Scanner (C7) and Tree Scanner (C8), spec §4.7/§4.8: discovering
//! every page and asset reachable from a help collection's contents tree
//! and keyword maps, by driving C6's HHC parser and C7's page scanner
//! through the worker pool to a fixed point.

pub mod discover;
pub mod error;
pub mod job;
pub mod page;
pub mod refs;
pub mod tree_data;

pub use discover::discover;
pub use error::ScanError;
pub use job::{run_job, Job, JobResponse};
pub use page::{scan_page, ScannedPage};
pub use refs::{classify, RefKind};
pub use tree_data::TreeData;
