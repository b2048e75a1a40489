pub mod cache;
pub mod error;
pub mod path_algebra;

pub use cache::FsCache;
pub use error::FsError;
pub use path_algebra::{doc_to_root, resolve_mixed_case, root_to_doc};
