use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FsError {
    #[error("path escapes its document root: {0}")]
    PathEscapesRoot(PathBuf),
}
