use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Pool(#[from] chmweb_pool::PoolError),
    #[error(transparent)]
    Io(#[from] chmweb_util::error::ChmIoError),
    #[error("archive stem {0:?} has no registered subdirectory")]
    UnregisteredArchive(String),
}
