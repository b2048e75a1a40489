use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("failed to spawn worker process {binary:?}: {source}")]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("worker process exited without producing a response for its last job")]
    WorkerDied,
    #[error("malformed worker protocol frame: {0}")]
    Protocol(String),
    #[error("worker io error: {0}")]
    Io(#[from] std::io::Error),
}
