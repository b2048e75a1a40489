use thiserror::Error;

/// Spec §7: a malformed binary header or block is fatal — unlike most page-
/// level problems, which degrade to a warning and a `#` link.
#[derive(Debug, Error)]
pub enum ChmError {
    #[error("{table} truncated: need {needed} bytes at offset {offset}, have {have}")]
    Truncated {
        table: &'static str,
        offset: usize,
        needed: usize,
        have: usize,
    },
    #[error("{table} entry {index}: {reason}")]
    Corrupt {
        table: &'static str,
        index: u32,
        reason: String,
    },
    #[error("bad B-tree header signature in {table}")]
    BadBTreeSignature { table: &'static str },
    #[error("string at offset {offset} in {table} is not valid {encoding}")]
    BadString {
        table: &'static str,
        offset: usize,
        encoding: &'static str,
    },
    #[error(transparent)]
    Io(#[from] chmweb_util::error::ChmIoError),
}
