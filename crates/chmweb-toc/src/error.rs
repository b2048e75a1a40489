use thiserror::Error;

/// Spec §7: duplicate archive stems (and, per SPEC_FULL.md §B, duplicate
/// output subdirectories) are fatal at registration time.
#[derive(Debug, Error)]
pub enum TocError {
    #[error("duplicate archive stem {0:?}")]
    DuplicateStem(String),
    #[error("archives {existing:?} and {incoming:?} both map to output subdirectory {subdir:?}")]
    DuplicateSubdir {
        existing: String,
        incoming: String,
        subdir: String,
    },
}
