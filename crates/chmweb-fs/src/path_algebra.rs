//! Path algebra, spec §4.2 (C2): converting between a reference as written
//! inside one document and the root-relative path it actually designates,
//! plus case-insensitive resolution against the real filesystem via C1.

use std::path::Path;

use chmweb_types::{DocRelPath, RootPath};

use crate::cache::FsCache;
use crate::error::FsError;

/// Resolves `rel`, a reference as it appears inside `doc`, into a path
/// rooted at the output directory.
///
/// `doc`'s directory is the base; `.` segments are dropped and `..` pops a
/// directory off that base. Popping past the root is a path escape and
/// returns `FsError::PathEscapesRoot` — spec §8 "Path escape detection".
pub fn doc_to_root(rel: &DocRelPath, doc: &RootPath) -> Result<RootPath, FsError> {
    let mut stack: Vec<&str> = doc.dir().split('/').filter(|s| !s.is_empty()).collect();
    for seg in rel.segments() {
        match seg {
            "" | "." => {}
            ".." => {
                if stack.pop().is_none() {
                    return Err(FsError::PathEscapesRoot(Path::new(rel.as_str()).to_path_buf()));
                }
            }
            other => stack.push(other),
        }
    }
    Ok(RootPath::new(stack.join("/")))
}

/// The inverse: how `doc` would have to spell a reference to reach `target`,
/// as a sequence of `..` climbs out of `doc`'s directory followed by the
/// descent into `target`.
pub fn root_to_doc(target: &RootPath, doc: &RootPath) -> DocRelPath {
    let doc_dir: Vec<&str> = doc.dir().split('/').filter(|s| !s.is_empty()).collect();
    let target_segs: Vec<&str> = target.segments().collect();

    let common = doc_dir
        .iter()
        .zip(target_segs.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let climbs = doc_dir.len() - common;
    let mut out: Vec<&str> = std::iter::repeat("..").take(climbs).collect();
    out.extend(target_segs[common..].iter().copied());

    if out.is_empty() {
        DocRelPath::new(target.file_name().to_string())
    } else {
        DocRelPath::new(out.join("/"))
    }
}

/// Resolves `path` (already root-relative and normalised, but possibly
/// wrong-case per segment, as produced by the CHM author's own broken
/// internal links) against the real directory tree under `prefix`, walking
/// one segment at a time and consulting `cache`'s case-insensitive lookup at
/// each step — spec §4.2 "mixed-case resolution".
///
/// More than one sibling can fold to the same segment (`Fig.GIF` and
/// `fig.gif` side by side); a wrong pick at an early segment must not sink
/// the whole resolution, so this recurses depth-first over every candidate
/// at each level and returns the first combination that resolves all the
/// way to a leaf, rather than committing to `hits.first()` greedily.
///
/// Returns `None` if no combination of case-insensitive matches reaches a
/// leaf.
pub fn resolve_mixed_case(cache: &FsCache, path: &RootPath) -> Option<RootPath> {
    let segments: Vec<&str> = path.segments().collect();
    resolve_from(cache, "", &segments)
}

fn resolve_from(cache: &FsCache, resolved_dir: &str, remaining: &[&str]) -> Option<RootPath> {
    let (seg, rest) = remaining.split_first()?;
    let hits = cache.case_insensitive_children(Path::new(resolved_dir), seg);

    for candidate in &hits {
        let joined = if resolved_dir.is_empty() {
            candidate.clone()
        } else {
            format!("{resolved_dir}/{candidate}")
        };
        if rest.is_empty() {
            return Some(RootPath::new(joined));
        }
        if let Some(resolved) = resolve_from(cache, &joined, rest) {
            return Some(resolved);
        }
    }
    None
}
