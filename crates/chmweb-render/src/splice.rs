//! Splice list application, spec §4.9 / §8 "Rewriter splice safety": the
//! rewriter never re-serialises a whole page, it records a set of
//! `{byte_offset, original_length, replacement}` edits against the original
//! bytes and applies them in one pass.

#[derive(Debug, Clone)]
pub struct Splice {
    pub byte_offset: usize,
    pub original_length: usize,
    pub replacement: Vec<u8>,
}

impl Splice {
    pub fn new(byte_offset: usize, original_length: usize, replacement: impl Into<Vec<u8>>) -> Self {
        Self {
            byte_offset,
            original_length,
            replacement: replacement.into(),
        }
    }
}

/// Applies `splices` (which may arrive in any order) to `original` in
/// increasing offset order. Panics if two splices overlap or a splice's
/// recorded length runs past the end of the buffer — the "assertion" spec
/// §4.9 requires of the apply step.
pub fn apply_splices(original: &[u8], mut splices: Vec<Splice>) -> Vec<u8> {
    splices.sort_by_key(|s| s.byte_offset);

    let mut out = Vec::with_capacity(original.len());
    let mut cursor = 0usize;
    for splice in &splices {
        assert!(
            splice.byte_offset >= cursor,
            "overlapping splice at byte {} (previous splice ended at {cursor})",
            splice.byte_offset
        );
        let end = splice.byte_offset + splice.original_length;
        assert!(
            end <= original.len(),
            "splice at byte {} with length {} runs past end of buffer ({} bytes)",
            splice.byte_offset,
            splice.original_length,
            original.len()
        );
        out.extend_from_slice(&original[cursor..splice.byte_offset]);
        out.extend_from_slice(&splice.replacement);
        cursor = end;
    }
    out.extend_from_slice(&original[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_splices_out_of_order() {
        let original = b"abcdefgh";
        let splices = vec![
            Splice::new(6, 2, "XY"),
            Splice::new(2, 2, "--"),
        ];
        let out = apply_splices(original, splices);
        assert_eq!(out, b"ab--efXY");
    }

    #[test]
    #[should_panic(expected = "overlapping splice")]
    fn overlapping_splices_panic() {
        let original = b"abcdef";
        let splices = vec![Splice::new(0, 3, "X"), Splice::new(2, 2, "Y")];
        apply_splices(original, splices);
    }
}
