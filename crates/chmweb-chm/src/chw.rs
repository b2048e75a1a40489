//! `$HHTitleMap` decoding, spec §4.5 "Multi-archive (chw) layout": a flat
//! list of `{stem_length: u16, stem: utf8, 12 opaque bytes}` records, one
//! per member archive, in the order that assigns archive ordinals (starting
//! at 1, since ordinal 0 is reserved for single-archive mode in
//! `TopicIndex::flatten`).
//!
//! The 12 opaque bytes (LCID + two reserved `u32`s per spec §9 "Open
//! questions") are never interpreted; this core does not depend on them.

use crate::bytes::u16_le;
use crate::error::ChmError;

const TABLE: &str = "$HHTitleMap";
const OPAQUE_TRAILER: usize = 12;

pub fn decode_title_map(data: &[u8]) -> Result<Vec<String>, ChmError> {
    let mut stems = Vec::new();
    let mut pos = 0;
    while pos < data.len() {
        let stem_len = u16_le(data, TABLE, pos)? as usize;
        pos += 2;
        let bytes = data.get(pos..pos + stem_len).ok_or(ChmError::Truncated {
            table: TABLE,
            offset: pos,
            needed: stem_len,
            have: data.len().saturating_sub(pos),
        })?;
        let stem = std::str::from_utf8(bytes)
            .map_err(|_| ChmError::BadString {
                table: TABLE,
                offset: pos,
                encoding: "utf-8",
            })?
            .to_string();
        pos += stem_len;
        pos += OPAQUE_TRAILER;
        stems.push(stem);
    }
    Ok(stems)
}
