//! `$WWAssociativeLinks/BTree` and `$WWKeywordLinks/BTree` decoding, spec
//! §4.5 "B-tree walk".
//!
//! Header signature `0x3B 0x29` at offset 0; the listing-block count sits at
//! offset `0x1A` as a zero-based count (the true block count is that value
//! plus one). Each listing block lives at `76 + block_index * 2048`, with
//! its own entry count at `block+2` and its entries starting at `block+12`.
//! Every entry ends with a 32-bit index that increments by 13 across the
//! whole file — spec §8 pins `entry_count == final_index / 13 + 1`.

use crate::bytes::{cstring_utf16le, u16_le, u32_le};
use crate::error::ChmError;

const TABLE: &str = "BTree";
const BLOCK_SIZE: usize = 2048;
const BLOCK_BASE: usize = 76;
const MONOTONIC_STEP: u32 = 13;
const SEE_ALSO_FLAG: u16 = 2;

/// One decoded keyword entry. `full_keyword` (all ancestor prefixes joined
/// by `", "`) is the lookup key used to build the A-link/K-link maps;
/// `local_display` (the suffix starting at `last_keyword_char_offset`) is
/// retained for rendering resolution pages with just the leaf name.
#[derive(Debug, Clone, PartialEq)]
pub struct BTreeEntry {
    pub full_keyword: String,
    pub local_display: String,
    pub depth: u16,
    pub topics: Vec<u32>,
    pub see_also: Option<String>,
    pub monotonic_index: u32,
}

pub fn decode_btree(data: &[u8]) -> Result<Vec<BTreeEntry>, ChmError> {
    let signature = u16_le(data, TABLE, 0)?;
    if signature != 0x293B {
        return Err(ChmError::BadBTreeSignature { table: TABLE });
    }
    let block_count_minus_one = u16_le(data, TABLE, 0x1A)?;
    let block_count = block_count_minus_one as usize + 1;

    let mut entries = Vec::new();
    for block_index in 0..block_count {
        let block = BLOCK_BASE + block_index * BLOCK_SIZE;
        let entry_count = u16_le(data, TABLE, block + 2)? as usize;
        let mut pos = block + 12;
        for _ in 0..entry_count {
            let (entry, next) = decode_entry(data, pos)?;
            entries.push(entry);
            pos = next;
        }
    }
    Ok(entries)
}

fn decode_entry(data: &[u8], offset: usize) -> Result<(BTreeEntry, usize), ChmError> {
    let last_keyword_char_offset = u16_le(data, TABLE, offset)? as usize;
    let (full_keyword, mut pos) = cstring_utf16le_checked(data, offset + 2)?;

    let local_display = full_keyword
        .chars()
        .skip(last_keyword_char_offset)
        .collect::<String>();
    let local_display = if local_display.is_empty() {
        full_keyword.clone()
    } else {
        local_display
    };

    let see_also_flag = u16_le(data, TABLE, pos)?;
    pos += 2;
    let depth = u16_le(data, TABLE, pos)?;
    pos += 2;
    let pair_count = u16_le(data, TABLE, pos)? as usize;
    pos += 2;

    let (topics, see_also) = if see_also_flag == SEE_ALSO_FLAG {
        let (target, next) = cstring_utf16le_checked(data, pos)?;
        pos = next;
        (Vec::new(), Some(target))
    } else {
        let mut topics = Vec::with_capacity(pair_count);
        for _ in 0..pair_count {
            topics.push(u32_le(data, TABLE, pos)?);
            pos += 4;
        }
        (topics, None)
    };

    let monotonic_index = u32_le(data, TABLE, pos)?;
    pos += 4;

    Ok((
        BTreeEntry {
            full_keyword,
            local_display,
            depth,
            topics,
            see_also,
            monotonic_index,
        },
        pos,
    ))
}

fn cstring_utf16le_checked(data: &[u8], offset: usize) -> Result<(String, usize), ChmError> {
    if offset >= data.len() {
        return Err(ChmError::Truncated {
            table: TABLE,
            offset,
            needed: 2,
            have: 0,
        });
    }
    Ok(cstring_utf16le(data, offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EntrySpec<'a> {
        keyword: &'a str,
        last_keyword_char_offset: u16,
        see_also: Option<&'a str>,
        topics: &'a [u32],
    }

    fn utf16_cstring(s: &str) -> Vec<u8> {
        let mut out: Vec<u8> = s.encode_utf16().flat_map(u16::to_le_bytes).collect();
        out.extend_from_slice(&0u16.to_le_bytes());
        out
    }

    fn build_file(entries_per_block: &[Vec<EntrySpec>]) -> Vec<u8> {
        let mut file = vec![0u8; BLOCK_BASE];
        file[0..2].copy_from_slice(&0x293Bu16.to_le_bytes());
        let block_count = entries_per_block.len();
        file[0x1A..0x1A + 2].copy_from_slice(&((block_count - 1) as u16).to_le_bytes());

        let mut monotonic = 0u32;
        for (block_index, entries) in entries_per_block.iter().enumerate() {
            let block_start = BLOCK_BASE + block_index * BLOCK_SIZE;
            if file.len() < block_start + BLOCK_SIZE {
                file.resize(block_start + BLOCK_SIZE, 0);
            }
            file[block_start + 2..block_start + 4]
                .copy_from_slice(&(entries.len() as u16).to_le_bytes());

            let mut body = Vec::new();
            for entry in entries {
                body.extend_from_slice(&entry.last_keyword_char_offset.to_le_bytes());
                body.extend_from_slice(&utf16_cstring(entry.keyword));
                let flag: u16 = if entry.see_also.is_some() { 2 } else { 0 };
                body.extend_from_slice(&flag.to_le_bytes());
                body.extend_from_slice(&1u16.to_le_bytes()); // depth
                if let Some(target) = entry.see_also {
                    body.extend_from_slice(&0u16.to_le_bytes());
                    body.extend_from_slice(&utf16_cstring(target));
                } else {
                    body.extend_from_slice(&(entry.topics.len() as u16).to_le_bytes());
                    for t in entry.topics {
                        body.extend_from_slice(&t.to_le_bytes());
                    }
                }
                body.extend_from_slice(&monotonic.to_le_bytes());
                monotonic += MONOTONIC_STEP;
            }
            let body_start = block_start + 12;
            if file.len() < body_start + body.len() {
                file.resize(body_start + body.len(), 0);
            }
            file[body_start..body_start + body.len()].copy_from_slice(&body);
        }
        file
    }

    #[test]
    fn decodes_single_block_with_local_and_see_also_entries() {
        let file = build_file(&[vec![
            EntrySpec {
                keyword: "Animals, Cats",
                last_keyword_char_offset: 9,
                see_also: None,
                topics: &[5, 7],
            },
            EntrySpec {
                keyword: "Feline",
                last_keyword_char_offset: 0,
                see_also: Some("Cats"),
                topics: &[],
            },
        ]]);

        let entries = decode_btree(&file).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].local_display, "Cats");
        assert_eq!(entries[0].topics, vec![5, 7]);
        assert_eq!(entries[1].see_also.as_deref(), Some("Cats"));
    }

    #[test]
    fn entry_count_matches_monotonic_index_formula() {
        let specs: Vec<EntrySpec> = (0..5)
            .map(|_| EntrySpec {
                keyword: "Term",
                last_keyword_char_offset: 0,
                see_also: None,
                topics: &[],
            })
            .collect();
        let file = build_file(&[specs]);
        let entries = decode_btree(&file).unwrap();
        let final_index = entries.last().unwrap().monotonic_index;
        assert_eq!(entries.len() as u32, final_index / MONOTONIC_STEP + 1);
    }

    #[test]
    fn bad_signature_is_rejected() {
        let mut file = build_file(&[vec![]]);
        file[0] = 0;
        assert!(decode_btree(&file).is_err());
    }
}
