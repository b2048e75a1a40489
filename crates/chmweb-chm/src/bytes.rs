//! Explicit little-endian byte-slice decoders for every binary side-table
//! C5 reads. A single borrowed slice plus plain integer offsets, per the
//! same philosophy the SGML tokenizer uses for HTML byte offsets: the
//! splice-safety of the link rewriter downstream depends on every consumer
//! of these tables knowing exactly which bytes it read.

use crate::error::ChmError;

pub fn u16_le(buf: &[u8], table: &'static str, offset: usize) -> Result<u16, ChmError> {
    let slice = buf.get(offset..offset + 2).ok_or(ChmError::Truncated {
        table,
        offset,
        needed: 2,
        have: buf.len().saturating_sub(offset),
    })?;
    Ok(u16::from_le_bytes([slice[0], slice[1]]))
}

pub fn u32_le(buf: &[u8], table: &'static str, offset: usize) -> Result<u32, ChmError> {
    let slice = buf.get(offset..offset + 4).ok_or(ChmError::Truncated {
        table,
        offset,
        needed: 4,
        have: buf.len().saturating_sub(offset),
    })?;
    Ok(u32::from_le_bytes([slice[0], slice[1], slice[2], slice[3]]))
}

/// A NUL-terminated UTF-8 string starting at `offset`. Returns the decoded
/// string and the byte offset one past the terminating NUL.
pub fn cstring_utf8<'a>(
    buf: &'a [u8],
    table: &'static str,
    offset: usize,
) -> Result<(&'a str, usize), ChmError> {
    let rest = buf.get(offset..).ok_or(ChmError::Truncated {
        table,
        offset,
        needed: 1,
        have: 0,
    })?;
    let nul = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
    let s = std::str::from_utf8(&rest[..nul]).map_err(|_| ChmError::BadString {
        table,
        offset,
        encoding: "utf-8",
    })?;
    Ok((s, offset + nul + 1))
}

/// A NUL-terminated UTF-16LE string starting at `offset`. Returns the
/// decoded string and the byte offset one past the terminating NUL code
/// unit. Uses `char::decode_utf16` so lone/invalid surrogates are replaced
/// rather than rejected — CHM keyword tables are not always perfectly
/// formed.
pub fn cstring_utf16le(buf: &[u8], offset: usize) -> (String, usize) {
    let mut units = Vec::new();
    let mut pos = offset;
    while pos + 1 < buf.len() {
        let unit = u16::from_le_bytes([buf[pos], buf[pos + 1]]);
        pos += 2;
        if unit == 0 {
            break;
        }
        units.push(unit);
    }
    let s = std::char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect();
    (s, pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_little_endian_integers() {
        let buf = [0x01, 0x00, 0x02, 0x00, 0x00, 0x00];
        assert_eq!(u16_le(&buf, "t", 0).unwrap(), 1);
        assert_eq!(u32_le(&buf, "t", 2).unwrap(), 2);
    }

    #[test]
    fn truncated_read_is_an_error() {
        let buf = [0x01];
        assert!(u16_le(&buf, "t", 0).is_err());
    }

    #[test]
    fn decodes_nul_terminated_utf8() {
        let buf = b"hello\0world\0";
        let (s, next) = cstring_utf8(buf, "t", 0).unwrap();
        assert_eq!(s, "hello");
        assert_eq!(next, 6);
        let (s2, _) = cstring_utf8(buf, "t", next).unwrap();
        assert_eq!(s2, "world");
    }

    #[test]
    fn decodes_nul_terminated_utf16le() {
        let text = "hi";
        let mut buf: Vec<u8> = text.encode_utf16().flat_map(u16::to_le_bytes).collect();
        buf.extend_from_slice(&0u16.to_le_bytes());
        buf.extend_from_slice(b"tail");

        let (s, next) = cstring_utf16le(&buf, 0);
        assert_eq!(s, "hi");
        assert_eq!(next, 6);
    }
}
