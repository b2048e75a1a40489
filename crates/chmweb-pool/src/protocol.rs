//! Wire protocol between the control process and a worker subprocess, spec
//! §4.3 (C3): a `u32` little-endian length prefix followed by a `bincode`
//! payload, one frame per job and one frame per result, read and written in
//! strict request/response lockstep over the worker's stdin/stdout.

use std::io::{self, Read, Write};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::PoolError;

/// A worker's reply to one job, per spec §4.3: a result, a non-fatal
/// warning to forward to the parent's warning sink, or a fatal error that
/// terminates the whole pool.
#[derive(Debug, Serialize, Deserialize)]
pub enum Envelope<R> {
    Result(R),
    Warning(String),
    Error(String),
}

pub fn write_frame<W: Write, T: Serialize>(w: &mut W, value: &T) -> Result<(), PoolError> {
    let payload = bincode::serialize(value)
        .map_err(|e| PoolError::Protocol(format!("failed to encode frame: {e}")))?;
    let len = u32::try_from(payload.len())
        .map_err(|_| PoolError::Protocol("frame payload exceeds 4 GiB".to_string()))?;
    w.write_all(&len.to_le_bytes())?;
    w.write_all(&payload)?;
    w.flush()?;
    Ok(())
}

/// Reads one frame, or `None` on a clean EOF between frames (the worker's
/// stdout closed with nothing half-written).
pub fn read_frame<R: Read, T: DeserializeOwned>(r: &mut R) -> Result<Option<T>, PoolError> {
    let mut len_buf = [0u8; 4];
    match read_exact_or_eof(r, &mut len_buf)? {
        false => return Ok(None),
        true => {}
    }
    let len = u32::from_le_bytes(len_buf) as usize;
    let mut payload = vec![0u8; len];
    r.read_exact(&mut payload)?;
    let value = bincode::deserialize(&payload)
        .map_err(|e| PoolError::Protocol(format!("failed to decode frame: {e}")))?;
    Ok(Some(value))
}

/// Like `Read::read_exact`, but treats an EOF on the very first byte as "no
/// more frames" (`Ok(false)`) instead of an error, and any EOF partway
/// through a frame as a genuine protocol error.
fn read_exact_or_eof<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<bool, PoolError> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(false),
            Ok(0) => {
                return Err(PoolError::Protocol(
                    "worker closed its stdout mid-frame".to_string(),
                ))
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trips_multiple_frames() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &"first".to_string()).unwrap();
        write_frame(&mut buf, &"second".to_string()).unwrap();

        let mut cursor = Cursor::new(buf);
        let a: String = read_frame(&mut cursor).unwrap().unwrap();
        let b: String = read_frame(&mut cursor).unwrap().unwrap();
        let eof: Option<String> = read_frame(&mut cursor).unwrap();

        assert_eq!(a, "first");
        assert_eq!(b, "second");
        assert_eq!(eof, None);
    }

    #[test]
    fn truncated_frame_is_a_protocol_error() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &"hello".to_string()).unwrap();
        buf.truncate(buf.len() - 2);

        let mut cursor = Cursor::new(buf);
        let result: Result<Option<String>, _> = read_frame(&mut cursor);
        assert!(result.is_err());
    }

    #[test]
    fn envelope_variants_round_trip() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &Envelope::Result(42u32)).unwrap();
        write_frame(&mut buf, &Envelope::Warning::<u32>("careful".to_string())).unwrap();
        write_frame(&mut buf, &Envelope::Error::<u32>("fatal".to_string())).unwrap();

        let mut cursor = Cursor::new(buf);
        match read_frame::<_, Envelope<u32>>(&mut cursor).unwrap().unwrap() {
            Envelope::Result(v) => assert_eq!(v, 42),
            other => panic!("unexpected {other:?}"),
        }
        match read_frame::<_, Envelope<u32>>(&mut cursor).unwrap().unwrap() {
            Envelope::Warning(msg) => assert_eq!(msg, "careful"),
            other => panic!("unexpected {other:?}"),
        }
        match read_frame::<_, Envelope<u32>>(&mut cursor).unwrap().unwrap() {
            Envelope::Error(msg) => assert_eq!(msg, "fatal"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
