use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::error::{QError, QResult};

/// Size of the fixed IPC header (§3, §4.A).
pub const HEADER_SIZE: usize = 8;

const LITTLE_ENDIAN: u8 = 1;
const BIG_ENDIAN: u8 = 0;

/// A decoded 8-byte IPC header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub little_endian: bool,
    pub msg_type: u8,
    pub compressed: bool,
    pub total_length: i32,
}

/// Always writes little-endian, per §4.A.
#[must_use]
pub fn pack_header(msg_type: u8, total_length: i32) -> [u8; HEADER_SIZE] {
    let mut buf = [0u8; HEADER_SIZE];
    buf[0] = LITTLE_ENDIAN;
    buf[1] = msg_type;
    buf[2] = 0;
    buf[3] = 0;
    LittleEndian::write_i32(&mut buf[4..8], total_length);
    buf
}

/// Reads the endian byte and uses it to unpack the rest of the header.
/// `total_length < 8` signals a malformed frame.
pub fn unpack_header(bytes: &[u8]) -> QResult<Header> {
    if bytes.len() < HEADER_SIZE {
        return Err(QError::Deserialization(format!(
            "header too short: {} < {HEADER_SIZE}",
            bytes.len()
        )));
    }
    let little_endian = bytes[0] == LITTLE_ENDIAN || bytes[0] != BIG_ENDIAN;
    let msg_type = bytes[1];
    let compressed = bytes[2] != 0;
    let total_length = if little_endian {
        LittleEndian::read_i32(&bytes[4..8])
    } else {
        BigEndian::read_i32(&bytes[4..8])
    };
    if total_length < HEADER_SIZE as i32 {
        return Err(QError::Deserialization(format!(
            "malformed frame: total_length {total_length} < {HEADER_SIZE}"
        )));
    }
    Ok(Header {
        little_endian,
        msg_type,
        compressed,
        total_length,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_is_little_endian() {
        let h = pack_header(1, 14);
        assert_eq!(h, [0x01, 0x01, 0x00, 0x00, 0x0E, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn round_trips() {
        let packed = pack_header(2, 123);
        let h = unpack_header(&packed).unwrap();
        assert!(h.little_endian);
        assert_eq!(h.msg_type, 2);
        assert!(!h.compressed);
        assert_eq!(h.total_length, 123);
    }

    #[test]
    fn rejects_short_length() {
        let packed = pack_header(1, 4);
        assert!(unpack_header(&packed).is_err());
    }

    #[test]
    fn rejects_short_buffer() {
        assert!(unpack_header(&[1, 2, 3]).is_err());
    }
}
