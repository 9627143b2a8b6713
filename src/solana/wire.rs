//! Compact-u16 lengths and a bounds-checked reader
//!
//! Every variable-length array on the wire is prefixed with its element
//! count as a compact-u16: 7 value bits per byte, least significant group
//! first, high bit set on every byte except the last. The encoding is at
//! most 3 bytes and must be minimal.

use super::errors::WireError;
use super::key::KEY_LEN;

/// Longest valid compact-u16 encoding.
pub const MAX_COMPACT_LEN_BYTES: usize = 3;

/// Append the compact-u16 encoding of `len` to `buf`.
pub fn encode_compact_len(buf: &mut Vec<u8>, len: u16) {
    let mut rem = len as u32;
    loop {
        let mut byte = (rem & 0x7f) as u8;
        rem >>= 7;
        if rem == 0 {
            buf.push(byte);
            break;
        }
        byte |= 0x80;
        buf.push(byte);
    }
}

/// Append the length prefix of an in-memory array.
///
/// Lengths are bounded by `Message::compile` and `Message::sanitize`, so
/// an oversized array here means an unsanitized message was marshalled.
pub(crate) fn encode_array_len(buf: &mut Vec<u8>, len: usize) {
    debug_assert!(
        len <= u16::MAX as usize,
        "array length {} exceeds compact-u16",
        len
    );
    encode_compact_len(buf, len as u16);
}

/// Require `len` to fit a compact-u16 prefix.
pub fn check_array_len(len: usize) -> Result<(), WireError> {
    if len > u16::MAX as usize {
        return Err(WireError::LengthOverflow(len));
    }
    Ok(())
}

/// Decode a compact-u16 from the front of `data`.
///
/// Returns the value and the number of bytes consumed.
pub fn decode_compact_len(data: &[u8]) -> Result<(u16, usize), WireError> {
    let mut value: u32 = 0;
    for i in 0..MAX_COMPACT_LEN_BYTES {
        let byte = *data.get(i).ok_or(WireError::UnexpectedEof)?;
        let group = (byte & 0x7f) as u32;

        // A zero group after the first byte means a shorter encoding existed
        if i > 0 && byte == 0 {
            return Err(WireError::InvalidCompactLength);
        }

        value |= group << (i * 7);
        if byte & 0x80 == 0 {
            return u16::try_from(value)
                .map(|v| (v, i + 1))
                .map_err(|_| WireError::InvalidCompactLength);
        }
    }
    Err(WireError::InvalidCompactLength)
}

/// Cursor over a byte slice. Every read is bounds-checked.
#[derive(Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        if self.remaining() < n {
            return Err(WireError::UnexpectedEof);
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], WireError> {
        let bytes = self.read_bytes(N)?;
        <[u8; N]>::try_from(bytes).map_err(|_| WireError::UnexpectedEof)
    }

    pub fn read_u8(&mut self) -> Result<u8, WireError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u32_le(&mut self) -> Result<u32, WireError> {
        self.read_array::<4>().map(u32::from_le_bytes)
    }

    pub fn read_u64_le(&mut self) -> Result<u64, WireError> {
        self.read_array::<8>().map(u64::from_le_bytes)
    }

    pub fn read_key(&mut self) -> Result<[u8; KEY_LEN], WireError> {
        self.read_array::<KEY_LEN>()
    }

    pub fn read_compact_len(&mut self) -> Result<usize, WireError> {
        let (len, used) = decode_compact_len(&self.buf[self.pos..])?;
        self.pos += used;
        Ok(len as usize)
    }

    /// Succeeds only if the whole buffer was consumed.
    pub fn finish(self) -> Result<(), WireError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(WireError::TrailingBytes(n)),
        }
    }
}
