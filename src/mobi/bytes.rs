//! Fixed-width and variable-width integer decoding over record bytes.
//!
//! MOBI structures are laid out at fixed big-endian offsets, with a few
//! variable-width integer ("VWI") encodings layered on top:
//! - forward VWI (`decint`): 7 bits per byte, the high bit marks the last byte
//! - backward VWI (`decint_backward`): read from the end of a buffer, the high
//!   bit marks the first byte; used for trailing entries of text records
//! - hex numbers (`decode_hex_number`): a length byte followed by ASCII hex
//! - flagged VWI (`decode_fvwi`): a forward VWI whose low bits carry flags

use log::warn;

use crate::error::{Error, Result};

/// Bounds-checked view over a byte slice with fixed-offset accessors.
///
/// Every accessor fails with [`Error::Truncated`] instead of panicking when
/// the requested span runs past the end of the data.
#[derive(Debug, Clone, Copy)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    context: &'static str,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8], context: &'static str) -> Self {
        Self { data, context }
    }

    /// Returns `len` bytes starting at `offset`.
    pub fn bytes(&self, offset: usize, len: usize) -> Result<&'a [u8]> {
        let end = offset.checked_add(len).filter(|&end| end <= self.data.len());
        match end {
            Some(end) => Ok(&self.data[offset..end]),
            None => Err(Error::Truncated {
                context: self.context,
                offset,
                needed: len,
                available: self.data.len().saturating_sub(offset),
            }),
        }
    }

    /// Returns everything from `offset` to the end of the data.
    pub fn tail(&self, offset: usize) -> Result<&'a [u8]> {
        self.bytes(offset, self.data.len().saturating_sub(offset))
    }

    pub fn u8_at(&self, offset: usize) -> Result<u8> {
        Ok(self.bytes(offset, 1)?[0])
    }

    pub fn u16_be(&self, offset: usize) -> Result<u16> {
        let b = self.bytes(offset, 2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn u16_le(&self, offset: usize) -> Result<u16> {
        let b = self.bytes(offset, 2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn u32_be(&self, offset: usize) -> Result<u32> {
        let b = self.bytes(offset, 4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Reads a 24-bit big-endian integer.
    pub fn u24_be(&self, offset: usize) -> Result<u32> {
        let b = self.bytes(offset, 3)?;
        Ok(((b[0] as u32) << 16) | ((b[1] as u32) << 8) | b[2] as u32)
    }

    /// Checks a 4-byte magic tag at `offset`.
    pub fn has_tag(&self, offset: usize, tag: &[u8; 4]) -> bool {
        self.bytes(offset, 4).is_ok_and(|b| b == tag)
    }
}

/// Variable-width integer decoding (forward)
/// Each byte uses 7 bits for data, high bit indicates the final byte
pub fn decint(data: &[u8]) -> (u32, usize) {
    let mut val: u32 = 0;
    let mut consumed = 0;

    for &byte in data {
        consumed += 1;
        val = (val << 7) | ((byte & 0x7F) as u32);
        if byte & 0x80 != 0 {
            break;
        }
    }

    (val, consumed)
}

/// Like [`decint`], but `None` when `data` ends before the final byte.
pub fn decint_terminated(data: &[u8]) -> Option<(u32, usize)> {
    let (val, consumed) = decint(data);
    let last = *data.get(consumed.checked_sub(1)?)?;
    (last & 0x80 != 0).then_some((val, consumed))
}

/// Variable-width integer decoding (backward), reading from the end of `data`.
pub fn decint_backward(data: &[u8]) -> (u32, usize) {
    let mut consumed = 0;
    for &byte in data.iter().rev() {
        consumed += 1;
        if byte & 0x80 != 0 {
            break;
        }
    }

    let start = data.len() - consumed;
    let val = data[start..]
        .iter()
        .fold(0u32, |acc, &b| (acc << 7) | (b & 0x7F) as u32);
    (val, consumed)
}

/// Decode a hex-encoded number: one length byte, then that many ASCII hex digits.
pub fn decode_hex_number(data: &[u8]) -> Result<(u32, usize)> {
    let cursor = ByteCursor::new(data, "hex number");
    let length = cursor.u8_at(0)? as usize;
    let digits = cursor.bytes(1, length)?;

    let text = std::str::from_utf8(digits)
        .map_err(|_| Error::format(format!("Hex number is not ASCII: {digits:02x?}")))?;
    let value = u32::from_str_radix(text, 16)
        .map_err(|_| Error::format(format!("Invalid hex number: {text:?}")))?;

    Ok((value, length + 1))
}

/// Decode a forward VWI whose lowest `flag_size` bits are flags.
///
/// Returns `(value, flags, consumed)`.
pub fn decode_fvwi(data: &[u8], flag_size: u32) -> (u32, u8, usize) {
    let (arg, consumed) = decint(data);
    let mask = (1u32 << flag_size) - 1;
    (arg >> flag_size, (arg & mask) as u8, consumed)
}

/// Split the trailing entries off a text record.
///
/// Bits 1..16 of `flags` each declare a trailing entry whose total size is
/// stored as a backward VWI at the current end of the record; these are
/// stripped last-bit-first. Bit 0 declares multibyte overlap bytes, whose
/// count lives in the two low bits of the final remaining byte and which
/// are stripped last.
///
/// Returns the `(entry number, payload)` pairs in decode order (number 0 is
/// the multibyte overlap, 1 indexing, 2 uncrossable breaks) and the record
/// content with all trailing bytes removed. Sizes that point past the start
/// of the record are clamped.
pub fn split_trailing_entries(record: &[u8], flags: u32) -> (Vec<(u32, &[u8])>, &[u8]) {
    let mut entries = Vec::new();
    let mut rest = record;
    let mut shifted = flags >> 1;
    let mut num = 0;

    while shifted != 0 {
        num += 1;
        if shifted & 1 != 0 && !rest.is_empty() {
            let (size, consumed) = decint_backward(rest);
            if (size as usize) < consumed {
                warn!(
                    "Trailing entry {num} declares {size} bytes but its size takes {consumed}"
                );
            }
            let size = (size as usize).min(rest.len());
            if size > consumed {
                entries.push((num, &rest[rest.len() - size..rest.len() - consumed]));
            }
            rest = &rest[..rest.len() - size];
        }
        shifted >>= 1;
    }

    // Only the two low bits hold the size; there are never more than 3 overlap bytes
    if flags & 1 != 0
        && let Some(&last) = rest.last()
    {
        let size = ((last & 0b11) as usize + 1).min(rest.len());
        if size > 1 {
            entries.push((0, &rest[rest.len() - size..rest.len() - 1]));
        }
        rest = &rest[..rest.len() - size];
    }

    (entries, rest)
}
