//! Embedded FONT records.
//!
//! A FONT record is a 24-byte header followed by the font payload, which
//! may be xor-obfuscated over its first bytes and zlib-compressed:
//!
//! ```text
//! 0  "FONT"
//! 4  uncompressed size
//! 8  flags (0b1 zlib, 0b10 xor)
//! 12 payload start
//! 16 xor key length
//! 20 xor key start
//! ```

use std::io::Read;

use flate2::read::ZlibDecoder;

use super::bytes::ByteCursor;
use crate::error::{Error, Result};

/// How many leading payload bytes the xor key covers.
pub const XOR_EXTENT: usize = 1040;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontHeaders {
    pub usize: u32,
    pub flags: u32,
    pub dstart: u32,
    pub xor_len: u32,
    pub xor_start: u32,
}

/// A successfully decoded font.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontPayload {
    pub headers: FontHeaders,
    pub encrypted: bool,
    pub data: Vec<u8>,
    /// `ttf`, `otf` or `dat`.
    pub ext: &'static str,
}

/// Extension implied by a font's leading signature.
pub fn font_extension(data: &[u8]) -> &'static str {
    match data.get(..4) {
        Some(b"\0\x01\0\0" | b"true" | b"ttcf") => "ttf",
        Some(b"OTTO") => "otf",
        _ => "dat",
    }
}

/// Decode a FONT record.
pub fn read_font_record(data: &[u8]) -> Result<FontPayload> {
    let c = ByteCursor::new(data, "FONT record");
    let header_err = |_| Error::Font("Failed to read font record header fields".into());
    let headers = FontHeaders {
        usize: c.u32_be(4).map_err(header_err)?,
        flags: c.u32_be(8).map_err(header_err)?,
        dstart: c.u32_be(12).map_err(header_err)?,
        xor_len: c.u32_be(16).map_err(header_err)?,
        xor_start: c.u32_be(20).map_err(header_err)?,
    };

    let mut font_data = data
        .get(headers.dstart as usize..)
        .unwrap_or_default()
        .to_vec();

    let encrypted = headers.flags & 0b10 != 0;
    if encrypted {
        let key = c
            .bytes(headers.xor_start as usize, headers.xor_len as usize)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Font("Font xor key is empty or out of range".into()))?;

        let extent = XOR_EXTENT.min(font_data.len());
        for (n, b) in font_data[..extent].iter_mut().enumerate() {
            *b ^= key[n % key.len()];
        }
    }

    if headers.flags & 0b1 != 0 {
        let mut decoder = ZlibDecoder::new(&font_data[..]);
        let mut out = Vec::new();
        decoder
            .read_to_end(&mut out)
            .map_err(|e| Error::Font(format!("Failed to zlib decompress font data ({e})")))?;

        if out.len() != headers.usize as usize {
            return Err(Error::Font("Uncompressed font size mismatch".into()));
        }
        font_data = out;
    }

    Ok(FontPayload {
        headers,
        encrypted,
        ext: font_extension(&font_data),
        data: font_data,
    })
}


#[cfg(test)]
mod tests {
    use super::test_fonts::font_record;
    use super::*;

    const TTF: &[u8] = b"\0\x01\0\0 fake truetype tables";

    #[test]
    fn test_plain_font() {
        let font = read_font_record(&font_record(TTF, false, None)).unwrap();
        assert_eq!(font.data, TTF);
        assert_eq!(font.ext, "ttf");
        assert!(!font.encrypted);
    }

    #[test]
    fn test_zlib_and_xor_font() {
        let otf = b"OTTO and then some more bytes".repeat(100);
        let record = font_record(&otf, true, Some(b"secret"));
        let font = read_font_record(&record).unwrap();
        assert!(font.encrypted);
        assert_eq!(font.headers.flags, 0b11);
        assert_eq!(font.data, otf);
        assert_eq!(font.ext, "otf");
    }

    #[test]
    fn test_xor_only_covers_extent() {
        let long = vec![b'z'; XOR_EXTENT + 10];
        let font = read_font_record(&font_record(&long, false, Some(b"k"))).unwrap();
        assert_eq!(font.data, long);
        assert_eq!(font.ext, "dat");
    }

    #[test]
    fn test_size_mismatch() {
        let mut record = font_record(TTF, true, None);
        record[4..8].copy_from_slice(&999u32.to_be_bytes());
        match read_font_record(&record) {
            Err(Error::Font(msg)) => assert!(msg.contains("size mismatch")),
            other => panic!("expected font error, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_zlib_and_short_header() {
        let mut record = font_record(TTF, false, None);
        record[8..12].copy_from_slice(&1u32.to_be_bytes());
        assert!(matches!(read_font_record(&record), Err(Error::Font(_))));
        assert!(matches!(read_font_record(b"FONT\0\0"), Err(Error::Font(_))));
    }
}
