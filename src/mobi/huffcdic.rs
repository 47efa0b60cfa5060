//! HUFF/CDIC decompression for MOBI files
//!
//! Some MOBI files use Huffman compression instead of PalmDOC LZ77.
//! This module handles the HUFF (Huffman table) and CDIC (dictionary) records.

use log::debug;

use super::bytes::ByteCursor;
use crate::error::{Error, Result};

/// Nesting limit for dictionary phrases that are themselves compressed.
const MAX_DEPTH: usize = 32;

/// Dictionary entry, unpacked lazily on first use
#[derive(Clone)]
enum DictEntry {
    Leaf(Vec<u8>),
    Node(Vec<u8>),
    Unpacked(Vec<u8>),
}

/// HUFF/CDIC decompressor
pub struct HuffCdicReader {
    /// dict1: 256 entries of (codelen, term, maxcode)
    dict1: Vec<(u8, bool, u32)>,
    /// mincode for each code length (1-32)
    mincode: Vec<u32>,
    /// maxcode for each code length (1-32)
    maxcode: Vec<u32>,
    /// Dictionary entries from CDIC records
    dictionary: Vec<DictEntry>,
}

impl std::fmt::Debug for HuffCdicReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HuffCdicReader")
            .field("phrases", &self.dictionary.len())
            .finish()
    }
}

fn invalid(msg: impl Into<String>) -> Error {
    Error::Decompression(msg.into())
}

impl HuffCdicReader {
    /// Create a reader from the Huffman records: one HUFF then the CDICs.
    pub fn from_records(records: &[&[u8]]) -> Result<Self> {
        let (huff, cdics) = records
            .split_first()
            .ok_or_else(|| invalid("No HUFF record"))?;
        Self::new(huff, cdics)
    }

    /// Create a new reader from HUFF and CDIC records
    pub fn new(huff: &[u8], cdics: &[&[u8]]) -> Result<Self> {
        let mut reader = Self {
            dict1: Vec::with_capacity(256),
            mincode: Vec::with_capacity(33),
            maxcode: Vec::with_capacity(33),
            dictionary: Vec::new(),
        };

        reader.load_huff(huff)?;
        for cdic in cdics {
            reader.load_cdic(cdic)?;
        }
        debug!(
            "HUFF/CDIC: {} CDIC records, {} phrases",
            cdics.len(),
            reader.dictionary.len()
        );

        Ok(reader)
    }

    fn load_huff(&mut self, huff: &[u8]) -> Result<()> {
        let c = ByteCursor::new(huff, "HUFF record");
        if !matches!(c.bytes(0, 8), Ok(b"HUFF\x00\x00\x00\x18")) {
            return Err(invalid("Invalid HUFF header"));
        }

        let off1 = c.u32_be(8)? as usize;
        let off2 = c.u32_be(12)? as usize;

        // dict1: 256 entries at off1
        for i in 0..256 {
            let v = c.u32_be(off1 + i * 4)?;

            let codelen = (v & 0x1f) as u8;
            let term = (v & 0x80) != 0;
            let maxcode_raw = v >> 8;

            let maxcode = if codelen > 0 {
                (maxcode_raw.wrapping_add(1) << (32 - codelen)).wrapping_sub(1)
            } else {
                0
            };

            self.dict1.push((codelen, term, maxcode));
        }

        // dict2: 32 mincode/maxcode pairs at off2, indexed by code length
        self.mincode.push(0);
        self.maxcode.push(0);

        for i in 0..32 {
            let pos = off2 + i * 8;
            let mincode_raw = c.u32_be(pos)?;
            let maxcode_raw = c.u32_be(pos + 4)?;

            let shift = 32 - (i as u32 + 1);
            self.mincode.push(mincode_raw.checked_shl(shift).unwrap_or(0));
            self.maxcode.push(
                maxcode_raw
                    .wrapping_add(1)
                    .checked_shl(shift)
                    .unwrap_or(0)
                    .wrapping_sub(1),
            );
        }

        Ok(())
    }

    fn load_cdic(&mut self, cdic: &[u8]) -> Result<()> {
        let c = ByteCursor::new(cdic, "CDIC record");
        if !matches!(c.bytes(0, 8), Ok(b"CDIC\x00\x00\x00\x10")) {
            return Err(invalid("Invalid CDIC header"));
        }

        let phrases = c.u32_be(8)? as usize;
        let bits = c.u32_be(12)?;

        let per_record = 1usize.checked_shl(bits).unwrap_or(usize::MAX);
        let n = per_record.min(phrases.saturating_sub(self.dictionary.len()));

        for i in 0..n {
            let off = c.u16_be(16 + i * 2)? as usize;
            let blen = c.u16_be(16 + off)?;
            let slice_len = (blen & 0x7fff) as usize;
            let is_leaf = (blen & 0x8000) != 0;

            let slice_start = 16 + off + 2;
            let slice_end = (slice_start + slice_len).min(cdic.len());
            let slice = cdic[slice_start.min(slice_end)..slice_end].to_vec();

            self.dictionary.push(if is_leaf {
                DictEntry::Leaf(slice)
            } else {
                DictEntry::Node(slice)
            });
        }

        Ok(())
    }

    /// Decompress a text record
    pub fn unpack(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        let mut result = Vec::new();
        self.unpack_into(data, &mut result, 0)?;
        Ok(result)
    }

    fn unpack_into(&mut self, data: &[u8], output: &mut Vec<u8>, depth: usize) -> Result<()> {
        if depth > MAX_DEPTH {
            return Err(invalid("HUFF/CDIC phrases nest too deeply"));
        }

        let mut bits_remaining = data.len() as i64 * 8;

        // Pad data for safe reading
        let mut padded = data.to_vec();
        padded.extend_from_slice(&[0u8; 8]);

        let mut pos = 0usize;
        let mut x = read_u64_be(&padded, pos);
        let mut n: i32 = 32;

        while bits_remaining > 0 {
            if n <= 0 {
                pos += 4;
                x = read_u64_be(&padded, pos);
                n += 32;
            }

            let code = ((x >> n) & 0xFFFFFFFF) as u32;

            // Look up in dict1 using top 8 bits
            let (mut codelen, term, mut maxcode) = self.dict1[(code >> 24) as usize];
            if codelen == 0 {
                return Err(invalid(format!("Zero code length for prefix {}", code >> 24)));
            }

            if !term {
                while codelen < 32 && code < self.mincode[codelen as usize] {
                    codelen += 1;
                }
                maxcode = self.maxcode[codelen as usize];
            }

            n -= codelen as i32;
            bits_remaining -= codelen as i64;

            if bits_remaining < 0 {
                break;
            }

            let r = (maxcode.wrapping_sub(code) >> (32 - codelen as u32)) as usize;
            let Some(entry) = self.dictionary.get(r) else {
                return Err(invalid(format!(
                    "Dictionary index {} out of bounds (len {})",
                    r,
                    self.dictionary.len()
                )));
            };

            match entry {
                DictEntry::Leaf(slice) | DictEntry::Unpacked(slice) => {
                    output.extend_from_slice(slice);
                }
                DictEntry::Node(slice) => {
                    let slice = slice.clone();
                    let mut unpacked = Vec::new();
                    self.unpack_into(&slice, &mut unpacked, depth + 1)?;
                    output.extend_from_slice(&unpacked);
                    self.dictionary[r] = DictEntry::Unpacked(unpacked);
                }
            }
        }

        Ok(())
    }
}

fn read_u64_be(data: &[u8], pos: usize) -> u64 {
    match data.get(pos..pos + 8) {
        Some(b) => u64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]),
        None => 0,
    }
}
