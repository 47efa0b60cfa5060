//! Text record codec selection.

use log::warn;

use super::headers::{Compression, MobiHeader};
use super::huffcdic::HuffCdicReader;
use super::palmdb::Record;
use super::palmdoc;
use crate::error::{Error, Result};

/// Decompressor for the text records of one file.
#[derive(Debug)]
pub enum TextCodec {
    None,
    PalmDoc,
    Huff(HuffCdicReader),
}

impl TextCodec {
    /// Pick the codec declared by the header, loading the Huffman records
    /// when the file uses HUFF/CDIC.
    pub fn for_header(header: &MobiHeader<'_>, records: &[Record<'_>]) -> Result<Self> {
        match header.compression {
            Compression::None => Ok(TextCodec::None),
            Compression::PalmDoc => Ok(TextCodec::PalmDoc),
            Compression::Huffman => {
                let start = header.huffman_record_offset as usize;
                let count = header.huffman_record_count as usize;
                let huff_records = start
                    .checked_add(count)
                    .and_then(|end| records.get(start..end))
                    .ok_or_else(|| Error::Truncated {
                        context: "Huffman records",
                        offset: start,
                        needed: count,
                        available: records.len().saturating_sub(start),
                    })?;
                let raws: Vec<&[u8]> = huff_records.iter().map(|r| r.raw).collect();
                Ok(TextCodec::Huff(HuffCdicReader::from_records(&raws)?))
            }
            Compression::Unknown(n) => {
                warn!("Unknown compression type {n}, treating text as uncompressed");
                Ok(TextCodec::None)
            }
        }
    }

    pub fn decompress(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            TextCodec::None => Ok(data.to_vec()),
            TextCodec::PalmDoc => Ok(palmdoc::decompress(data)),
            TextCodec::Huff(reader) => reader.unpack(data),
        }
    }
}
