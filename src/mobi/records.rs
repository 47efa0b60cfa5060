//! Payload records: text, images, fonts and everything else.

use std::fs;
use std::path::Path;

use log::{trace, warn};

use super::bytes::split_trailing_entries;
use super::codec::TextCodec;
use super::font::{FontPayload, read_font_record};
use super::palmdb::Record;
use crate::error::Result;
use crate::util::{ImageInfo, identify_image, repr_bytes};

/// Signatures that label a binary record.
const BINARY_SIGNATURES: &[&str] = &[
    "FCIS", "FLIS", "SRCS", "DATP", "RESC", "BOUN", "FDST", "AUDI", "VIDE",
];

/// End-of-file marker record.
const EOF_SIGNATURE: &[u8; 4] = b"\xe9\x8e\r\n";

/// Trailing entries of a text record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrailingData<'a> {
    pub multibyte_overlap: Option<&'a [u8]>,
    /// TBS bytes.
    pub indexing: Option<&'a [u8]>,
    pub uncrossable_breaks: Option<&'a [u8]>,
    /// Entries with no known meaning, keyed by their flag bit.
    pub unknown: Vec<(u32, &'a [u8])>,
    /// Every byte after the record content, as stored.
    pub raw_bytes: &'a [u8],
}

impl<'a> TrailingData<'a> {
    /// Named entries in display order.
    pub fn entries(&self) -> Vec<(String, &'a [u8])> {
        let mut out: Vec<(String, &'a [u8])> = self
            .unknown
            .iter()
            .map(|&(num, data)| (num.to_string(), data))
            .collect();
        for (name, value) in [
            ("multibyte_overlap", self.multibyte_overlap),
            ("indexing", self.indexing),
            ("uncrossable_breaks", self.uncrossable_breaks),
        ] {
            if let Some(data) = value {
                out.push((name.to_string(), data));
            }
        }
        out.push(("raw_bytes".to_string(), self.raw_bytes));
        out
    }
}

/// A decompressed text record.
#[derive(Debug, Clone)]
pub struct TextRecord<'a> {
    /// Position in the record table.
    pub idx: usize,
    /// Decompressed content without the trailing entries.
    pub raw: Vec<u8>,
    pub trailing_data: TrailingData<'a>,
}

impl<'a> TextRecord<'a> {
    pub fn new(
        idx: usize,
        record: &Record<'a>,
        extra_data_flags: u32,
        codec: &mut TextCodec,
    ) -> Result<Self> {
        let (entries, content) = split_trailing_entries(record.raw, extra_data_flags);
        let mut trailing_data = TrailingData {
            raw_bytes: &record.raw[content.len()..],
            ..TrailingData::default()
        };

        for (num, data) in entries {
            match num {
                0 => trailing_data.multibyte_overlap = Some(data),
                1 => trailing_data.indexing = Some(data),
                2 => trailing_data.uncrossable_breaks = Some(data),
                _ => {
                    warn!(
                        "Record {idx} has unknown trailing data of type: {num} : {}",
                        repr_bytes(data)
                    );
                    trailing_data.unknown.push((num, data));
                }
            }
        }

        let raw = codec.decompress(content)?;
        trace!(
            "Text record {idx}: {} stored bytes, {} decompressed",
            content.len(),
            raw.len()
        );

        Ok(Self {
            idx,
            raw,
            trailing_data,
        })
    }

    pub fn indexing_bytes(&self) -> &'a [u8] {
        self.trailing_data.indexing.unwrap_or_default()
    }

    /// Write `NNNNNN.txt` and `NNNNNN.trailing_data` into `dir`.
    pub fn dump(&self, dir: &Path) -> Result<()> {
        let name = format!("{:06}", self.idx);
        fs::write(dir.join(format!("{name}.txt")), &self.raw)?;

        let mut trailing = String::new();
        for (key, value) in self.trailing_data.entries() {
            trailing.push_str(&format!("{key} : {}\n\n", repr_bytes(value)));
        }
        fs::write(dir.join(format!("{name}.trailing_data")), trailing)?;
        Ok(())
    }
}

/// A record recognised as an image by its leading bytes.
#[derive(Debug, Clone)]
pub struct ImageRecord<'a> {
    /// 1-based position among the non-text records.
    pub idx: usize,
    pub record_idx: usize,
    pub raw: &'a [u8],
    pub info: ImageInfo,
}

impl ImageRecord<'_> {
    pub fn name(&self) -> String {
        format!("{:06}.{}", self.idx, self.info.format.extension())
    }

    pub fn dump(&self, dir: &Path) -> Result<()> {
        fs::write(dir.join(self.name()), self.raw)?;
        Ok(())
    }
}

/// Any other record after the text, labelled by its signature when known.
#[derive(Debug, Clone)]
pub struct BinaryRecord<'a> {
    pub idx: usize,
    pub raw: &'a [u8],
    /// `FCIS`, `FDST`, ... or `EOF`; `None` when unlabelled.
    pub signature: Option<&'static str>,
}

impl<'a> BinaryRecord<'a> {
    pub fn new(idx: usize, raw: &'a [u8]) -> Self {
        Self {
            idx,
            raw,
            signature: binary_signature(raw),
        }
    }

    pub fn name(&self) -> String {
        match self.signature {
            Some(sig) => format!("{:06}-{sig}", self.idx),
            None => format!("{:06}", self.idx),
        }
    }

    pub fn dump(&self, dir: &Path) -> Result<()> {
        fs::write(dir.join(format!("{}.bin", self.name())), self.raw)?;
        Ok(())
    }
}

fn binary_signature(raw: &[u8]) -> Option<&'static str> {
    let sig = raw.get(..4)?;
    if sig == EOF_SIGNATURE {
        return Some("EOF");
    }
    BINARY_SIGNATURES
        .iter()
        .find(|s| s.as_bytes() == sig)
        .copied()
}

/// A `FONT` record. A reader failure is kept on the record.
#[derive(Debug)]
pub struct FontRecord<'a> {
    pub idx: usize,
    pub raw: &'a [u8],
    pub font: Result<FontPayload>,
}

impl<'a> FontRecord<'a> {
    pub fn new(idx: usize, raw: &'a [u8]) -> Self {
        let font = read_font_record(raw);
        if let Err(e) = &font {
            warn!("Record {idx}: {e}");
        }
        Self { idx, raw, font }
    }

    pub fn extension(&self) -> &'static str {
        match &self.font {
            Ok(font) => font.ext,
            Err(_) => "failed",
        }
    }

    pub fn name(&self) -> String {
        format!("{:06}.{}", self.idx, self.extension())
    }

    /// Decoded font bytes, or the raw record when decoding failed or produced nothing.
    pub fn payload(&self) -> &[u8] {
        match &self.font {
            Ok(font) if !font.data.is_empty() => &font.data,
            _ => self.raw,
        }
    }

    pub fn dump(&self, dir: &Path) -> Result<()> {
        fs::write(dir.join(self.name()), self.payload())?;
        Ok(())
    }
}

/// Non-text records sorted by kind.
#[derive(Debug, Default)]
pub struct Classified<'a> {
    pub images: Vec<ImageRecord<'a>>,
    pub binaries: Vec<BinaryRecord<'a>>,
    pub fonts: Vec<FontRecord<'a>>,
}

/// Whether a record's signature rules it out as an image.
fn is_known_non_image(raw: &[u8]) -> bool {
    matches!(raw.get(..4), Some(b"FONT")) || binary_signature(raw).is_some()
}

/// Sort the records from `first_non_book` onwards.
///
/// Records for which `skip` holds (index and Huffman records) are left
/// out. Image sniffing is only attempted at or after `first_image`.
pub fn classify<'a>(
    records: &[Record<'a>],
    first_non_book: usize,
    first_image: usize,
    skip: impl Fn(usize) -> bool,
) -> Classified<'a> {
    let mut out = Classified::default();
    let mut image_index = 0;

    for (i, record) in records.iter().enumerate().skip(first_non_book) {
        if skip(i) {
            continue;
        }
        image_index += 1;
        let raw = record.raw;

        let info = if i >= first_image && !is_known_non_image(raw) {
            identify_image(raw)
        } else {
            None
        };

        if let Some(info) = info {
            out.images.push(ImageRecord {
                idx: image_index,
                record_idx: i,
                raw,
                info,
            });
        } else if raw.starts_with(b"FONT") {
            out.fonts.push(FontRecord::new(i, raw));
        } else {
            out.binaries.push(BinaryRecord::new(i, raw));
        }
    }

    trace!(
        "Classified {} images, {} fonts, {} binary records",
        out.images.len(),
        out.fonts.len(),
        out.binaries.len()
    );
    out
}
