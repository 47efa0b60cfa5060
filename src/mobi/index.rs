//! Index parsing (INDX, TAGX, IDXT)
//!
//! MOBI files carry up to two index tables, each made of an `INDX` header
//! record followed by data records and CNCX string records:
//! - Primary index: the NCX (table of contents, or sections and articles of
//!   a periodical)
//! - Secondary index: a small companion table whose entries describe the
//!   tag types used by the primary index
//!
//! The header embeds a `TAGX` table describing how entries encode their
//! tags. Each entry starts with `control_byte_count` control bytes; every
//! TAGX entry selects bits of one control byte through its bitmask, and an
//! EOF entry moves on to the next control byte.

use std::collections::HashMap;

use log::{debug, trace, warn};

use super::bytes::{ByteCursor, decint, decint_terminated, decode_hex_number};
use crate::error::{Error, Result};
use crate::util::{self, TextEncoding};

/// TAGX entry: defines how to interpret index entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagX {
    pub tag: u8,
    pub num_values: u8,
    pub bitmask: u8,
    pub eof: u8,
}

impl TagX {
    /// The all-zero sentinel terminating a control byte's tags.
    pub fn is_eof(&self) -> bool {
        self.eof == 1 && self.tag == 0 && self.num_values == 0 && self.bitmask == 0
    }
}

/// Parse a TAGX section.
///
/// Returns `(header_length, control_byte_count, entries)`; entries are read
/// from offset 12 up to the declared header length.
pub fn parse_tagx_section(data: &[u8]) -> Result<(u32, u32, Vec<TagX>)> {
    let c = ByteCursor::new(data, "TAGX section");
    if !c.has_tag(0, b"TAGX") {
        return Err(Error::format("Invalid TAGX section"));
    }

    let header_length = c.u32_be(4)?;
    let control_byte_count = c.u32_be(8)?;
    if header_length < 12 {
        return Err(Error::format(format!(
            "TAGX header length {header_length} is too small"
        )));
    }
    let body = c.bytes(12, header_length as usize - 12)?;

    let entries = body
        .chunks_exact(4)
        .map(|q| TagX {
            tag: q[0],
            num_values: q[1],
            bitmask: q[2],
            eof: q[3],
        })
        .collect();

    Ok((header_length, control_byte_count, entries))
}

/// Identifier of the last entry, as stored after the TAGX table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LastEntry<'a> {
    /// Primary index: a hex number checked against the NCX count.
    Number(u32),
    /// Secondary index: length-prefixed bytes, kept as is.
    Raw(&'a [u8]),
}

/// Fields only one of the two index header layouts carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexKind<'a> {
    Primary {
        header_type: u32,
        possibly_language: &'a [u8],
    },
    Secondary {
        unknown2: &'a [u8],
    },
}

/// Parsed `INDX` header record of a primary or secondary index.
#[derive(Debug, Clone)]
pub struct IndexHeader<'a> {
    pub raw: &'a [u8],
    pub kind: IndexKind<'a>,
    pub header_length: u32,
    /// Bytes 8..12 (primary) or 8..16 (secondary).
    pub unknown1: &'a [u8],
    pub index_type: u32,
    pub idxt_start: u32,
    /// Number of index data records following the header.
    pub index_count: u32,
    pub encoding_raw: u32,
    pub encoding: TextEncoding,
    pub num_index_entries: u32,
    pub ordt_start: u32,
    pub ligt_start: u32,
    pub num_of_ligt_entries: u32,
    pub num_of_cncx_blocks: u32,
    /// Bytes 56..180.
    pub unknown_block: &'a [u8],
    pub tagx_offset: u32,
    /// Bytes 184..header_length.
    pub unknown_tail: &'a [u8],
    pub tagx_header_length: u32,
    pub tagx_control_byte_count: u32,
    pub tagx_entries: Vec<TagX>,
    pub last_entry: LastEntry<'a>,
    pub ncx_count: u16,
}

impl<'a> IndexHeader<'a> {
    /// Parse the primary index header, including the last-entry check.
    pub fn parse_primary(raw: &'a [u8]) -> Result<Self> {
        Self::parse(raw, true)
    }

    /// Parse the secondary index header.
    pub fn parse_secondary(raw: &'a [u8]) -> Result<Self> {
        Self::parse(raw, false)
    }

    fn parse(raw: &'a [u8], primary: bool) -> Result<Self> {
        let label = if primary { "Primary" } else { "Secondary" };
        let c = ByteCursor::new(raw, "index header");
        if !c.has_tag(0, b"INDX") {
            return Err(Error::format(format!("Invalid {label} Index Record")));
        }

        let header_length = c.u32_be(4)?;
        let (unknown1, kind) = if primary {
            (
                c.bytes(8, 4)?,
                IndexKind::Primary {
                    header_type: c.u32_be(12)?,
                    possibly_language: c.bytes(32, 4)?,
                },
            )
        } else {
            (
                c.bytes(8, 8)?,
                IndexKind::Secondary {
                    unknown2: c.bytes(32, 4)?,
                },
            )
        };

        let encoding_raw = c.u32_be(28)?;
        let encoding = TextEncoding::from_codepage(encoding_raw).ok_or_else(|| {
            Error::format(format!("Unknown index encoding: {encoding_raw}"))
        })?;

        let tagx_offset = c.u32_be(180)?;
        if tagx_offset != header_length {
            return Err(Error::format("TAGX offset and header length disagree"));
        }
        let hl = header_length as usize;
        let unknown_tail = c.bytes(184, hl.saturating_sub(184))?;

        let (tagx_header_length, tagx_control_byte_count, tagx_entries) =
            parse_tagx_section(c.tail(hl)?)?;
        if !tagx_entries.last().is_some_and(TagX::is_eof) {
            return Err(Error::format("TAGX last entry is not EOF"));
        }

        let idxt0_pos = hl + tagx_header_length as usize;
        let (last_entry, count_pos) = if primary {
            let (num, consumed) = decode_hex_number(c.tail(idxt0_pos)?)?;
            (LastEntry::Number(num), idxt0_pos + consumed)
        } else {
            let num = c.u8_at(idxt0_pos)? as usize;
            (
                LastEntry::Raw(c.bytes(idxt0_pos + 1, num)?),
                idxt0_pos + 1 + num,
            )
        };
        let ncx_count = c.u16_be(count_pos)?;

        if let LastEntry::Number(num) = last_entry
            && num as i64 != ncx_count as i64 - 1
        {
            return Err(Error::format(format!(
                "Last id number in the NCX ({num}) != NCX count - 1 ({ncx_count} - 1)"
            )));
        }

        let idxt_start = c.u32_be(20)?;
        check_idxt(
            &c,
            idxt_start as usize,
            header_length + tagx_header_length,
        )?;

        let header = Self {
            raw,
            kind,
            header_length,
            unknown1,
            index_type: c.u32_be(16)?,
            idxt_start,
            index_count: c.u32_be(24)?,
            encoding_raw,
            encoding,
            num_index_entries: c.u32_be(36)?,
            ordt_start: c.u32_be(40)?,
            ligt_start: c.u32_be(44)?,
            num_of_ligt_entries: c.u32_be(48)?,
            num_of_cncx_blocks: c.u32_be(52)?,
            unknown_block: c.bytes(56, 124)?,
            tagx_offset,
            unknown_tail,
            tagx_header_length,
            tagx_control_byte_count,
            tagx_entries,
            last_entry,
            ncx_count,
        };

        debug!(
            "{label} index header: records={} entries={} cncx={} tags={}",
            header.index_count,
            header.num_index_entries,
            header.num_of_cncx_blocks,
            header.tagx_entries.len()
        );
        Ok(header)
    }

    pub fn is_primary(&self) -> bool {
        matches!(self.kind, IndexKind::Primary { .. })
    }

    pub fn index_type_desc(&self) -> &'static str {
        match self.index_type {
            0 => "normal",
            2 => "inflection",
            6 => "calibre",
            _ => "unknown",
        }
    }
}

/// Validate the IDXT trailer of an index header.
fn check_idxt(c: &ByteCursor<'_>, idxt_start: usize, expected_len: u32) -> Result<()> {
    if !c.has_tag(idxt_start, b"IDXT") {
        return Err(Error::format("Invalid IDXT header"));
    }
    let length_check = c.u16_be(idxt_start + 4)?;
    if length_check as u32 != expected_len {
        return Err(Error::format(format!(
            "Length check failed: IDXT says {length_check}, header and TAGX span {expected_len}"
        )));
    }
    if !util::all_zero(c.tail(idxt_start + 6)?) {
        return Err(Error::format("Non null trailing bytes after IDXT"));
    }
    Ok(())
}

/// Tag values of one index entry, in TAGX order.
pub type TagMap = Vec<(u8, Vec<u32>)>;

/// A tag found in the control bytes, waiting for its values to be read.
struct PendingTag {
    tag: u8,
    value_count: Option<u32>,
    value_bytes: Option<u32>,
    num_values: u8,
}

/// Extract tag values from an index entry.
///
/// In strict mode running out of data or control bytes, overlapping
/// bitmasks within one control byte, a value-bytes length that does not
/// land on a value boundary and unprocessed non-NUL bytes are errors; in
/// lenient mode they are logged and decoding stops early.
pub fn get_tag_map(
    control_byte_count: u32,
    tagx: &[TagX],
    data: &[u8],
    strict: bool,
) -> Result<TagMap> {
    let cb = control_byte_count as usize;
    let Some(control_bytes) = data.get(..cb) else {
        return Err(Error::Truncated {
            context: "index entry control bytes",
            offset: 0,
            needed: cb,
            available: data.len(),
        });
    };
    let mut pos = cb;
    let mut control_idx = 0;
    let mut used_mask = 0u8;

    // First pass: determine which tags are present and their counts
    let mut pending: Vec<PendingTag> = Vec::new();

    for entry in tagx {
        if entry.eof == 0x01 {
            control_idx += 1;
            used_mask = 0;
            continue;
        }

        let Some(&control) = control_bytes.get(control_idx) else {
            if strict {
                return Err(Error::format(format!(
                    "TAGX entry for tag {} has no control byte",
                    entry.tag
                )));
            }
            break;
        };

        if entry.bitmask & used_mask != 0 {
            if strict {
                return Err(Error::format(format!(
                    "TAGX bitmask {:#010b} of tag {} overlaps another tag",
                    entry.bitmask, entry.tag
                )));
            }
            warn!("Overlapping TAGX bitmask for tag {}", entry.tag);
        }
        used_mask |= entry.bitmask;

        let value = control & entry.bitmask;
        if value == 0 {
            continue;
        }

        let (value_count, value_bytes) = if value == entry.bitmask {
            if entry.bitmask.count_ones() > 1 {
                // Variable width byte count follows, not a value count
                let Some((vb, consumed)) = read_value(data, pos, strict)? else {
                    return Err(entry_truncated(pos, data.len()));
                };
                pos += consumed;
                (None, Some(vb))
            } else {
                (Some(1), None)
            }
        } else {
            // Shift to get actual count
            let shift = entry.bitmask.trailing_zeros();
            (Some((value >> shift) as u32), None)
        };

        pending.push(PendingTag {
            tag: entry.tag,
            value_count,
            value_bytes,
            num_values: entry.num_values,
        });
    }

    // Second pass: read actual values
    let mut result = TagMap::with_capacity(pending.len());
    for p in pending {
        let mut values = Vec::new();

        if let Some(count) = p.value_count {
            for _ in 0..(count * p.num_values as u32) {
                let Some((v, consumed)) = read_value(data, pos, strict)? else {
                    warn!("Index entry ran out of bytes reading tag {}", p.tag);
                    break;
                };
                pos += consumed;
                values.push(v);
            }
        } else if let Some(bytes) = p.value_bytes {
            let mut consumed_total = 0;
            while consumed_total < bytes as usize {
                let Some((v, consumed)) = read_value(data, pos, strict)? else {
                    break;
                };
                pos += consumed;
                consumed_total += consumed;
                values.push(v);
            }
            if consumed_total != bytes as usize {
                let msg = format!(
                    "Should consume {bytes} bytes for tag {}, but consumed {consumed_total}",
                    p.tag
                );
                if strict {
                    return Err(Error::Format(msg));
                }
                warn!("{msg}");
            }
        }

        result.push((p.tag, values));
    }

    // Test that all bytes have been processed
    let rest = &data[pos..];
    if !util::all_zero(rest) {
        let msg = format!(
            "There are unprocessed index bytes left: {}",
            util::format_bytes(rest)
        );
        if strict {
            return Err(Error::Format(msg));
        }
        warn!("{msg}");
    }

    Ok(result)
}

/// Read one forward VWI at `pos`. `None` when no bytes are left.
///
/// A value cut off by the end of the entry is an error in strict mode and
/// is kept with a warning otherwise.
fn read_value(data: &[u8], pos: usize, strict: bool) -> Result<Option<(u32, usize)>> {
    let rest = &data[pos..];
    if let Some(value) = decint_terminated(rest) {
        return Ok(Some(value));
    }
    if strict {
        return Err(entry_truncated(pos, data.len()));
    }
    let (v, consumed) = decint(rest);
    if consumed == 0 {
        return Ok(None);
    }
    warn!("Unterminated index value at offset {pos}");
    Ok(Some((v, consumed)))
}

fn entry_truncated(offset: usize, len: usize) -> Error {
    Error::Truncated {
        context: "index entry values",
        offset,
        needed: 1,
        available: len.saturating_sub(offset),
    }
}

/// Decode a length-prefixed string, returning it and the bytes consumed.
///
/// Returns `None` when the bytes are not valid in `encoding`.
pub fn decode_string(data: &[u8], encoding: TextEncoding) -> Result<(Option<String>, usize)> {
    let c = ByteCursor::new(data, "index string");
    let length = c.u8_at(0)? as usize;
    let bytes = c.bytes(1, length)?;
    let text = util::decode_strict(bytes, encoding).map(|s| s.into_owned());
    Ok((text, length + 1))
}

/// Decode an entry identifier, falling back to UTF-16.
fn decode_ident(data: &[u8], encoding: TextEncoding) -> Result<(String, usize)> {
    let (text, consumed) = decode_string(data, encoding)?;
    let bytes = &data[1..consumed];
    let ident = match text {
        Some(s) if !s.contains('\0') => s,
        Some(s) => util::decode_utf16(bytes).unwrap_or_else(|| s.replace('\0', "")),
        None => util::decode_utf16(bytes).unwrap_or_else(|| {
            warn!(
                "Index entry identifier is not valid {} or UTF-16: {}",
                encoding.name(),
                util::format_bytes(bytes)
            );
            util::decode_lossy(bytes, encoding).into_owned()
        }),
    };
    Ok((ident, consumed))
}

/// Entries of an index, keyed by identifier in first-seen order.
///
/// A repeated identifier replaces the earlier tags but keeps its position.
#[derive(Debug, Default, Clone)]
pub struct IndexTable {
    entries: Vec<(String, TagMap)>,
    positions: HashMap<String, usize>,
}

impl IndexTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ident: String, tags: TagMap) {
        match self.positions.get(&ident) {
            Some(&i) => self.entries[i].1 = tags,
            None => {
                self.positions.insert(ident.clone(), self.entries.len());
                self.entries.push((ident, tags));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TagMap)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_entries(self) -> Vec<(String, TagMap)> {
        self.entries
    }
}

/// Parse one index data record into `table`.
///
/// Entry positions come from the record's IDXT table; the last entry ends
/// at the IDXT itself.
pub fn parse_index_record(
    table: &mut IndexTable,
    data: &[u8],
    control_byte_count: u32,
    tagx: &[TagX],
    encoding: TextEncoding,
    strict: bool,
) -> Result<()> {
    let c = ByteCursor::new(data, "index record");
    if !c.has_tag(0, b"INDX") {
        return Err(Error::format("Invalid Primary Index Record"));
    }

    let idxt_pos = c.u32_be(20)? as usize;
    let entry_count = c.u32_be(24)? as usize;
    if !c.has_tag(idxt_pos, b"IDXT") {
        if strict {
            return Err(Error::format(format!(
                "Index record has no IDXT at offset {idxt_pos}"
            )));
        }
        warn!("Invalid INDX record: no IDXT at offset {idxt_pos}");
    }

    let mut positions = Vec::with_capacity(entry_count + 1);
    for j in 0..entry_count {
        positions.push(c.u16_be(idxt_pos + 4 + 2 * j)? as usize);
    }
    positions.push(idxt_pos);

    for (j, pair) in positions.windows(2).enumerate() {
        let (start, end) = (pair[0], pair[1]);
        if start > end {
            return Err(Error::format(format!(
                "Index entry {j} starts at {start}, after its end {end}"
            )));
        }
        let rec = c.bytes(start, end - start)?;
        let (ident, consumed) = decode_ident(rec, encoding)?;
        let tags = get_tag_map(control_byte_count, tagx, &rec[consumed..], strict)?;
        trace!("index entry {ident:?}: {} tags", tags.len());
        table.insert(ident, tags);
    }

    Ok(())
}
