//! PalmDB container: the 78-byte database header and the record table.

use chrono::{DateTime, Utc};
use log::{debug, trace};

use super::bytes::ByteCursor;
use crate::error::{Error, Result};

/// Size of the fixed PalmDB header.
pub const PALMDB_HEADER_LEN: usize = 78;
/// Size of one record-table entry.
pub const RECORD_ENTRY_LEN: usize = 8;

/// Seconds between the Palm epoch (1904-01-01) and the Unix epoch.
const PALM_EPOCH_OFFSET: i64 = 2_082_844_800;

/// Named bits of the PalmDB attribute word.
///
/// Several of these overlap (0x12 and 0x14 share bits with 0x02/0x04/0x10);
/// each is tested independently against the word.
pub const PALM_ATTRIBUTES: &[(&str, u16)] = &[
    ("Read Only", 0x02),
    ("Dirty AppInfoArea", 0x04),
    ("Backup this database", 0x08),
    (
        "Okay to install newer over existing copy, if present on PalmPilot",
        0x10,
    ),
    (
        "Force the PalmPilot to reset after this database is installed",
        0x12,
    ),
    ("Don't allow copy of file to be beamed to other Pilot", 0x14),
];

/// Attribute word of a PalmDB header (stored little-endian in MOBI files).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PalmAttributes(pub u16);

impl PalmAttributes {
    /// Each named attribute with whether any of its bits are set.
    pub fn flags(self) -> impl Iterator<Item = (&'static str, bool)> {
        PALM_ATTRIBUTES
            .iter()
            .map(move |&(name, mask)| (name, self.0 & mask != 0))
    }
}

/// A PalmDB timestamp: seconds since 1904-01-01 UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PalmDate {
    pub raw: u32,
}

impl PalmDate {
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.raw as i64 - PALM_EPOCH_OFFSET, 0)
    }
}

/// The fixed PalmDB database header.
#[derive(Debug, Clone)]
pub struct PalmDbHeader<'a> {
    pub raw: &'a [u8],
    pub name: Vec<u8>,
    pub attributes: PalmAttributes,
    pub version: u16,
    pub creation_date: PalmDate,
    pub modification_date: PalmDate,
    pub last_backup_date: PalmDate,
    pub modification_number: u32,
    pub app_info_id: &'a [u8],
    pub sort_info_id: &'a [u8],
    pub type_id: &'a [u8],
    pub creator: &'a [u8],
    pub last_record_uid: u32,
    pub next_rec_list_id: &'a [u8],
    pub number_of_records: u16,
}

impl<'a> PalmDbHeader<'a> {
    /// Parse the PalmDB header from the start of the stream.
    ///
    /// Topaz files are reported as [`Error::UnsupportedFormat`]; any type and
    /// creator pair other than `BOOKMOBI` or `TEXtREAd` is a format error.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if data.starts_with(b"TPZ") {
            return Err(Error::UnsupportedFormat("This is a Topaz file".into()));
        }

        let c = ByteCursor::new(data, "PalmDB header");
        let raw = c.bytes(0, PALMDB_HEADER_LEN)?;

        let type_id = c.bytes(60, 4)?;
        let creator = c.bytes(64, 4)?;
        let ident = &raw[60..68];
        if ident != b"BOOKMOBI" && !ident.eq_ignore_ascii_case(b"TEXTREAD") {
            return Err(Error::format(format!(
                "Unknown book ident: {}",
                crate::util::repr_bytes(ident)
            )));
        }

        let name = raw[..32].iter().copied().filter(|&b| b != 0).collect();

        let header = Self {
            raw,
            name,
            attributes: PalmAttributes(c.u16_le(32)?),
            version: c.u16_be(34)?,
            creation_date: PalmDate { raw: c.u32_be(36)? },
            modification_date: PalmDate { raw: c.u32_be(40)? },
            last_backup_date: PalmDate { raw: c.u32_be(44)? },
            modification_number: c.u32_be(48)?,
            app_info_id: c.bytes(52, 4)?,
            sort_info_id: c.bytes(56, 4)?,
            type_id,
            creator,
            last_record_uid: c.u32_be(68)?,
            next_rec_list_id: c.bytes(72, 4)?,
            number_of_records: c.u16_be(76)?,
        };

        debug!(
            "PalmDB header: ident={} records={}",
            crate::util::repr_bytes(ident),
            header.number_of_records
        );
        Ok(header)
    }

    /// The 8-byte type+creator identifier.
    pub fn ident(&self) -> &'a [u8] {
        &self.raw[60..68]
    }
}

/// One record of the container: its table entry plus its raw bytes.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub offset: u32,
    pub flags: u8,
    pub uid: u32,
    pub raw: &'a [u8],
}

impl<'a> Record<'a> {
    /// Leading 4 bytes, or fewer for short records.
    pub fn signature(&self) -> &'a [u8] {
        &self.raw[..self.raw.len().min(4)]
    }
}

/// Read the record table following the header and slice every record.
///
/// Offsets must be non-decreasing and lie within the stream; record `i`
/// spans `[offset[i], offset[i+1])` and the last record runs to the end of
/// the stream.
pub fn read_records<'a>(data: &'a [u8], header: &PalmDbHeader<'_>) -> Result<Vec<Record<'a>>> {
    let count = header.number_of_records as usize;
    let table = ByteCursor::new(data, "record table");
    table.bytes(PALMDB_HEADER_LEN, count * RECORD_ENTRY_LEN)?;

    let mut entries = Vec::with_capacity(count);
    for i in 0..count {
        let pos = PALMDB_HEADER_LEN + i * RECORD_ENTRY_LEN;
        let offset = table.u32_be(pos)?;
        let flags = table.u8_at(pos + 4)?;
        let uid = table.u24_be(pos + 5)?;
        entries.push((offset, flags, uid));
    }

    let mut records = Vec::with_capacity(count);
    for (i, &(offset, flags, uid)) in entries.iter().enumerate() {
        let start = offset as usize;
        let end = match entries.get(i + 1) {
            Some(&(next, _, _)) => next as usize,
            None => data.len(),
        };
        if start > end {
            return Err(Error::format(format!(
                "Record {i} offset {start} is past the next record offset {end}"
            )));
        }
        if end > data.len() {
            return Err(Error::format(format!(
                "Record {i} ends at {end}, beyond the end of the file ({})",
                data.len()
            )));
        }
        trace!("record {i}: offset={start} size={}", end - start);
        records.push(Record {
            offset,
            flags,
            uid,
            raw: &data[start..end],
        });
    }

    Ok(records)
}
