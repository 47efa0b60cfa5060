//! CNCX (compiled NCX): the string table referenced by index entries.

use std::borrow::Cow;
use std::collections::BTreeMap;

use log::{trace, warn};

use super::bytes::decint;
use crate::util::{self, TextEncoding};

/// Offset stride between consecutive CNCX records.
pub const CNCX_RECORD_STRIDE: u32 = 0x10000;

/// One string of the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CncxString<'a> {
    Text(String),
    /// Bytes that did not decode, from the bad string to the record end.
    Undecodable(&'a [u8]),
}

impl CncxString<'_> {
    /// The text, or the hex dump of undecodable bytes.
    pub fn as_str(&self) -> Cow<'_, str> {
        match self {
            CncxString::Text(s) => Cow::Borrowed(s),
            CncxString::Undecodable(raw) => Cow::Owned(util::format_bytes(raw)),
        }
    }
}

/// Offset-keyed string table built from the CNCX records of an index.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Cncx<'a> {
    pub strings: BTreeMap<u32, CncxString<'a>>,
}

impl<'a> Cncx<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse CNCX records.
    ///
    /// Each record is a run of VWI-length-prefixed strings, keyed by their
    /// position plus `0x10000` per preceding record. A string that fails to
    /// decode is stored as raw bytes and ends the scan of its record.
    pub fn parse<I>(records: I, encoding: TextEncoding) -> Self
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut strings = BTreeMap::new();
        let mut record_offset: u32 = 0;

        for raw in records {
            let mut pos = 0;
            while pos < raw.len() {
                let (length, consumed) = decint(&raw[pos..]);
                let length = length as usize;
                if length > 0 {
                    let key = record_offset + pos as u32;
                    let start = pos + consumed;
                    let decoded = raw
                        .get(start..start + length)
                        .and_then(|bytes| util::decode_strict(bytes, encoding));
                    match decoded {
                        Some(text) => {
                            trace!("CNCX {key}: {text:?}");
                            strings.insert(key, CncxString::Text(text.into_owned()));
                        }
                        None => {
                            let rest = &raw[pos..];
                            warn!(
                                "CNCX entry at offset {key} has unknown format {}",
                                util::format_bytes(rest)
                            );
                            strings.insert(key, CncxString::Undecodable(rest));
                            break;
                        }
                    }
                }
                pos += consumed + length;
            }
            record_offset = record_offset.wrapping_add(CNCX_RECORD_STRIDE);
        }

        Self { strings }
    }

    pub fn get(&self, offset: u32) -> Option<&CncxString<'a>> {
        self.strings.get(&offset)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
