//! TBS (trailing byte sequence) indexing.
//!
//! Every text record of an indexed book may carry a short byte sequence in
//! its `indexing` trailing entry describing which index entries start, end
//! or continue inside it. For periodicals the sequence is a series of
//! section transitions, each relative to the section the previous one left
//! off at. Decoding is best effort: a record whose bytes cannot be
//! interpreted is logged and reported, and the scan moves on.

use std::fmt;

use log::{debug, warn};

use super::bytes::{decint, decode_fvwi};
use super::headers::DocType;
use super::records::TextRecord;
use super::tags::{EntryId, IndexEntry};
use crate::error::{Error, Result};

/// Optional values following the leading value of a TBS sequence, keyed by
/// the flag bit that announced them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TbsExtra {
    /// `0b1000`: only seen when four flag bits are in use.
    pub next_section: bool,
    /// `0b0010`
    pub unknown: Option<u32>,
    /// `0b0100`: number of articles.
    pub count: Option<u8>,
    /// `0b0001`: offset to the next section, 0 when one article spans the record.
    pub offset: Option<u32>,
}

impl TbsExtra {
    /// OR of the flag bits that are present.
    pub fn flags(&self) -> u8 {
        let mut flags = 0;
        if self.next_section {
            flags |= 0b1000;
        }
        if self.count.is_some() {
            flags |= 0b0100;
        }
        if self.unknown.is_some() {
            flags |= 0b0010;
        }
        if self.offset.is_some() {
            flags |= 0b0001;
        }
        flags
    }

    pub fn len(&self) -> usize {
        self.flags().count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.flags() == 0
    }
}

impl fmt::Display for TbsExtra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.next_section {
            parts.push("1000: true".to_string());
        }
        if let Some(v) = self.count {
            parts.push(format!("0100: {v}"));
        }
        if let Some(v) = self.unknown {
            parts.push(format!("0010: {v}"));
        }
        if let Some(v) = self.offset {
            parts.push(format!("0001: {v}"));
        }
        write!(f, "{{{}}}", parts.join(", "))
    }
}

/// Decode one TBS value and the extras its flags announce.
///
/// Returns `(value, extra, consumed)`.
pub fn decode_tbs(data: &[u8], flag_size: u32) -> Result<(u32, TbsExtra, usize)> {
    let (value, flags, mut consumed) = decode_fvwi(data, flag_size);
    let mut extra = TbsExtra::default();

    if flags & 0b1000 != 0 && flag_size > 3 {
        extra.next_section = true;
    }
    if flags & 0b0010 != 0 {
        let (x, n) = decint(&data[consumed..]);
        extra.unknown = Some(x);
        consumed += n;
    }
    if flags & 0b0100 != 0 {
        let count = data.get(consumed).copied().ok_or(Error::Truncated {
            context: "TBS article count",
            offset: consumed,
            needed: 1,
            available: 0,
        })?;
        extra.count = Some(count);
        consumed += 1;
    }
    if flags & 0b0001 != 0 {
        let (x, n) = decint(&data[consumed..]);
        extra.offset = Some(x);
        consumed += n;
    }

    Ok((value, extra, consumed))
}

/// One interpreted statement about a periodical record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TbsEvent {
    StartingSection {
        section: u32,
    },
    StartingSectionCount {
        section: u32,
        count: u8,
    },
    StartingSectionSeveral {
        section: u32,
    },
    LastArticle {
        section: u32,
        next_section: u32,
        relative: u32,
    },
    FirstArticle {
        section: u32,
        relative: u32,
    },
    ArticleCount {
        section: u32,
        count: u8,
    },
    AtMostOneArticle {
        section: u32,
    },
    SpannedBy {
        article: u32,
    },
    NextSectionOffset {
        next_section: u32,
        offset: u32,
        record_offset: u64,
    },
}

impl fmt::Display for TbsEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            TbsEvent::StartingSection { section } => {
                write!(f, "The section at the start of this record is: {section}")
            }
            TbsEvent::StartingSectionCount { section, count } => write!(
                f,
                "The number of articles from the section {section} in this record: {count}"
            ),
            TbsEvent::StartingSectionSeveral { section } => write!(
                f,
                "??This record has more than one article from the section: {section}"
            ),
            TbsEvent::LastArticle {
                section,
                next_section,
                relative,
            } => write!(
                f,
                "Last article in this record of section {section} (relative to next \
                 section index [{next_section}]): {relative} [{} absolute index]",
                relative as u64 + next_section as u64
            ),
            TbsEvent::FirstArticle { section, relative } => write!(
                f,
                "First article in this record of section {section} (relative to its \
                 parent section): {relative} [{} absolute index]",
                relative as u64 + section as u64
            ),
            TbsEvent::ArticleCount { section, count } => write!(
                f,
                "Number of articles in this record of section {section}: {count}"
            ),
            TbsEvent::AtMostOneArticle { section } => write!(
                f,
                "The section {section} has at most one article in this record"
            ),
            TbsEvent::SpannedBy { article } => {
                write!(f, "This record is spanned by the article:{article}")
            }
            TbsEvent::NextSectionOffset {
                next_section,
                offset,
                record_offset,
            } => write!(
                f,
                "->Offset to start of next section ({next_section}) from start of \
                 record: {offset} [{} absolute offset]",
                offset as u64 + record_offset
            ),
        }
    }
}

/// Periodical interpretation of one record's TBS bytes.
///
/// Holds the section cursor explicitly; each step reads from the front of
/// `rest` and appends to `events`.
struct PeriodicalScan<'e, 'b> {
    entries: &'e [IndexEntry],
    record_offset: u64,
    rest: &'b [u8],
    events: Vec<TbsEvent>,
}

impl<'e, 'b> PeriodicalScan<'e, 'b> {
    fn section(&self, idx: u64) -> std::result::Result<u32, String> {
        let found = u32::try_from(idx).ok().filter(|&n| {
            self.entries
                .iter()
                .any(|e| matches!(e.index, EntryId::Number(i) if i == n))
        });
        found.ok_or_else(|| format!("Index {idx} not found"))
    }

    fn read_value(&mut self) -> std::result::Result<(u32, TbsExtra), String> {
        let (value, extra, consumed) = decode_tbs(self.rest, 4).map_err(|e| e.to_string())?;
        self.rest = &self.rest[consumed..];
        Ok((value, extra))
    }

    fn read_starting_section(&mut self) -> std::result::Result<u32, String> {
        let orig = self.rest;
        let (si, extra) = self.read_value()?;
        if extra.len() > 1 || extra.unknown.is_some() || extra.next_section {
            return Err(format!(
                "Dont know how to interpret flags {extra} when reading starting section"
            ));
        }

        let section = self.section(si as u64)?;
        self.events.push(TbsEvent::StartingSection { section });
        if let Some(count) = extra.count {
            self.events
                .push(TbsEvent::StartingSectionCount { section, count });
        } else if let Some(eof) = extra.offset {
            if eof != 0 {
                return Err(format!(
                    "Unknown eof value {eof} when reading starting section. All bytes: {orig:02x?}"
                ));
            }
            self.events.push(TbsEvent::StartingSectionSeveral { section });
        }
        Ok(section)
    }

    fn read_section_transitions(&mut self, mut section: u32) -> std::result::Result<(), String> {
        while !self.rest.is_empty() {
            let (ai, extra) = self.read_value()?;
            if extra.unknown.is_some() {
                return Err(
                    "Dont know how to interpret flag 0b0010 while reading section transitions"
                        .into(),
                );
            }

            if extra.next_section {
                if extra.len() > 1 {
                    return Err(format!(
                        "Dont know how to interpret flags {extra} while reading section transitions"
                    ));
                }
                let next_section = self.section(section as u64 + 1)?;
                self.events.push(TbsEvent::LastArticle {
                    section,
                    next_section,
                    relative: ai,
                });
                section = next_section;
                continue;
            }

            self.events.push(TbsEvent::FirstArticle {
                section,
                relative: ai,
            });
            self.events.push(match extra.count {
                Some(count) => TbsEvent::ArticleCount { section, count },
                None => TbsEvent::AtMostOneArticle { section },
            });

            match extra.offset {
                Some(0) => self.events.push(TbsEvent::SpannedBy {
                    article: ai.saturating_add(section),
                }),
                Some(offset) => self.events.push(TbsEvent::NextSectionOffset {
                    next_section: section.saturating_add(1),
                    offset,
                    record_offset: self.record_offset,
                }),
                None => {}
            }
        }
        Ok(())
    }

    fn run(&mut self, tbs_type: u8) -> std::result::Result<(), String> {
        let start = if tbs_type & 0b0100 != 0 {
            self.section(1)?
        } else {
            self.read_starting_section()?
        };
        self.read_section_transitions(start)
    }
}

/// Decoded TBS bytes of one text record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TbsDecoded<'a> {
    /// OR of the flags on the leading value.
    pub tbs_type: u8,
    pub outermost_index: u32,
    pub extra: TbsExtra,
    /// Periodical statements, in decode order.
    pub events: Vec<TbsEvent>,
    /// Why periodical interpretation stopped, when it failed.
    pub error: Option<String>,
    /// Bytes left undecoded.
    pub remaining: &'a [u8],
}

/// Index entries touching one text record, and its decoded TBS bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TbsRecord<'a> {
    /// Position of the text record in the record table.
    pub idx: usize,
    /// Offset of the record's first byte in the text.
    pub start: i64,
    /// Offset of the record's last byte in the text.
    pub end: i64,
    /// Positions in the entry list of entries starting and ending here.
    pub complete: Vec<usize>,
    /// Entries starting here and ending later.
    pub starts: Vec<usize>,
    /// Entries starting earlier and ending here.
    pub ends: Vec<usize>,
    /// Entries starting before and ending after this record.
    pub spans: Vec<usize>,
    pub bytes: &'a [u8],
    /// `None` when the record carries no TBS bytes.
    pub decoded: Option<TbsDecoded<'a>>,
}

impl TbsRecord<'_> {
    pub fn tbs_type(&self) -> u8 {
        self.decoded.as_ref().map_or(0, |d| d.tbs_type)
    }
}

/// TBS view of every text record.
///
/// For each record, `starts`, `ends` and `complete` partition the index
/// entries that start or end inside the record's byte range: every such
/// entry is in exactly one of them. Entries that start before the record
/// and end after it touch no endpoint there and are listed in `spans`
/// instead. Entries entirely outside the record are in none of the four.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TbsIndexing<'a> {
    pub doc_type: DocType,
    pub records: Vec<TbsRecord<'a>>,
}

impl<'a> TbsIndexing<'a> {
    pub fn new(text_records: &[TextRecord<'a>], entries: &[IndexEntry], doc_type: DocType) -> Self {
        let mut pos: i64 = 0;
        let mut records = Vec::with_capacity(text_records.len());

        for text in text_records {
            let start = pos;
            pos += text.raw.len() as i64;
            let end = pos - 1;

            let mut record = TbsRecord {
                idx: text.idx,
                start,
                end,
                complete: Vec::new(),
                starts: Vec::new(),
                ends: Vec::new(),
                spans: Vec::new(),
                bytes: text.indexing_bytes(),
                decoded: None,
            };

            for (i, entry) in entries.iter().enumerate() {
                let (istart, iend) = entry.byte_range();
                let has_start = (start..=end).contains(&istart);
                let has_end = (start..=end).contains(&iend);
                let bucket = match (has_start, has_end) {
                    (true, true) => &mut record.complete,
                    (true, false) => &mut record.starts,
                    (false, true) => &mut record.ends,
                    (false, false) if istart < start && iend > end => &mut record.spans,
                    (false, false) => continue,
                };
                bucket.push(i);
            }

            record.decoded = decode_record(&record, entries, doc_type);
            records.push(record);
        }

        debug!("TBS indexing: {} text records", records.len());
        Self { doc_type, records }
    }

    /// Records grouped by non-zero TBS type, in ascending type order.
    pub fn by_type(&self) -> Vec<(u8, Vec<&TbsRecord<'a>>)> {
        let mut groups: Vec<(u8, Vec<&TbsRecord<'a>>)> = Vec::new();
        for record in &self.records {
            let t = record.tbs_type();
            if t == 0 {
                continue;
            }
            match groups.iter_mut().find(|(k, _)| *k == t) {
                Some((_, group)) => group.push(record),
                None => groups.push((t, vec![record])),
            }
        }
        groups.sort_by_key(|(t, _)| *t);
        groups
    }
}

fn decode_record<'a>(
    record: &TbsRecord<'a>,
    entries: &[IndexEntry],
    doc_type: DocType,
) -> Option<TbsDecoded<'a>> {
    let bytes = record.bytes;
    if bytes.is_empty() {
        return None;
    }

    let (outermost_index, extra, consumed) = match decode_tbs(bytes, 3) {
        Ok(v) => v,
        Err(e) => {
            let err = Error::Tbs {
                record: record.idx,
                reason: e.to_string(),
            };
            warn!("{err}");
            return Some(TbsDecoded {
                tbs_type: 0,
                outermost_index: 0,
                extra: TbsExtra::default(),
                events: Vec::new(),
                error: Some(err.to_string()),
                remaining: bytes,
            });
        }
    };
    let tbs_type = extra.flags();
    let after_outer = &bytes[consumed..];

    let mut decoded = TbsDecoded {
        tbs_type,
        outermost_index,
        extra,
        events: Vec::new(),
        error: None,
        remaining: after_outer,
    };

    if doc_type.is_periodical() {
        let mut scan = PeriodicalScan {
            entries,
            record_offset: record.start.max(0) as u64,
            rest: after_outer,
            events: Vec::new(),
        };
        match scan.run(tbs_type) {
            Ok(()) => decoded.remaining = scan.rest,
            Err(reason) => {
                let err = Error::Tbs {
                    record: record.idx,
                    reason,
                };
                warn!("{err}");
                decoded.error = Some(err.to_string());
            }
        }
        decoded.events = scan.events;
    }

    Some(decoded)
}
