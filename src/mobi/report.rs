//! Human-readable reports of a decoded file.
//!
//! Each structure gets a `Display` implementation producing the text that
//! ends up in `header.txt`, `index.txt` and the TBS files of a dump.

use std::fmt::{self, Display, Formatter};

use super::cncx::Cncx;
use super::file::MobiFile;
use super::headers::{ExthHeader, ExthValue, MobiHeader, NULL_INDEX};
use super::index::{IndexHeader, IndexKind, LastEntry, TagX};
use super::palmdb::{PalmDate, PalmDbHeader, Record};
use super::tags::{IndexEntry, Tag};
use super::tbs::{TbsIndexing, TbsRecord};
use crate::util::{all_zero, format_bytes, repr_bytes};

/// Bytes of reconstructed text shown around each index entry boundary.
const CONTEXT_LEN: usize = 50;

fn banner(f: &mut Formatter<'_>, title: &str) -> fmt::Result {
    let stars = "*".repeat(20);
    writeln!(f, "{stars} {title} {stars}")
}

fn unknown(f: &mut Formatter<'_>, label: &str, bytes: &[u8]) -> fmt::Result {
    writeln!(
        f,
        "{label}: {} ({} bytes) (All zeros: {})",
        repr_bytes(bytes),
        bytes.len(),
        all_zero(bytes)
    )
}

fn date(d: PalmDate) -> String {
    match d.to_datetime() {
        Some(dt) => format!("{} ({})", dt.to_rfc3339(), d.raw),
        None => d.raw.to_string(),
    }
}

// ============================================================================
// PalmDB
// ============================================================================

impl Display for PalmDbHeader<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        banner(f, "PalmDB Header")?;
        writeln!(f, "Name: {}", repr_bytes(&self.name))?;
        writeln!(f, "PalmDOC Attributes: {:#b}", self.attributes.0)?;
        for (name, set) in self.attributes.flags() {
            writeln!(f, "\t{name}: {set}")?;
        }
        writeln!(f, "Version: {}", self.version)?;
        writeln!(f, "Creation date: {}", date(self.creation_date))?;
        writeln!(f, "Modification date: {}", date(self.modification_date))?;
        writeln!(f, "Backup date: {}", date(self.last_backup_date))?;
        writeln!(f, "Modification number: {}", self.modification_number)?;
        writeln!(f, "App Info ID: {}", repr_bytes(self.app_info_id))?;
        writeln!(f, "Sort Info ID: {}", repr_bytes(self.sort_info_id))?;
        writeln!(f, "Type: {}", repr_bytes(self.type_id))?;
        writeln!(f, "Creator: {}", repr_bytes(self.creator))?;
        writeln!(f, "Last record UID +1: {}", self.last_record_uid)?;
        writeln!(f, "Next record list id: {}", repr_bytes(self.next_rec_list_id))?;
        writeln!(f, "Number of records: {}", self.number_of_records)
    }
}

/// The record table, one line per record.
pub struct RecordTable<'r, 'a>(pub &'r [Record<'a>]);

impl Display for RecordTable<'_, '_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "Record headers:")?;
        for (i, r) in self.0.iter().enumerate() {
            writeln!(
                f,
                "{i:6}. Offset: {} Flags: {} UID: {} First 4 bytes: {} Size: {}",
                r.offset,
                r.flags,
                r.uid,
                repr_bytes(r.signature()),
                r.raw.len()
            )?;
        }
        Ok(())
    }
}

// ============================================================================
// MOBI / EXTH
// ============================================================================

impl Display for MobiHeader<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        banner(f, "MOBI Header")?;
        writeln!(
            f,
            "Compression: {} ({})",
            self.compression.description(),
            self.compression_raw
        )?;
        writeln!(f, "Unused: {}", repr_bytes(self.unused))?;
        writeln!(f, "Text length: {}", self.text_length)?;
        writeln!(f, "Number of text records: {}", self.number_of_text_records)?;
        writeln!(f, "Text record size: {}", self.text_record_size)?;
        writeln!(f, "Encryption: {}", self.encryption.description())?;
        writeln!(f, "Unknown: {}", repr_bytes(self.unknown))?;
        writeln!(f, "Identifier: {}", repr_bytes(self.identifier))?;
        writeln!(f, "Header length: {}", self.length)?;
        writeln!(f, "Type: {}", self.doc_type.description())?;
        writeln!(f, "Encoding: {}", self.encoding_name())?;
        writeln!(f, "UID: {}", repr_bytes(self.uid))?;
        writeln!(f, "File version: {}", self.file_version)?;
        writeln!(f, "Reserved: {}", repr_bytes(self.reserved))?;
        writeln!(
            f,
            "Secondary index record: {} (null val: {NULL_INDEX})",
            self.secondary_index_record
        )?;
        writeln!(f, "Reserved2: {}", repr_bytes(self.reserved2))?;
        writeln!(
            f,
            "First non-book record (null value: {NULL_INDEX}): {}",
            self.first_non_book_record
        )?;
        writeln!(f, "Full name offset: {}", self.fullname_offset)?;
        writeln!(f, "Full name length: {} bytes", self.fullname_length)?;
        writeln!(f, "Full name: {}", self.full_name())?;
        writeln!(f, "Langcode: {:#x}", self.locale_raw)?;
        writeln!(f, "Language: {}", self.language)?;
        writeln!(f, "Sub language: {}", self.sublanguage)?;
        writeln!(f, "Input language: {}", repr_bytes(self.input_language))?;
        writeln!(f, "Output language: {}", repr_bytes(self.output_language))?;
        writeln!(f, "Min version: {}", self.min_version)?;
        writeln!(f, "First Image index: {}", self.first_image_index)?;
        writeln!(f, "Huffman record offset: {}", self.huffman_record_offset)?;
        writeln!(f, "Huffman record count: {}", self.huffman_record_count)?;
        writeln!(f, "DATP record offset: {:#x}", self.datp_record_offset)?;
        writeln!(f, "DATP record count: {}", self.datp_record_count)?;
        writeln!(f, "EXTH flags: {:#b} ({})", self.exth_flags, self.has_exth())?;

        if let Some(drm) = &self.drm {
            writeln!(f, "Unknown3: {}", repr_bytes(drm.unknown3))?;
            writeln!(f, "DRM Offset: {}", drm.offset)?;
            writeln!(f, "DRM Count: {}", drm.count)?;
            writeln!(f, "DRM Size: {}", drm.size)?;
            writeln!(f, "DRM Flags: {:#b}", drm.flags)?;
        }

        if let Some(extra) = &self.extra {
            writeln!(f, "Unknown4: {}", repr_bytes(extra.unknown4))?;
            writeln!(f, "First content record: {}", extra.first_content_record)?;
            writeln!(f, "Last content record: {}", extra.last_content_record)?;
            writeln!(f, "Unknown5: {}", extra.unknown5)?;
            writeln!(f, "FCIS number: {}", extra.fcis_number)?;
            writeln!(f, "FCIS count: {}", extra.fcis_count)?;
            writeln!(f, "FLIS number: {}", extra.flis_number)?;
            writeln!(f, "FLIS count: {}", extra.flis_count)?;
            writeln!(f, "Unknown6: {}", repr_bytes(extra.unknown6))?;
            writeln!(f, "SRCS record index: {}", extra.srcs_record_index)?;
            writeln!(f, "Number of SRCS records?: {}", extra.num_srcs_records)?;
            writeln!(f, "Unknown7: {}", repr_bytes(extra.unknown7))?;
            writeln!(
                f,
                "Extra data flags: {:#b} (has multibyte: {}) (has indexing: {}) \
                 (has uncrossable breaks: {})",
                extra.extra_data_flags,
                self.has_multibytes(),
                self.has_indexing_bytes(),
                self.has_uncrossable_breaks()
            )?;
            writeln!(
                f,
                "Primary index record (null value: {NULL_INDEX}): {}",
                extra.primary_index_record
            )?;
        }

        if let Some(exth) = &self.exth {
            write!(f, "\n{exth}")?;
        }
        if let Some(after) = self.bytes_after_exth() {
            writeln!(
                f,
                "Bytes after EXTH ({} bytes): {}",
                after.len(),
                format_bytes(after)
            )?;
        }
        writeln!(
            f,
            "Number of bytes after full name: {}",
            self.bytes_after_full_name()
        )?;
        writeln!(f, "Record 0 length: {}", self.raw.len())
    }
}

impl Display for ExthHeader<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        banner(f, "EXTH Header")?;
        writeln!(f, "EXTH header length: {}", self.length)?;
        writeln!(f, "Number of EXTH records: {}", self.count)?;
        writeln!(f, "EXTH records...")?;
        for record in &self.records {
            let value = match &record.value {
                ExthValue::Int(v) => v.to_string(),
                ExthValue::Text(s) => s.clone(),
                ExthValue::Raw(raw) => repr_bytes(raw),
            };
            writeln!(
                f,
                "{} ({}): {value}",
                record.display_name(),
                record.type_id
            )?;
        }
        writeln!(f)
    }
}

// ============================================================================
// Index
// ============================================================================

impl Display for TagX {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TAGX(tag={:02}, num_values={}, bitmask={:#b}, eof={})",
            self.tag, self.num_values, self.bitmask, self.eof
        )
    }
}

impl Display for IndexHeader<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let title = if self.is_primary() {
            "Index Header"
        } else {
            "Secondary Index Header"
        };
        banner(f, &format!("{title} ({} bytes)", self.header_length))?;
        writeln!(f, "Header length: {}", self.header_length)?;
        unknown(f, "Unknown", self.unknown1)?;
        if let IndexKind::Primary { header_type, .. } = self.kind {
            writeln!(f, "Header type: {header_type}")?;
        }
        writeln!(
            f,
            "Index Type: {} ({})",
            self.index_type_desc(),
            self.index_type
        )?;
        writeln!(f, "Offset to IDXT start: {}", self.idxt_start)?;
        writeln!(f, "Number of index records: {}", self.index_count)?;
        writeln!(
            f,
            "Index encoding: {} ({})",
            self.encoding.name(),
            self.encoding_raw
        )?;
        match self.kind {
            IndexKind::Primary {
                possibly_language, ..
            } => unknown(f, "Unknown (possibly language?)", possibly_language)?,
            IndexKind::Secondary { unknown2 } => unknown(f, "Unknown", unknown2)?,
        }
        writeln!(f, "Number of index entries: {}", self.num_index_entries)?;
        writeln!(f, "ORDT start: {}", self.ordt_start)?;
        writeln!(f, "LIGT start: {}", self.ligt_start)?;
        writeln!(f, "Number of LIGT entries: {}", self.num_of_ligt_entries)?;
        writeln!(f, "Number of cncx blocks: {}", self.num_of_cncx_blocks)?;
        unknown(f, "Unknown", self.unknown_block)?;
        writeln!(f, "TAGX offset: {}", self.tagx_offset)?;
        unknown(f, "Unknown", self.unknown_tail)?;

        banner(f, &format!("TAGX Header ({} bytes)", self.tagx_header_length))?;
        writeln!(f, "Header length: {}", self.tagx_header_length)?;
        writeln!(f, "Control byte count: {}", self.tagx_control_byte_count)?;
        for tagx in &self.tagx_entries {
            writeln!(f, "\t{tagx}")?;
        }
        match self.last_entry {
            LastEntry::Number(n) => writeln!(
                f,
                "Index of last IndexEntry in primary index record: {n}"
            )?,
            LastEntry::Raw(raw) => writeln!(
                f,
                "Index of last IndexEntry in secondary index record: {}",
                repr_bytes(raw)
            )?,
        }
        writeln!(f, "Number of entries in the NCX: {}", self.ncx_count)
    }
}

impl Display for Cncx<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        banner(f, &format!("cncx ({} strings)", self.len()))?;
        for (offset, s) in &self.strings {
            writeln!(f, "{offset:10} : {}", s.as_str())?;
        }
        Ok(())
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.values.as_slice() {
            [v] => write!(f, "{} : {v}", self.description())?,
            values => write!(f, "{} : {values:?}", self.description())?,
        }
        if let Some(s) = &self.cncx_value {
            write!(f, " [{s}]")?;
        }
        Ok(())
    }
}

/// `data[start..end]` clamped to the data.
fn window(data: &[u8], start: i64, end: i64) -> &[u8] {
    let clamp = |v: i64| v.clamp(0, data.len() as i64) as usize;
    let (start, end) = (clamp(start), clamp(end));
    &data[start.min(end)..end]
}

/// Index entries, with the text around each entry when `text` is given.
pub struct IndexEntries<'r> {
    pub entries: &'r [IndexEntry],
    pub text: Option<&'r [u8]>,
}

impl Display for IndexEntries<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        banner(f, &format!("Index Entries ({} entries)", self.entries.len()))?;
        for entry in self.entries {
            writeln!(
                f,
                "Index Entry(index={}, length={})",
                entry.index,
                entry.tags.len()
            )?;
            for tag in &entry.tags {
                writeln!(f, "\t{tag}")?;
            }
            if let Some(n) = entry.child_count() {
                writeln!(f, "\tNumber of children: {n}")?;
            }

            if let Some(text) = self.text {
                let ctx = CONTEXT_LEN as i64;
                let o = entry.offset() as i64;
                let p = o + entry.size() as i64;
                let context = [
                    ("HTML before offset", window(text, o - ctx, o)),
                    ("HTML after offset", window(text, o, o + ctx)),
                    ("HTML before end", window(text, p - ctx, p)),
                    ("HTML after end", window(text, p, p + ctx)),
                ];
                for (label, bytes) in context {
                    writeln!(f, "\t{label}: {}", repr_bytes(bytes))?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

// ============================================================================
// TBS
// ============================================================================

/// One text record's TBS view.
pub struct TbsRecordReport<'r, 'a> {
    pub record: &'r TbsRecord<'a>,
    pub entries: &'r [IndexEntry],
}

impl TbsRecordReport<'_, '_> {
    fn entry_list(&self, f: &mut Formatter<'_>, title: &str, positions: &[usize]) -> fmt::Result {
        if positions.is_empty() {
            return Ok(());
        }
        writeln!(f, "\t{title}:")?;
        for entry in positions.iter().filter_map(|&i| self.entries.get(i)) {
            writeln!(
                f,
                "\t\tIndex Entry: {} (Parent index: {}, Depth: {}, Offset: {}, Size: {}) [{}]",
                entry.index,
                entry.parent_index(),
                entry.depth(),
                entry.offset(),
                entry.size(),
                entry.label()
            )?;
        }
        Ok(())
    }
}

impl Display for TbsRecordReport<'_, '_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let r = self.record;
        writeln!(f)?;
        writeln!(
            f,
            "Record #{}: Starts at: {} Ends at: {}",
            r.idx, r.start, r.end
        )?;
        let total = r.ends.len() + r.complete.len() + r.starts.len() + r.spans.len();
        writeln!(
            f,
            "\tContains: {total} index entries ({} ends, {} complete, {} starts, {} spanning)",
            r.ends.len(),
            r.complete.len(),
            r.starts.len(),
            r.spans.len()
        )?;
        writeln!(f, "TBS bytes: {}", format_bytes(r.bytes))?;
        self.entry_list(f, "Ends", &r.ends)?;
        self.entry_list(f, "Complete", &r.complete)?;
        self.entry_list(f, "Starts", &r.starts)?;
        self.entry_list(f, "Spans", &r.spans)?;

        if let Some(d) = &r.decoded {
            writeln!(f)?;
            writeln!(f, "TBS: {} ({:04b})", d.tbs_type, d.tbs_type)?;
            writeln!(f, "Outermost index: {}", d.outermost_index)?;
            writeln!(f, "Unknown extra start bytes: {}", d.extra)?;
            for event in &d.events {
                writeln!(f, "{event}")?;
            }
            if let Some(err) = &d.error {
                writeln!(f, "Failed to decode TBS bytes: {err}")?;
            }
            if !d.remaining.is_empty() {
                writeln!(f, "Remaining bytes: {}", format_bytes(d.remaining))?;
            }
        }
        writeln!(f)
    }
}

/// Every text record's TBS view.
pub struct TbsReport<'r, 'a> {
    pub tbs: &'r TbsIndexing<'a>,
    pub entries: &'r [IndexEntry],
}

impl Display for TbsReport<'_, '_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        banner(
            f,
            &format!("TBS Indexing ({} records)", self.tbs.records.len()),
        )?;
        for record in &self.tbs.records {
            let report = TbsRecordReport {
                record,
                entries: self.entries,
            };
            write!(f, "{report}")?;
        }
        Ok(())
    }
}

/// Per-type TBS reports, as `(tbs_type, text)`, for non-zero types only.
pub fn tbs_type_reports(tbs: &TbsIndexing<'_>, entries: &[IndexEntry]) -> Vec<(u8, String)> {
    tbs.by_type()
        .into_iter()
        .map(|(tbs_type, records)| {
            let text = records
                .into_iter()
                .map(|record| TbsRecordReport { record, entries }.to_string())
                .collect::<String>();
            (tbs_type, text)
        })
        .collect()
}

// ============================================================================
// Whole-file reports
// ============================================================================

/// PalmDB header, record table, MOBI header and EXTH.
pub fn header_report(file: &MobiFile<'_>) -> String {
    format!(
        "{}\n{}\n{}",
        file.palmdb,
        RecordTable(&file.records),
        file.mobi_header
    )
}

/// Index headers, secondary entries, CNCX and primary entries.
///
/// `text` is the reconstructed text used for entry context.
pub fn index_report(file: &MobiFile<'_>, text: &[u8]) -> String {
    let mut sections = Vec::new();
    if let Some(header) = &file.index_header {
        sections.push(header.to_string());
    }
    if let Some(header) = &file.secondary_index_header {
        sections.push(header.to_string());
    }
    if let Some(record) = &file.secondary_index_record {
        sections.push(
            IndexEntries {
                entries: &record.indices,
                text: None,
            }
            .to_string(),
        );
    }
    if !file.cncx.is_empty() {
        sections.push(file.cncx.to_string());
    }
    if let Some(record) = &file.index_record {
        sections.push(
            IndexEntries {
                entries: &record.indices,
                text: Some(text),
            }
            .to_string(),
        );
    }
    sections.join("\n\n\n")
}

/// The full TBS report, when the file has a primary index.
pub fn tbs_report(file: &MobiFile<'_>) -> Option<String> {
    let tbs = file.tbs_indexing.as_ref()?;
    let entries = file.index_record.as_ref().map_or(&[][..], |r| &r.indices);
    Some(TbsReport { tbs, entries }.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mobi::test_helpers::{
        MobiHeaderBuilder, book_bytes, exth_bytes, ncx_records, palmdb_bytes,
    };

    fn text_with_tbs(text: &[u8], tbs: &[u8]) -> Vec<u8> {
        let mut raw = text.to_vec();
        raw.extend_from_slice(tbs);
        raw.push(0x80 | (tbs.len() as u8 + 1));
        raw
    }

    fn periodical() -> Vec<u8> {
        let header = MobiHeaderBuilder::new(232)
            .doc_type(257)
            .text_records(2, 20)
            .extra_data_flags(0b10)
            .primary_index(3)
            .first_non_book(3)
            .build();
        let mut records = vec![
            text_with_tbs(&[b'a'; 10], &[0x80 | 0b100, 1, 0x80]),
            text_with_tbs(&[b'b'; 10], &[]),
        ];
        records.extend(ncx_records(&[(0, 20, "Periodical"), (0, 20, "Section")]));
        book_bytes(&header, &records)
    }

    #[test]
    fn test_palmdb_report() {
        let data = palmdb_bytes(b"My Book", b"BOOKMOBI", &[b"x"]);
        let palmdb = PalmDbHeader::parse(&data).unwrap();
        let text = palmdb.to_string();
        assert!(text.starts_with("******************** PalmDB Header ********************\n"));
        assert!(text.contains("Name: \"My Book\"\n"));
        assert!(text.contains("\tRead Only: false\n"));
        assert!(text.contains("Type: \"BOOK\"\n"));
        assert!(text.contains("Number of records: 1\n"));
        assert!(text.contains("Creation date: 2018-01-28T"));
    }

    #[test]
    fn test_record_table() {
        let data = palmdb_bytes(b"t", b"BOOKMOBI", &[b"FLIS rest", b"ab"]);
        let palmdb = PalmDbHeader::parse(&data).unwrap();
        let records = crate::mobi::palmdb::read_records(&data, &palmdb).unwrap();
        let text = RecordTable(&records).to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Record headers:");
        assert!(lines[1].starts_with("     0. Offset: "));
        assert!(lines[1].ends_with("First 4 bytes: \"FLIS\" Size: 9"));
        assert!(lines[2].ends_with("Size: 2"));
    }

    #[test]
    fn test_mobi_header_report_with_exth() {
        let exth = exth_bytes(&[(100, b"Jane Doe"), (201, &[0, 0, 0, 7])]);
        let header = MobiHeaderBuilder::new(232)
            .exth(exth)
            .full_name(b"A Title")
            .build();
        let data = book_bytes(&header, &[]);
        let file = MobiFile::parse(&data).unwrap();
        let text = header_report(&file);

        assert!(text.contains("MOBI Header"));
        assert!(text.contains("Full name: A Title\n"));
        assert!(text.contains("EXTH flags: 0b1000000 (true)\n"));
        assert!(text.contains("author (100): Jane Doe\n"));
        assert!(text.contains("coveroffset (201): 7\n"));
        assert!(text.contains("Primary index record (null value: 4294967295): 4294967295\n"));
        assert!(text.contains("DRM Offset: "));
    }

    #[test]
    fn test_index_report() {
        let data = periodical();
        let file = MobiFile::parse(&data).unwrap();
        let text = index_report(&file, &file.alltext());

        assert!(text.contains("Index Header (192 bytes)"));
        assert!(text.contains("\tTAGX(tag=01, num_values=1, bitmask=0b1, eof=0)\n"));
        assert!(text.contains("Index of last IndexEntry in primary index record: 1\n"));
        assert!(text.contains("cncx (2 strings)"));
        assert!(text.contains("Index Entry(index=1, length=4)\n"));
        assert!(text.contains("[Section]"));
        assert!(text.contains("\tHTML before offset: \"\"\n"));
        assert!(text.contains(&format!("\tHTML after offset: \"{}\"", "a".repeat(10))));
        assert!(!text.contains("Secondary Index Header"));
    }

    #[test]
    fn test_tbs_report() {
        let data = periodical();
        let file = MobiFile::parse(&data).unwrap();
        let text = tbs_report(&file).unwrap();

        assert!(text.contains("TBS Indexing (2 records)"));
        assert!(text.contains("Record #1: Starts at: 0 Ends at: 9\n"));
        assert!(text.contains("(0 ends, 0 complete, 2 starts, 0 spanning)"));
        assert!(text.contains("TBS: 4 (0100)\n"));
        assert!(text.contains("The section 1 has at most one article in this record"));
        assert!(text.contains("Record #2: Starts at: 10 Ends at: 19\n"));

        let tbs = file.tbs_indexing.as_ref().unwrap();
        let by_type = tbs_type_reports(tbs, &file.index_record.as_ref().unwrap().indices);
        assert_eq!(by_type.len(), 1);
        assert_eq!(by_type[0].0, 4);
        assert!(by_type[0].1.contains("Record #1"));
        assert!(!by_type[0].1.contains("Record #2"));
    }

    #[test]
    fn test_window_clamps() {
        let data = b"0123456789";
        assert_eq!(window(data, -5, 3), b"012");
        assert_eq!(window(data, 8, 20), b"89");
        assert_eq!(window(data, 12, 20), b"");
    }
}
