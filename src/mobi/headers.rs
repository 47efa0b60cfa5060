//! MOBI header (record 0) and EXTH metadata.

use log::{debug, trace, warn};

use super::bytes::ByteCursor;
use super::langcodes;
use crate::error::{Error, Result};
use crate::util::{self, TextEncoding};

pub const NULL_INDEX: u32 = 0xFFFFFFFF;

/// Bytes of record 0 that every MOBI header carries, through `exth_flags`.
pub const MOBI_HEADER_MIN_LEN: usize = 132;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    PalmDoc,
    Huffman,
    Unknown(u16),
}

impl Compression {
    pub fn from_raw(raw: u16) -> Self {
        match raw {
            1 => Compression::None,
            2 => Compression::PalmDoc,
            0x4448 => Compression::Huffman, // "DH"
            n => Compression::Unknown(n),
        }
    }

    pub fn description(self) -> String {
        match self {
            Compression::None => "No compression".into(),
            Compression::PalmDoc => "PalmDoc compression".into(),
            Compression::Huffman => "HUFF/CDIC compression".into(),
            Compression::Unknown(n) => util::repr_bytes(&n.to_be_bytes()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encryption {
    None,
    OldMobipocket,
    Mobipocket,
    Unknown(u16),
}

impl Encryption {
    pub fn from_raw(raw: u16) -> Self {
        match raw {
            0 => Encryption::None,
            1 => Encryption::OldMobipocket,
            2 => Encryption::Mobipocket,
            n => Encryption::Unknown(n),
        }
    }

    pub fn description(self) -> String {
        match self {
            Encryption::None => "No encryption".into(),
            Encryption::OldMobipocket => "Old mobipocket encryption".into(),
            Encryption::Mobipocket => "Mobipocket encryption".into(),
            Encryption::Unknown(n) => n.to_string(),
        }
    }
}

/// MOBI document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocType {
    MobipocketBook,
    PalmDocBook,
    Audio,
    News,
    NewsFeed,
    NewsMagazine,
    Pics,
    Word,
    Xls,
    Ppt,
    Text,
    Html,
    Unknown(u32),
}

impl DocType {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            2 => DocType::MobipocketBook,
            3 => DocType::PalmDocBook,
            4 => DocType::Audio,
            257 => DocType::News,
            258 => DocType::NewsFeed,
            259 => DocType::NewsMagazine,
            513 => DocType::Pics,
            514 => DocType::Word,
            515 => DocType::Xls,
            516 => DocType::Ppt,
            517 => DocType::Text,
            518 => DocType::Html,
            n => DocType::Unknown(n),
        }
    }

    /// News, news feed and news magazine documents carry periodical TBS.
    pub fn is_periodical(self) -> bool {
        matches!(
            self,
            DocType::News | DocType::NewsFeed | DocType::NewsMagazine
        )
    }

    pub fn description(self) -> String {
        let name = match self {
            DocType::MobipocketBook => "Mobipocket book",
            DocType::PalmDocBook => "PalmDOC book",
            DocType::Audio => "Audio",
            DocType::News => "News",
            DocType::NewsFeed => "News Feed",
            DocType::NewsMagazine => "News magazine",
            DocType::Pics => "PICS",
            DocType::Word => "Word",
            DocType::Xls => "XLS",
            DocType::Ppt => "PPT",
            DocType::Text => "TEXT",
            DocType::Html => "HTML",
            DocType::Unknown(n) => return n.to_string(),
        };
        name.to_string()
    }
}

/// DRM block, present when the header declares at least 174 bytes.
#[derive(Debug, Clone)]
pub struct DrmSection<'a> {
    pub unknown3: &'a [u8],
    pub offset: u32,
    pub count: u32,
    pub size: u32,
    pub flags: u32,
}

/// Extra-data-flags block, present when the header declares at least 232 bytes.
#[derive(Debug, Clone)]
pub struct ExtraDataSection<'a> {
    pub unknown4: &'a [u8],
    pub first_content_record: u16,
    pub last_content_record: u16,
    pub unknown5: u32,
    pub fcis_number: u32,
    pub fcis_count: u32,
    pub flis_number: u32,
    pub flis_count: u32,
    pub unknown6: &'a [u8],
    pub srcs_record_index: u32,
    pub num_srcs_records: u32,
    pub unknown7: &'a [u8],
    pub extra_data_flags: u32,
    pub primary_index_record: u32,
}

/// Typed view of record 0.
#[derive(Debug, Clone)]
pub struct MobiHeader<'a> {
    pub raw: &'a [u8],
    pub compression_raw: u16,
    pub compression: Compression,
    pub unused: &'a [u8],
    pub text_length: u32,
    pub number_of_text_records: u16,
    pub text_record_size: u16,
    pub encryption: Encryption,
    pub unknown: &'a [u8],
    pub identifier: &'a [u8],
    /// Declared header length, counted from the `MOBI` identifier.
    pub length: u32,
    pub doc_type: DocType,
    pub encoding_raw: u32,
    pub uid: &'a [u8],
    pub file_version: u32,
    pub reserved: &'a [u8],
    pub secondary_index_record: u32,
    pub reserved2: &'a [u8],
    pub first_non_book_record: u32,
    pub fullname_offset: u32,
    pub fullname_length: u32,
    pub locale_raw: u32,
    pub language: &'static str,
    pub sublanguage: &'static str,
    pub input_language: &'a [u8],
    pub output_language: &'a [u8],
    pub min_version: u32,
    pub first_image_index: u32,
    pub huffman_record_offset: u32,
    pub huffman_record_count: u32,
    pub datp_record_offset: u32,
    pub datp_record_count: u32,
    pub exth_flags: u32,
    pub drm: Option<DrmSection<'a>>,
    pub extra: Option<ExtraDataSection<'a>>,
    pub exth: Option<ExthHeader<'a>>,
}

impl<'a> MobiHeader<'a> {
    /// Parse record 0.
    ///
    /// Optional sections are read only when both the declared header length
    /// and the physical record size cover them.
    pub fn parse(raw: &'a [u8]) -> Result<Self> {
        let c = ByteCursor::new(raw, "MOBI header");

        let identifier = c.bytes(16, 4)?;
        if identifier != b"MOBI" {
            return Err(Error::format(format!(
                "Identifier {} unknown",
                util::repr_bytes(identifier)
            )));
        }
        c.bytes(0, MOBI_HEADER_MIN_LEN)?;

        let compression_raw = c.u16_be(0)?;
        let length = c.u32_be(20)?;
        let encoding_raw = c.u32_be(28)?;
        let locale_raw = c.u32_be(92)?;
        let (lang_id, sublang_id) = langcodes::split_locale(locale_raw);

        let mut header = Self {
            raw,
            compression_raw,
            compression: Compression::from_raw(compression_raw),
            unused: c.bytes(2, 2)?,
            text_length: c.u32_be(4)?,
            number_of_text_records: c.u16_be(8)?,
            text_record_size: c.u16_be(10)?,
            encryption: Encryption::from_raw(c.u16_be(12)?),
            unknown: c.bytes(14, 2)?,
            identifier,
            length,
            doc_type: DocType::from_raw(c.u32_be(24)?),
            encoding_raw,
            uid: c.bytes(32, 4)?,
            file_version: c.u32_be(36)?,
            reserved: c.bytes(40, 8)?,
            secondary_index_record: c.u32_be(48)?,
            reserved2: c.bytes(52, 28)?,
            first_non_book_record: c.u32_be(80)?,
            fullname_offset: c.u32_be(84)?,
            fullname_length: c.u32_be(88)?,
            locale_raw,
            language: langcodes::language_name(lang_id),
            sublanguage: langcodes::sublanguage_name(lang_id, sublang_id),
            input_language: c.bytes(96, 4)?,
            output_language: c.bytes(100, 4)?,
            min_version: c.u32_be(104)?,
            first_image_index: c.u32_be(108)?,
            huffman_record_offset: c.u32_be(112)?,
            huffman_record_count: c.u32_be(116)?,
            datp_record_offset: c.u32_be(120)?,
            datp_record_count: c.u32_be(124)?,
            exth_flags: c.u32_be(128)?,
            drm: None,
            extra: None,
            exth: None,
        };

        if length >= 174 && raw.len() >= 180 {
            header.drm = Some(DrmSection {
                unknown3: c.bytes(132, 32)?,
                offset: c.u32_be(164)?,
                count: c.u32_be(168)?,
                size: c.u32_be(172)?,
                flags: c.u32_be(176)?,
            });
        }

        if length >= 232 && raw.len() >= 248 {
            header.extra = Some(ExtraDataSection {
                unknown4: c.bytes(180, 12)?,
                first_content_record: c.u16_be(192)?,
                last_content_record: c.u16_be(194)?,
                unknown5: c.u32_be(196)?,
                fcis_number: c.u32_be(200)?,
                fcis_count: c.u32_be(204)?,
                flis_number: c.u32_be(208)?,
                flis_count: c.u32_be(212)?,
                unknown6: c.bytes(216, 8)?,
                srcs_record_index: c.u32_be(224)?,
                num_srcs_records: c.u32_be(228)?,
                unknown7: c.bytes(232, 8)?,
                extra_data_flags: c.u32_be(240)?,
                primary_index_record: c.u32_be(244)?,
            });
        }

        if header.has_exth() {
            let exth_offset = header.exth_offset();
            let exth_raw = c.tail(exth_offset)?;
            header.exth = Some(ExthHeader::parse(exth_raw, header.encoding())?);
        }

        debug!(
            "MOBI header: length={} type={:?} compression={:?} drm={} extra={} exth={}",
            header.length,
            header.doc_type,
            header.compression,
            header.has_drm_data(),
            header.has_extra_data_flags(),
            header.has_exth()
        );
        Ok(header)
    }

    /// Text encoding, or `None` for an unrecognized codepage.
    pub fn encoding(&self) -> Option<TextEncoding> {
        TextEncoding::from_codepage(self.encoding_raw)
    }

    pub fn encoding_name(&self) -> String {
        self.encoding()
            .map_or_else(|| self.encoding_raw.to_string(), |e| e.name().to_string())
    }

    pub fn has_exth(&self) -> bool {
        self.exth_flags & 0x40 != 0
    }

    pub fn has_drm_data(&self) -> bool {
        self.drm.is_some()
    }

    pub fn has_extra_data_flags(&self) -> bool {
        self.extra.is_some()
    }

    pub fn extra_data_flags(&self) -> u32 {
        self.extra.as_ref().map_or(0, |e| e.extra_data_flags)
    }

    pub fn has_multibytes(&self) -> bool {
        self.extra_data_flags() & 0b1 != 0
    }

    pub fn has_indexing_bytes(&self) -> bool {
        self.extra_data_flags() & 0b10 != 0
    }

    pub fn has_uncrossable_breaks(&self) -> bool {
        self.extra_data_flags() & 0b100 != 0
    }

    /// Primary index record number, `NULL_INDEX` without an extra-data block.
    pub fn primary_index_record(&self) -> u32 {
        self.extra
            .as_ref()
            .map_or(NULL_INDEX, |e| e.primary_index_record)
    }

    pub fn exth_offset(&self) -> usize {
        16 + self.length as usize
    }

    /// Bytes between the end of the EXTH block and the full name.
    pub fn bytes_after_exth(&self) -> Option<&'a [u8]> {
        let exth = self.exth.as_ref()?;
        let start = self.exth_offset() + exth.length as usize;
        Some(clamped(self.raw, start, self.fullname_offset as usize))
    }

    /// Raw full name bytes.
    pub fn full_name_bytes(&self) -> &'a [u8] {
        let start = self.fullname_offset as usize;
        clamped(
            self.raw,
            start,
            start.saturating_add(self.fullname_length as usize),
        )
    }

    pub fn full_name(&self) -> String {
        let encoding = self.encoding().unwrap_or(TextEncoding::Cp1252);
        util::decode_lossy(self.full_name_bytes(), encoding).into_owned()
    }

    /// Record 0 bytes following the full name (negative if the name overruns).
    pub fn bytes_after_full_name(&self) -> i64 {
        self.raw.len() as i64 - (self.fullname_offset as i64 + self.fullname_length as i64)
    }
}

/// Slice `data[start..end]` with both ends clamped to the data.
fn clamped(data: &[u8], start: usize, end: usize) -> &[u8] {
    let end = end.min(data.len());
    let start = start.min(end);
    &data[start..end]
}

// ============================================================================
// EXTH
// ============================================================================

/// How the payload of a known EXTH record is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExthKind {
    Int,
    Text,
    Binary,
}

/// Known EXTH record types: `(type, name, kind)`.
pub const EXTH_TYPES: &[(u32, &str, ExthKind)] = &[
    (1, "DRM Server id", ExthKind::Binary),
    (2, "DRM Commerce id", ExthKind::Binary),
    (3, "DRM ebookbase book id", ExthKind::Binary),
    (100, "author", ExthKind::Text),
    (101, "publisher", ExthKind::Text),
    (102, "imprint", ExthKind::Text),
    (103, "description", ExthKind::Text),
    (104, "isbn", ExthKind::Text),
    (105, "subject", ExthKind::Text),
    (106, "publishingdate", ExthKind::Text),
    (107, "review", ExthKind::Text),
    (108, "contributor", ExthKind::Text),
    (109, "rights", ExthKind::Text),
    (110, "subjectcode", ExthKind::Text),
    (111, "type", ExthKind::Text),
    (112, "source", ExthKind::Text),
    (113, "asin", ExthKind::Text),
    (114, "versionnumber", ExthKind::Text),
    (115, "sample", ExthKind::Binary),
    (116, "startreading", ExthKind::Int),
    (117, "adult", ExthKind::Int),
    (118, "retailprice", ExthKind::Text),
    (119, "retailpricecurrency", ExthKind::Text),
    (121, "KF8 header section index", ExthKind::Int),
    (125, "KF8 resources (images/fonts) count", ExthKind::Int),
    (129, "KF8 cover URI", ExthKind::Text),
    (131, "KF8 unknown count", ExthKind::Int),
    (201, "coveroffset", ExthKind::Int),
    (202, "thumboffset", ExthKind::Int),
    (203, "hasfakecover", ExthKind::Int),
    (204, "Creator Software", ExthKind::Int),
    (205, "Creator Major Version", ExthKind::Int),
    (206, "Creator Minor Version", ExthKind::Int),
    (207, "Creator Build Number", ExthKind::Int),
    (208, "watermark", ExthKind::Binary),
    (209, "tamper_proof_keys", ExthKind::Binary),
    (300, "fontsignature", ExthKind::Binary),
    (301, "clippinglimit", ExthKind::Int),
    (402, "publisherlimit", ExthKind::Binary),
    (404, "TTS flag", ExthKind::Int),
    (501, "cdetype", ExthKind::Text),
    (502, "lastupdatetime", ExthKind::Text),
    (503, "updatedtitle", ExthKind::Text),
];

fn lookup_exth(type_id: u32) -> Option<(&'static str, ExthKind)> {
    EXTH_TYPES
        .iter()
        .find(|&&(t, _, _)| t == type_id)
        .map(|&(_, name, kind)| (name, kind))
}

/// Interpreted payload of an EXTH record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExthValue<'a> {
    Int(u32),
    Text(String),
    Raw(&'a [u8]),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExthRecord<'a> {
    pub type_id: u32,
    /// Known name, if the type is in [`EXTH_TYPES`].
    pub name: Option<&'static str>,
    pub data: &'a [u8],
    pub value: ExthValue<'a>,
}

impl<'a> ExthRecord<'a> {
    fn new(type_id: u32, data: &'a [u8], encoding: Option<TextEncoding>) -> Self {
        let known = lookup_exth(type_id);
        let value = match known.map(|(_, kind)| kind) {
            Some(ExthKind::Int) => match *data {
                [a] => ExthValue::Int(a as u32),
                [a, b] => ExthValue::Int(u16::from_be_bytes([a, b]) as u32),
                [a, b, c, d] => ExthValue::Int(u32::from_be_bytes([a, b, c, d])),
                _ => {
                    warn!(
                        "EXTH record {type_id} has {} bytes, expected an integer",
                        data.len()
                    );
                    ExthValue::Raw(data)
                }
            },
            Some(ExthKind::Text) => {
                match util::decode_strict(data, encoding.unwrap_or(TextEncoding::Cp1252)) {
                    Some(text) => ExthValue::Text(text.into_owned()),
                    None => ExthValue::Raw(data),
                }
            }
            Some(ExthKind::Binary) | None => ExthValue::Raw(data),
        };

        Self {
            type_id,
            name: known.map(|(name, _)| name),
            data,
            value,
        }
    }

    /// Display name, the numeric type for unknown records.
    pub fn display_name(&self) -> String {
        self.name
            .map_or_else(|| self.type_id.to_string(), str::to_string)
    }

    pub fn as_int(&self) -> Option<u32> {
        match self.value {
            ExthValue::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            ExthValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// EXTH metadata block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExthHeader<'a> {
    pub raw: &'a [u8],
    pub length: u32,
    pub count: u32,
    /// Records sorted by type.
    pub records: Vec<ExthRecord<'a>>,
}

impl<'a> ExthHeader<'a> {
    /// Parse an EXTH block; `raw` starts at the `EXTH` magic.
    pub fn parse(raw: &'a [u8], encoding: Option<TextEncoding>) -> Result<Self> {
        let c = ByteCursor::new(raw, "EXTH header");
        if !c.has_tag(0, b"EXTH") {
            return Err(Error::format("EXTH header does not start with EXTH"));
        }
        let length = c.u32_be(4)?;
        let count = c.u32_be(8)?;

        let mut records = Vec::new();
        let mut pos = 12;
        for i in 0..count {
            let type_id = c.u32_be(pos)?;
            let rec_len = c.u32_be(pos + 4)? as usize;
            if rec_len < 8 {
                return Err(Error::format(format!(
                    "EXTH record {i} (type {type_id}) has invalid length {rec_len}"
                )));
            }
            let data = c.bytes(pos + 8, rec_len - 8)?;
            trace!("EXTH record type={type_id} len={}", data.len());
            records.push(ExthRecord::new(type_id, data, encoding));
            pos += rec_len;
        }

        records.sort_by_key(|r| r.type_id);

        Ok(Self {
            raw,
            length,
            count,
            records,
        })
    }

    /// First record of the given type.
    pub fn get(&self, type_id: u32) -> Option<&ExthRecord<'a>> {
        self.records.iter().find(|r| r.type_id == type_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mobi::test_helpers::{MobiHeaderBuilder, exth_bytes};

    #[test]
    fn test_parse_basic_fields() {
        let raw = MobiHeaderBuilder::new(232).build();
        let header = MobiHeader::parse(&raw).unwrap();
        assert_eq!(header.compression, Compression::None);
        assert_eq!(header.length, 232);
        assert_eq!(header.doc_type, DocType::MobipocketBook);
        assert_eq!(header.encoding(), Some(TextEncoding::Utf8));
        assert_eq!(header.language, "ENGLISH");
        assert_eq!(header.sublanguage, "ENGLISH_US");
        assert!(header.has_drm_data());
        assert!(header.has_extra_data_flags());
        assert!(!header.has_exth());
    }

    #[test]
    fn test_bad_identifier() {
        let mut raw = MobiHeaderBuilder::new(232).build();
        raw[16..20].copy_from_slice(b"MOBX");
        assert!(matches!(MobiHeader::parse(&raw), Err(Error::Format(_))));
    }

    #[test]
    fn test_record0_too_short() {
        let raw = MobiHeaderBuilder::new(232).build();
        assert!(matches!(
            MobiHeader::parse(&raw[..100]),
            Err(Error::Truncated { .. })
        ));
    }

    #[test]
    fn test_drm_gated_by_declared_length() {
        // Declared length 100 but 300 physical bytes
        let mut raw = MobiHeaderBuilder::new(100).build();
        raw.resize(300, 0xAA);
        let header = MobiHeader::parse(&raw).unwrap();
        assert!(!header.has_drm_data());
        assert!(header.drm.is_none());
        assert!(!header.has_extra_data_flags());
        assert_eq!(header.primary_index_record(), NULL_INDEX);
    }

    #[test]
    fn test_drm_gated_by_physical_length() {
        let raw = MobiHeaderBuilder::new(232).build();
        let header = MobiHeader::parse(&raw[..178]).unwrap();
        assert!(!header.has_drm_data());
        let header = MobiHeader::parse(&raw[..200]).unwrap();
        assert!(header.has_drm_data());
        assert!(!header.has_extra_data_flags());
    }

    #[test]
    fn test_extra_data_flags() {
        let raw = MobiHeaderBuilder::new(232)
            .extra_data_flags(0b11)
            .primary_index(5)
            .build();
        let header = MobiHeader::parse(&raw).unwrap();
        assert!(header.has_multibytes());
        assert!(header.has_indexing_bytes());
        assert!(!header.has_uncrossable_breaks());
        assert_eq!(header.primary_index_record(), 5);
    }

    #[test]
    fn test_exth_absent_ignores_trailing_bytes() {
        // Garbage where an EXTH block would be must not be read
        let mut raw = MobiHeaderBuilder::new(232).build();
        raw.extend_from_slice(b"JUNKJUNKJUNK");
        let header = MobiHeader::parse(&raw).unwrap();
        assert!(!header.has_exth());
        assert!(header.exth.is_none());
        assert!(header.bytes_after_exth().is_none());
    }

    #[test]
    fn test_exth_present() {
        let exth = exth_bytes(&[(100, b"Author"), (201, &7u32.to_be_bytes())]);
        let raw = MobiHeaderBuilder::new(232)
            .exth(exth)
            .full_name(b"Title")
            .build();
        let header = MobiHeader::parse(&raw).unwrap();
        let exth = header.exth.as_ref().unwrap();
        assert_eq!(exth.count, 2);
        assert_eq!(exth.get(100).unwrap().as_text(), Some("Author"));
        assert_eq!(exth.get(201).unwrap().as_int(), Some(7));
        assert_eq!(header.full_name(), "Title");
        assert_eq!(header.bytes_after_exth(), Some(&[][..]));
    }

    #[test]
    fn test_exth_sorted_and_idempotent() {
        let raw = exth_bytes(&[(503, b"T"), (100, b"A"), (9999, b"\x01\x02"), (201, b"\0\0\0\x01")]);
        let first = ExthHeader::parse(&raw, Some(TextEncoding::Utf8)).unwrap();
        let types: Vec<_> = first.records.iter().map(|r| r.type_id).collect();
        assert_eq!(types, vec![100, 201, 503, 9999]);
        let second = ExthHeader::parse(&raw, Some(TextEncoding::Utf8)).unwrap();
        assert_eq!(first, second);

        let unknown = first.get(9999).unwrap();
        assert_eq!(unknown.display_name(), "9999");
        assert_eq!(unknown.value, ExthValue::Raw(b"\x01\x02"));
    }

    #[test]
    fn test_exth_int_widths() {
        let raw = exth_bytes(&[(404, b"\x01"), (205, b"\x00\x02"), (206, b"\x01\x02\x03")]);
        let exth = ExthHeader::parse(&raw, None).unwrap();
        assert_eq!(exth.get(404).unwrap().as_int(), Some(1));
        assert_eq!(exth.get(205).unwrap().as_int(), Some(2));
        assert_eq!(exth.get(206).unwrap().value, ExthValue::Raw(b"\x01\x02\x03"));
    }

    #[test]
    fn test_exth_bad_magic_and_length() {
        assert!(matches!(
            ExthHeader::parse(b"NOTEXTH_____", None),
            Err(Error::Format(_))
        ));

        let mut raw = b"EXTH".to_vec();
        raw.extend_from_slice(&20u32.to_be_bytes());
        raw.extend_from_slice(&1u32.to_be_bytes());
        raw.extend_from_slice(&100u32.to_be_bytes());
        raw.extend_from_slice(&4u32.to_be_bytes());
        assert!(ExthHeader::parse(&raw, None).is_err());
    }

    #[test]
    fn test_enum_descriptions() {
        assert_eq!(Compression::from_raw(17480), Compression::Huffman);
        assert_eq!(Compression::Huffman.description(), "HUFF/CDIC compression");
        assert_eq!(Compression::from_raw(0x4142).description(), "\"AB\"");
        assert_eq!(Encryption::from_raw(2).description(), "Mobipocket encryption");
        assert!(DocType::from_raw(259).is_periodical());
        assert!(!DocType::from_raw(2).is_periodical());
        assert_eq!(DocType::from_raw(999).description(), "999");
    }
}
