//! Typed view of index entries: known tag kinds and named accessors.

use log::{debug, warn};

use super::cncx::Cncx;
use super::index::{IndexHeader, IndexTable, TagMap, parse_index_record};
use super::palmdb::Record;
use crate::error::Result;

/// Known index tag numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
#[cfg_attr(feature = "cli", serde(rename_all = "snake_case"))]
pub enum TagKind {
    Offset,
    Size,
    LabelOffset,
    Depth,
    ClassOffset,
    PosFid,
    Secondary,
    ParentIndex,
    FirstChildIndex,
    LastChildIndex,
    ImageIndex,
    DescOffset,
    AuthorOffset,
    ImageCaptionOffset,
    ImageAttrOffset,
}

/// `(tag number, kind, attribute name, description)`
const TAG_MAP: &[(u8, TagKind, &str, &str)] = &[
    (1, TagKind::Offset, "offset", "Offset in HTML"),
    (2, TagKind::Size, "size", "Size in HTML"),
    (3, TagKind::LabelOffset, "label_offset", "Label offset in CNCX"),
    (4, TagKind::Depth, "depth", "Depth of this entry in TOC"),
    (5, TagKind::ClassOffset, "class_offset", "Class offset in CNCX"),
    (6, TagKind::PosFid, "pos_fid", "File Index"),
    (
        11,
        TagKind::Secondary,
        "secondary",
        "[unknown, unknown, tag type from TAGX in primary index header]",
    ),
    (21, TagKind::ParentIndex, "parent_index", "Parent"),
    (22, TagKind::FirstChildIndex, "first_child_index", "First child"),
    (23, TagKind::LastChildIndex, "last_child_index", "Last child"),
    (
        69,
        TagKind::ImageIndex,
        "image_index",
        "Offset from first image record to the image record associated with this entry \
         (masthead for periodical or thumbnail for article entry).",
    ),
    (70, TagKind::DescOffset, "desc_offset", "Description offset in cncx"),
    (71, TagKind::AuthorOffset, "author_offset", "Author offset in cncx"),
    (
        72,
        TagKind::ImageCaptionOffset,
        "image_caption_offset",
        "Image caption offset in cncx",
    ),
    (
        73,
        TagKind::ImageAttrOffset,
        "image_attr_offset",
        "Image attribution offset in cncx",
    ),
];

impl TagKind {
    pub fn from_tag(tag: u8) -> Option<Self> {
        TAG_MAP
            .iter()
            .find(|&&(t, _, _, _)| t == tag)
            .map(|&(_, kind, _, _)| kind)
    }

    fn entry(self) -> (&'static str, &'static str) {
        TAG_MAP
            .iter()
            .find(|&&(_, k, _, _)| k == self)
            .map_or(("unknown", ""), |&(_, _, attr, desc)| (attr, desc))
    }

    pub fn attr(self) -> &'static str {
        self.entry().0
    }

    pub fn description(self) -> &'static str {
        self.entry().1
    }

    /// Tags whose value is an offset into the CNCX.
    pub fn is_cncx_offset(self) -> bool {
        self.attr().ends_with("_offset")
    }
}

/// One decoded tag of an index entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub tag: u8,
    pub kind: Option<TagKind>,
    pub values: Vec<u32>,
    /// CNCX string for `*_offset` tags, when the offset resolves.
    pub cncx_value: Option<String>,
}

impl Tag {
    fn new(tag: u8, values: Vec<u32>, cncx: &Cncx<'_>) -> Self {
        let kind = TagKind::from_tag(tag);
        if kind.is_none() {
            warn!("Unknown tag value: {tag}");
        }

        let cncx_value = match (kind, values.as_slice()) {
            (Some(k), [offset]) if k.is_cncx_offset() => {
                cncx.get(*offset).map(|s| s.as_str().into_owned())
            }
            _ => None,
        };

        Self {
            tag,
            kind,
            values,
            cncx_value,
        }
    }

    /// Single value; `None` when the tag has none or several.
    pub fn value(&self) -> Option<u32> {
        match self.values.as_slice() {
            [v] => Some(*v),
            _ => None,
        }
    }

    pub fn description(&self) -> String {
        match self.kind {
            Some(k) => k.description().to_string(),
            None => format!("??Unknown (tag value: {})", self.tag),
        }
    }
}

/// Identifier of an index entry: hex-numeric when it parses as such.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryId {
    Number(u32),
    Text(String),
}

impl EntryId {
    pub fn parse(ident: &str) -> Self {
        match u32::from_str_radix(ident, 16) {
            Ok(n) => EntryId::Number(n),
            Err(_) => EntryId::Text(ident.to_string()),
        }
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryId::Number(n) => write!(f, "{n}"),
            EntryId::Text(s) => f.write_str(s),
        }
    }
}

/// One entry of an index with its tags in TAGX order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub index: EntryId,
    pub tags: Vec<Tag>,
}

impl IndexEntry {
    pub fn new(ident: &str, tag_map: TagMap, cncx: &Cncx<'_>) -> Self {
        Self {
            index: EntryId::parse(ident),
            tags: tag_map
                .into_iter()
                .map(|(tag, values)| Tag::new(tag, values, cncx))
                .collect(),
        }
    }

    /// First tag of the given kind.
    pub fn get(&self, kind: TagKind) -> Option<&Tag> {
        self.tags.iter().find(|t| t.kind == Some(kind))
    }

    fn first_value(&self, kind: TagKind) -> Option<u32> {
        self.get(kind).and_then(|t| t.values.first().copied())
    }

    pub fn label(&self) -> &str {
        self.get(TagKind::LabelOffset)
            .and_then(|t| t.cncx_value.as_deref())
            .unwrap_or("")
    }

    pub fn offset(&self) -> u32 {
        self.first_value(TagKind::Offset).unwrap_or(0)
    }

    pub fn size(&self) -> u32 {
        self.first_value(TagKind::Size).unwrap_or(0)
    }

    pub fn depth(&self) -> u32 {
        self.first_value(TagKind::Depth).unwrap_or(0)
    }

    pub fn parent_index(&self) -> i64 {
        self.first_value(TagKind::ParentIndex).map_or(-1, i64::from)
    }

    pub fn first_child_index(&self) -> i64 {
        self.first_value(TagKind::FirstChildIndex)
            .map_or(-1, i64::from)
    }

    pub fn last_child_index(&self) -> i64 {
        self.first_value(TagKind::LastChildIndex)
            .map_or(-1, i64::from)
    }

    pub fn pos_fid(&self) -> [u32; 2] {
        match self.get(TagKind::PosFid).map(|t| t.values.as_slice()) {
            Some([a, b, ..]) => [*a, *b],
            Some([a]) => [*a, 0],
            _ => [0, 0],
        }
    }

    /// Number of children, when the entry has a first child.
    pub fn child_count(&self) -> Option<i64> {
        let first = self.first_child_index();
        (first != -1).then(|| self.last_child_index() - first + 1)
    }

    /// Byte range `[start, end]` this entry covers in the text.
    pub fn byte_range(&self) -> (i64, i64) {
        let start = self.offset() as i64;
        (start, start + self.size() as i64 - 1)
    }
}

/// All entries of an index, decoded from its data records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexRecord {
    pub indices: Vec<IndexEntry>,
}

impl IndexRecord {
    /// Decode the data records of an index in strict mode.
    pub fn parse(
        records: &[Record<'_>],
        header: &IndexHeader<'_>,
        cncx: &Cncx<'_>,
    ) -> Result<Self> {
        let mut table = IndexTable::new();
        for record in records {
            parse_index_record(
                &mut table,
                record.raw,
                header.tagx_control_byte_count,
                &header.tagx_entries,
                header.encoding,
                true,
            )?;
        }

        let indices: Vec<IndexEntry> = table
            .into_entries()
            .into_iter()
            .map(|(ident, tags)| IndexEntry::new(&ident, tags, cncx))
            .collect();
        debug!("Decoded {} index entries", indices.len());

        Ok(Self { indices })
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mobi::cncx::CncxString;
    use crate::util::TextEncoding;

    fn cncx_with(strings: &[(u32, &str)]) -> Cncx<'static> {
        let mut cncx = Cncx::new();
        for &(offset, s) in strings {
            cncx.strings.insert(offset, CncxString::Text(s.to_string()));
        }
        cncx
    }

    #[test]
    fn test_tag_table_lookup() {
        assert_eq!(TagKind::from_tag(3), Some(TagKind::LabelOffset));
        assert_eq!(TagKind::from_tag(99), None);
        assert!(TagKind::LabelOffset.is_cncx_offset());
        assert!(TagKind::ImageAttrOffset.is_cncx_offset());
        assert!(!TagKind::Offset.is_cncx_offset());
        assert_eq!(TagKind::ParentIndex.attr(), "parent_index");
    }

    #[test]
    fn test_entry_accessors() {
        let cncx = cncx_with(&[(0, "Section One"), (12, "An author")]);
        let entry = IndexEntry::new(
            "0a",
            vec![
                (1, vec![100]),
                (2, vec![50]),
                (3, vec![0]),
                (4, vec![1]),
                (21, vec![0]),
                (22, vec![3]),
                (23, vec![7]),
                (71, vec![12]),
            ],
            &cncx,
        );
        assert_eq!(entry.index, EntryId::Number(10));
        assert_eq!(entry.label(), "Section One");
        assert_eq!(entry.offset(), 100);
        assert_eq!(entry.size(), 50);
        assert_eq!(entry.depth(), 1);
        assert_eq!(entry.parent_index(), 0);
        assert_eq!(entry.child_count(), Some(5));
        assert_eq!(entry.byte_range(), (100, 149));
        assert_eq!(
            entry.get(TagKind::AuthorOffset).unwrap().cncx_value.as_deref(),
            Some("An author")
        );
    }

    #[test]
    fn test_entry_defaults() {
        let entry = IndexEntry::new("name", vec![(99, vec![1, 2])], &Cncx::new());
        assert_eq!(entry.index, EntryId::Text("name".into()));
        assert_eq!(entry.label(), "");
        assert_eq!(entry.offset(), 0);
        assert_eq!(entry.parent_index(), -1);
        assert_eq!(entry.first_child_index(), -1);
        assert_eq!(entry.pos_fid(), [0, 0]);
        assert_eq!(entry.child_count(), None);
        assert_eq!(entry.tags[0].description(), "??Unknown (tag value: 99)");
        assert_eq!(entry.tags[0].value(), None);
    }

    #[test]
    fn test_pos_fid_pair() {
        let entry = IndexEntry::new("01", vec![(6, vec![4, 9])], &Cncx::new());
        assert_eq!(entry.pos_fid(), [4, 9]);
    }

    #[test]
    fn test_unresolved_cncx_offset() {
        let entry = IndexEntry::new("01", vec![(3, vec![42])], &Cncx::new());
        assert_eq!(entry.get(TagKind::LabelOffset).unwrap().cncx_value, None);
        assert_eq!(entry.label(), "");
    }

    #[test]
    fn test_index_record_from_data_records() {
        use crate::mobi::index::TagX;
        use crate::mobi::test_helpers::IndexBuilder;

        let tagx = vec![
            TagX { tag: 1, num_values: 1, bitmask: 0x01, eof: 0 },
            TagX { tag: 0, num_values: 0, bitmask: 0, eof: 1 },
        ];
        let header_raw = IndexBuilder::new(tagx).primary().ncx_count(2).build_header();
        let header = IndexHeader::parse_primary(&header_raw).unwrap();
        let data = IndexBuilder::data_record(&[
            (b"00".as_slice(), vec![0x01, 0x80]),
            (b"01".as_slice(), vec![0x01, 0x8a]),
        ]);
        let records = [Record { offset: 0, flags: 0, uid: 0, raw: &data }];
        let index = IndexRecord::parse(&records, &header, &Cncx::new()).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.indices[1].offset(), 10);
        assert_eq!(header.encoding, TextEncoding::Utf8);
    }
}
