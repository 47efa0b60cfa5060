//! Compact summary of a decoded file.
//!
//! With the `cli` feature the summary serializes to JSON for
//! `mobi-inspect --json`.

use super::file::MobiFile;
use super::tags::IndexEntry;
use crate::util::ImageFormat;

// ============================================================================
// Public Types
// ============================================================================

/// Headline facts about a MOBI file.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct MobiSummary {
    pub name: String,
    pub title: String,
    pub doc_type: String,
    pub compression: String,
    pub encryption: String,
    pub encoding: String,
    pub file_version: u32,
    pub language: String,
    pub record_count: usize,
    pub text_record_count: usize,
    pub text_length: usize,
    #[cfg_attr(feature = "cli", serde(skip_serializing_if = "Vec::is_empty"))]
    pub exth: Vec<ExthSummary>,
    #[cfg_attr(feature = "cli", serde(skip_serializing_if = "Vec::is_empty"))]
    pub images: Vec<ImageSummary>,
    #[cfg_attr(feature = "cli", serde(skip_serializing_if = "Vec::is_empty"))]
    pub fonts: Vec<String>,
    #[cfg_attr(feature = "cli", serde(skip_serializing_if = "Vec::is_empty"))]
    pub binary: Vec<String>,
    #[cfg_attr(feature = "cli", serde(skip_serializing_if = "Vec::is_empty"))]
    pub index: Vec<EntrySummary>,
    /// Text records per non-zero TBS type.
    #[cfg_attr(feature = "cli", serde(skip_serializing_if = "Vec::is_empty"))]
    pub tbs_types: Vec<(u8, usize)>,
}

/// One EXTH record with its value rendered as text.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct ExthSummary {
    pub type_id: u32,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct ImageSummary {
    pub name: String,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

/// One primary index entry.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct EntrySummary {
    pub index: String,
    pub label: String,
    pub depth: u32,
    pub offset: u32,
    pub size: u32,
    #[cfg_attr(feature = "cli", serde(skip_serializing_if = "Option::is_none"))]
    pub parent: Option<i64>,
}

// ============================================================================
// Construction
// ============================================================================

impl MobiSummary {
    pub fn from_file(file: &MobiFile<'_>) -> Self {
        let header = &file.mobi_header;

        let exth = header
            .exth
            .iter()
            .flat_map(|exth| &exth.records)
            .map(|record| ExthSummary {
                type_id: record.type_id,
                name: record.display_name(),
                value: match record.as_int() {
                    Some(v) => v.to_string(),
                    None => record
                        .as_text()
                        .map_or_else(|| crate::util::format_bytes(record.data), str::to_string),
                },
            })
            .collect();

        let images = file
            .image_records
            .iter()
            .map(|image| ImageSummary {
                name: image.name(),
                format: image.info.format,
                width: image.info.width,
                height: image.info.height,
            })
            .collect();

        let index = file
            .index_record
            .as_ref()
            .map(|r| r.indices.iter().map(EntrySummary::from).collect())
            .unwrap_or_default();

        let tbs_types = file
            .tbs_indexing
            .as_ref()
            .map(|tbs| {
                tbs.by_type()
                    .into_iter()
                    .map(|(t, records)| (t, records.len()))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name: String::from_utf8_lossy(&file.palmdb.name).into_owned(),
            title: header.full_name(),
            doc_type: header.doc_type.description(),
            compression: header.compression.description(),
            encryption: header.encryption.description(),
            encoding: header.encoding_name(),
            file_version: header.file_version,
            language: format!("{} ({})", header.language, header.sublanguage),
            record_count: file.records.len(),
            text_record_count: file.text_records.len(),
            text_length: file.text_records.iter().map(|r| r.raw.len()).sum(),
            exth,
            images,
            fonts: file.font_records.iter().map(|f| f.name()).collect(),
            binary: file.binary_records.iter().map(|b| b.name()).collect(),
            index,
            tbs_types,
        }
    }
}

impl From<&IndexEntry> for EntrySummary {
    fn from(entry: &IndexEntry) -> Self {
        let parent = entry.parent_index();
        Self {
            index: entry.index.to_string(),
            label: entry.label().to_string(),
            depth: entry.depth(),
            offset: entry.offset(),
            size: entry.size(),
            parent: (parent != -1).then_some(parent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mobi::test_helpers::{MobiHeaderBuilder, book_bytes, exth_bytes, ncx_records};

    #[test]
    fn test_summary_of_indexed_book() {
        let header = MobiHeaderBuilder::new(232)
            .text_records(1, 8)
            .primary_index(2)
            .first_non_book(2)
            .exth(exth_bytes(&[(100, b"Some Author")]))
            .full_name(b"Book Title")
            .build();
        let mut records = vec![b"abcdefgh".to_vec()];
        records.extend(ncx_records(&[(0, 8, "Chapter 1")]));
        let data = book_bytes(&header, &records);

        let file = MobiFile::parse(&data).unwrap();
        let summary = MobiSummary::from_file(&file);
        assert_eq!(summary.name, "Test Book");
        assert_eq!(summary.title, "Book Title");
        assert_eq!(summary.encoding, "utf-8");
        assert_eq!(summary.text_length, 8);
        assert_eq!(summary.exth[0].name, "author");
        assert_eq!(summary.exth[0].value, "Some Author");
        assert_eq!(summary.index.len(), 1);
        assert_eq!(summary.index[0].label, "Chapter 1");
        assert_eq!(summary.index[0].parent, None);
        assert!(summary.tbs_types.is_empty());
        assert!(summary.binary.is_empty());
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_summary_json() {
        let header = MobiHeaderBuilder::new(232).text_records(1, 2).build();
        let data = book_bytes(&header, &[b"hi".to_vec()]);
        let file = MobiFile::parse(&data).unwrap();
        let json = serde_json::to_value(MobiSummary::from_file(&file)).unwrap();
        assert_eq!(json["text_record_count"], 1);
        assert_eq!(json["compression"], file.mobi_header.compression.description());
        assert!(json.get("images").is_none());
    }
}
