//! A fully decoded MOBI container.

use std::collections::BTreeSet;
use std::ops::Range;

use log::{debug, info};

use super::cncx::Cncx;
use super::codec::TextCodec;
use super::headers::{Compression, MobiHeader, NULL_INDEX};
use super::index::IndexHeader;
use super::palmdb::{PalmDbHeader, Record, read_records};
use super::records::{BinaryRecord, FontRecord, ImageRecord, TextRecord, classify};
use super::tags::IndexRecord;
use super::tbs::TbsIndexing;
use crate::error::{Error, Result};

/// Every structure of a MOBI file, borrowing from the file's bytes.
#[derive(Debug)]
pub struct MobiFile<'a> {
    pub raw: &'a [u8],
    pub palmdb: PalmDbHeader<'a>,
    pub records: Vec<Record<'a>>,
    pub mobi_header: MobiHeader<'a>,
    /// Records holding the HUFF/CDIC tables.
    pub huffman_record_nums: Range<usize>,
    pub index_header: Option<IndexHeader<'a>>,
    pub cncx: Cncx<'a>,
    pub index_record: Option<IndexRecord>,
    pub secondary_index_header: Option<IndexHeader<'a>>,
    pub secondary_index_record: Option<IndexRecord>,
    /// Records claimed by the primary and secondary indices.
    pub indexing_record_nums: BTreeSet<usize>,
    pub text_records: Vec<TextRecord<'a>>,
    pub image_records: Vec<ImageRecord<'a>>,
    pub binary_records: Vec<BinaryRecord<'a>>,
    pub font_records: Vec<FontRecord<'a>>,
    /// Present when the file has a primary index.
    pub tbs_indexing: Option<TbsIndexing<'a>>,
}

/// `count` records starting at `start`, or a truncation error naming `context`.
fn record_slice<'r, 'a>(
    records: &'r [Record<'a>],
    start: usize,
    count: usize,
    context: &'static str,
) -> Result<&'r [Record<'a>]> {
    start
        .checked_add(count)
        .and_then(|end| records.get(start..end))
        .ok_or(Error::Truncated {
            context,
            offset: start,
            needed: count,
            available: records.len().saturating_sub(start),
        })
}

impl<'a> MobiFile<'a> {
    /// Decode a MOBI container held in memory.
    ///
    /// Container and header problems abort with an error. TBS and font
    /// record problems are logged and kept on the affected records.
    pub fn parse(raw: &'a [u8]) -> Result<Self> {
        let palmdb = PalmDbHeader::parse(raw)?;
        let records = read_records(raw, &palmdb)?;
        let record0 = records
            .first()
            .ok_or_else(|| Error::format("The file contains no records"))?;
        let mobi_header = MobiHeader::parse(record0.raw)?;

        let huffman_record_nums = if mobi_header.compression == Compression::Huffman {
            let start = mobi_header.huffman_record_offset as usize;
            start..start.saturating_add(mobi_header.huffman_record_count as usize)
        } else {
            0..0
        };
        let mut codec = TextCodec::for_header(&mobi_header, &records)?;

        let mut cncx = Cncx::new();
        let mut index_header = None;
        let mut index_record = None;
        let mut indexing_record_nums = BTreeSet::new();

        let pir = mobi_header.primary_index_record();
        if pir != NULL_INDEX {
            let pir = pir as usize;
            let header_record = record_slice(&records, pir, 1, "primary index header")?;
            let header = IndexHeader::parse_primary(header_record[0].raw)?;
            let numi = header.index_count as usize;
            let num_cncx = header.num_of_cncx_blocks as usize;

            let cncx_records = record_slice(&records, pir + 1 + numi, num_cncx, "CNCX records")?;
            cncx = Cncx::parse(cncx_records.iter().map(|r| r.raw), header.encoding);

            let data = record_slice(&records, pir + 1, numi, "primary index records")?;
            index_record = Some(IndexRecord::parse(data, &header, &cncx)?);
            indexing_record_nums.extend(pir..pir + 1 + numi + num_cncx);
            index_header = Some(header);
        }

        let mut secondary_index_header = None;
        let mut secondary_index_record = None;
        let sir = mobi_header.secondary_index_record;
        if sir != NULL_INDEX {
            let sir = sir as usize;
            let header_record = record_slice(&records, sir, 1, "secondary index header")?;
            let header = IndexHeader::parse_secondary(header_record[0].raw)?;
            let numi = header.index_count as usize;

            let data = record_slice(&records, sir + 1, numi, "secondary index records")?;
            secondary_index_record = Some(IndexRecord::parse(data, &header, &cncx)?);
            indexing_record_nums.extend(sir..sir + 1 + numi);
            secondary_index_header = Some(header);
        }

        let ntr = mobi_header.number_of_text_records as usize;
        let extra_data_flags = mobi_header.extra_data_flags();
        let text_records = (1..records.len().min(ntr + 1))
            .map(|i| TextRecord::new(i, &records[i], extra_data_flags, &mut codec))
            .collect::<Result<Vec<_>>>()?;
        debug!("Decoded {} text records", text_records.len());

        let fntbr = match mobi_header.first_non_book_record {
            NULL_INDEX => records.len(),
            n => n as usize,
        };
        let fii = mobi_header.first_image_index as usize;
        let classified = classify(&records, fntbr, fii, |i| {
            indexing_record_nums.contains(&i) || huffman_record_nums.contains(&i)
        });

        let tbs_indexing = index_record.as_ref().map(|index| {
            TbsIndexing::new(&text_records, &index.indices, mobi_header.doc_type)
        });

        info!(
            "Decoded MOBI file: {} records, {} text, {} images, {} fonts, {} binary",
            records.len(),
            text_records.len(),
            classified.images.len(),
            classified.fonts.len(),
            classified.binaries.len()
        );

        Ok(Self {
            raw,
            palmdb,
            records,
            mobi_header,
            huffman_record_nums,
            index_header,
            cncx,
            index_record,
            secondary_index_header,
            secondary_index_record,
            indexing_record_nums,
            text_records,
            image_records: classified.images,
            binary_records: classified.binaries,
            font_records: classified.fonts,
            tbs_indexing,
        })
    }

    /// All text records concatenated.
    pub fn alltext(&self) -> Vec<u8> {
        let len = self.text_records.iter().map(|r| r.raw.len()).sum();
        let mut out = Vec::with_capacity(len);
        for record in &self.text_records {
            out.extend_from_slice(&record.raw);
        }
        out
    }
}
