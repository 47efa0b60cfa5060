//! Builders for synthetic PalmDB/MOBI data used by the unit tests.

use super::headers::{MOBI_HEADER_MIN_LEN, NULL_INDEX};
use super::index::TagX;

fn put_u16(buf: &mut [u8], at: usize, v: u16) {
    buf[at..at + 2].copy_from_slice(&v.to_be_bytes());
}

fn put_u32(buf: &mut [u8], at: usize, v: u32) {
    buf[at..at + 4].copy_from_slice(&v.to_be_bytes());
}

/// Forward VWI, high bit set on the last byte.
pub fn encint(val: u32) -> Vec<u8> {
    let mut out = vec![(val & 0x7F) as u8 | 0x80];
    let mut v = val >> 7;
    while v != 0 {
        out.insert(0, (v & 0x7F) as u8);
        v >>= 7;
    }
    out
}

/// A PalmDB container holding `records` back to back.
pub fn palmdb_bytes(name: &[u8], ident: &[u8; 8], records: &[&[u8]]) -> Vec<u8> {
    let mut out = vec![0u8; 78];
    let n = name.len().min(31);
    out[..n].copy_from_slice(&name[..n]);
    put_u16(&mut out, 34, 1);
    put_u32(&mut out, 36, 3_600_000_000);
    put_u32(&mut out, 40, 3_600_000_100);
    out[60..68].copy_from_slice(ident);
    put_u32(&mut out, 68, records.len() as u32 * 2);
    put_u16(&mut out, 76, records.len() as u16);

    let mut offset = 78 + 8 * records.len();
    for (i, record) in records.iter().enumerate() {
        out.extend_from_slice(&(offset as u32).to_be_bytes());
        out.push(0);
        out.extend_from_slice(&(i as u32 + 1).to_be_bytes()[1..]);
        offset += record.len();
    }
    for record in records {
        out.extend_from_slice(record);
    }
    out
}

/// A `BOOKMOBI` file whose record 0 is `header` followed by `records`.
pub fn book_bytes(header: &[u8], records: &[Vec<u8>]) -> Vec<u8> {
    let mut all: Vec<&[u8]> = vec![header];
    all.extend(records.iter().map(Vec::as_slice));
    palmdb_bytes(b"Test Book", b"BOOKMOBI", &all)
}

/// Record 0 builder. Defaults: uncompressed UTF-8 Mobipocket book in
/// US English, no EXTH, no index.
#[derive(Debug, Clone)]
pub struct MobiHeaderBuilder {
    length: u32,
    compression: u16,
    doc_type: u32,
    encoding: u32,
    file_version: u32,
    text_length: u32,
    text_records: u16,
    secondary_index: u32,
    first_non_book: u32,
    first_image: u32,
    huffman: (u32, u32),
    extra_data_flags: u32,
    primary_index: u32,
    exth: Option<Vec<u8>>,
    full_name: Vec<u8>,
}

impl MobiHeaderBuilder {
    pub fn new(length: u32) -> Self {
        Self {
            length,
            compression: 1,
            doc_type: 2,
            encoding: 65001,
            file_version: 6,
            text_length: 0,
            text_records: 0,
            secondary_index: NULL_INDEX,
            first_non_book: NULL_INDEX,
            first_image: NULL_INDEX,
            huffman: (0, 0),
            extra_data_flags: 0,
            primary_index: NULL_INDEX,
            exth: None,
            full_name: Vec::new(),
        }
    }

    pub fn compression(mut self, compression: u16) -> Self {
        self.compression = compression;
        self
    }

    pub fn doc_type(mut self, doc_type: u32) -> Self {
        self.doc_type = doc_type;
        self
    }

    pub fn file_version(mut self, version: u32) -> Self {
        self.file_version = version;
        self
    }

    pub fn text_records(mut self, count: u16, text_length: u32) -> Self {
        self.text_records = count;
        self.text_length = text_length;
        self
    }

    pub fn secondary_index(mut self, record: u32) -> Self {
        self.secondary_index = record;
        self
    }

    pub fn first_non_book(mut self, record: u32) -> Self {
        self.first_non_book = record;
        self
    }

    pub fn first_image(mut self, record: u32) -> Self {
        self.first_image = record;
        self
    }

    pub fn huffman(mut self, offset: u32, count: u32) -> Self {
        self.huffman = (offset, count);
        self
    }

    pub fn extra_data_flags(mut self, flags: u32) -> Self {
        self.extra_data_flags = flags;
        self
    }

    pub fn primary_index(mut self, record: u32) -> Self {
        self.primary_index = record;
        self
    }

    pub fn exth(mut self, exth: Vec<u8>) -> Self {
        self.exth = Some(exth);
        self
    }

    pub fn full_name(mut self, name: &[u8]) -> Self {
        self.full_name = name.to_vec();
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let header_end = 16 + self.length as usize;
        let mut raw = vec![0u8; header_end.max(MOBI_HEADER_MIN_LEN)];

        put_u16(&mut raw, 0, self.compression);
        put_u32(&mut raw, 4, self.text_length);
        put_u16(&mut raw, 8, self.text_records);
        put_u16(&mut raw, 10, 4096);
        raw[16..20].copy_from_slice(b"MOBI");
        put_u32(&mut raw, 20, self.length);
        put_u32(&mut raw, 24, self.doc_type);
        put_u32(&mut raw, 28, self.encoding);
        put_u32(&mut raw, 32, 0xC0FFEE);
        put_u32(&mut raw, 36, self.file_version);
        raw[40..48].fill(0xFF);
        put_u32(&mut raw, 48, self.secondary_index);
        raw[52..80].fill(0xFF);
        put_u32(&mut raw, 80, self.first_non_book);
        put_u32(&mut raw, 92, 0x0409);
        put_u32(&mut raw, 104, self.file_version);
        put_u32(&mut raw, 108, self.first_image);
        put_u32(&mut raw, 112, self.huffman.0);
        put_u32(&mut raw, 116, self.huffman.1);
        put_u32(&mut raw, 120, NULL_INDEX);
        if self.exth.is_some() {
            put_u32(&mut raw, 128, 0x40);
        }

        if raw.len() >= 180 {
            put_u32(&mut raw, 164, NULL_INDEX);
        }
        if raw.len() >= 248 {
            put_u16(&mut raw, 192, 1);
            put_u16(&mut raw, 194, self.text_records);
            put_u32(&mut raw, 196, 1);
            put_u32(&mut raw, 200, NULL_INDEX);
            put_u32(&mut raw, 208, NULL_INDEX);
            put_u32(&mut raw, 224, NULL_INDEX);
            put_u32(&mut raw, 240, self.extra_data_flags);
            put_u32(&mut raw, 244, self.primary_index);
        }

        if let Some(exth) = &self.exth {
            assert!(header_end >= MOBI_HEADER_MIN_LEN, "EXTH would overlap the header");
            raw.truncate(header_end);
            raw.extend_from_slice(exth);
        }

        let name_offset = raw.len() as u32;
        put_u32(&mut raw, 84, name_offset);
        put_u32(&mut raw, 88, self.full_name.len() as u32);
        raw.extend_from_slice(&self.full_name);
        raw.extend_from_slice(&[0, 0]);
        raw
    }
}

/// An EXTH block holding `records` in the given order.
pub fn exth_bytes(records: &[(u32, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (type_id, data) in records {
        body.extend_from_slice(&type_id.to_be_bytes());
        body.extend_from_slice(&(data.len() as u32 + 8).to_be_bytes());
        body.extend_from_slice(data);
    }

    let mut out = b"EXTH".to_vec();
    out.extend_from_slice(&(body.len() as u32 + 12).to_be_bytes());
    out.extend_from_slice(&(records.len() as u32).to_be_bytes());
    out.extend_from_slice(&body);
    out
}

/// A TAGX section.
pub fn tagx_bytes(control_byte_count: u32, entries: &[TagX]) -> Vec<u8> {
    let mut out = b"TAGX".to_vec();
    out.extend_from_slice(&(12 + 4 * entries.len() as u32).to_be_bytes());
    out.extend_from_slice(&control_byte_count.to_be_bytes());
    for e in entries {
        out.extend_from_slice(&[e.tag, e.num_values, e.bitmask, e.eof]);
    }
    out
}

const INDEX_HEADER_LEN: usize = 192;

/// Builder for index header records and index data records.
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    tagx: Vec<TagX>,
    primary: bool,
    ncx_count: u16,
    last_entry: Option<u32>,
    index_count: u32,
    cncx_blocks: u32,
}

impl IndexBuilder {
    pub fn new(tagx: Vec<TagX>) -> Self {
        Self {
            tagx,
            primary: false,
            ncx_count: 1,
            last_entry: None,
            index_count: 0,
            cncx_blocks: 0,
        }
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    pub fn ncx_count(mut self, count: u16) -> Self {
        self.ncx_count = count;
        self
    }

    /// Override the stored last entry id (defaults to `ncx_count - 1`).
    pub fn last_entry(mut self, id: u32) -> Self {
        self.last_entry = Some(id);
        self
    }

    pub fn index_count(mut self, count: u32) -> Self {
        self.index_count = count;
        self
    }

    pub fn cncx_blocks(mut self, count: u32) -> Self {
        self.cncx_blocks = count;
        self
    }

    pub fn build_header(&self) -> Vec<u8> {
        let mut out = vec![0u8; INDEX_HEADER_LEN];
        out[..4].copy_from_slice(b"INDX");
        put_u32(&mut out, 4, INDEX_HEADER_LEN as u32);
        if self.primary {
            put_u32(&mut out, 12, 1);
        }
        put_u32(&mut out, 24, self.index_count);
        put_u32(&mut out, 28, 65001);
        put_u32(&mut out, 32, NULL_INDEX);
        put_u32(&mut out, 36, self.ncx_count as u32);
        put_u32(&mut out, 52, self.cncx_blocks);
        put_u32(&mut out, 180, INDEX_HEADER_LEN as u32);

        let control_bytes = self.tagx.iter().filter(|t| t.eof == 1).count().max(1);
        let tagx = tagx_bytes(control_bytes as u32, &self.tagx);
        let tagx_len = tagx.len() as u32;
        out.extend_from_slice(&tagx);

        let last = self
            .last_entry
            .unwrap_or_else(|| (self.ncx_count as u32).saturating_sub(1));
        let hex = format!("{last:02x}");
        out.push(hex.len() as u8);
        out.extend_from_slice(hex.as_bytes());
        out.extend_from_slice(&self.ncx_count.to_be_bytes());
        while out.len() % 4 != 0 {
            out.push(0);
        }

        let idxt_start = out.len() as u32;
        put_u32(&mut out, 20, idxt_start);
        out.extend_from_slice(b"IDXT");
        out.extend_from_slice(&((INDEX_HEADER_LEN as u32 + tagx_len) as u16).to_be_bytes());
        out.extend_from_slice(&[0, 0]);
        out
    }

    /// An index data record with `(identifier, control and tag bytes)` entries.
    pub fn data_record(entries: &[(&[u8], Vec<u8>)]) -> Vec<u8> {
        let mut out = vec![0u8; INDEX_HEADER_LEN];
        out[..4].copy_from_slice(b"INDX");
        put_u32(&mut out, 4, INDEX_HEADER_LEN as u32);
        put_u32(&mut out, 24, entries.len() as u32);

        let mut positions = Vec::with_capacity(entries.len());
        for (ident, tags) in entries {
            positions.push(out.len() as u16);
            out.push(ident.len() as u8);
            out.extend_from_slice(ident);
            out.extend_from_slice(tags);
        }

        let idxt_pos = out.len() as u32;
        put_u32(&mut out, 20, idxt_pos);
        out.extend_from_slice(b"IDXT");
        for p in positions {
            out.extend_from_slice(&p.to_be_bytes());
        }
        out
    }
}

/// TAGX of the NCX built by [`ncx_records`]: offset, size, label, depth.
pub fn ncx_tagx() -> Vec<TagX> {
    let tag = |tag, bitmask| TagX {
        tag,
        num_values: 1,
        bitmask,
        eof: 0,
    };
    vec![
        tag(1, 0x01),
        tag(2, 0x02),
        tag(3, 0x04),
        tag(4, 0x08),
        TagX {
            tag: 0,
            num_values: 0,
            bitmask: 0,
            eof: 1,
        },
    ]
}

/// A primary index over `(offset, size, label)` entries: the header, one
/// data record and one CNCX record. Entry `i` is identified as `i` in hex.
pub fn ncx_records(entries: &[(u32, u32, &str)]) -> Vec<Vec<u8>> {
    let mut cncx = Vec::new();
    let mut data_entries = Vec::with_capacity(entries.len());
    let idents: Vec<String> = (0..entries.len()).map(|i| format!("{i:02x}")).collect();

    for (i, &(offset, size, label)) in entries.iter().enumerate() {
        let label_offset = cncx.len() as u32;
        cncx.extend(encint(label.len() as u32));
        cncx.extend_from_slice(label.as_bytes());

        let mut tags = vec![0x0F];
        for v in [offset, size, label_offset, 0] {
            tags.extend(encint(v));
        }
        data_entries.push((idents[i].as_bytes(), tags));
    }

    let header = IndexBuilder::new(ncx_tagx())
        .primary()
        .ncx_count(entries.len() as u16)
        .index_count(1)
        .cncx_blocks(1)
        .build_header();
    vec![header, IndexBuilder::data_record(&data_entries), cncx]
}
