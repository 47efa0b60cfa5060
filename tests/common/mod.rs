//! Synthetic MOBI files for the integration tests.

#![allow(dead_code)]

pub const NULL: u32 = 0xFFFF_FFFF;

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

/// A `BOOKMOBI` PalmDB holding `records`.
pub fn palmdb(name: &str, records: &[Vec<u8>]) -> Vec<u8> {
    let mut out = vec![0u8; 78];
    out[..name.len()].copy_from_slice(name.as_bytes());
    put_u32(&mut out, 36, 3_600_000_000);
    out[60..68].copy_from_slice(b"BOOKMOBI");
    put_u16(&mut out, 76, records.len() as u16);

    let mut offset = 78 + 8 * records.len();
    for (i, record) in records.iter().enumerate() {
        out.extend_from_slice(&(offset as u32).to_be_bytes());
        out.extend_from_slice(&(i as u32).to_be_bytes());
        offset += record.len();
    }
    for record in records {
        out.extend_from_slice(record);
    }
    out
}

/// Record 0 of a UTF-8 book.
#[derive(Debug, Clone)]
pub struct Header {
    pub length: u32,
    pub compression: u16,
    pub doc_type: u32,
    pub file_version: u32,
    pub text_records: u16,
    pub secondary_index: u32,
    pub first_non_book: u32,
    pub first_image: u32,
    pub extra_data_flags: u32,
    pub primary_index: u32,
    pub exth: Vec<(u32, Vec<u8>)>,
    pub title: String,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            length: 232,
            compression: 1,
            doc_type: 2,
            file_version: 6,
            text_records: 0,
            secondary_index: NULL,
            first_non_book: NULL,
            first_image: NULL,
            extra_data_flags: 0,
            primary_index: NULL,
            exth: Vec::new(),
            title: "Synthetic".into(),
        }
    }
}

impl Header {
    pub fn build(&self) -> Vec<u8> {
        let end = 16 + self.length as usize;
        let mut raw = vec![0u8; end.max(132)];
        put_u16(&mut raw, 0, self.compression);
        put_u16(&mut raw, 8, self.text_records);
        put_u16(&mut raw, 10, 4096);
        raw[16..20].copy_from_slice(b"MOBI");
        put_u32(&mut raw, 20, self.length);
        put_u32(&mut raw, 24, self.doc_type);
        put_u32(&mut raw, 28, 65001);
        put_u32(&mut raw, 36, self.file_version);
        put_u32(&mut raw, 48, self.secondary_index);
        put_u32(&mut raw, 80, self.first_non_book);
        put_u32(&mut raw, 92, 0x0809);
        put_u32(&mut raw, 108, self.first_image);
        if !self.exth.is_empty() {
            put_u32(&mut raw, 128, 0x40);
        }
        if raw.len() >= 248 {
            put_u32(&mut raw, 240, self.extra_data_flags);
            put_u32(&mut raw, 244, self.primary_index);
        }

        if !self.exth.is_empty() {
            raw.truncate(end);
            let mut body = Vec::new();
            for (type_id, data) in &self.exth {
                body.extend_from_slice(&type_id.to_be_bytes());
                body.extend_from_slice(&(data.len() as u32 + 8).to_be_bytes());
                body.extend_from_slice(data);
            }
            raw.extend_from_slice(b"EXTH");
            raw.extend_from_slice(&(body.len() as u32 + 12).to_be_bytes());
            raw.extend_from_slice(&(self.exth.len() as u32).to_be_bytes());
            raw.extend_from_slice(&body);
        }

        let name_offset = raw.len() as u32;
        put_u32(&mut raw, 84, name_offset);
        put_u32(&mut raw, 88, self.title.len() as u32);
        raw.extend_from_slice(self.title.as_bytes());
        raw.extend_from_slice(&[0, 0]);
        raw
    }
}

/// Tags of the index built by [`index_records`]: offset, size, label,
/// depth, parent.
const TAGX: [[u8; 4]; 6] = [
    [1, 1, 0x01, 0],
    [2, 1, 0x02, 0],
    [3, 1, 0x04, 0],
    [4, 1, 0x08, 0],
    [21, 1, 0x10, 0],
    [0, 0, 0, 1],
];

/// Index entry: `(offset, size, label, depth, parent)`.
pub type Entry<'a> = (u32, u32, &'a str, u32, Option<u32>);

/// The header record, one data record and one CNCX record of an index.
///
/// Entry `i` is identified as `i` in hex.
pub fn index_records(entries: &[Entry<'_>]) -> Vec<Vec<u8>> {
    let mut header = vec![0u8; 192];
    header[..4].copy_from_slice(b"INDX");
    put_u32(&mut header, 4, 192);
    put_u32(&mut header, 12, 1);
    put_u32(&mut header, 24, 1);
    put_u32(&mut header, 28, 65001);
    put_u32(&mut header, 36, entries.len() as u32);
    put_u32(&mut header, 52, 1);
    put_u32(&mut header, 180, 192);

    let tagx_len = 12 + 4 * TAGX.len() as u32;
    header.extend_from_slice(b"TAGX");
    header.extend_from_slice(&tagx_len.to_be_bytes());
    header.extend_from_slice(&1u32.to_be_bytes());
    for t in TAGX {
        header.extend_from_slice(&t);
    }
    let last = format!("{:02x}", entries.len().saturating_sub(1));
    header.push(last.len() as u8);
    header.extend_from_slice(last.as_bytes());
    header.extend_from_slice(&(entries.len() as u16).to_be_bytes());
    while header.len() % 4 != 0 {
        header.push(0);
    }
    let idxt = header.len() as u32;
    put_u32(&mut header, 20, idxt);
    header.extend_from_slice(b"IDXT");
    header.extend_from_slice(&((192 + tagx_len) as u16).to_be_bytes());
    header.extend_from_slice(&[0, 0]);

    let mut cncx = Vec::new();
    let mut data = vec![0u8; 192];
    data[..4].copy_from_slice(b"INDX");
    put_u32(&mut data, 4, 192);
    put_u32(&mut data, 24, entries.len() as u32);
    let mut positions = Vec::new();
    for (i, &(offset, size, label, depth, parent)) in entries.iter().enumerate() {
        let label_offset = cncx.len() as u32;
        cncx.extend(encint(label.len() as u32));
        cncx.extend_from_slice(label.as_bytes());

        positions.push(data.len() as u16);
        let ident = format!("{i:02x}");
        data.push(ident.len() as u8);
        data.extend_from_slice(ident.as_bytes());
        data.push(if parent.is_some() { 0x1F } else { 0x0F });
        for v in [offset, size, label_offset, depth] {
            data.extend(encint(v));
        }
        if let Some(p) = parent {
            data.extend(encint(p));
        }
    }
    let idxt = data.len() as u32;
    put_u32(&mut data, 20, idxt);
    data.extend_from_slice(b"IDXT");
    for p in positions {
        data.extend_from_slice(&p.to_be_bytes());
    }

    vec![header, data, cncx]
}

/// A text record followed by an indexing trailing entry holding `tbs`.
pub fn text_with_tbs(text: &[u8], tbs: &[u8]) -> Vec<u8> {
    let mut raw = text.to_vec();
    raw.extend_from_slice(tbs);
    raw.push(0x80 | (tbs.len() as u8 + 1));
    raw
}

/// A 1x1 PNG header, enough for sniffing.
pub fn png() -> Vec<u8> {
    let mut out = b"\x89PNG\r\n\x1a\n\0\0\0\x0dIHDR".to_vec();
    out.extend_from_slice(&1u32.to_be_bytes());
    out.extend_from_slice(&1u32.to_be_bytes());
    out.extend_from_slice(&[8, 6, 0, 0, 0]);
    out
}

/// An uncompressed, unobfuscated FONT record.
pub fn font(payload: &[u8]) -> Vec<u8> {
    let mut out = b"FONT".to_vec();
    for v in [payload.len() as u32, 0, 24, 0, 24] {
        out.extend_from_slice(&v.to_be_bytes());
    }
    out.extend_from_slice(payload);
    out
}

pub const EOF: &[u8] = b"\xe9\x8e\r\n";
