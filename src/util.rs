//! Text decoding, byte formatting and image sniffing helpers.

use std::borrow::Cow;
use std::fmt::Write as _;

// ============================================================================
// Text Decoding
// ============================================================================

/// Text encodings declared by MOBI headers and index headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
#[cfg_attr(feature = "cli", serde(rename_all = "kebab-case"))]
pub enum TextEncoding {
    Cp1252,
    Utf8,
}

impl TextEncoding {
    /// Resolve a Windows codepage number.
    pub fn from_codepage(codepage: u32) -> Option<Self> {
        match codepage {
            1252 => Some(TextEncoding::Cp1252),
            65001 => Some(TextEncoding::Utf8),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TextEncoding::Cp1252 => "cp1252",
            TextEncoding::Utf8 => "utf-8",
        }
    }

    fn encoding(self) -> &'static encoding_rs::Encoding {
        match self {
            TextEncoding::Cp1252 => encoding_rs::WINDOWS_1252,
            TextEncoding::Utf8 => encoding_rs::UTF_8,
        }
    }
}

/// Decode bytes in `encoding`, failing on malformed input.
///
/// No BOM sniffing and no replacement characters: a `None` return means the
/// bytes are not valid in the declared encoding.
pub fn decode_strict(bytes: &[u8], encoding: TextEncoding) -> Option<Cow<'_, str>> {
    encoding
        .encoding()
        .decode_without_bom_handling_and_without_replacement(bytes)
}

/// Decode bytes in `encoding`, substituting U+FFFD for malformed sequences.
pub fn decode_lossy(bytes: &[u8], encoding: TextEncoding) -> Cow<'_, str> {
    let (text, _) = encoding.encoding().decode_without_bom_handling(bytes);
    text
}

/// Decode UTF-16 text, honouring a BOM and defaulting to little-endian.
pub fn decode_utf16(bytes: &[u8]) -> Option<String> {
    let (text, _, malformed) = encoding_rs::UTF_16LE.decode(bytes);
    (!malformed).then(|| text.into_owned())
}

// ============================================================================
// Byte Formatting
// ============================================================================

/// Render bytes as space-separated lowercase hex without zero padding.
pub fn format_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{b:x}");
    }
    out
}

/// Render bytes as an escaped byte-string literal, e.g. `"MOBI\0"`.
pub fn repr_bytes(bytes: &[u8]) -> String {
    format!("{:?}", bstr::BStr::new(bytes))
}

/// Whether every byte in `bytes` is NUL.
pub fn all_zero(bytes: &[u8]) -> bool {
    bytes.iter().all(|&b| b == 0)
}

// ============================================================================
// Image Identification
// ============================================================================

/// Image formats recognized by magic-byte sniffing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
#[cfg_attr(feature = "cli", serde(rename_all = "lowercase"))]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Bmp,
}

impl ImageFormat {
    /// File extension used when dumping the image.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::Gif => "gif",
            ImageFormat::Bmp => "bmp",
        }
    }
}

/// Result of sniffing an image record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
}

/// Identify an image from its leading bytes.
///
/// Returns `None` when the data is not a recognized image or its header is
/// too short to yield dimensions.
pub fn identify_image(data: &[u8]) -> Option<ImageInfo> {
    if data.len() < 4 {
        return None;
    }

    let (format, (width, height)) = if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        (ImageFormat::Jpeg, extract_jpeg_dimensions(data)?)
    } else if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        // IHDR chunk: width/height at bytes 16-23
        if data.len() < 24 {
            return None;
        }
        let width = u32::from_be_bytes([data[16], data[17], data[18], data[19]]);
        let height = u32::from_be_bytes([data[20], data[21], data[22], data[23]]);
        (ImageFormat::Png, (width, height))
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        if data.len() < 10 {
            return None;
        }
        let width = u16::from_le_bytes([data[6], data[7]]) as u32;
        let height = u16::from_le_bytes([data[8], data[9]]) as u32;
        (ImageFormat::Gif, (width, height))
    } else if data.starts_with(b"BM") {
        // BITMAPINFOHEADER: signed width/height at 18-25, height may be negative
        if data.len() < 26 {
            return None;
        }
        let width = i32::from_le_bytes([data[18], data[19], data[20], data[21]]);
        let height = i32::from_le_bytes([data[22], data[23], data[24], data[25]]);
        (
            ImageFormat::Bmp,
            (width.unsigned_abs(), height.unsigned_abs()),
        )
    } else {
        return None;
    };

    Some(ImageInfo {
        width,
        height,
        format,
    })
}

/// Extract dimensions from JPEG data by parsing SOF markers.
fn extract_jpeg_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    let mut i = 2;
    while i + 4 < data.len() {
        if data[i] != 0xFF {
            i += 1;
            continue;
        }

        let marker = data[i + 1];

        // SOF markers (Start of Frame) - various encoding types
        if matches!(
            marker,
            0xC0 | 0xC1
                | 0xC2
                | 0xC3
                | 0xC5
                | 0xC6
                | 0xC7
                | 0xC9
                | 0xCA
                | 0xCB
                | 0xCD
                | 0xCE
                | 0xCF
        ) && i + 9 < data.len()
        {
            let height = u16::from_be_bytes([data[i + 5], data[i + 6]]) as u32;
            let width = u16::from_be_bytes([data[i + 7], data[i + 8]]) as u32;
            return Some((width, height));
        }

        // Skip to next marker
        let length = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        i += 2 + length;
    }
    None
}
