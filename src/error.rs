//! Error types for mobi-inspect operations.

use thiserror::Error;

/// Errors that can occur while decoding a MOBI container.
///
/// Structural problems at container and header boundaries (`Format`,
/// `UnsupportedFormat`, `Truncated`) abort the decode. `Tbs` and `Font`
/// are produced by per-record stages and are normally caught, logged and
/// recorded on the record instead of being propagated.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Invalid MOBI: {0}")]
    Format(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Truncated {context}: need {needed} bytes at offset {offset}, only {available} available")]
    Truncated {
        context: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Failed to decode TBS bytes for record {record}: {reason}")]
    Tbs { record: usize, reason: String },

    #[error("Decompression failed: {0}")]
    Decompression(String),

    #[error("Failed to read font record: {0}")]
    Font(String),
}

impl Error {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        Error::Format(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
