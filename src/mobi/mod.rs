//! MOBI/PalmDB decoding and inspection.
//!
//! [`MobiFile::parse`] decodes a whole container held in memory: the PalmDB
//! record table, the MOBI and EXTH headers, the primary and secondary
//! indices with their CNCX strings, text/image/binary/font records and the
//! trailing byte sequences (TBS) of each text record. [`inspect_mobi`]
//! writes all of it to a directory as text reports and extracted records.

mod bytes;
pub mod cncx;
mod codec;
pub mod dump;
pub mod file;
pub mod font;
pub mod headers;
mod huffcdic;
pub mod index;
mod langcodes;
pub mod palmdb;
mod palmdoc;
pub mod records;
pub mod report;
pub mod summary;
pub mod tags;
pub mod tbs;

#[cfg(test)]
mod test_helpers;

pub use dump::{InspectOptions, dump_mobi, inspect_mobi};
pub use file::MobiFile;
pub use headers::{Compression, DocType, Encryption, ExthHeader, ExthRecord, ExthValue, MobiHeader};
pub use index::{IndexHeader, TagX};
pub use palmdb::{PalmDbHeader, Record};
pub use summary::MobiSummary;
pub use tags::{EntryId, IndexEntry, IndexRecord, TagKind};
pub use tbs::{TbsEvent, TbsIndexing};
