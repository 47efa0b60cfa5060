//! # mobi-inspect
//!
//! A decoder and debug inspector for MOBI/PalmDB ebook containers.
//!
//! ## Features
//!
//! - PalmDB header and record table with offset validation
//! - MOBI header, DRM and extra-data sections, EXTH metadata
//! - Primary and secondary INDX indices with TAGX tag tables and CNCX strings
//! - PalmDoc and HUFF/CDIC text decompression, trailing entries per record
//! - TBS (trailing byte sequence) indexing for books and periodicals
//! - Image, font and binary record extraction
//!
//! ## Quick Start
//!
//! ```no_run
//! use mobi_inspect::{InspectOptions, inspect_mobi};
//!
//! let dir = inspect_mobi("book.mobi", &InspectOptions::default())?;
//! println!("Debug data saved to: {}", dir.display());
//! # Ok::<(), mobi_inspect::Error>(())
//! ```
//!
//! ## Working with a decoded file
//!
//! [`MobiFile`] borrows from the file's bytes:
//!
//! ```no_run
//! use mobi_inspect::MobiFile;
//!
//! let data = std::fs::read("book.mobi")?;
//! let file = MobiFile::parse(&data)?;
//! println!("{}", file.mobi_header.full_name());
//! if let Some(index) = &file.index_record {
//!     for entry in &index.indices {
//!         println!("{} at {}", entry.label(), entry.offset());
//!     }
//! }
//! # Ok::<(), mobi_inspect::Error>(())
//! ```

pub mod error;
pub mod mobi;
pub mod util;

pub use error::{Error, Result};
pub use mobi::{InspectOptions, MobiFile, MobiSummary, dump_mobi, inspect_mobi};
