//! On-disk extraction of a decoded file.
//!
//! Layout of a dump directory:
//!
//! ```text
//! header.txt            PalmDB, record table, MOBI and EXTH reports
//! text.html             all text records concatenated
//! pretty.html           re-indented text.html (file versions < 8)
//! index.txt             index headers, CNCX and index entries
//! tbs_indexing.txt      TBS report for every text record
//! tbs_type_N.txt        TBS report for records of type N
//! text/                 NNNNNN.txt and NNNNNN.trailing_data
//! images/               NNNNNN.<ext>
//! binary/               NNNNNN[-SIG].bin
//! font/                 NNNNNN.<ext>
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::Event;

use super::file::MobiFile;
use super::report;
use crate::error::Result;

/// Options for [`inspect_mobi`].
#[derive(Debug, Clone)]
pub struct InspectOptions {
    /// Dump directory; `decompiled_<file stem>` beside the input when unset.
    pub output_dir: Option<PathBuf>,
    /// Write `pretty.html` for pre-KF8 files.
    pub pretty: bool,
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self {
            output_dir: None,
            pretty: true,
        }
    }
}

/// Default dump directory for `path`.
pub fn default_output_dir(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("decompiled_{stem}"))
}

/// Decode the MOBI file at `path` and dump everything into a directory.
///
/// An existing output directory is removed first. Returns the directory.
pub fn inspect_mobi(path: impl AsRef<Path>, options: &InspectOptions) -> Result<PathBuf> {
    let path = path.as_ref();
    let raw = fs::read(path)?;
    let file = MobiFile::parse(&raw)?;

    let dir = options
        .output_dir
        .clone()
        .unwrap_or_else(|| default_output_dir(path));
    if dir.exists() {
        debug!("Removing existing dump at {}", dir.display());
        fs::remove_dir_all(&dir)?;
    }
    fs::create_dir_all(&dir)?;

    dump_mobi(&file, &dir, options.pretty)?;
    info!("Debug data saved to: {}", dir.display());
    Ok(dir)
}

/// Write every report and record of `file` into `dir`, which must exist.
pub fn dump_mobi(file: &MobiFile<'_>, dir: &Path, pretty: bool) -> Result<()> {
    fs::write(dir.join("header.txt"), report::header_report(file))?;

    let alltext = file.alltext();
    fs::write(dir.join("text.html"), &alltext)?;
    if pretty && file.mobi_header.file_version < 8 {
        match pretty_html(&alltext) {
            Ok(html) => fs::write(dir.join("pretty.html"), html)?,
            Err(e) => warn!("Skipping pretty.html: {e}"),
        }
    }

    if file.index_header.is_some() || file.secondary_index_header.is_some() {
        fs::write(dir.join("index.txt"), report::index_report(file, &alltext))?;
    }

    if let Some(tbs) = &file.tbs_indexing {
        if let Some(text) = report::tbs_report(file) {
            fs::write(dir.join("tbs_indexing.txt"), text)?;
        }
        let entries = file.index_record.as_ref().map_or(&[][..], |r| &r.indices);
        for (tbs_type, text) in report::tbs_type_reports(tbs, entries) {
            fs::write(dir.join(format!("tbs_type_{tbs_type}.txt")), text)?;
        }
    }

    let text_dir = subdir(dir, "text")?;
    for record in &file.text_records {
        record.dump(&text_dir)?;
    }
    let image_dir = subdir(dir, "images")?;
    for record in &file.image_records {
        record.dump(&image_dir)?;
    }
    let binary_dir = subdir(dir, "binary")?;
    for record in &file.binary_records {
        record.dump(&binary_dir)?;
    }
    let font_dir = subdir(dir, "font")?;
    for record in &file.font_records {
        record.dump(&font_dir)?;
    }

    debug!(
        "Dumped {} text, {} image, {} binary and {} font records",
        file.text_records.len(),
        file.image_records.len(),
        file.binary_records.len(),
        file.font_records.len()
    );
    Ok(())
}

fn subdir(dir: &Path, name: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::create_dir_all(&path)?;
    Ok(path)
}

/// Re-indent markup, tolerating the unbalanced tags of MOBI HTML.
pub fn pretty_html(html: &[u8]) -> Result<Vec<u8>> {
    let mut reader = Reader::from_reader(html);
    let config = reader.config_mut();
    config.trim_text(true);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    let mut writer = Writer::new_with_indent(Vec::with_capacity(html.len()), b' ', 2);
    loop {
        match reader.read_event()? {
            Event::Eof => break,
            event => writer.write_event(event)?,
        }
    }
    Ok(writer.into_inner())
}
