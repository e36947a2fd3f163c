//! Tabular I/O
//!
//! Reads a headered delimited text file or an `.xlsx` workbook into a
//! [`Table`] and writes tables back. The input format is detected from the
//! file contents; the output format comes from [`TableFormat`] or the path
//! extension.
//!
//! Cells are text or null. An empty cell reads as null and a null cell is
//! written empty.

mod delimited;
mod error;
mod table;
mod workbook;

pub use error::{Result, TabularError};
pub use table::{Cell, Record, Table};

use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::config::TabularConfig;
use crate::fsutil;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = b"\xD0\xCF\x11\xE0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// Headered delimited text
    Delimited,
    /// Office Open XML workbook
    Workbook,
}

impl TableFormat {
    /// `.xlsx` selects a workbook, anything else delimited text
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("xlsx") => TableFormat::Workbook,
            _ => TableFormat::Delimited,
        }
    }

    /// Detect the format from the leading bytes of a file
    pub fn detect(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(TabularError::unrecognised("file is empty"));
        }
        if bytes.starts_with(ZIP_MAGIC) {
            return Ok(TableFormat::Workbook);
        }
        if bytes.starts_with(OLE_MAGIC) {
            return Err(TabularError::unrecognised(
                "legacy binary workbooks are not supported",
            ));
        }
        Ok(TableFormat::Delimited)
    }
}

/// Read a table from `path`
pub fn read(path: &Path, config: &TabularConfig) -> Result<Table> {
    let bytes = fs::read(path).map_err(|source| TabularError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let format = TableFormat::detect(&bytes)?;
    debug!(path = %path.display(), ?format, "Reading table");

    match format {
        TableFormat::Delimited => delimited::decode(&bytes, config.delimiter_byte()),
        TableFormat::Workbook => workbook::decode(bytes, config.sheet.as_deref()),
    }
}

/// Write `table` to `path`, choosing the format from the extension
pub fn write(table: &Table, path: &Path, config: &TabularConfig) -> Result<()> {
    write_as(table, path, TableFormat::from_path(path), config)
}

/// Write `table` to `path` in `format`, replacing any existing file
pub fn write_as(
    table: &Table,
    path: &Path,
    format: TableFormat,
    config: &TabularConfig,
) -> Result<()> {
    if table.columns().is_empty() {
        return Err(TabularError::InvalidArgument(
            "cannot write a table without columns".to_string(),
        ));
    }

    let bytes = match format {
        TableFormat::Delimited => delimited::encode(table, config.delimiter_byte())?,
        TableFormat::Workbook => workbook::encode(table, &config.sheet_name)?,
    };

    fsutil::write_atomic(path, &bytes).map_err(|source| TabularError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    info!(
        path = %path.display(),
        ?format,
        rows = table.len(),
        "Table written"
    );
    Ok(())
}
