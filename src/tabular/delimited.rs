//! Headered delimited text

use tracing::debug;

use super::error::{Result, TabularError};
use super::table::{Cell, Table};

pub(crate) fn decode(bytes: &[u8], delimiter: u8) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(bytes);
    let mut records = reader.records();

    let header = match records.next() {
        Some(record) => record.map_err(|e| TabularError::unrecognised(e.to_string()))?,
        None => return Err(TabularError::unrecognised("no header row")),
    };

    if let Some(position) = header.iter().position(|name| name.trim().is_empty()) {
        return Err(TabularError::unrecognised(format!(
            "header column {} is blank",
            position + 1
        )));
    }

    let mut table = Table::new(header.iter())?;
    for record in records {
        let record = record.map_err(|e| TabularError::unrecognised(e.to_string()))?;
        let row: Vec<Cell> = record
            .iter()
            .map(|cell| (!cell.is_empty()).then(|| cell.to_string()))
            .collect();
        table.push_row(row)?;
    }

    debug!(
        columns = table.columns().len(),
        rows = table.len(),
        "Decoded delimited table"
    );
    Ok(table)
}

pub(crate) fn encode(table: &Table, delimiter: u8) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    writer
        .write_record(table.columns())
        .map_err(|e| TabularError::Encode(e.to_string()))?;
    for row in table.rows() {
        writer
            .write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))
            .map_err(|e| TabularError::Encode(e.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|e| TabularError::Encode(e.error().to_string()))
}
