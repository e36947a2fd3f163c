//! `.xlsx` workbooks through calamine (read) and rust_xlsxwriter (write)

use calamine::{Data, Reader, Xlsx};
use rust_xlsxwriter::Workbook;
use std::io::Cursor;
use tracing::debug;

use super::error::{Result, TabularError};
use super::table::{Cell, Table};

/// Workbook-level name holding the data row count. Sheet ranges end at the
/// last non-empty cell, so trailing all-empty rows need it to survive.
const ROW_COUNT_NAME: &str = "toolbelt_row_count";

pub(crate) fn decode(bytes: Vec<u8>, sheet: Option<&str>) -> Result<Table> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| TabularError::unrecognised(format!("not a readable workbook: {e}")))?;

    let range = match sheet {
        Some(name) => workbook
            .worksheet_range(name)
            .map_err(|e| TabularError::unrecognised(format!("sheet {name:?}: {e}")))?,
        None => workbook
            .worksheet_range_at(0)
            .ok_or_else(|| TabularError::unrecognised("workbook has no sheets"))?
            .map_err(|e| TabularError::unrecognised(e.to_string()))?,
    };

    let declared_rows = declared_row_count(&workbook);

    let mut rows = range.rows();
    let header_cells = rows
        .next()
        .ok_or_else(|| TabularError::unrecognised("sheet is empty"))?;

    // The range spans the widest row; trailing empty header cells are padding.
    let header: Vec<Cell> = header_cells.iter().map(cell_text).collect::<Result<_>>()?;
    let width = header.iter().rposition(Option::is_some).map_or(0, |i| i + 1);
    if width == 0 {
        return Err(TabularError::unrecognised("header row is empty"));
    }

    let mut columns = Vec::with_capacity(width);
    for (position, name) in header.into_iter().take(width).enumerate() {
        match name {
            Some(name) if !name.trim().is_empty() => columns.push(name),
            _ => {
                return Err(TabularError::unrecognised(format!(
                    "header column {} is blank",
                    position + 1
                )));
            }
        }
    }

    let mut table = Table::new(columns)?;
    for cells in rows {
        let mut row: Vec<Cell> = cells.iter().map(cell_text).collect::<Result<_>>()?;
        let used = row.iter().rposition(Option::is_some).map_or(0, |i| i + 1);
        row.truncate(used.max(width));
        table.push_row(row)?;
    }
    while table.len() < declared_rows {
        table.push_row(Vec::new())?;
    }

    debug!(
        columns = table.columns().len(),
        rows = table.len(),
        "Decoded workbook sheet"
    );
    Ok(table)
}

fn declared_row_count(workbook: &Xlsx<Cursor<Vec<u8>>>) -> usize {
    workbook
        .defined_names()
        .iter()
        .find(|(name, _)| name == ROW_COUNT_NAME)
        .and_then(|(_, formula)| formula.trim().trim_start_matches('=').trim().parse().ok())
        .unwrap_or(0)
}

fn cell_text(cell: &Data) -> Result<Cell> {
    match cell {
        Data::Empty => Ok(None),
        Data::String(text) if text.is_empty() => Ok(None),
        Data::String(text) => Ok(Some(text.clone())),
        Data::Int(value) => Ok(Some(value.to_string())),
        Data::Float(value) => Ok(Some(value.to_string())),
        Data::Bool(value) => Ok(Some(value.to_string())),
        Data::Error(error) => Err(TabularError::unrecognised(format!(
            "cell holds an error value: {error:?}"
        ))),
        other => Ok(Some(other.to_string())),
    }
}

pub(crate) fn encode(table: &Table, sheet_name: &str) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name).map_err(encode_error)?;

    for (col, name) in table.columns().iter().enumerate() {
        worksheet
            .write_string(0, column_number(col)?, name)
            .map_err(encode_error)?;
    }

    for (index, row) in table.rows().iter().enumerate() {
        let row_number = u32::try_from(index + 1)
            .map_err(|_| TabularError::Encode("too many rows for a workbook".to_string()))?;
        for (col, cell) in row.iter().enumerate() {
            if let Some(text) = cell.as_deref().filter(|text| !text.is_empty()) {
                worksheet
                    .write_string(row_number, column_number(col)?, text)
                    .map_err(encode_error)?;
            }
        }
    }

    workbook
        .define_name(ROW_COUNT_NAME, &format!("={}", table.len()))
        .map_err(encode_error)?;

    workbook.save_to_buffer().map_err(encode_error)
}

fn column_number(index: usize) -> Result<u16> {
    u16::try_from(index)
        .map_err(|_| TabularError::Encode("too many columns for a workbook".to_string()))
}

fn encode_error(err: rust_xlsxwriter::XlsxError) -> TabularError {
    TabularError::Encode(err.to_string())
}
