use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashSet;

use super::error::{Result, TabularError};

/// A cell is text or null
pub type Cell = Option<String>;

/// Ordered mapping from field name to cell
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, Cell)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Record::insert`]
    pub fn with(mut self, name: impl Into<String>, value: Option<&str>) -> Self {
        self.insert(name, value.map(str::to_string));
        self
    }

    /// Set a field, keeping its position if it already exists
    pub fn insert(&mut self, name: impl Into<String>, value: Cell) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name, value)),
        }
    }

    /// The cell for `name`; `None` when the field is absent
    pub fn field(&self, name: &str) -> Option<&Cell> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// The text of `name`; `None` when absent or null
    pub fn value(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(|cell| cell.as_deref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Ordered rows sharing one set of column names
///
/// Every row holds exactly one cell per column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Create an empty table; duplicate column names are rejected
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();

        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if column.trim().is_empty() {
                return Err(TabularError::InvalidArgument(
                    "column names must not be blank".to_string(),
                ));
            }
            if !seen.insert(column.as_str()) {
                return Err(TabularError::AmbiguousSchema {
                    column: column.clone(),
                });
            }
        }

        Ok(Self {
            columns,
            rows: Vec::new(),
        })
    }

    /// Build a table from records that all carry the same field names
    ///
    /// Column order follows the first record.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Result<Self> {
        let mut records = records.into_iter();
        let Some(first) = records.next() else {
            return Ok(Self::default());
        };

        let mut table = Self::new(first.names().map(str::to_string))?;
        table.push_record(first)?;
        for record in records {
            table.push_record(record)?;
        }
        Ok(table)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row; short rows are padded with nulls, long rows rejected
    pub fn push_row(&mut self, mut row: Vec<Cell>) -> Result<()> {
        let expected = self.columns.len();
        if row.len() > expected {
            return Err(TabularError::SchemaMismatch {
                row: self.rows.len() + 1,
                expected,
                found: row.len(),
            });
        }

        row.resize(expected, None);
        self.rows.push(row);
        Ok(())
    }

    /// Append a record whose field names are exactly the table's columns
    pub fn push_record(&mut self, record: Record) -> Result<()> {
        let row_number = self.rows.len() + 1;
        if record.len() != self.columns.len() {
            return Err(TabularError::FieldMismatch {
                row: row_number,
                reason: format!(
                    "expected {} fields, found {}",
                    self.columns.len(),
                    record.len()
                ),
            });
        }

        let mut row = vec![None; self.columns.len()];
        for (name, value) in record.fields {
            let index = self
                .column_index(&name)
                .ok_or_else(|| TabularError::FieldMismatch {
                    row: row_number,
                    reason: format!("unknown field {name:?}"),
                })?;
            row[index] = value;
        }

        self.rows.push(row);
        Ok(())
    }

    pub fn record(&self, index: usize) -> Option<Record> {
        self.rows.get(index).map(|row| self.to_record(row))
    }

    /// Rows as records, in table order
    pub fn records(&self) -> impl Iterator<Item = Record> + '_ {
        self.rows.iter().map(|row| self.to_record(row))
    }

    fn to_record(&self, row: &[Cell]) -> Record {
        Record {
            fields: self.columns.iter().cloned().zip(row.iter().cloned()).collect(),
        }
    }
}
