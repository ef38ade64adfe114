//! Column-oriented in-memory mirror of the tracked table.
//!
//! `Table::load` pulls the whole grid from a backend once; every read
//! and write after that is against memory. Nothing reaches the backing
//! medium until `write_back` / `write_back_all`, and those push whole
//! columns, so a run that only touches Stock and Status costs two
//! column writes no matter how many rows changed.

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;

use crate::backend::TableBackend;
use crate::cell::Cell;
use crate::error::{Result, TableError};

/// One row materialized as an ordered column-name-to-cell mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: IndexMap<String, Cell>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, cell: impl Into<Cell>) {
        self.cells.insert(name.into(), cell.into());
    }

    /// Builder-style `set`, for literals in tests and appends.
    pub fn with(mut self, name: impl Into<String>, cell: impl Into<Cell>) -> Self {
        self.set(name, cell);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Cell> {
        self.cells.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Cell::as_text)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Cell::as_number)
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Cell::as_bool)
    }

    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        self.get(name).and_then(Cell::as_date)
    }

    pub fn timestamp(&self, name: &str) -> Option<DateTime<Utc>> {
        self.get(name).and_then(Cell::as_timestamp)
    }

    /// Stored-text rendering of a cell, whatever its kind. Use this
    /// where the column is nominally text but a value may have parsed
    /// as something narrower (a product named "42", say).
    pub fn render(&self, name: &str) -> Option<String> {
        self.get(name).map(Cell::render)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// In-memory table with selective column write-back.
#[derive(Debug)]
pub struct Table {
    columns: IndexMap<String, Vec<Cell>>,
    rows: usize,
}

impl Table {
    /// Read the whole grid and validate its shape.
    ///
    /// Rejects an empty header row, blank or duplicate column names,
    /// and ragged columns. Row order is preserved as read.
    pub fn load(backend: &dyn TableBackend) -> Result<Table> {
        let raw = backend.read()?;
        if raw.headers.is_empty() {
            return Err(TableError::EmptyHeader);
        }
        let mut columns = IndexMap::with_capacity(raw.headers.len());
        for (idx, (name, values)) in
            raw.headers.into_iter().zip(raw.columns).enumerate()
        {
            if name.trim().is_empty() {
                return Err(TableError::BlankColumn(idx));
            }
            if columns.insert(name.clone(), values).is_some() {
                return Err(TableError::DuplicateColumn(name));
            }
        }
        let rows = columns
            .values()
            .next()
            .map(Vec::len)
            .unwrap_or(0);
        for (name, values) in &columns {
            if values.len() != rows {
                return Err(TableError::RaggedColumn {
                    column: name.clone(),
                    len: values.len(),
                    expected: rows,
                });
            }
        }
        Ok(Table { columns, rows })
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect()
    }

    pub fn column(&self, name: &str) -> Option<&[Cell]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Snapshot one row. The returned `Row` is a copy; mutate it and
    /// hand it back via [`Table::update_row`].
    pub fn get_row(&self, index: usize) -> Result<Row> {
        if index >= self.rows {
            return Err(TableError::RowOutOfBounds(index));
        }
        let mut row = Row::new();
        for (name, values) in &self.columns {
            row.set(name.clone(), values[index].clone());
        }
        Ok(row)
    }

    /// Replace one row in memory.
    ///
    /// The row must carry a value for every column; a missing field
    /// fails the whole update and leaves the stored row untouched.
    /// Extra keys the table does not know are ignored.
    pub fn update_row(&mut self, index: usize, row: &Row) -> Result<()> {
        if index >= self.rows {
            return Err(TableError::RowOutOfBounds(index));
        }
        let cells = self.collect_full_row(index, row)?;
        for (name, cell) in cells {
            self.columns[&name][index] = cell;
        }
        Ok(())
    }

    /// Append one row in memory, growing every column. Returns the new
    /// row's index.
    pub fn append_row(&mut self, row: &Row) -> Result<usize> {
        let cells = self.collect_full_row(self.rows, row)?;
        for (name, cell) in cells {
            self.columns[&name].push(cell);
        }
        self.rows += 1;
        Ok(self.rows - 1)
    }

    /// Push the named columns back to the backend, in the order given.
    /// Untouched columns never leave memory.
    pub fn write_back(&self, backend: &dyn TableBackend, names: &[&str]) -> Result<()> {
        for name in names {
            let values = self
                .columns
                .get(*name)
                .ok_or_else(|| TableError::UnknownColumn(name.to_string()))?;
            backend.write_column(name, values)?;
        }
        Ok(())
    }

    /// Push every column back, in header order. Needed after appends,
    /// which grow columns a selective write would skip.
    pub fn write_back_all(&self, backend: &dyn TableBackend) -> Result<()> {
        for (name, values) in &self.columns {
            backend.write_column(name, values)?;
        }
        Ok(())
    }

    fn collect_full_row(&self, index: usize, row: &Row) -> Result<Vec<(String, Cell)>> {
        let mut cells = Vec::with_capacity(self.columns.len());
        for name in self.columns.keys() {
            let cell = row.get(name).ok_or_else(|| TableError::MissingField {
                row: index,
                column: name.clone(),
            })?;
            cells.push((name.clone(), cell.clone()));
        }
        Ok(cells)
    }
}
