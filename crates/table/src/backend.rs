//! Backing-medium interface and implementations.
//!
//! The store never talks to a file or service directly. It reads the
//! whole grid up front and pushes whole columns back out, so a backend
//! only has to provide:
//!
//! - a stable header order,
//! - row order preserved across reads,
//! - per-column overwrite.
//!
//! No cross-column transactional guarantee is assumed or offered.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::cell::Cell;
use crate::error::{Result, TableError};

/// Raw grid contents: header order plus one value vector per column.
///
/// `columns` is parallel to `headers`.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub columns: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn column(&self, name: &str) -> Option<&[Cell]> {
        let idx = self.headers.iter().position(|h| h == name)?;
        self.columns.get(idx).map(Vec::as_slice)
    }

    fn replace_column(&mut self, name: &str, values: &[Cell]) -> Result<()> {
        let idx = self
            .headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))?;
        self.columns[idx] = values.to_vec();
        // A column write may grow the grid; pad the others with empty
        // cells so it stays rectangular.
        let rows = self.columns.iter().map(Vec::len).max().unwrap_or(0);
        for col in &mut self.columns {
            col.resize(rows, Cell::Empty);
        }
        Ok(())
    }
}

pub trait TableBackend: Send + Sync {
    fn read(&self) -> Result<RawTable>;
    fn write_column(&self, name: &str, values: &[Cell]) -> Result<()>;
}

// ── CSV file backend ─────────────────────────────────────────────────────────

/// CSV file with a header row, one record per tracked product.
pub struct CsvBackend {
    path: PathBuf,
}

impl CsvBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_grid(&self, raw: &RawTable) -> Result<()> {
        // Write to a sibling temp file and rename so a crash mid-write
        // never leaves a half-written table behind.
        let tmp = self.path.with_extension("csv.tmp");
        let mut writer = csv::Writer::from_path(&tmp)?;
        writer.write_record(&raw.headers)?;
        let rows = raw.columns.iter().map(Vec::len).max().unwrap_or(0);
        for row in 0..rows {
            let record: Vec<String> = raw
                .columns
                .iter()
                .map(|col| col.get(row).map_or_else(String::new, Cell::render))
                .collect();
            writer.write_record(&record)?;
        }
        writer.flush()?;
        drop(writer);
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl TableBackend for CsvBackend {
    fn read(&self) -> Result<RawTable> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)?;
        let headers: Vec<String> =
            reader.headers()?.iter().map(str::to_string).collect();
        let mut columns = vec![Vec::new(); headers.len()];
        for record in reader.records() {
            let record = record?;
            for (idx, col) in columns.iter_mut().enumerate() {
                // Short records read as trailing empties.
                col.push(Cell::parse(record.get(idx).unwrap_or("")));
            }
        }
        Ok(RawTable { headers, columns })
    }

    fn write_column(&self, name: &str, values: &[Cell]) -> Result<()> {
        let mut raw = self.read()?;
        raw.replace_column(name, values)?;
        self.write_grid(&raw)
    }
}

// ── In-memory backend ────────────────────────────────────────────────────────

/// In-memory grid, used by tests and dry runs.
pub struct MemoryBackend {
    inner: RwLock<RawTable>,
}

impl MemoryBackend {
    pub fn new(raw: RawTable) -> Self {
        Self {
            inner: RwLock::new(raw),
        }
    }

    /// Build from row-major literals, parsing each value like a file
    /// backend would.
    pub fn from_rows(headers: &[&str], rows: &[&[&str]]) -> Self {
        let headers: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
        let mut columns = vec![Vec::new(); headers.len()];
        for row in rows {
            for (idx, col) in columns.iter_mut().enumerate() {
                col.push(Cell::parse(row.get(idx).copied().unwrap_or("")));
            }
        }
        Self::new(RawTable { headers, columns })
    }

    /// Current grid contents, for assertions.
    pub fn snapshot(&self) -> RawTable {
        self.inner.read().expect("table lock poisoned").clone()
    }
}

impl TableBackend for MemoryBackend {
    fn read(&self) -> Result<RawTable> {
        Ok(self.snapshot())
    }

    fn write_column(&self, name: &str, values: &[Cell]) -> Result<()> {
        let mut raw = self.inner.write().expect("table lock poisoned");
        raw.replace_column(name, values)
    }
}
