//! In-memory product table with selective write-back.
//!
//! - [`Cell`]: lenient typed cell values
//! - [`TableBackend`]: backing-medium seam ([`CsvBackend`], [`MemoryBackend`])
//! - [`Table`] / [`Row`]: column-oriented store and row snapshots

pub mod backend;
pub mod cell;
pub mod error;
pub mod store;

pub use backend::{CsvBackend, MemoryBackend, RawTable, TableBackend};
pub use cell::Cell;
pub use error::{Result, TableError};
pub use store::{Row, Table};
