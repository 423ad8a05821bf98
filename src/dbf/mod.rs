//! dBASE III attribute tables
//!
//! Shapefiles keep their attributes in a `.dbf` table whose row `i` belongs to
//! geometry record `i`. This module reads such tables lazily through
//! [`DbfReader`], which implements [`crate::record::AttributeSource`], writes
//! them with [`DbfWriter`], and exposes the column metadata as an editable
//! [`TableSchema`].
//!
//! # Example
//!
//! ```rust
//! use shpio::dbf::{DbfColumn, DbfReader, DbfWriter};
//! use shpio::record::Value;
//! use std::io::Cursor;
//!
//! let columns = vec![DbfColumn::character("NAME", 16), DbfColumn::numeric("LANES", 2, 0)];
//! let rows = vec![vec![Value::from("Main St"), Value::from(4)]];
//!
//! let mut writer = DbfWriter::new(Vec::new());
//! writer.write(&columns, rows.iter().map(|r| r.iter()))?;
//!
//! let mut reader = DbfReader::new(Cursor::new(writer.into_inner()))?;
//! assert_eq!(reader.next().transpose()?, Some(rows[0].clone()));
//! # Ok::<(), shpio::Error>(())
//! ```

pub mod consts;
mod reader;
mod schema;
mod types;
mod writer;

pub use reader::{DbfReader, TableHeader};
pub use schema::{BLANK_COLUMN_LENGTH, BLANK_COLUMN_NAME, MAX_CHARACTER_LENGTH, TableSchema};
pub use types::{DbfColumn, DbfFieldType, MAX_NAME_BYTES};
pub use writer::DbfWriter;
