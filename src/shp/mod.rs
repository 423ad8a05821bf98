//! ESRI shapefile geometry codec
//!
//! This module reads and writes the main geometry file (`.shp`) and its
//! record index (`.shx`). Headers and record headers are big-endian, record
//! payloads are little-endian; all lengths stored in the files are counted in
//! 16-bit words.
//!
//! # Example
//!
//! ```rust
//! use shpio::geometry::{Envelope, Geometry};
//! use shpio::shp::{RecordIndex, ShapeReader, ShapeType, ShapeWriter};
//! use std::io::Cursor;
//!
//! let points = [Geometry::point(1.0, 2.0), Geometry::point(3.0, 4.0)];
//! let refs: Vec<Option<&Geometry>> = points.iter().map(Some).collect();
//!
//! let index = RecordIndex::build(ShapeType::Point, refs.iter().copied())?;
//! let mut writer = ShapeWriter::new(Vec::new());
//! writer.write(ShapeType::Point, &index, &refs, Envelope::WHOLE_EARTH)?;
//!
//! let reader = ShapeReader::new(Cursor::new(writer.into_inner()), index.len())?;
//! let decoded: Vec<Option<Geometry>> = reader.collect::<Result<_, _>>()?;
//! assert_eq!(decoded[1], Some(Geometry::point(3.0, 4.0)));
//! # Ok::<(), shpio::Error>(())
//! ```

/// Format constants
pub mod consts;

/// 100-byte file header shared by `.shp` and `.shx`
mod header;

/// Shape type codes
mod shape_type;

/// Record index building and `.shx` serialization
mod index;

/// Lazy record decoder
mod reader;

/// Record encoder
mod writer;

/// Codec round-trip tests
#[cfg(test)]
mod tests;

pub use header::FileHeader;
pub use index::{IndexEntry, RecordIndex, content_length_words};
pub use reader::ShapeReader;
pub use shape_type::ShapeType;
pub use writer::ShapeWriter;
