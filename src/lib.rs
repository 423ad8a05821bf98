//! shpio - Reading and writing ESRI Shapefiles
//!
//! A shapefile is a set of sibling files sharing one base name: the geometry
//! file (`.shp`), its record index (`.shx`), a dBASE attribute table (`.dbf`)
//! and optionally a projection (`.prj`) and a code page (`.cpg`). This crate
//! decodes and encodes each of them and pairs geometries with attribute rows
//! into records.
//!
//! # Features
//!
//! - **Geometry codec**: Point, MultiPoint, PolyLine and Polygon records in
//!   both byte orders the format mixes
//! - **Lazy decoding**: records are decoded one at a time from buffered files
//! - **dBASE tables**: typed attribute values, code pages, editable column
//!   metadata
//! - **All-or-nothing saves**: every file is encoded in memory before any of
//!   them is written
//!
//! # Example - Writing and reading a shapefile
//!
//! ```no_run
//! use shpio::{Field, Geometry, Record, Shapefile};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut rivers = Shapefile::new();
//! rivers.append(Record::new(vec![
//!     Field::new("name", "Ouse"),
//!     Field::new("geom", Geometry::line_string([(0.0, 0.0), (2.0, 1.5), (3.0, 4.0)])),
//! ]))?;
//! rivers.save_as("rivers", "data")?;
//!
//! let opened = Shapefile::open("data/rivers.shp")?;
//! for record in opened.records()? {
//!     let record = record?;
//!     println!("{}: {}", record.get_by_name("name"), record.get_by_name("geom"));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Decoding geometries only
//!
//! ```no_run
//! use shpio::Shapefile;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let parcels = Shapefile::open("data/parcels.dbf")?;
//! for geometry in parcels.geometries()? {
//!     match geometry? {
//!         Some(g) => println!("{} with {} vertices", g.type_name(), g.num_coords()),
//!         None => println!("null shape"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

/// Shared utilities: byte-order readers, text encodings and the error type
pub mod common;

/// Geometry model
///
/// Points, line strings, polygons and their multi-part forms, plus the
/// bounding box type used by file headers.
pub mod geometry;

/// `.shp`/`.shx` geometry codec
pub mod shp;

/// Records, fields and attribute values
pub mod record;

/// dBASE III attribute tables (`.dbf`)
pub mod dbf;

/// Shapefile facade pairing geometries with attribute rows
pub mod shapefile;

// Re-export commonly used types for convenience
pub use common::error::{Error, Result};
pub use geometry::{Coord, Envelope, Geometry, GeometryKind};
pub use record::{Field, Record, Value};
pub use shapefile::{Shapefile, ShapefileOptions};
