//! Shapefile facade
//!
//! [`Shapefile`] ties the geometry codec and the attribute table together:
//! it locates sibling files, pairs geometries with attribute rows into
//! [`crate::record::Record`]s, and writes record sets back as a complete
//! shapefile.
//!
//! # Example
//!
//! ```rust,no_run
//! use shpio::geometry::Geometry;
//! use shpio::record::{Field, Record};
//! use shpio::shapefile::Shapefile;
//!
//! let mut roads = Shapefile::new();
//! roads.append(Record::new(vec![
//!     Field::new("name", "Main St"),
//!     Field::new("lanes", 4),
//!     Field::new("geom", Geometry::line_string([(0.0, 0.0), (1.0, 1.0)])),
//! ]))?;
//! roads.save_as("roads", "out")?;
//!
//! let opened = Shapefile::open("out/roads.shp")?;
//! for record in opened.records()? {
//!     let record = record?;
//!     println!("{} {}", record.get_by_name("id"), record.get_by_name("name"));
//! }
//! # Ok::<(), shpio::Error>(())
//! ```

mod config;
mod file;
mod iter;
mod paths;

#[cfg(test)]
mod tests;

pub use config::ShapefileOptions;
pub use file::Shapefile;
pub use iter::RecordIter;
pub use paths::{Sibling, SiblingPaths};
