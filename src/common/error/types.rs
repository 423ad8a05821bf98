//! Unified error types for shpio.
//!
//! This module provides a single error type covering the geometry codec, the
//! attribute table and the shapefile facade.
use thiserror::Error;

/// Main error type for shpio operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Header declares a shape type this crate cannot decode
    #[error("Unsupported shape type: {0}")]
    UnsupportedShapeType(i32),

    /// Truncated or malformed binary content
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Coordinates do not form a valid geometry of the requested kind
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A geometry cannot be stored in a file of the classified shape type
    #[error("Shape type mismatch in record {record}: file holds {expected}, found {found}")]
    ShapeTypeMismatch {
        record: usize,
        expected: &'static str,
        found: &'static str,
    },

    /// Attribute rows and geometries no longer line up
    #[error("Stream desynchronization at record {record}: {detail}")]
    Desynchronized { record: usize, detail: String },

    /// No record holds a geometry value
    #[error("Records missing geometry")]
    MissingGeometry,

    /// Save was requested on an empty record set
    #[error("Nothing to save")]
    NothingToSave,

    /// A sibling file required by the operation is not available
    #[error("Missing file: {0}")]
    MissingFile(String),

    /// Attempt to mutate a record decoded from disk
    #[error("Record is read-only")]
    ReadOnlyRecord,

    /// Attribute value cannot be encoded in the target column
    #[error("Invalid attribute: {0}")]
    InvalidAttribute(String),

    /// Unsupported feature
    #[error("Unsupported feature: {0}")]
    Unsupported(String),
}

/// Result type for shpio operations.
pub type Result<T> = std::result::Result<T, Error>;
