//! Error conversion implementations.
//!
//! This module contains From trait implementations to convert from internal
//! error types to the unified Error type.

use super::types::Error;
use crate::common::binary::BinaryError;

impl From<BinaryError> for Error {
    fn from(err: BinaryError) -> Self {
        Error::InvalidData(err.to_string())
    }
}

impl From<crate::geometry::GeometryError> for Error {
    fn from(err: crate::geometry::GeometryError) -> Self {
        Error::InvalidGeometry(err.to_string())
    }
}
