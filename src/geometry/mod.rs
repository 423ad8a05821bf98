//! Geometry model.
//!
//! Typed vector geometries produced by the shape decoder and consumed by the
//! shape encoder, plus the envelope type used for bounding boxes.

mod envelope;
mod types;

pub use envelope::Envelope;
pub use types::{
    Coord, Geometry, GeometryError, GeometryKind, LineString, MultiLineString, MultiPoint,
    MultiPolygon, Point, Polygon,
};
