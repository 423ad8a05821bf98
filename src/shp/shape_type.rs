//! Shape type codes.

use crate::geometry::{Geometry, GeometryKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Geometry kind declared once per `.shp` file.
///
/// Only the two-dimensional types are supported; Z and M variants are
/// rejected when a file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ShapeType {
    Null = 0,
    Point = 1,
    Polyline = 3,
    Polygon = 5,
    MultiPoint = 8,
}

impl ShapeType {
    /// Map an on-disk code to a supported shape type.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(ShapeType::Null),
            1 => Some(ShapeType::Point),
            3 => Some(ShapeType::Polyline),
            5 => Some(ShapeType::Polygon),
            8 => Some(ShapeType::MultiPoint),
            _ => None,
        }
    }

    #[inline]
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn name(self) -> &'static str {
        match self {
            ShapeType::Null => "Null",
            ShapeType::Point => "Point",
            ShapeType::Polyline => "Polyline",
            ShapeType::Polygon => "Polygon",
            ShapeType::MultiPoint => "MultiPoint",
        }
    }

    /// Shape type a file must declare to hold `geometry`.
    ///
    /// # Examples
    ///
    /// ```
    /// use shpio::geometry::Geometry;
    /// use shpio::shp::ShapeType;
    ///
    /// assert_eq!(ShapeType::of(&Geometry::point(0.0, 0.0)), ShapeType::Point);
    /// assert_eq!(
    ///     ShapeType::of(&Geometry::line_string([(0.0, 0.0), (1.0, 1.0)])),
    ///     ShapeType::Polyline
    /// );
    /// ```
    pub fn of(geometry: &Geometry) -> Self {
        match geometry.kind() {
            GeometryKind::Point(_) => ShapeType::Point,
            GeometryKind::MultiPoint(_) => ShapeType::MultiPoint,
            GeometryKind::LineString(_) | GeometryKind::MultiLineString(_) => ShapeType::Polyline,
            GeometryKind::Polygon(_) | GeometryKind::MultiPolygon(_) => ShapeType::Polygon,
        }
    }

    /// Whether a file of this type can store `geometry`.
    ///
    /// A multipoint file also accepts single points, written as one-point
    /// multipoints.
    pub fn accepts(self, geometry: &Geometry) -> bool {
        match (self, geometry.kind()) {
            (ShapeType::Null, _) => false,
            (ShapeType::Point, GeometryKind::Point(_)) => true,
            (ShapeType::MultiPoint, GeometryKind::Point(_) | GeometryKind::MultiPoint(_)) => true,
            (
                ShapeType::Polyline,
                GeometryKind::LineString(_) | GeometryKind::MultiLineString(_),
            ) => true,
            (ShapeType::Polygon, GeometryKind::Polygon(_) | GeometryKind::MultiPolygon(_)) => true,
            _ => false,
        }
    }

    /// Whether records of this type carry a part table.
    #[inline]
    pub fn has_parts(self) -> bool {
        matches!(self, ShapeType::Polyline | ShapeType::Polygon)
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}
