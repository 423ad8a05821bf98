//! Vector geometry types.
//!
//! Every geometry owns its coordinates. Polygons are single closed rings: a
//! shapefile polygon record with holes is represented as a `MultiPolygon`
//! whose parts are independent rings, with no exterior/interior relationship.

use super::envelope::Envelope;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised when building geometries from raw coordinates.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// First and last vertex of a polygon ring differ
    #[error("ring is not closed: first vertex {first} differs from last vertex {last}")]
    UnclosedRing { first: Coord, last: Coord },
}

/// A planar (x, y) coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Coord {
    #[inline]
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.x, self.y)
    }
}

/// A single position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point(pub Coord);

impl Point {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self(Coord::new(x, y))
    }

    #[inline]
    pub fn coord(&self) -> Coord {
        self.0
    }
}

/// An open sequence of vertices.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LineString(pub Vec<Coord>);

impl LineString {
    pub fn new(coords: Vec<Coord>) -> Self {
        Self(coords)
    }

    #[inline]
    pub fn coords(&self) -> &[Coord] {
        &self.0
    }
}

/// A closed ring of vertices.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polygon {
    ring: Vec<Coord>,
}

impl Polygon {
    /// Build a polygon from a ring whose first and last vertices coincide.
    ///
    /// An empty ring is accepted.
    pub fn new(ring: Vec<Coord>) -> Result<Self, GeometryError> {
        if let (Some(&first), Some(&last)) = (ring.first(), ring.last())
            && first != last
        {
            return Err(GeometryError::UnclosedRing { first, last });
        }
        Ok(Self { ring })
    }

    /// Build a polygon, appending the first vertex when the ring is open.
    ///
    /// # Examples
    ///
    /// ```
    /// use shpio::geometry::{Coord, Polygon};
    ///
    /// let square = Polygon::closed(vec![
    ///     Coord::new(0.0, 0.0),
    ///     Coord::new(1.0, 0.0),
    ///     Coord::new(1.0, 1.0),
    ///     Coord::new(0.0, 1.0),
    /// ]);
    /// assert_eq!(square.ring().len(), 5);
    /// assert_eq!(square.ring()[0], square.ring()[4]);
    /// ```
    pub fn closed(mut ring: Vec<Coord>) -> Self {
        if let (Some(&first), Some(&last)) = (ring.first(), ring.last())
            && first != last
        {
            ring.push(first);
        }
        Self { ring }
    }

    #[inline]
    pub fn ring(&self) -> &[Coord] {
        &self.ring
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MultiPoint(pub Vec<Point>);

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MultiLineString(pub Vec<LineString>);

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MultiPolygon(pub Vec<Polygon>);

/// The closed set of geometry variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeometryKind {
    Point(Point),
    MultiPoint(MultiPoint),
    LineString(LineString),
    MultiLineString(MultiLineString),
    Polygon(Polygon),
    MultiPolygon(MultiPolygon),
}

/// A top-level geometry tagged with the record it was decoded from.
///
/// The origin index is the 0-based position of the source record. It is used
/// to check that geometries stay aligned with their attribute rows; equality
/// ignores it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geometry {
    kind: GeometryKind,
    origin_index: Option<usize>,
}

impl PartialEq for Geometry {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Geometry {
    pub fn new(kind: GeometryKind) -> Self {
        Self {
            kind,
            origin_index: None,
        }
    }

    /// Shorthand for a point geometry.
    pub fn point(x: f64, y: f64) -> Self {
        Self::new(GeometryKind::Point(Point::new(x, y)))
    }

    /// Shorthand for a line string built from `(x, y)` pairs.
    pub fn line_string<I, C>(coords: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Coord>,
    {
        Self::new(GeometryKind::LineString(LineString(
            coords.into_iter().map(Into::into).collect(),
        )))
    }

    /// Shorthand for a polygon built from `(x, y)` pairs; the ring is closed
    /// if needed.
    pub fn polygon<I, C>(coords: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Coord>,
    {
        Self::new(GeometryKind::Polygon(Polygon::closed(
            coords.into_iter().map(Into::into).collect(),
        )))
    }

    /// Tag the geometry with its source record position.
    pub fn with_origin_index(mut self, index: usize) -> Self {
        self.origin_index = Some(index);
        self
    }

    #[inline]
    pub fn origin_index(&self) -> Option<usize> {
        self.origin_index
    }

    #[inline]
    pub fn kind(&self) -> &GeometryKind {
        &self.kind
    }

    #[inline]
    pub fn into_kind(self) -> GeometryKind {
        self.kind
    }

    /// Variant name, e.g. `"MultiPolygon"`.
    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            GeometryKind::Point(_) => "Point",
            GeometryKind::MultiPoint(_) => "MultiPoint",
            GeometryKind::LineString(_) => "LineString",
            GeometryKind::MultiLineString(_) => "MultiLineString",
            GeometryKind::Polygon(_) => "Polygon",
            GeometryKind::MultiPolygon(_) => "MultiPolygon",
        }
    }

    pub fn is_multi(&self) -> bool {
        matches!(
            self.kind,
            GeometryKind::MultiPoint(_)
                | GeometryKind::MultiLineString(_)
                | GeometryKind::MultiPolygon(_)
        )
    }

    /// Coordinate runs in storage order.
    ///
    /// Simple geometries yield one part. A multipoint yields one single-vertex
    /// part per point.
    pub fn parts(&self) -> Vec<&[Coord]> {
        match &self.kind {
            GeometryKind::Point(p) => vec![std::slice::from_ref(&p.0)],
            GeometryKind::MultiPoint(mp) => {
                mp.0.iter().map(|p| std::slice::from_ref(&p.0)).collect()
            },
            GeometryKind::LineString(ls) => vec![ls.coords()],
            GeometryKind::MultiLineString(mls) => mls.0.iter().map(|ls| ls.coords()).collect(),
            GeometryKind::Polygon(poly) => vec![poly.ring()],
            GeometryKind::MultiPolygon(mp) => mp.0.iter().map(|poly| poly.ring()).collect(),
        }
    }

    /// Number of coordinate runs, see [`Geometry::parts`].
    pub fn num_parts(&self) -> usize {
        match &self.kind {
            GeometryKind::Point(_) | GeometryKind::LineString(_) | GeometryKind::Polygon(_) => 1,
            GeometryKind::MultiPoint(mp) => mp.0.len(),
            GeometryKind::MultiLineString(mls) => mls.0.len(),
            GeometryKind::MultiPolygon(mp) => mp.0.len(),
        }
    }

    /// Total vertex count across all parts.
    pub fn num_coords(&self) -> usize {
        match &self.kind {
            GeometryKind::Point(_) => 1,
            GeometryKind::MultiPoint(mp) => mp.0.len(),
            GeometryKind::LineString(ls) => ls.0.len(),
            GeometryKind::MultiLineString(mls) => mls.0.iter().map(|ls| ls.0.len()).sum(),
            GeometryKind::Polygon(poly) => poly.ring.len(),
            GeometryKind::MultiPolygon(mp) => mp.0.iter().map(|poly| poly.ring.len()).sum(),
        }
    }

    /// Iterate every vertex in storage order.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        self.parts().into_iter().flat_map(|part| part.iter().copied())
    }

    /// Bounding box of all vertices, `None` when the geometry is empty.
    pub fn envelope(&self) -> Option<Envelope> {
        Envelope::from_coords(self.coords())
    }
}

macro_rules! impl_from_variant {
    ($($ty:ident),*) => {
        $(
            impl From<$ty> for Geometry {
                fn from(value: $ty) -> Self {
                    Geometry::new(GeometryKind::$ty(value))
                }
            }
        )*
    };
}

impl_from_variant!(Point, MultiPoint, LineString, MultiLineString, Polygon, MultiPolygon);

impl fmt::Display for Geometry {
    /// Renders the geometry as well-known text.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn run(f: &mut fmt::Formatter<'_>, coords: &[Coord]) -> fmt::Result {
            f.write_str("(")?;
            for (i, c) in coords.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", c)?;
            }
            f.write_str(")")
        }

        match &self.kind {
            GeometryKind::Point(p) => write!(f, "POINT ({})", p.0),
            GeometryKind::MultiPoint(mp) => {
                let coords: Vec<Coord> = mp.0.iter().map(|p| p.0).collect();
                f.write_str("MULTIPOINT ")?;
                run(f, &coords)
            },
            GeometryKind::LineString(ls) => {
                f.write_str("LINESTRING ")?;
                run(f, &ls.0)
            },
            GeometryKind::Polygon(poly) => {
                f.write_str("POLYGON (")?;
                run(f, &poly.ring)?;
                f.write_str(")")
            },
            GeometryKind::MultiLineString(mls) => {
                f.write_str("MULTILINESTRING (")?;
                for (i, ls) in mls.0.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    run(f, &ls.0)?;
                }
                f.write_str(")")
            },
            GeometryKind::MultiPolygon(mp) => {
                f.write_str("MULTIPOLYGON (")?;
                for (i, poly) in mp.0.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str("(")?;
                    run(f, &poly.ring)?;
                    f.write_str(")")?;
                }
                f.write_str(")")
            },
        }
    }
}
