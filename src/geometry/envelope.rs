//! Axis-aligned bounding boxes.

use super::types::Coord;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box as (min x, min y, max x, max y).
///
/// An envelope built from coordinates always has `min <= max` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Envelope {
    /// Longitude/latitude bounds of the whole earth.
    ///
    /// Written as the aggregate bounding box of every saved file.
    pub const WHOLE_EARTH: Envelope = Envelope {
        min_x: -180.0,
        min_y: -90.0,
        max_x: 180.0,
        max_y: 90.0,
    };

    /// Create an envelope from two corners, normalizing the axis order.
    pub fn new(a: Coord, b: Coord) -> Self {
        Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }

    /// Envelope of a single coordinate.
    #[inline]
    pub fn of(coord: Coord) -> Self {
        Self::new(coord, coord)
    }

    /// Smallest envelope holding every coordinate, or `None` for no coordinates.
    ///
    /// # Examples
    ///
    /// ```
    /// use shpio::geometry::{Coord, Envelope};
    ///
    /// let env = Envelope::from_coords([Coord::new(3.0, -1.0), Coord::new(-2.0, 4.0)]).unwrap();
    /// assert_eq!(env, Envelope { min_x: -2.0, min_y: -1.0, max_x: 3.0, max_y: 4.0 });
    /// assert!(Envelope::from_coords(std::iter::empty()).is_none());
    /// ```
    pub fn from_coords<I>(coords: I) -> Option<Self>
    where
        I: IntoIterator<Item = Coord>,
    {
        let mut iter = coords.into_iter();
        let first = iter.next()?;
        let mut env = Self::of(first);
        for coord in iter {
            env.expand_to_include(coord);
        }
        Some(env)
    }

    /// Grow the envelope so it contains `coord`.
    #[inline]
    pub fn expand_to_include(&mut self, coord: Coord) {
        self.min_x = self.min_x.min(coord.x);
        self.min_y = self.min_y.min(coord.y);
        self.max_x = self.max_x.max(coord.x);
        self.max_y = self.max_y.max(coord.y);
    }

    /// Smallest envelope holding both `self` and `other`.
    pub fn merge(&self, other: &Envelope) -> Envelope {
        Envelope {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Whether `coord` lies inside or on the boundary.
    pub fn contains(&self, coord: Coord) -> bool {
        coord.x >= self.min_x && coord.x <= self.max_x && coord.y >= self.min_y && coord.y <= self.max_y
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::WHOLE_EARTH
    }
}
