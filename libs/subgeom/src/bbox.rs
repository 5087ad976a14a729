//! Rectangular bounding boxes and associated trait implementations.

use serde::{Deserialize, Serialize};

use super::{Point, Polygon, Rect, Shape};

/// An axis-aligned rectangular bounding box.
///
/// This differs from [`Rect`] in that it could be empty, meaning that `p0`
/// is to the upper right of `p1`.
#[derive(Debug, Copy, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Bbox {
    pub p0: Point,
    pub p1: Point,
}

impl Default for Bbox {
    fn default() -> Self {
        Self::empty()
    }
}

impl Bbox {
    /// Creates an empty bounding box.
    pub fn empty() -> Self {
        Self {
            p0: Point::new(i64::MAX, i64::MAX),
            p1: Point::new(i64::MIN, i64::MIN),
        }
    }

    /// Returns `true` if the bounding box is empty.
    pub fn is_empty(&self) -> bool {
        self.p0.x > self.p1.x || self.p0.y > self.p1.y
    }

    /// Returns true if [`Point`] `pt` lies inside the bounding box.
    pub fn contains(&self, pt: Point) -> bool {
        self.p0.x <= pt.x && self.p1.x >= pt.x && self.p0.y <= pt.y && self.p1.y >= pt.y
    }

    /// Computes the smallest bounding box containing both `self` and `other`.
    pub fn union(self, other: Bbox) -> Bbox {
        if other.is_empty() {
            return self;
        }
        if self.is_empty() {
            return other;
        }
        Bbox {
            p0: Point::new(self.p0.x.min(other.p0.x), self.p0.y.min(other.p0.y)),
            p1: Point::new(self.p1.x.max(other.p1.x), self.p1.y.max(other.p1.y)),
        }
    }

    /// Converts a non-empty bounding box into a [`Rect`].
    pub fn into_rect(self) -> Option<Rect> {
        (!self.is_empty()).then(|| Rect::new(self.p0, self.p1))
    }
}

/// A trait representing functions available for objects with a bounding box.
pub trait BoundBox {
    /// Compute a rectangular bounding box around the implementing type.
    fn bbox(&self) -> Bbox;
}

impl BoundBox for Point {
    fn bbox(&self) -> Bbox {
        Bbox {
            p0: *self,
            p1: *self,
        }
    }
}

impl BoundBox for Rect {
    fn bbox(&self) -> Bbox {
        Bbox {
            p0: self.p0,
            p1: self.p1,
        }
    }
}

impl BoundBox for Vec<Point> {
    fn bbox(&self) -> Bbox {
        self.iter()
            .fold(Bbox::empty(), |bbox, pt| bbox.union(pt.bbox()))
    }
}

impl BoundBox for Polygon {
    fn bbox(&self) -> Bbox {
        self.points.bbox()
    }
}

impl BoundBox for Shape {
    fn bbox(&self) -> Bbox {
        match self {
            Shape::Rect(r) => r.bbox(),
            Shape::Polygon(p) => p.bbox(),
        }
    }
}

impl<T> BoundBox for [T]
where
    T: BoundBox,
{
    fn bbox(&self) -> Bbox {
        self.iter()
            .fold(Bbox::empty(), |bbox, item| bbox.union(item.bbox()))
    }
}
