//! Transformation types and traits.

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

use super::orientation::Orientation;
use super::{Point, Polygon, Rect};

/// A rectilinear orientation matrix and a translation vector,
/// used for relative movement of [Point]s and [Shape](super::Shape)s.
///
/// Only rotations by multiples of 90 degrees and reflections are representable,
/// so transformed coordinates stay exact integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transformation {
    /// The orientation matrix in row-major order.
    pub a: [[i64; 2]; 2],
    /// The x-y translation applied after the orientation.
    pub b: [i64; 2],
}

impl Default for Transformation {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transformation {
    /// Returns the identity transform, leaving any transformed object unmodified.
    pub fn identity() -> Self {
        Self {
            a: [[1, 0], [0, 1]],
            b: [0, 0],
        }
    }

    /// Returns a translation by `(x,y)`.
    pub fn translate(x: i64, y: i64) -> Self {
        Self {
            a: [[1, 0], [0, 1]],
            b: [x, y],
        }
    }

    /// Creates a transform from a location and [`Orientation`].
    pub fn with_loc_and_orientation(loc: Point, orientation: impl Into<Orientation>) -> Self {
        Self {
            a: orientation.into().matrix(),
            b: [loc.x, loc.y],
        }
    }

    /// Create a new [`Transformation`] that is the cascade of `parent` and `child`.
    ///
    /// "Parents" and "children" refer to typical layout-instance hierarchies,
    /// in which each layer of instance has a nested set of transformations relative to its top-level parent.
    ///
    /// Note this operation *is not* commutative.
    pub fn cascade(parent: Transformation, child: Transformation) -> Transformation {
        let mut b = matvec(&parent.a, &child.b);
        b[0] += parent.b[0];
        b[1] += parent.b[1];
        let a = matmul(&parent.a, &child.a);
        Self { a, b }
    }

    /// The point to which the origin is moved.
    pub fn offset_point(&self) -> Point {
        Point::new(self.b[0], self.b[1])
    }

    /// The orientation component of the transformation.
    pub fn orientation(&self) -> Orientation {
        Orientation::from_matrix(self.a)
    }
}

impl<T> From<T> for Transformation
where
    T: Into<Orientation>,
{
    fn from(value: T) -> Self {
        Self::with_loc_and_orientation(Point::zero(), value)
    }
}

/// Multiplies two 2x2 matrices, returning a new 2x2 matrix.
pub(crate) fn matmul(a: &[[i64; 2]; 2], b: &[[i64; 2]; 2]) -> [[i64; 2]; 2] {
    [
        [
            a[0][0] * b[0][0] + a[0][1] * b[1][0],
            a[0][0] * b[0][1] + a[0][1] * b[1][1],
        ],
        [
            a[1][0] * b[0][0] + a[1][1] * b[1][0],
            a[1][0] * b[0][1] + a[1][1] * b[1][1],
        ],
    ]
}

/// Multiplies a 2x2 matrix by a 2-entry vector, returning a new 2-entry vector.
fn matvec(a: &[[i64; 2]; 2], b: &[i64; 2]) -> [i64; 2] {
    [
        a[0][0] * b[0] + a[0][1] * b[1],
        a[1][0] * b[0] + a[1][1] * b[1],
    ]
}

/// A trait for specifying how an object is changed by a transformation.
#[enum_dispatch]
pub trait Transform {
    /// Applies [`Transformation`] `trans`.
    ///
    /// Creates a new shape at a location equal to the transformation of our own.
    fn transform(&self, trans: Transformation) -> Self;
}

impl Transform for Point {
    fn transform(&self, trans: Transformation) -> Self {
        let [x, y] = matvec(&trans.a, &[self.x, self.y]);
        Self {
            x: x + trans.b[0],
            y: y + trans.b[1],
        }
    }
}

impl Transform for Rect {
    fn transform(&self, trans: Transformation) -> Self {
        Rect::new(self.p0.transform(trans), self.p1.transform(trans))
    }
}

impl Transform for Polygon {
    fn transform(&self, trans: Transformation) -> Self {
        Polygon {
            points: self.points.iter().map(|p| p.transform(trans)).collect(),
        }
    }
}

/// A trait for specifying how a shape is translated by a [`Point`].
#[enum_dispatch]
pub trait Translate {
    /// Translates the shape by a [`Point`] through mutation.
    fn translate(&mut self, p: Point);
}

impl Translate for Point {
    fn translate(&mut self, p: Point) {
        self.x += p.x;
        self.y += p.y;
    }
}

impl Translate for Rect {
    fn translate(&mut self, p: Point) {
        self.p0.translate(p);
        self.p1.translate(p);
    }
}

impl Translate for Polygon {
    fn translate(&mut self, p: Point) {
        for pt in self.points.iter_mut() {
            pt.translate(p);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::Named;

    #[test]
    fn test_matmul() {
        let a = [[1, 2], [3, 4]];
        let b = [[5, 6], [7, 8]];
        assert_eq!(matmul(&a, &b), [[19, 22], [43, 50]]);
    }

    #[test]
    fn cascade_identity() {
        for orientation in Named::all_rectangular() {
            let tf = Transformation::with_loc_and_orientation(Point::new(520, 130), orientation);
            let casc = Transformation::cascade(tf, Transformation::identity());
            assert_eq!(tf, casc, "cascade with identity changed {orientation:?}");
        }
    }

    #[test]
    fn cascade_is_ordered() {
        let reflect = Transformation::from(Named::ReflectVert);
        let shift = Transformation::translate(1, 1);
        let p = Point::new(1, 1);

        assert_eq!(
            p.transform(Transformation::cascade(reflect, shift)),
            Point::new(2, -2)
        );
        assert_eq!(
            p.transform(Transformation::cascade(shift, reflect)),
            Point::new(2, 0)
        );
    }

    #[test]
    fn loc_and_orientation_components() {
        let pt = Point::new(8930, 730);
        for orientation in Named::all_rectangular() {
            let tf = Transformation::with_loc_and_orientation(pt, orientation);
            assert_eq!(tf.orientation(), orientation.into());
            assert_eq!(tf.offset_point(), pt);
        }
    }

    #[test]
    fn rotate_rect_r90() {
        let rect = Rect::new(Point::new(0, 0), Point::new(2, 1));
        let tf = Transformation::with_loc_and_orientation(Point::new(10, 0), Named::R90);
        assert_eq!(
            rect.transform(tf),
            Rect::new(Point::new(9, 0), Point::new(10, 2))
        );
    }
}
