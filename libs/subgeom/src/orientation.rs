//! Rectilinear orientations of placed layout objects.

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A counter-clockwise rotation by a multiple of 90 degrees.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Rotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    /// Returns the rotation corresponding to `turns` counter-clockwise quarter turns.
    pub fn from_quarter_turns(turns: i64) -> Self {
        match turns.rem_euclid(4) {
            0 => Self::R0,
            1 => Self::R90,
            2 => Self::R180,
            _ => Self::R270,
        }
    }

    /// The number of counter-clockwise quarter turns, between 0 and 3.
    #[inline]
    pub fn quarter_turns(&self) -> i64 {
        *self as u8 as i64
    }

    /// The rotation angle in degrees.
    #[inline]
    pub fn degrees(&self) -> i64 {
        90 * self.quarter_turns()
    }

    /// Cosine and sine of the rotation angle.
    pub(crate) fn cos_sin(&self) -> (i64, i64) {
        match self {
            Self::R0 => (1, 0),
            Self::R90 => (0, 1),
            Self::R180 => (-1, 0),
            Self::R270 => (0, -1),
        }
    }
}

/// A named orientation.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Named {
    /// No rotations or reflections.
    #[default]
    R0,
    /// Rotate 90 degrees counter-clockwise.
    R90,
    /// Rotate 180 degrees.
    R180,
    /// Rotate 270 degrees counter-clockwise.
    R270,
    /// Reflect vertically (ie. about the x-axis).
    ReflectVert,
    /// Reflect horizontally (ie. about the y-axis).
    ReflectHoriz,
    /// Flip across the line y = x.
    FlipYx,
    /// Flip across the line y = -x.
    FlipMinusYx,
}

impl Named {
    /// Returns all 8 rectilinear orientations.
    pub fn all_rectangular() -> [Self; 8] {
        [
            Self::R0,
            Self::R90,
            Self::R180,
            Self::R270,
            Self::ReflectVert,
            Self::ReflectHoriz,
            Self::FlipYx,
            Self::FlipMinusYx,
        ]
    }

    /// Converts this named orientation into a regular [`Orientation`].
    #[inline]
    pub fn into_orientation(self) -> Orientation {
        Orientation::from(self)
    }
}

impl Display for Named {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::R0 => "R0",
            Self::R90 => "R90",
            Self::R180 => "R180",
            Self::R270 => "R270",
            Self::ReflectVert => "MX",
            Self::ReflectHoriz => "MY",
            Self::FlipYx => "MXR90",
            Self::FlipMinusYx => "MYR90",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("error parsing orientation from `{0}`")]
pub struct OrientationParseError(String);

impl FromStr for Named {
    type Err = OrientationParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Named::all_rectangular()
            .into_iter()
            .find(|named| named.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| OrientationParseError(s.to_string()))
    }
}

/// An orientation of a cell instance.
///
/// The vertical reflection is applied before the rotation.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Orientation {
    pub(crate) reflect_vert: bool,
    pub(crate) rotation: Rotation,
}

impl From<Named> for Orientation {
    fn from(value: Named) -> Self {
        use Named::*;
        let (reflect_vert, rotation) = match value {
            R0 => (false, Rotation::R0),
            R90 => (false, Rotation::R90),
            R180 => (false, Rotation::R180),
            R270 => (false, Rotation::R270),
            ReflectVert => (true, Rotation::R0),
            FlipYx => (true, Rotation::R90),
            ReflectHoriz => (true, Rotation::R180),
            FlipMinusYx => (true, Rotation::R270),
        };
        Self {
            reflect_vert,
            rotation,
        }
    }
}

impl From<Orientation> for Named {
    fn from(value: Orientation) -> Self {
        match (value.reflect_vert, value.rotation) {
            (false, Rotation::R0) => Self::R0,
            (false, Rotation::R90) => Self::R90,
            (false, Rotation::R180) => Self::R180,
            (false, Rotation::R270) => Self::R270,
            (true, Rotation::R0) => Self::ReflectVert,
            (true, Rotation::R90) => Self::FlipYx,
            (true, Rotation::R180) => Self::ReflectHoriz,
            (true, Rotation::R270) => Self::FlipMinusYx,
        }
    }
}

impl Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.named())
    }
}

impl Orientation {
    /// Returns the identity orientation.
    #[inline]
    pub fn identity() -> Self {
        Self::default()
    }

    /// Creates an orientation from its components.
    #[inline]
    pub fn new(reflect_vert: bool, rotation: Rotation) -> Self {
        Self {
            reflect_vert,
            rotation,
        }
    }

    #[inline]
    pub fn reflect_vert(&self) -> bool {
        self.reflect_vert
    }

    #[inline]
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Returns the named equivalent of this orientation.
    #[inline]
    pub fn named(&self) -> Named {
        Named::from(*self)
    }

    /// Returns `true` if this orientation is the same as `other`.
    #[inline]
    pub fn is(&self, other: impl Into<Orientation>) -> bool {
        *self == other.into()
    }

    /// The 2x2 integer matrix of this orientation, in row-major order.
    pub fn matrix(&self) -> [[i64; 2]; 2] {
        let (cos, sin) = self.rotation.cos_sin();
        let m = if self.reflect_vert { -1 } else { 1 };
        [[cos, -sin * m], [sin, cos * m]]
    }

    /// Recovers an orientation from a rectilinear orientation matrix.
    pub fn from_matrix(a: [[i64; 2]; 2]) -> Self {
        let det = a[0][0] * a[1][1] - a[0][1] * a[1][0];
        let rotation = match (a[0][0], a[1][0]) {
            (1, 0) => Rotation::R0,
            (0, 1) => Rotation::R90,
            (-1, 0) => Rotation::R180,
            _ => Rotation::R270,
        };
        Self {
            reflect_vert: det < 0,
            rotation,
        }
    }

    /// Applies orientation `o` on top of this orientation.
    pub fn apply(&mut self, o: impl Into<Orientation>) {
        let o = o.into();
        *self = Self::from_matrix(crate::transform::matmul(&o.matrix(), &self.matrix()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_round_trips_through_orientation() {
        for named in Named::all_rectangular() {
            assert_eq!(Named::from(named.into_orientation()), named);
            assert_eq!(
                Orientation::from_matrix(named.into_orientation().matrix()),
                named.into_orientation()
            );
        }
    }

    #[test]
    fn apply_rotations_accumulates() {
        let mut o = Orientation::identity();
        o.apply(Named::R90);
        o.apply(Named::R180);
        assert_eq!(o.named(), Named::R270);
        o.apply(Named::R90);
        assert!(o.is(Named::R0));
    }

    #[test]
    fn double_reflection_is_identity() {
        let mut o = Named::ReflectVert.into_orientation();
        o.apply(Named::ReflectVert);
        assert_eq!(o, Orientation::identity());
    }

    #[test]
    fn parse_named() {
        assert_eq!("r90".parse::<Named>().unwrap(), Named::R90);
        assert_eq!("MX".parse::<Named>().unwrap(), Named::ReflectVert);
        assert!("R45".parse::<Named>().is_err());
    }
}
