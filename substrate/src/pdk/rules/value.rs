//! Numeric values carried by design rules.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use super::error::{ConstraintViolation, RuleError};

/// Relative tolerance used when checking that a micron value lies on the process grid.
const GRID_TOLERANCE: f64 = 1e-6;

/// The manufacturing grid of a process.
///
/// Rule values are given in microns; the grid is stored in integer nanometers.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Grid {
    nm: i64,
}

impl Grid {
    /// Creates a grid from a pitch in nanometers.
    pub fn from_nm(nm: i64) -> Result<Self, RuleError> {
        if nm <= 0 {
            return Err(RuleError::InvalidGrid(nm as f64 / 1000.));
        }
        Ok(Self { nm })
    }

    /// Creates a grid from a pitch in microns.
    ///
    /// The pitch must be a positive whole number of nanometers.
    pub fn from_microns(um: f64) -> Result<Self, RuleError> {
        let nm = um * 1000.;
        if !nm.is_finite() || nm < 1. - GRID_TOLERANCE || (nm - nm.round()).abs() > GRID_TOLERANCE
        {
            return Err(RuleError::InvalidGrid(um));
        }
        Self::from_nm(nm.round() as i64)
    }

    #[inline]
    pub fn nm(&self) -> i64 {
        self.nm
    }

    #[inline]
    pub fn microns(&self) -> f64 {
        self.nm as f64 / 1000.
    }

    /// Returns `true` if the micron value `um` is a whole multiple of the grid.
    pub fn is_on_grid(&self, um: f64) -> bool {
        let steps = um * 1000. / self.nm as f64;
        (steps - steps.round()).abs() <= GRID_TOLERANCE
    }

    /// Returns `true` if the area `um2` (in square microns) is a whole multiple
    /// of the grid cell area.
    pub fn is_on_area_grid(&self, um2: f64) -> bool {
        let cell = (self.nm * self.nm) as f64;
        let steps = um2 * 1e6 / cell;
        (steps - steps.round()).abs() <= GRID_TOLERANCE
    }

    /// Converts a micron value to integer nanometers, rounding to the nearest grid point.
    pub fn to_nm(&self, um: f64) -> i64 {
        let steps = (um * 1000. / self.nm as f64).round() as i64;
        steps * self.nm
    }
}

impl Display for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}um", self.microns())
    }
}

/// A minimum enclosure of one shape by another.
///
/// A uniform enclosure is stored as a pair of equal values.
/// Directional enclosures give separate minimums for the two orthogonal directions.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Enclosure {
    first: f64,
    second: f64,
}

impl Enclosure {
    /// An enclosure that is the same in all directions.
    #[inline]
    pub fn uniform(value: f64) -> Self {
        Self {
            first: value,
            second: value,
        }
    }

    /// An enclosure with different minimums in the two directions.
    #[inline]
    pub fn directional(first: f64, second: f64) -> Self {
        Self { first, second }
    }

    #[inline]
    pub fn first(&self) -> f64 {
        self.first
    }

    #[inline]
    pub fn second(&self) -> f64 {
        self.second
    }

    #[inline]
    pub fn is_uniform(&self) -> bool {
        self.first == self.second
    }

    /// The smaller of the two directional values.
    #[inline]
    pub fn min(&self) -> f64 {
        self.first.min(self.second)
    }

    /// The larger of the two directional values.
    #[inline]
    pub fn max(&self) -> f64 {
        self.first.max(self.second)
    }

    /// The enclosure with its two directions swapped.
    #[inline]
    pub fn wide(&self) -> Self {
        Self::directional(self.max(), self.min())
    }

    /// The enclosure with the smaller value first.
    #[inline]
    pub fn tall(&self) -> Self {
        Self::directional(self.min(), self.max())
    }
}

impl From<f64> for Enclosure {
    fn from(value: f64) -> Self {
        Self::uniform(value)
    }
}

impl From<(f64, f64)> for Enclosure {
    fn from(value: (f64, f64)) -> Self {
        Self::directional(value.0, value.1)
    }
}

impl Display for Enclosure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_uniform() {
            write!(f, "{}", self.first)
        } else {
            write!(f, "({}, {})", self.first, self.second)
        }
    }
}

/// A row of a width and length dependent spacing table.
///
/// Wires wider than `width` (and, if given, with parallel run length over `length`)
/// need at least `space` to their neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpaceTableRow {
    pub width: f64,
    pub length: Option<f64>,
    pub space: f64,
}

impl SpaceTableRow {
    #[inline]
    pub fn new(width: f64, length: Option<f64>, space: f64) -> Self {
        Self {
            width,
            length,
            space,
        }
    }

    /// Returns `true` if this row applies to a wire with the given width and run length.
    pub fn applies(&self, width: f64, length: f64) -> bool {
        width > self.width && self.length.map(|l| length > l).unwrap_or(true)
    }
}

/// The unit in which a constraint value is expressed.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ConstraintUnit {
    /// A distance in microns; must lie on the process grid.
    Length,
    /// An area in square microns; must be a whole number of grid cells.
    Area,
    /// Any other non-negative scalar, such as a sheet resistance in ohms per square.
    Scalar,
}

/// A numeric constraint exposed by a primitive for validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraint {
    pub field: &'static str,
    pub value: f64,
    pub unit: ConstraintUnit,
}

impl Constraint {
    #[inline]
    pub fn length(field: &'static str, value: f64) -> Self {
        Self {
            field,
            value,
            unit: ConstraintUnit::Length,
        }
    }

    #[inline]
    pub fn area(field: &'static str, value: f64) -> Self {
        Self {
            field,
            value,
            unit: ConstraintUnit::Area,
        }
    }

    #[inline]
    pub fn scalar(field: &'static str, value: f64) -> Self {
        Self {
            field,
            value,
            unit: ConstraintUnit::Scalar,
        }
    }

    /// Expands an enclosure into its two directional length constraints.
    pub fn enclosure(field: &'static str, enc: &Enclosure) -> [Self; 2] {
        [Self::length(field, enc.first), Self::length(field, enc.second)]
    }

    /// Checks the constraint against `grid`.
    pub fn check(&self, grid: Grid) -> Result<(), ConstraintViolation> {
        if !self.value.is_finite() {
            return Err(ConstraintViolation::NonFinite);
        }
        if self.value < 0. {
            return Err(ConstraintViolation::Negative);
        }
        let on_grid = match self.unit {
            ConstraintUnit::Length => grid.is_on_grid(self.value),
            ConstraintUnit::Area => grid.is_on_area_grid(self.value),
            ConstraintUnit::Scalar => true,
        };
        if !on_grid {
            return Err(ConstraintViolation::OffGrid { grid: grid.microns() });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use float_eq::assert_float_eq;

    use super::*;

    #[test]
    fn grid_accepts_multiples() {
        let grid = Grid::from_microns(0.005).unwrap();
        assert_eq!(grid.nm(), 5);
        for v in [0.0, 0.005, 0.13, 0.31, 1.64, 40.0, 55.32] {
            assert!(grid.is_on_grid(v), "{v} should be on grid");
        }
        assert!(!grid.is_on_grid(0.1234));
        assert!(!grid.is_on_grid(0.0025));
        assert!(grid.is_on_grid(5000.0));
        assert!(!grid.is_on_grid(5000.0025));
    }

    #[test]
    fn grid_area_check() {
        let grid = Grid::from_microns(0.005).unwrap();
        assert!(grid.is_on_area_grid(0.122));
        assert!(grid.is_on_area_grid(0.09));
        assert!(!grid.is_on_area_grid(0.0000125));
        assert!(!grid.is_on_area_grid(10000.0000125));
    }

    #[test]
    fn invalid_grids_are_rejected() {
        assert!(Grid::from_microns(0.0).is_err());
        assert!(Grid::from_microns(-0.005).is_err());
        assert!(Grid::from_microns(0.0005).is_err());
        assert!(Grid::from_microns(f64::NAN).is_err());
    }

    #[test]
    fn enclosure_normalizes() {
        let e = Enclosure::from(0.07);
        assert!(e.is_uniform());
        assert_eq!(e, Enclosure::from((0.07, 0.07)));

        let d = Enclosure::from((0.34, 0.26));
        assert_float_eq!(d.min(), 0.26, abs <= 1e-12);
        assert_eq!(d.tall(), Enclosure::directional(0.26, 0.34));
        assert_eq!(d.wide(), d);
    }

    #[test]
    fn constraint_violations() {
        let grid = Grid::from_microns(0.005).unwrap();
        assert_eq!(Constraint::length("min_space", 0.21).check(grid), Ok(()));
        assert_eq!(
            Constraint::length("min_space", -0.21).check(grid),
            Err(ConstraintViolation::Negative)
        );
        assert_eq!(
            Constraint::length("min_space", f64::INFINITY).check(grid),
            Err(ConstraintViolation::NonFinite)
        );
        assert_eq!(
            Constraint::length("min_width", 0.1234).check(grid),
            Err(ConstraintViolation::OffGrid { grid: 0.005 })
        );
        assert_eq!(Constraint::scalar("sheet_resistance", 396.917).check(grid), Ok(()));
    }

    #[test]
    fn space_table_row_applies() {
        let row = SpaceTableRow::new(0.3, Some(1.0), 0.22);
        assert!(row.applies(0.4, 1.5));
        assert!(!row.applies(0.4, 0.5));
        assert!(!row.applies(0.3, 1.5));
        assert!(SpaceTableRow::new(10.0, None, 0.6).applies(12.0, 0.0));
    }
}
