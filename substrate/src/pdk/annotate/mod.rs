//! Hooks for annotating the layout of device primitives.

use serde::{Deserialize, Serialize};

use self::error::AnnotateError;
use crate::deps::arcstr::ArcStr;
use crate::error::Result;
use crate::layout::cell::Cell;
use crate::pdk::rules::Primitive;

pub mod error;

/// Geometric parameters of a device primitive, in microns.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceParams {
    pub width: Option<f64>,
    pub length: Option<f64>,
}

impl DeviceParams {
    #[inline]
    pub fn new(width: f64, length: f64) -> Self {
        Self {
            width: Some(width),
            length: Some(length),
        }
    }

    /// Returns the width, checking that it is present, finite and positive.
    pub fn checked_width(&self, primitive: &ArcStr) -> std::result::Result<f64, AnnotateError> {
        check_param(primitive, "width", self.width)
    }

    /// Returns the length, checking that it is present, finite and positive.
    pub fn checked_length(&self, primitive: &ArcStr) -> std::result::Result<f64, AnnotateError> {
        check_param(primitive, "length", self.length)
    }
}

fn check_param(
    primitive: &ArcStr,
    param: &'static str,
    value: Option<f64>,
) -> std::result::Result<f64, AnnotateError> {
    let value = value.ok_or_else(|| AnnotateError::MissingParam {
        primitive: primitive.clone(),
        param,
    })?;
    if !value.is_finite() || value <= 0. {
        return Err(AnnotateError::InvalidParam {
            primitive: primitive.clone(),
            param,
            value,
        });
    }
    Ok(value)
}

/// A callback run after the layout of a device primitive has been generated.
pub trait PrimitiveLayoutHook: Send + Sync {
    /// Adds PDK specific markup to `cell`, the generated layout of `prim`.
    fn on_primitive_layout(
        &self,
        prim: &Primitive,
        params: &DeviceParams,
        cell: &mut Cell,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_must_be_positive() {
        let name = arcstr::literal!("Rppd");
        let params = DeviceParams::new(1.0, 0.0);
        assert_eq!(params.checked_width(&name), Ok(1.0));
        assert_eq!(
            params.checked_length(&name),
            Err(AnnotateError::InvalidParam {
                primitive: name.clone(),
                param: "length",
                value: 0.0,
            })
        );
        let params = DeviceParams {
            width: Some(f64::NAN),
            length: None,
        };
        assert!(params.checked_width(&name).is_err());
        assert_eq!(
            params.checked_length(&name),
            Err(AnnotateError::MissingParam {
                primitive: name,
                param: "length",
            })
        );
    }
}
