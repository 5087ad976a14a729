//! Device annotation error handling.

use thiserror::Error;

use crate::deps::arcstr::ArcStr;
use crate::pdk::rules::{ImplantType, PrimitiveKind};

/// An error type for primitive layout annotation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnnotateError {
    #[error("parameter `{param}` of `{primitive}` must be finite and positive, got {value}")]
    InvalidParam {
        primitive: ArcStr,
        param: &'static str,
        value: f64,
    },

    #[error("parameter `{param}` of `{primitive}` is required")]
    MissingParam {
        primitive: ArcStr,
        param: &'static str,
    },

    #[error("no sheet resistance is known for resistor `{0}`")]
    UnknownSheetResistance(ArcStr),

    #[error("cannot label {kind} `{primitive}`")]
    UnsupportedDevice {
        primitive: ArcStr,
        kind: PrimitiveKind,
    },

    #[error("cannot label diode `{primitive}` of type `{type_}`")]
    UnsupportedDiodeType {
        primitive: ArcStr,
        type_: ImplantType,
    },

    #[error("no layer for label mask `{0}`")]
    MissingLabelLayer(ArcStr),
}
