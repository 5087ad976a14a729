//! Design rule graph error handling.

use std::fmt::Display;

use derive_builder::UninitializedFieldError;
use thiserror::Error;

use super::PrimitiveKind;
use crate::deps::arcstr::ArcStr;

/// The reason a numeric rule value was rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstraintViolation {
    NonFinite,
    Negative,
    OffGrid { grid: f64 },
}

impl Display for ConstraintViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonFinite => write!(f, "value is not finite"),
            Self::Negative => write!(f, "value is negative"),
            Self::OffGrid { grid } => write!(f, "value is not a multiple of the {grid}um grid"),
        }
    }
}

/// An error type for the design rule API.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuleError {
    #[error("a primitive named `{0}` already exists")]
    DuplicateName(ArcStr),

    #[error("primitive `{primitive}` refers to unknown primitive `{target}` in field `{field}`")]
    UnresolvedReference {
        primitive: ArcStr,
        field: &'static str,
        target: ArcStr,
    },

    #[error("invalid value {value} for `{field}` of primitive `{primitive}`: {reason}")]
    InvalidConstraint {
        primitive: ArcStr,
        field: &'static str,
        value: f64,
        reason: ConstraintViolation,
    },

    #[error("spacing `{primitive}` lists `{operand}` on both sides")]
    OverlappingSpacing { primitive: ArcStr, operand: ArcStr },

    #[error("primitive `{primitive}` has field `{field}` which must not be empty")]
    EmptyField {
        primitive: ArcStr,
        field: &'static str,
    },

    #[error("primitive `{name}` is a {found}, not a {expected}")]
    WrongKind {
        name: ArcStr,
        expected: PrimitiveKind,
        found: PrimitiveKind,
    },

    #[error("no primitive named `{0}` was found")]
    NotFound(ArcStr),

    #[error("invalid process grid: {0}um")]
    InvalidGrid(f64),

    #[error("incomplete primitive definition: {0}")]
    Builder(String),
}

impl From<UninitializedFieldError> for RuleError {
    fn from(value: UninitializedFieldError) -> Self {
        Self::Builder(value.to_string())
    }
}

pub type RuleResult<T> = std::result::Result<T, RuleError>;
