//! Layout compliance error handling.

use subgeom::orientation::Named;
use thiserror::Error;

use crate::deps::arcstr::ArcStr;

/// An error type for post-generation layout compliance passes.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum ComplianceError {
    #[error("instance `{inst}` in cell `{cell}` has orientation {found}, expected {expected}")]
    UnexpectedRotation {
        cell: ArcStr,
        inst: ArcStr,
        expected: Named,
        found: Named,
    },

    #[error("cell `{cell}` has no instance of a cell named `{prefix}*`")]
    MissingInstance { cell: ArcStr, prefix: ArcStr },

    #[error("instance `{inst}` in cell `{cell}` has no {layer} shape on net `{net}`")]
    MissingNetShape {
        cell: ArcStr,
        inst: ArcStr,
        layer: ArcStr,
        net: ArcStr,
    },

    #[error("no layer for label mask `{0}`")]
    MissingLabelLayer(ArcStr),
}
