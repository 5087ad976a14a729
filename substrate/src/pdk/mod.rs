use std::fmt::Display;
use std::path::PathBuf;

use self::annotate::PrimitiveLayoutHook;
use self::rules::RuleGraph;
use crate::error::Result;
use crate::layout::layers::Layers;

pub mod annotate;
pub mod compliance;
pub mod rules;

#[derive(Debug, Clone)]
pub struct PdkParams {
    /// The path at which PDK files are stored
    pub pdk_root: PathBuf,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum DeviceClass {
    Mos,
    Res,
    Diode,
    Other,
}

impl Display for DeviceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Mos => write!(f, "mos"),
            Self::Res => write!(f, "res"),
            Self::Diode => write!(f, "diode"),
            Self::Other => write!(f, "other"),
        }
    }
}

pub trait Pdk {
    fn new(params: &PdkParams) -> Result<Self>
    where
        Self: Sized;

    fn name(&self) -> &'static str;

    fn process(&self) -> &'static str;

    /// The grid on which all layout geometry must lie, in layout units.
    fn layout_grid(&self) -> i64;

    /// The design rules of the process.
    fn rules(&self) -> &RuleGraph;

    /// The GDS layer table of the process.
    fn layers(&self) -> &Layers;

    /// Called by layout generators after drawing a device primitive.
    ///
    /// Allows the PDK to add process specific markup to primitive cells.
    fn primitive_layout_hook(&self) -> Option<&dyn PrimitiveLayoutHook> {
        None
    }
}
