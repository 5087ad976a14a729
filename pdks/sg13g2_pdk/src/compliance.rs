//! LVS labels for the generated IO cells.
//!
//! The foundry LVS deck recognizes the substrate connection of guard rings and
//! DC diodes, and the pad net of the ESD diodes, by text labels. The IO cell
//! generators do not draw these; they are added here after a cell is created.

use std::fmt::Display;

use arcstr::ArcStr;
use subgeom::orientation::Named;
use subgeom::Point;
use substrate::error::{with_err_context, ErrorContext, Result};
use substrate::layout::cell::Cell;
use substrate::layout::layers::{LayerSpec, Layers};
use substrate::pdk::compliance::error::ComplianceError;
use substrate::pdk::compliance::{expect_orientation, first_inst_with_prefix, insts_of, LabelBatch};
use substrate::pdk::rules::ImplantType;

use crate::annotate::LABEL_LAYER;
use crate::config::Sg13g2Params;
use crate::io::IoSpec;

/// The layer whose pad net shapes locate the output pad connection.
pub const PAD_NET_LAYER: &str = "Metal2";

/// The pad cell variants.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum PadKind {
    In,
    Out,
    TriOut,
    InOut,
}

impl Display for PadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::In => "input",
            Self::Out => "output",
            Self::TriOut => "tri-state output",
            Self::InOut => "bidirectional",
        };
        write!(f, "{s}")
    }
}

/// The kind of IO cell being labeled, with the dimensions the labels depend on.
///
/// Dimensions are in nanometers. Label positions that fall on a half
/// nanometer are rounded toward zero.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ComplianceTarget {
    GuardRing {
        type_: ImplantType,
        width: i64,
        height: i64,
        ring_width: i64,
    },
    DcDiode {
        type_: ImplantType,
        active_width: i64,
    },
    Pad(PadKind),
}

impl Display for ComplianceTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GuardRing { type_, .. } => write!(f, "{type_}-type guard ring"),
            Self::DcDiode { type_, .. } => write!(f, "{type_}-type DC diode"),
            Self::Pad(kind) => write!(f, "{kind} pad"),
        }
    }
}

/// Adds LVS labels to generated IO cells.
#[derive(Debug, Clone)]
pub struct ComplianceScanner {
    text: LayerSpec,
    metal2: LayerSpec,
    clamp_prefix: ArcStr,
    diode_cells: Vec<ArcStr>,
    pad_net: ArcStr,
    pad_label: ArcStr,
    sub_label: ArcStr,
    pad_in_offset: i64,
}

impl ComplianceScanner {
    pub fn new(
        layers: &Layers,
        io: &IoSpec,
        params: &Sg13g2Params,
    ) -> std::result::Result<Self, ComplianceError> {
        let layer = |name: &str| {
            layers
                .mask_spec(name)
                .ok_or_else(|| ComplianceError::MissingLabelLayer(ArcStr::from(name)))
        };
        Ok(Self {
            text: layer(LABEL_LAYER)?,
            metal2: layer(PAD_NET_LAYER)?,
            clamp_prefix: params.clamp_prefix.clone(),
            diode_cells: params.diode_cells.clone(),
            pad_net: params.pad_net.clone(),
            pad_label: params.pad_label.clone(),
            sub_label: params.sub_label.clone(),
            pad_in_offset: io.dcdiode.pad_offset,
        })
    }

    /// Labels `cell`, returning the number of labels added.
    ///
    /// Nothing is added if the cell violates the placement conventions the
    /// labels rely on.
    pub fn scan_and_label(&self, cell: &mut Cell, target: ComplianceTarget) -> Result<usize> {
        let batch = with_err_context(self.scan(cell, target), || ErrorContext::LabelCell {
            cell: cell.name().clone(),
            target: arcstr::format!("{target}"),
        })?;
        Ok(batch.commit(cell))
    }

    /// Computes the labels for `cell` without modifying it.
    pub fn scan(
        &self,
        cell: &Cell,
        target: ComplianceTarget,
    ) -> std::result::Result<LabelBatch, ComplianceError> {
        let mut batch = LabelBatch::new(self.text);
        match target {
            ComplianceTarget::GuardRing {
                type_: ImplantType::P,
                width,
                height,
                ring_width,
            } => {
                batch.push(
                    self.sub_label.clone(),
                    ((ring_width - width) / 2, (ring_width - height) / 2),
                );
            }
            ComplianceTarget::DcDiode {
                type_: ImplantType::N,
                active_width,
            } => {
                batch.push(self.sub_label.clone(), (active_width / 2, active_width / 2));
            }
            ComplianceTarget::GuardRing { .. } | ComplianceTarget::DcDiode { .. } => {}
            ComplianceTarget::Pad(PadKind::In) => self.label_pad_in(cell, &mut batch)?,
            ComplianceTarget::Pad(PadKind::Out | PadKind::TriOut | PadKind::InOut) => {
                self.label_pad_out(cell, &mut batch)?
            }
        }
        Ok(batch)
    }

    fn label_pad_in(
        &self,
        cell: &Cell,
        batch: &mut LabelBatch,
    ) -> std::result::Result<(), ComplianceError> {
        for inst in insts_of(cell, &self.diode_cells) {
            expect_orientation(cell, inst, Named::R90)?;
            batch.push(
                self.pad_label.clone(),
                inst.loc() + Point::new(-self.pad_in_offset, 0),
            );
        }
        Ok(())
    }

    fn label_pad_out(
        &self,
        cell: &Cell,
        batch: &mut LabelBatch,
    ) -> std::result::Result<(), ComplianceError> {
        let clamp = first_inst_with_prefix(cell, &self.clamp_prefix).ok_or_else(|| {
            ComplianceError::MissingInstance {
                cell: cell.name().clone(),
                prefix: self.clamp_prefix.clone(),
            }
        })?;
        expect_orientation(cell, clamp, Named::R0)?;

        let pad = clamp
            .shapes_on_net(self.metal2, &self.pad_net)
            .into_iter()
            .next()
            .ok_or_else(|| ComplianceError::MissingNetShape {
                cell: cell.name().clone(),
                inst: clamp.name().clone(),
                layer: ArcStr::from(PAD_NET_LAYER),
                net: self.pad_net.clone(),
            })?;
        let x = pad.center().x;

        for inst in insts_of(cell, &self.diode_cells) {
            expect_orientation(cell, inst, Named::R0)?;
            batch.push(self.pad_label.clone(), (x, inst.loc().y));
        }
        Ok(())
    }
}
