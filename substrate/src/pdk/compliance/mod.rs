//! Building blocks for post-generation layout compliance passes.
//!
//! A pass inspects the instance tree of a finished cell and collects labels
//! into a [`LabelBatch`]. The batch is only committed once the whole pass
//! succeeded, so a failing pass leaves the cell untouched.

use subgeom::orientation::Named;
use subgeom::Point;

use self::error::ComplianceError;
use crate::deps::arcstr::ArcStr;
use crate::layout::cell::{Cell, Instance, TextElement};
use crate::layout::layers::LayerSpec;
use crate::log::debug;

pub mod error;

/// Labels waiting to be added to a cell.
#[derive(Debug, Clone)]
pub struct LabelBatch {
    layer: LayerSpec,
    labels: Vec<TextElement>,
}

impl LabelBatch {
    /// Creates an empty batch of labels on `layer`.
    pub fn new(layer: LayerSpec) -> Self {
        Self {
            layer,
            labels: Vec::new(),
        }
    }

    pub fn push(&mut self, text: impl Into<ArcStr>, loc: impl Into<Point>) {
        self.labels
            .push(TextElement::new(text, loc, self.layer));
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    #[inline]
    pub fn labels(&self) -> &[TextElement] {
        &self.labels
    }

    /// Appends the labels to `cell`, returning how many were added.
    pub fn commit(self, cell: &mut Cell) -> usize {
        let n = self.labels.len();
        for label in self.labels.iter() {
            debug!("labeling {} with `{}` at {}", cell.name(), label.string, label.loc);
        }
        cell.add_annotations(self.labels);
        n
    }
}

/// Checks that `inst` is placed with orientation `expected`.
pub fn expect_orientation(
    cell: &Cell,
    inst: &Instance,
    expected: Named,
) -> Result<(), ComplianceError> {
    let found = inst.orientation().named();
    if found != expected {
        return Err(ComplianceError::UnexpectedRotation {
            cell: cell.name().clone(),
            inst: inst.name().clone(),
            expected,
            found,
        });
    }
    Ok(())
}

/// The direct instances of `cell` whose cell name is one of `names`, in placement order.
pub fn insts_of<'a>(cell: &'a Cell, names: &'a [ArcStr]) -> impl Iterator<Item = &'a Instance> {
    cell.insts()
        .filter(move |inst| names.contains(inst.cell().name()))
}

/// The first direct instance of `cell` whose cell name starts with `prefix`.
pub fn first_inst_with_prefix<'a>(cell: &'a Cell, prefix: &str) -> Option<&'a Instance> {
    cell.insts()
        .find(|inst| inst.cell().name().starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::layout::layers::{GdsLayerSpec, LayerInfo, Layers};

    fn text_layer() -> LayerSpec {
        let mut layers = Layers::new();
        LayerSpec::drawing(layers.add(LayerInfo::drawing("TEXT", GdsLayerSpec(63, 0))))
    }

    #[test]
    fn orientation_mismatch_names_instance() {
        let leaf = Arc::new(Cell::new("sg13g2_DCNDiode"));
        let mut top = Cell::new("IOPadIn");
        let mut inst = Instance::new(leaf);
        inst.set_name("dcndiode");
        inst.set_orientation(Named::R90);
        top.add_inst(inst);

        let inst = top.insts().next().unwrap();
        assert_eq!(expect_orientation(&top, inst, Named::R90), Ok(()));
        assert_eq!(
            expect_orientation(&top, inst, Named::R0),
            Err(ComplianceError::UnexpectedRotation {
                cell: "IOPadIn".into(),
                inst: "dcndiode".into(),
                expected: Named::R0,
                found: Named::R90,
            })
        );
    }

    #[test]
    fn instance_queries() {
        let mut top = Cell::new("IOPadOut");
        top.add_insts([
            Instance::new(Cell::new("sg13g2_Clamp_N20N0D")),
            Instance::new(Cell::new("sg13g2_DCPDiode")),
            Instance::new(Cell::new("sg13g2_Clamp_N15N0D")),
        ]);
        let clamp = first_inst_with_prefix(&top, "sg13g2_Clamp_N").unwrap();
        assert_eq!(clamp.cell().name(), "sg13g2_Clamp_N20N0D");
        assert!(first_inst_with_prefix(&top, "sg13g2_Clamp_P").is_none());

        let names = [arcstr::literal!("sg13g2_DCNDiode"), arcstr::literal!("sg13g2_DCPDiode")];
        assert_eq!(insts_of(&top, &names).count(), 1);
    }

    #[test]
    fn batch_commits_all_labels() {
        let mut batch = LabelBatch::new(text_layer());
        batch.push("PAD", (10_000, 0));
        batch.push("PAD", (10_000, 5_000));
        let mut cell = Cell::new("c");
        assert_eq!(batch.commit(&mut cell), 2);
        assert_eq!(cell.annotations().count(), 2);
    }
}
