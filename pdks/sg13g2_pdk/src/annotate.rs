//! Labels for the generated layout of resistors and diodes.
//!
//! The labels are read by LVS to extract device parameters that cannot be
//! recovered from the geometry alone.

use arcstr::ArcStr;
use subgeom::Point;
use substrate::error::{with_err_context, ErrorContext, Result};
use substrate::layout::cell::{Cell, TextElement};
use substrate::layout::layers::{LayerSpec, Layers};
use substrate::pdk::annotate::error::AnnotateError;
use substrate::pdk::annotate::{DeviceParams, PrimitiveLayoutHook};
use substrate::pdk::rules::{Diode, ImplantType, Primitive, PrimitiveTrait, Resistor};

/// The auxiliary layer labels are drawn on.
pub const LABEL_LAYER: &str = "TEXT";

/// Resistance in ohms of a resistor body `l` squares long and `w` squares wide.
#[inline]
pub fn resistance(sheet_resistance: f64, w: f64, l: f64) -> f64 {
    sheet_resistance * l / w
}

/// Formats a resistance with three decimals, switching to kilo-ohms above 1000 ohms.
pub fn render_resistance(r: f64) -> String {
    if r > 1000. {
        format!("{:.3}k", r / 1000.)
    } else {
        format!("{r:.3}")
    }
}

/// Adds parameter labels to device primitive layouts.
#[derive(Debug, Clone, Copy)]
pub struct DeviceAnnotator {
    text: LayerSpec,
}

impl DeviceAnnotator {
    #[inline]
    pub fn new(text: LayerSpec) -> Self {
        Self { text }
    }

    /// Creates an annotator drawing on the [`LABEL_LAYER`] of `layers`.
    pub fn from_layers(layers: &Layers) -> std::result::Result<Self, AnnotateError> {
        let text = layers
            .mask_spec(LABEL_LAYER)
            .ok_or_else(|| AnnotateError::MissingLabelLayer(ArcStr::from(LABEL_LAYER)))?;
        Ok(Self::new(text))
    }

    #[inline]
    pub fn layer(&self) -> LayerSpec {
        self.text
    }

    /// Computes the label for an instance of `prim` with the given parameters.
    ///
    /// The label sits at the device origin.
    pub fn annotate(
        &self,
        prim: &Primitive,
        params: &DeviceParams,
    ) -> std::result::Result<TextElement, AnnotateError> {
        let text = match prim {
            Primitive::Resistor(res) => resistor_label(res, params)?,
            Primitive::Diode(diode) => diode_label(diode)?,
            _ => {
                return Err(AnnotateError::UnsupportedDevice {
                    primitive: prim.name().clone(),
                    kind: prim.kind(),
                })
            }
        };
        Ok(TextElement::new(text, Point::zero(), self.text))
    }
}

fn resistor_label(
    res: &Resistor,
    params: &DeviceParams,
) -> std::result::Result<ArcStr, AnnotateError> {
    let name = res.name();
    let w = params.checked_width(name)?;
    let l = params.checked_length(name)?;
    let sheet = res
        .sheet_resistance()
        .ok_or_else(|| AnnotateError::UnknownSheetResistance(name.clone()))?;
    Ok(arcstr::format!(
        "{} r={}",
        name.to_lowercase(),
        render_resistance(resistance(sheet, w, l))
    ))
}

fn diode_label(diode: &Diode) -> std::result::Result<ArcStr, AnnotateError> {
    match diode.type_() {
        ImplantType::N => Ok(arcstr::literal!("dant")),
        ImplantType::P => Ok(arcstr::literal!("dpant")),
        type_ => Err(AnnotateError::UnsupportedDiodeType {
            primitive: diode.name().clone(),
            type_,
        }),
    }
}

impl PrimitiveLayoutHook for DeviceAnnotator {
    /// Labels resistors and diodes. Other primitives are left as drawn.
    fn on_primitive_layout(
        &self,
        prim: &Primitive,
        params: &DeviceParams,
        cell: &mut Cell,
    ) -> Result<()> {
        if !matches!(prim, Primitive::Resistor(_) | Primitive::Diode(_)) {
            return Ok(());
        }
        let label = with_err_context(self.annotate(prim, params), || {
            ErrorContext::AnnotatePrimitive {
                primitive: prim.name().clone(),
            }
        })?;
        log::debug!("labeling {} with `{}`", cell.name(), label.string);
        cell.add_annotation(label);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kilo_suffix_is_strict() {
        assert_eq!(render_resistance(1000.0), "1000.000");
        assert_eq!(render_resistance(1500.0), "1.500k");
        assert_eq!(render_resistance(520.0), "520.000");
        assert_eq!(render_resistance(resistance(396.917, 1.0, 20.0)), "7.938k");
    }
}
