use substrate::error::Result;
use substrate::layout::layers::Layers;

/// The GDS layer table, one row per layer and purpose.
pub const LAYERS_CSV: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/layers.csv"));

/// Builds the SG13G2 layer table.
pub fn build_layers() -> Result<Layers> {
    Layers::from_csv(LAYERS_CSV)
}

#[cfg(test)]
mod tests {
    use substrate::layout::layers::{GdsLayerSpec, LayerPurpose};

    use super::*;

    #[test]
    fn foundry_numbering() {
        let layers = build_layers().unwrap();
        assert_eq!(layers.map("Metal2", LayerPurpose::Drawing), Some(GdsLayerSpec(10, 0)));
        assert_eq!(layers.map("Metal2", LayerPurpose::PinText), Some(GdsLayerSpec(10, 25)));
        assert_eq!(layers.map_mask("TopVia2.obs"), Some(GdsLayerSpec(133, 100)));
        assert_eq!(layers.map_mask("Recog.esd"), Some(GdsLayerSpec(99, 30)));
        assert_eq!(layers.map("Passiv", LayerPurpose::Obstruction), None);
        assert_eq!(
            layers.name_from_spec(GdsLayerSpec(63, 0)),
            Some((&arcstr::literal!("TEXT"), LayerPurpose::Drawing))
        );
    }
}
