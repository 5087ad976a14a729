//! Utilities and types for managing layers in a PDK.
//!
//! A PDK's layer table maps each mask-bearing primitive, in each of its roles,
//! to a GDS (layer, datatype) pair. Pin and blockage markers are named
//! `<base>.pin` and `<base>.obs` and are mapped to the pin and obstruction
//! purposes of their base layer.

use std::borrow::Borrow;
use std::fmt::Display;
use std::hash::Hash;
use std::str::FromStr;

use derive_builder::Builder;
use indexmap::map::Entry;
use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};
use thiserror::Error;

use crate::deps::arcstr::ArcStr;
use crate::error::{ErrorSource, Result as SubResult};
use crate::log::info;
use crate::pdk::rules::RuleGraph;

new_key_type! {
    /// A unique identifier for a layer in a PDK.
    pub struct LayerKey;
}

/// Suffix of pin marker names.
pub const PIN_SUFFIX: &str = ".pin";
/// Suffix of blockage marker names.
pub const OBS_SUFFIX: &str = ".obs";

/// A GDS layer specification.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct GdsLayerSpec(pub i16, pub i16);

impl GdsLayerSpec {
    #[inline]
    pub fn layer(&self) -> i16 {
        self.0
    }

    #[inline]
    pub fn datatype(&self) -> i16 {
        self.1
    }
}

impl Display for GdsLayerSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.0, self.1)
    }
}

#[derive(Deserialize)]
struct CsvLayerRecord {
    layernum: i16,
    datatype: i16,
    name: String,
    purpose: String,
}

/// An enumeration of layer purposes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Ord, PartialOrd, PartialEq, Eq, Hash)]
pub enum LayerPurpose {
    Drawing,
    Pin,
    Obstruction,
    /// Text labels naming the pins drawn on the layer.
    PinText,
}

impl LayerPurpose {
    /// The conventional GDS datatype of this purpose.
    pub fn default_datatype(&self) -> i16 {
        match self {
            Self::Drawing => 0,
            Self::Pin => 2,
            Self::PinText => 25,
            Self::Obstruction => 100,
        }
    }
}

impl Display for LayerPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Drawing => "drawing",
            Self::Pin => "pin",
            Self::Obstruction => "obstruction",
            Self::PinText => "pintext",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Error)]
#[error("unknown layer purpose `{0}`")]
pub struct FromStrError(pub String);

impl FromStr for LayerPurpose {
    type Err = FromStrError;
    fn from_str(purp: &str) -> Result<Self, Self::Err> {
        Ok(match purp {
            "drawing" => Self::Drawing,
            "pin" => Self::Pin,
            "obstruction" | "obs" => Self::Obstruction,
            "pintext" | "label" => Self::PinText,
            _ => return Err(FromStrError(purp.to_string())),
        })
    }
}

/// Splits a mask name into its base layer name and purpose.
///
/// `Metal1.pin` is the pin purpose of `Metal1`; `Via1.obs` is the obstruction
/// purpose of `Via1`. Any other name is the drawing purpose of itself.
pub fn split_mask_name(name: &str) -> (&str, LayerPurpose) {
    if let Some(base) = name.strip_suffix(PIN_SUFFIX) {
        (base, LayerPurpose::Pin)
    } else if let Some(base) = name.strip_suffix(OBS_SUFFIX) {
        (base, LayerPurpose::Obstruction)
    } else {
        (name, LayerPurpose::Drawing)
    }
}

/// A unique identifier for a specific GDS layer based on its definition in a PDK.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct LayerSpec(LayerKey, LayerPurpose);

impl LayerSpec {
    /// Creates a new [`LayerSpec`].
    #[inline]
    pub fn new(key: LayerKey, purpose: LayerPurpose) -> Self {
        Self(key, purpose)
    }

    /// Returns the spec for the drawing purpose of the layer associated with key `key`.
    pub fn drawing(key: LayerKey) -> Self {
        Self(key, LayerPurpose::Drawing)
    }

    /// Returns the spec for the pin purpose of the layer associated with key `key`.
    pub fn pin(key: LayerKey) -> Self {
        Self(key, LayerPurpose::Pin)
    }

    /// Returns the layer key of a [`LayerSpec`].
    #[inline]
    pub fn layer(&self) -> LayerKey {
        self.0
    }

    /// Returns the purpose of a [`LayerSpec`].
    #[inline]
    pub fn purpose(&self) -> LayerPurpose {
        self.1
    }
}

/// A layer table entry the rule graph requires but the table lacks.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct MissingEntry {
    /// The primitive (mask or marker) needing the entry.
    pub primitive: ArcStr,
    /// The base layer name looked up.
    pub layer: ArcStr,
    pub purpose: LayerPurpose,
}

impl Display for MissingEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} {})", self.primitive, self.layer, self.purpose)
    }
}

/// A layer table configuration error.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum LayerMapError {
    #[error("missing layer entries: {}", .0.iter().join(", "))]
    MissingEntries(Vec<MissingEntry>),

    #[error("GDS layer {spec} is used by both {first_layer} {first_purpose} and {second_layer} {second_purpose}")]
    Collision {
        spec: GdsLayerSpec,
        first_layer: ArcStr,
        first_purpose: LayerPurpose,
        second_layer: ArcStr,
        second_purpose: LayerPurpose,
    },

    #[error("{layer} {purpose} uses datatype 0, which is reserved for drawing")]
    ReservedDatatype {
        layer: ArcStr,
        purpose: LayerPurpose,
    },

    #[error("layer {layer} has more than one {purpose} entry")]
    DuplicateEntry {
        layer: ArcStr,
        purpose: LayerPurpose,
    },

    #[error("unknown layer purpose `{0}`")]
    UnknownPurpose(String),
}

/// A manager for layers in a PDK.
///
/// Keeps track of layers and indexes them by name and by GDS spec.
/// Layers are kept in insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Layers {
    slots: SlotMap<LayerKey, Layer>,
    names: IndexMap<ArcStr, LayerKey>,
    gds_to_layout: IndexMap<GdsLayerSpec, LayerSpec>,
}

impl Layers {
    /// Creates an empty [`Layers`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a [`Layers`] from a vector of [`LayerInfo`]s.
    pub fn from_layer_infos(layer_infos: Vec<LayerInfo>) -> Self {
        let mut layers = Self::new();
        for info in layer_infos {
            layers.add(info);
        }
        layers
    }

    /// Creates a [`Layers`] from purposes specified in a CSV file.
    ///
    /// The CSV must have the columns `layernum`, `datatype`, `name` and `purpose`.
    /// Rows with the same name are merged into one layer, in order of first appearance.
    pub fn from_csv(csv: &str) -> SubResult<Self> {
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let mut layer_infos: IndexMap<String, LayerInfo> = IndexMap::new();

        for record in reader.deserialize() {
            let record: CsvLayerRecord = record?;
            let purp = LayerPurpose::from_str(&record.purpose)
                .map_err(|err| LayerMapError::UnknownPurpose(err.0))?;
            let gds_spec = GdsLayerSpec(record.layernum, record.datatype);
            match layer_infos.entry(record.name.clone()) {
                Entry::Occupied(o) => {
                    let info = o.into_mut();
                    if info.spec(purp).is_some() {
                        return Err(LayerMapError::DuplicateEntry {
                            layer: info.name.clone(),
                            purpose: purp,
                        }
                        .into());
                    }
                    info.add_purpose(purp, gds_spec);
                }
                Entry::Vacant(v) => {
                    let mut layer_info = LayerInfo::default();
                    layer_info.name = ArcStr::from(record.name);
                    layer_info.add_purpose(purp, gds_spec);
                    v.insert(layer_info);
                }
            }
        }

        Ok(Self::from_layer_infos(layer_infos.into_values().collect()))
    }

    /// Adds a [`Layer`] to our slot-map, GDS-map, and name-map.
    ///
    /// If a GDS spec is already taken, the first layer keeps it;
    /// the clash is reported by [`Layers::validate`].
    pub fn add(&mut self, layer: LayerInfo) -> LayerKey {
        let name = layer.name.clone();
        let key = self.slots.insert_with_key(|k| Layer::new(k, layer));
        for (purp, gds_spec) in self.slots[key].purps() {
            self.gds_to_layout
                .entry(*gds_spec)
                .or_insert_with(|| LayerSpec::new(key, *purp));
        }
        self.names.insert(name, key);
        key
    }

    /// Gets the [`LayerKey`] with layer name `name`.
    pub fn get_key<Q>(&self, name: &Q) -> Option<LayerKey>
    where
        Q: Hash + Eq + ?Sized,
        ArcStr: Borrow<Q>,
    {
        self.names.get(name).cloned()
    }

    /// Gets a reference to the [`Layer`] with name `name`.
    pub fn get_layer<Q>(&self, name: &Q) -> Option<&Layer>
    where
        Q: Hash + Eq + ?Sized,
        ArcStr: Borrow<Q>,
    {
        let key = self.get_key(name)?;
        self.slots.get(key)
    }

    /// Gets the name of `key`.
    pub fn get_name(&self, key: LayerKey) -> SubResult<&ArcStr> {
        let layer = self
            .slots
            .get(key)
            .ok_or(ErrorSource::LayerNotFound(format!("{key:?}")))?;
        Ok(&layer.info.name)
    }

    /// Gets a reference to the [`Layer`] from [`LayerKey`] `key`.
    pub fn get(&self, key: LayerKey) -> Option<&Layer> {
        self.slots.get(key)
    }

    /// Iterates over all layers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.names.values().filter_map(|&k| self.slots.get(k))
    }

    /// Gets the [`LayerSpec`] corresponding to [`GdsLayerSpec`] `spec`.
    pub fn get_from_spec(&self, spec: GdsLayerSpec) -> Option<&LayerSpec> {
        self.gds_to_layout.get(&spec)
    }

    /// Gets the layer name and purpose stored under GDS spec `spec`.
    pub fn name_from_spec(&self, spec: GdsLayerSpec) -> Option<(&ArcStr, LayerPurpose)> {
        let ls = self.get_from_spec(spec)?;
        let layer = self.get(ls.layer())?;
        Some((&layer.info.name, ls.purpose()))
    }

    /// Converts a [`LayerSpec`] into its corresponding [`GdsLayerSpec`].
    pub fn to_gds_spec(&self, spec: &LayerSpec) -> Option<GdsLayerSpec> {
        self.get(spec.layer())
            .and_then(|layer| layer.spec(spec.purpose()))
    }

    /// Looks up the GDS spec of the layer named `name` with purpose `purpose`.
    pub fn map(&self, name: &str, purpose: LayerPurpose) -> Option<GdsLayerSpec> {
        self.get_layer(name).and_then(|layer| layer.spec(purpose))
    }

    /// Looks up the GDS spec of a mask or marker by its primitive name.
    ///
    /// See [`split_mask_name`].
    pub fn map_mask(&self, name: &str) -> Option<GdsLayerSpec> {
        let (base, purpose) = split_mask_name(name);
        self.map(base, purpose)
    }

    /// The [`LayerSpec`] of a mask or marker by its primitive name.
    pub fn mask_spec(&self, name: &str) -> Option<LayerSpec> {
        let (base, purpose) = split_mask_name(name);
        let layer = self.get_layer(base)?;
        layer.spec(purpose)?;
        Some(LayerSpec::new(layer.id, purpose))
    }

    /// Returns a [`Vec`] consisting of all layer names in the layer manager.
    pub fn get_layer_names(&self) -> Vec<&ArcStr> {
        self.names.keys().collect()
    }

    /// Checks the table against the primitives of `rules`.
    ///
    /// Every mask-bearing primitive needs an entry for its role; all missing
    /// entries are reported together. Afterwards, checks that no GDS spec is
    /// used twice and that datatype 0 is only used for drawing.
    pub fn validate(&self, rules: &RuleGraph) -> Result<(), LayerMapError> {
        let missing: Vec<MissingEntry> = rules
            .mask_names()
            .into_iter()
            .filter(|name| self.map_mask(name).is_none())
            .map(|name| {
                let (base, purpose) = split_mask_name(name);
                MissingEntry {
                    primitive: name.clone(),
                    layer: ArcStr::from(base),
                    purpose,
                }
            })
            .collect();
        if !missing.is_empty() {
            return Err(LayerMapError::MissingEntries(missing));
        }

        let mut seen: IndexMap<GdsLayerSpec, (&ArcStr, LayerPurpose)> = IndexMap::new();
        for layer in self.iter() {
            for (&purpose, &spec) in layer.purps() {
                if purpose != LayerPurpose::Drawing && spec.datatype() == 0 {
                    return Err(LayerMapError::ReservedDatatype {
                        layer: layer.info.name.clone(),
                        purpose,
                    });
                }
                if let Some((first_layer, first_purpose)) =
                    seen.insert(spec, (&layer.info.name, purpose))
                {
                    return Err(LayerMapError::Collision {
                        spec,
                        first_layer: first_layer.clone(),
                        first_purpose,
                        second_layer: layer.info.name.clone(),
                        second_purpose: purpose,
                    });
                }
            }
        }

        info!(
            "layer table validated against {}: {} layers, {} GDS specs",
            rules.name(),
            self.names.len(),
            seen.len()
        );
        Ok(())
    }
}

/// A layer in a PDK.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Layer {
    /// A unique identifier.
    pub id: LayerKey,
    /// Information associated with the layer.
    pub info: LayerInfo,
}

/// Metadata associated with a layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Builder)]
#[builder(pattern = "owned")]
pub struct LayerInfo {
    /// The layer name.
    #[builder(setter(into), default)]
    pub name: ArcStr,
    /// A layer purpose to GDS spec lookup table.
    #[builder(setter(into), default)]
    pub purps: IndexMap<LayerPurpose, GdsLayerSpec>,
}

impl Layer {
    pub(crate) fn new(id: LayerKey, info: LayerInfo) -> Self {
        Self { id, info }
    }

    /// Retrieves the spec for this layer and [`purpose`](LayerPurpose).
    pub fn spec(&self, purpose: LayerPurpose) -> Option<GdsLayerSpec> {
        self.info.spec(purpose)
    }

    /// Retrieves the pin text spec for this layer.
    pub fn label_spec(&self) -> Option<GdsLayerSpec> {
        self.info.spec(LayerPurpose::PinText)
    }

    /// Retrieves the [`LayerPurpose`]-[`GdsLayerSpec`] pairs in insertion order.
    pub fn purps(&self) -> impl Iterator<Item = (&LayerPurpose, &GdsLayerSpec)> {
        self.info.purps.iter()
    }
}

impl LayerInfo {
    /// Creates a new [`LayerInfoBuilder`].
    #[inline]
    pub fn builder() -> LayerInfoBuilder {
        LayerInfoBuilder::default()
    }

    /// Creates a layer with only a drawing purpose.
    pub fn drawing(name: impl Into<ArcStr>, spec: GdsLayerSpec) -> Self {
        let mut info = Self {
            name: name.into(),
            purps: IndexMap::new(),
        };
        info.add_purpose(LayerPurpose::Drawing, spec);
        info
    }

    /// Adds a new [`LayerPurpose`].
    #[inline]
    pub fn add_purpose(&mut self, purp: LayerPurpose, spec: GdsLayerSpec) {
        self.purps.insert(purp, spec);
    }

    /// Adds purpose-spec `pairs`.
    ///
    /// Consumes and returns `self` for chainability.
    pub fn add_pairs(mut self, pairs: &[(LayerPurpose, GdsLayerSpec)]) -> Self {
        for (purp, spec) in pairs {
            self.add_purpose(*purp, *spec);
        }
        self
    }

    /// Retrieves the spec for this layer and [`purpose`](LayerPurpose).
    pub fn spec(&self, purpose: LayerPurpose) -> Option<GdsLayerSpec> {
        self.purps.get(&purpose).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "layernum,datatype,name,purpose
8,0,Metal1,drawing
8,2,Metal1,pin
8,25,Metal1,pintext
8,100,Metal1,obstruction
63,0,TEXT,drawing
";

    #[test]
    fn csv_rows_merge_by_name() {
        let layers = Layers::from_csv(CSV).unwrap();
        assert_eq!(layers.get_layer_names(), ["Metal1", "TEXT"]);
        assert_eq!(
            layers.map("Metal1", LayerPurpose::Pin),
            Some(GdsLayerSpec(8, 2))
        );
        assert_eq!(layers.map_mask("Metal1.obs"), Some(GdsLayerSpec(8, 100)));
        assert_eq!(layers.map_mask("Metal1"), Some(GdsLayerSpec(8, 0)));
        assert_eq!(layers.map_mask("TEXT.pin"), None);
        let (name, purpose) = layers.name_from_spec(GdsLayerSpec(8, 25)).unwrap();
        assert_eq!(name, "Metal1");
        assert_eq!(purpose, LayerPurpose::PinText);
        assert_eq!(
            layers.get_layer("Metal1").unwrap().label_spec(),
            Some(GdsLayerSpec(8, 25))
        );
    }

    #[test]
    fn csv_rejects_bad_rows() {
        let err = Layers::from_csv("layernum,datatype,name,purpose\n8,0,Metal1,fill\n").unwrap_err();
        assert!(matches!(
            err.source(),
            ErrorSource::LayerMap(LayerMapError::UnknownPurpose(p)) if p == "fill"
        ));
        let err = Layers::from_csv("layernum,datatype,name,purpose\n8,0,M1,drawing\n9,0,M1,drawing\n")
            .unwrap_err();
        assert!(matches!(
            err.source(),
            ErrorSource::LayerMap(LayerMapError::DuplicateEntry { .. })
        ));
    }

    #[test]
    fn split_marker_names() {
        assert_eq!(split_mask_name("Activ.pin"), ("Activ", LayerPurpose::Pin));
        assert_eq!(split_mask_name("Via1.obs"), ("Via1", LayerPurpose::Obstruction));
        assert_eq!(split_mask_name("Recog.dio"), ("Recog.dio", LayerPurpose::Drawing));
    }

    #[test]
    fn parse_purposes() {
        assert_eq!("pintext".parse::<LayerPurpose>().unwrap(), LayerPurpose::PinText);
        assert_eq!("obs".parse::<LayerPurpose>().unwrap(), LayerPurpose::Obstruction);
        assert!("fill".parse::<LayerPurpose>().is_err());
        for p in [
            LayerPurpose::Drawing,
            LayerPurpose::Pin,
            LayerPurpose::Obstruction,
            LayerPurpose::PinText,
        ] {
            assert_eq!(p.to_string().parse::<LayerPurpose>().unwrap(), p);
        }
    }
}
