//! Manufacturing primitives and the constraints they carry.

use std::fmt::Display;
use std::str::FromStr;

use array_map::{ArrayMap, Indexable};
use derive_builder::Builder;
use enum_dispatch::enum_dispatch;
use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::error::{RuleError, RuleResult};
use super::value::{Constraint, Enclosure, SpaceTableRow};
use crate::deps::arcstr::ArcStr;

/// Kinds of wires a via or device may sit on.
const WIRES: &[PrimitiveKind] = &[
    PrimitiveKind::WaferWire,
    PrimitiveKind::GateWire,
    PrimitiveKind::MetalWire,
];

/// A reference from one primitive to another, by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference<'a> {
    /// The field holding the reference.
    pub field: &'static str,
    /// The referenced primitive.
    pub target: &'a ArcStr,
    /// The kinds the target may have. Empty if any kind is allowed.
    pub allowed: &'static [PrimitiveKind],
}

impl<'a> Reference<'a> {
    #[inline]
    fn new(field: &'static str, target: &'a ArcStr, allowed: &'static [PrimitiveKind]) -> Self {
        Self {
            field,
            target,
            allowed,
        }
    }
}

/// Common primitive operations, dispatched from the [`Primitive`] enum to its variants.
#[enum_dispatch]
pub trait PrimitiveTrait {
    /// The unique name of the primitive.
    fn name(&self) -> &ArcStr;

    /// Other primitives this primitive refers to.
    fn references(&self) -> Vec<Reference<'_>> {
        Vec::new()
    }

    /// Numeric rule values carried by this primitive.
    fn constraints(&self) -> Vec<Constraint> {
        Vec::new()
    }

    /// The marker used for pins drawn on this primitive, if any.
    fn pin(&self) -> Option<&ArcStr> {
        None
    }

    /// The marker used for routing blockages on this primitive, if any.
    fn blockage(&self) -> Option<&ArcStr> {
        None
    }

    /// Checks internal consistency that does not depend on other primitives.
    fn check(&self) -> RuleResult<()> {
        Ok(())
    }
}

/// A manufacturing primitive.
#[derive(Debug, Clone, PartialEq)]
#[enum_dispatch(PrimitiveTrait)]
pub enum Primitive {
    Marker(Marker),
    Auxiliary(Auxiliary),
    Implant(Implant),
    Well(Well),
    Insulator(Insulator),
    ExtraProcess(ExtraProcess),
    SubstrateMarker(SubstrateMarker),
    WaferWire(WaferWire),
    GateWire(GateWire),
    MetalWire(MetalWire),
    Via(Via),
    PadOpening(PadOpening),
    MosfetGate(MosfetGate),
    Mosfet(Mosfet),
    Resistor(Resistor),
    Diode(Diode),
    Spacing(Spacing),
}

/// An enumeration of primitive variants.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Marker,
    Auxiliary,
    Implant,
    Well,
    Insulator,
    ExtraProcess,
    SubstrateMarker,
    WaferWire,
    GateWire,
    MetalWire,
    Via,
    PadOpening,
    MosfetGate,
    Mosfet,
    Resistor,
    Diode,
    Spacing,
}

impl PrimitiveKind {
    /// Returns `true` if primitives of this kind are drawn on a mask of their own.
    pub fn is_mask_bearing(&self) -> bool {
        !matches!(
            self,
            Self::MosfetGate | Self::Mosfet | Self::Resistor | Self::Diode | Self::Spacing
        )
    }

    /// Returns `true` if primitives of this kind are conductors.
    pub fn is_wire(&self) -> bool {
        WIRES.contains(self)
    }
}

impl Display for PrimitiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Marker => "marker",
            Self::Auxiliary => "auxiliary layer",
            Self::Implant => "implant",
            Self::Well => "well",
            Self::Insulator => "insulator",
            Self::ExtraProcess => "extra process layer",
            Self::SubstrateMarker => "substrate marker",
            Self::WaferWire => "wafer wire",
            Self::GateWire => "gate wire",
            Self::MetalWire => "metal wire",
            Self::Via => "via",
            Self::PadOpening => "pad opening",
            Self::MosfetGate => "MOSFET gate",
            Self::Mosfet => "MOSFET",
            Self::Resistor => "resistor",
            Self::Diode => "diode",
            Self::Spacing => "spacing rule",
        };
        write!(f, "{s}")
    }
}

/// A [`Primitive`] variant that can be borrowed out of the enum.
pub trait PrimitiveVariant: Sized {
    const KIND: PrimitiveKind;

    fn from_primitive(prim: &Primitive) -> Option<&Self>;
}

macro_rules! primitive_variants {
    ($($variant:ident),* $(,)?) => {
        $(
            impl PrimitiveVariant for $variant {
                const KIND: PrimitiveKind = PrimitiveKind::$variant;

                fn from_primitive(prim: &Primitive) -> Option<&Self> {
                    match prim {
                        Primitive::$variant(inner) => Some(inner),
                        _ => None,
                    }
                }
            }
        )*

        impl Primitive {
            /// The variant of this primitive.
            pub fn kind(&self) -> PrimitiveKind {
                match self {
                    $(Self::$variant(_) => PrimitiveKind::$variant,)*
                }
            }
        }
    };
}

primitive_variants!(
    Marker,
    Auxiliary,
    Implant,
    Well,
    Insulator,
    ExtraProcess,
    SubstrateMarker,
    WaferWire,
    GateWire,
    MetalWire,
    Via,
    PadOpening,
    MosfetGate,
    Mosfet,
    Resistor,
    Diode,
    Spacing,
);

impl Primitive {
    /// Borrows the inner primitive as type `T`, if it has that type.
    #[inline]
    pub fn downcast<T: PrimitiveVariant>(&self) -> Option<&T> {
        T::from_primitive(self)
    }
}

/// The doping type of an implant, well or device.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ImplantType {
    N,
    P,
    /// Threshold-adjust or other implants without a doping polarity of their own.
    Adjust,
}

impl Display for ImplantType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::N => write!(f, "n"),
            Self::P => write!(f, "p"),
            Self::Adjust => write!(f, "adjust"),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("unknown implant type `{0}`")]
pub struct ImplantTypeParseError(pub String);

impl FromStr for ImplantType {
    type Err = ImplantTypeParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "n" => Ok(Self::N),
            "p" => Ok(Self::P),
            "adjust" => Ok(Self::Adjust),
            _ => Err(ImplantTypeParseError(s.to_string())),
        }
    }
}

macro_rules! named_layer {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Eq, PartialEq, Hash)]
        pub struct $name {
            name: ArcStr,
        }

        impl $name {
            pub fn new(name: impl Into<ArcStr>) -> Self {
                Self { name: name.into() }
            }
        }

        impl PrimitiveTrait for $name {
            fn name(&self) -> &ArcStr {
                &self.name
            }
        }
    };
}

named_layer!(
    /// A recognition or pin/blockage layer without process meaning of its own.
    Marker
);
named_layer!(
    /// A layer carried through the flow but not used by any rule,
    /// such as text or cell boundaries.
    Auxiliary
);
named_layer!(
    /// A layer marking regions of the substrate that belong to a separate net.
    SubstrateMarker
);

fn push_opt_length(out: &mut Vec<Constraint>, field: &'static str, value: Option<f64>) {
    if let Some(value) = value {
        out.push(Constraint::length(field, value));
    }
}

fn push_opt_enclosure(out: &mut Vec<Constraint>, field: &'static str, value: Option<&Enclosure>) {
    if let Some(enc) = value {
        out.extend(Constraint::enclosure(field, enc));
    }
}

/// Width, space and area rules shared by single-mask layers.
fn basic_constraints(min_width: f64, min_space: f64, min_area: Option<f64>) -> Vec<Constraint> {
    let mut out = vec![
        Constraint::length("min_width", min_width),
        Constraint::length("min_space", min_space),
    ];
    if let Some(area) = min_area {
        out.push(Constraint::area("min_area", area));
    }
    out
}

fn marker_refs<'a>(pin: Option<&'a ArcStr>, blockage: Option<&'a ArcStr>) -> Vec<Reference<'a>> {
    let mut out = Vec::new();
    if let Some(pin) = pin {
        out.push(Reference::new("pin", pin, &[PrimitiveKind::Marker]));
    }
    if let Some(blockage) = blockage {
        out.push(Reference::new("blockage", blockage, &[PrimitiveKind::Marker]));
    }
    out
}

/// A doping implant.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(pattern = "owned", build_fn(error = "RuleError"))]
pub struct Implant {
    #[builder(setter(into))]
    name: ArcStr,
    type_: ImplantType,
    min_width: f64,
    min_space: f64,
    #[builder(setter(strip_option), default)]
    min_area: Option<f64>,
}

impl Implant {
    #[inline]
    pub fn builder() -> ImplantBuilder {
        ImplantBuilder::default()
    }

    #[inline]
    pub fn type_(&self) -> ImplantType {
        self.type_
    }
}

impl PrimitiveTrait for Implant {
    fn name(&self) -> &ArcStr {
        &self.name
    }
    fn constraints(&self) -> Vec<Constraint> {
        basic_constraints(self.min_width, self.min_space, self.min_area)
    }
}

/// A well.
#[derive(Debug, Clone, PartialEq)]
pub struct Well {
    name: ArcStr,
    type_: ImplantType,
    min_width: f64,
    min_space: f64,
}

impl Well {
    pub fn new(name: impl Into<ArcStr>, type_: ImplantType, min_width: f64, min_space: f64) -> Self {
        Self {
            name: name.into(),
            type_,
            min_width,
            min_space,
        }
    }

    #[inline]
    pub fn type_(&self) -> ImplantType {
        self.type_
    }
}

impl PrimitiveTrait for Well {
    fn name(&self) -> &ArcStr {
        &self.name
    }
    fn constraints(&self) -> Vec<Constraint> {
        basic_constraints(self.min_width, self.min_space, None)
    }
}

/// A gate insulator layer, such as a thick oxide.
#[derive(Debug, Clone, PartialEq)]
pub struct Insulator {
    name: ArcStr,
    min_width: f64,
    min_space: f64,
}

impl Insulator {
    pub fn new(name: impl Into<ArcStr>, min_width: f64, min_space: f64) -> Self {
        Self {
            name: name.into(),
            min_width,
            min_space,
        }
    }
}

impl PrimitiveTrait for Insulator {
    fn name(&self) -> &ArcStr {
        &self.name
    }
    fn constraints(&self) -> Vec<Constraint> {
        basic_constraints(self.min_width, self.min_space, None)
    }
}

/// A layer that adds a process step, such as a silicide block.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtraProcess {
    name: ArcStr,
    min_width: f64,
    min_space: f64,
}

impl ExtraProcess {
    pub fn new(name: impl Into<ArcStr>, min_width: f64, min_space: f64) -> Self {
        Self {
            name: name.into(),
            min_width,
            min_space,
        }
    }
}

impl PrimitiveTrait for ExtraProcess {
    fn name(&self) -> &ArcStr {
        &self.name
    }
    fn constraints(&self) -> Vec<Constraint> {
        basic_constraints(self.min_width, self.min_space, None)
    }
}

/// The enclosure rules of a [`WaferWire`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[repr(u8)]
#[derive(Indexable)]
pub enum WireEnclosure {
    /// Enclosure of the wire by its implants.
    Implant,
    /// Enclosure of the wire by a well of opposite type.
    Well,
    /// Distance from the wire to a well edge when the wire is on the substrate.
    Substrate,
    /// Enclosure of the wire by a well of the same type.
    WellSameType,
    /// Substrate enclosure for wires of the substrate's own type.
    SubstrateSameType,
    /// Enclosure of the wire by an oxide.
    Oxide,
}

impl WireEnclosure {
    pub const ALL: [WireEnclosure; 6] = [
        Self::Implant,
        Self::Well,
        Self::Substrate,
        Self::WellSameType,
        Self::SubstrateSameType,
        Self::Oxide,
    ];

    fn field(&self) -> &'static str {
        match self {
            Self::Implant => "min_implant_enclosure",
            Self::Well => "min_well_enclosure",
            Self::Substrate => "min_substrate_enclosure",
            Self::WellSameType => "min_well_enclosure_same_type",
            Self::SubstrateSameType => "min_substrate_enclosure_same_type",
            Self::Oxide => "min_oxide_enclosure",
        }
    }
}

/// Whether implants of opposite type may abut on a wafer wire.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ImplantAbut {
    #[default]
    None,
    All,
}

/// The active (diffusion) wire of the wafer.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(pattern = "owned", build_fn(error = "RuleError"))]
pub struct WaferWire {
    #[builder(setter(into))]
    name: ArcStr,
    #[builder(setter(into, strip_option), default)]
    pin: Option<ArcStr>,
    #[builder(setter(into, strip_option), default)]
    blockage: Option<ArcStr>,
    min_width: f64,
    min_space: f64,
    #[builder(setter(strip_option), default)]
    min_area: Option<f64>,
    #[builder(default)]
    allow_in_substrate: bool,
    #[builder(setter(custom), default)]
    wells: Vec<ArcStr>,
    #[builder(setter(custom), default)]
    implants: Vec<ArcStr>,
    #[builder(setter(custom), default)]
    oxides: Vec<ArcStr>,
    #[builder(setter(custom), default)]
    enclosures: ArrayMap<WireEnclosure, Option<Enclosure>, 6>,
    #[builder(setter(custom), default)]
    well_enclosure_for_oxide: IndexMap<ArcStr, Enclosure>,
    #[builder(setter(custom), default)]
    substrate_enclosure_for_oxide: IndexMap<ArcStr, Enclosure>,
    #[builder(default)]
    implant_abut: ImplantAbut,
    #[builder(default)]
    allow_contactless_implant: bool,
    #[builder(default)]
    allow_well_crossing: bool,
}

impl WaferWireBuilder {
    /// Adds a well in which the wire may be placed.
    pub fn well(mut self, well: impl Into<ArcStr>) -> Self {
        self.wells.get_or_insert_with(Vec::new).push(well.into());
        self
    }

    /// Adds an implant the wire may be doped with.
    pub fn implant(mut self, implant: impl Into<ArcStr>) -> Self {
        self.implants.get_or_insert_with(Vec::new).push(implant.into());
        self
    }

    /// Adds an oxide the wire may be covered by.
    pub fn oxide(mut self, oxide: impl Into<ArcStr>) -> Self {
        self.oxides.get_or_insert_with(Vec::new).push(oxide.into());
        self
    }

    /// Sets one of the wire's enclosure rules.
    pub fn enclosure(mut self, kind: WireEnclosure, enc: impl Into<Enclosure>) -> Self {
        self.enclosures.get_or_insert_with(ArrayMap::default)[kind] = Some(enc.into());
        self
    }

    /// Overrides the well enclosure for wires covered by `oxide`.
    pub fn well_enclosure_for_oxide(
        mut self,
        oxide: impl Into<ArcStr>,
        enc: impl Into<Enclosure>,
    ) -> Self {
        self.well_enclosure_for_oxide
            .get_or_insert_with(IndexMap::new)
            .insert(oxide.into(), enc.into());
        self
    }

    /// Overrides the substrate enclosure for wires covered by `oxide`.
    pub fn substrate_enclosure_for_oxide(
        mut self,
        oxide: impl Into<ArcStr>,
        enc: impl Into<Enclosure>,
    ) -> Self {
        self.substrate_enclosure_for_oxide
            .get_or_insert_with(IndexMap::new)
            .insert(oxide.into(), enc.into());
        self
    }
}

impl WaferWire {
    #[inline]
    pub fn builder() -> WaferWireBuilder {
        WaferWireBuilder::default()
    }

    #[inline]
    pub fn min_width(&self) -> f64 {
        self.min_width
    }

    #[inline]
    pub fn min_space(&self) -> f64 {
        self.min_space
    }

    #[inline]
    pub fn allow_in_substrate(&self) -> bool {
        self.allow_in_substrate
    }

    #[inline]
    pub fn wells(&self) -> &[ArcStr] {
        &self.wells
    }

    #[inline]
    pub fn implants(&self) -> &[ArcStr] {
        &self.implants
    }

    #[inline]
    pub fn oxides(&self) -> &[ArcStr] {
        &self.oxides
    }

    #[inline]
    pub fn enclosure(&self, kind: WireEnclosure) -> Option<Enclosure> {
        self.enclosures[kind]
    }

    /// The well enclosure for a wire covered by `oxide`, falling back to the default.
    pub fn well_enclosure(&self, oxide: Option<&str>) -> Option<Enclosure> {
        oxide
            .and_then(|ox| self.well_enclosure_for_oxide.get(ox).copied())
            .or(self.enclosures[WireEnclosure::Well])
    }

    /// The substrate enclosure for a wire covered by `oxide`, falling back to the default.
    pub fn substrate_enclosure(&self, oxide: Option<&str>) -> Option<Enclosure> {
        oxide
            .and_then(|ox| self.substrate_enclosure_for_oxide.get(ox).copied())
            .or(self.enclosures[WireEnclosure::Substrate])
    }

    #[inline]
    pub fn implant_abut(&self) -> ImplantAbut {
        self.implant_abut
    }

    #[inline]
    pub fn allow_contactless_implant(&self) -> bool {
        self.allow_contactless_implant
    }

    #[inline]
    pub fn allow_well_crossing(&self) -> bool {
        self.allow_well_crossing
    }
}

impl PrimitiveTrait for WaferWire {
    fn name(&self) -> &ArcStr {
        &self.name
    }
    fn references(&self) -> Vec<Reference<'_>> {
        let mut out = marker_refs(self.pin.as_ref(), self.blockage.as_ref());
        out.extend(
            self.wells
                .iter()
                .map(|w| Reference::new("well", w, &[PrimitiveKind::Well])),
        );
        out.extend(
            self.implants
                .iter()
                .map(|i| Reference::new("implant", i, &[PrimitiveKind::Implant])),
        );
        out.extend(
            self.oxides
                .iter()
                .map(|o| Reference::new("oxide", o, &[PrimitiveKind::Insulator])),
        );
        out.extend(self.well_enclosure_for_oxide.keys().map(|o| {
            Reference::new("min_well_enclosure4oxide", o, &[PrimitiveKind::Insulator])
        }));
        out.extend(self.substrate_enclosure_for_oxide.keys().map(|o| {
            Reference::new(
                "min_substrate_enclosure4oxide",
                o,
                &[PrimitiveKind::Insulator],
            )
        }));
        out
    }
    fn constraints(&self) -> Vec<Constraint> {
        let mut out = basic_constraints(self.min_width, self.min_space, self.min_area);
        for kind in WireEnclosure::ALL {
            push_opt_enclosure(&mut out, kind.field(), self.enclosures[kind].as_ref());
        }
        for enc in self.well_enclosure_for_oxide.values() {
            out.extend(Constraint::enclosure("min_well_enclosure4oxide", enc));
        }
        for enc in self.substrate_enclosure_for_oxide.values() {
            out.extend(Constraint::enclosure("min_substrate_enclosure4oxide", enc));
        }
        out
    }
    fn pin(&self) -> Option<&ArcStr> {
        self.pin.as_ref()
    }
    fn blockage(&self) -> Option<&ArcStr> {
        self.blockage.as_ref()
    }
    fn check(&self) -> RuleResult<()> {
        if self.enclosures[WireEnclosure::Oxide].is_some() && self.oxides.is_empty() {
            return Err(RuleError::EmptyField {
                primitive: self.name.clone(),
                field: "oxide",
            });
        }
        Ok(())
    }
}

/// The gate (poly) wire.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(pattern = "owned", build_fn(error = "RuleError"))]
pub struct GateWire {
    #[builder(setter(into))]
    name: ArcStr,
    #[builder(setter(into, strip_option), default)]
    pin: Option<ArcStr>,
    #[builder(setter(into, strip_option), default)]
    blockage: Option<ArcStr>,
    min_width: f64,
    min_space: f64,
    #[builder(setter(strip_option), default)]
    min_area: Option<f64>,
}

impl GateWire {
    #[inline]
    pub fn builder() -> GateWireBuilder {
        GateWireBuilder::default()
    }

    #[inline]
    pub fn min_width(&self) -> f64 {
        self.min_width
    }
}

impl PrimitiveTrait for GateWire {
    fn name(&self) -> &ArcStr {
        &self.name
    }
    fn references(&self) -> Vec<Reference<'_>> {
        marker_refs(self.pin.as_ref(), self.blockage.as_ref())
    }
    fn constraints(&self) -> Vec<Constraint> {
        basic_constraints(self.min_width, self.min_space, self.min_area)
    }
    fn pin(&self) -> Option<&ArcStr> {
        self.pin.as_ref()
    }
    fn blockage(&self) -> Option<&ArcStr> {
        self.blockage.as_ref()
    }
}

/// A metal interconnect wire.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(pattern = "owned", build_fn(error = "RuleError"))]
pub struct MetalWire {
    #[builder(setter(into))]
    name: ArcStr,
    #[builder(setter(into, strip_option), default)]
    pin: Option<ArcStr>,
    #[builder(setter(into, strip_option), default)]
    blockage: Option<ArcStr>,
    min_width: f64,
    min_space: f64,
    #[builder(setter(strip_option), default)]
    min_area: Option<f64>,
    #[builder(setter(custom), default)]
    space_table: Vec<SpaceTableRow>,
}

impl MetalWireBuilder {
    /// Adds a row to the wire's width dependent spacing table.
    pub fn space_row(mut self, width: f64, length: Option<f64>, space: f64) -> Self {
        self.space_table
            .get_or_insert_with(Vec::new)
            .push(SpaceTableRow::new(width, length, space));
        self
    }
}

impl MetalWire {
    #[inline]
    pub fn builder() -> MetalWireBuilder {
        MetalWireBuilder::default()
    }

    #[inline]
    pub fn min_width(&self) -> f64 {
        self.min_width
    }

    #[inline]
    pub fn min_space(&self) -> f64 {
        self.min_space
    }

    #[inline]
    pub fn space_table(&self) -> &[SpaceTableRow] {
        &self.space_table
    }

    /// The minimum space next to a wire of the given width and parallel run length.
    pub fn min_space_for(&self, width: f64, length: f64) -> f64 {
        self.space_table
            .iter()
            .filter(|row| row.applies(width, length))
            .map(|row| row.space)
            .fold(self.min_space, f64::max)
    }
}

impl PrimitiveTrait for MetalWire {
    fn name(&self) -> &ArcStr {
        &self.name
    }
    fn references(&self) -> Vec<Reference<'_>> {
        marker_refs(self.pin.as_ref(), self.blockage.as_ref())
    }
    fn constraints(&self) -> Vec<Constraint> {
        let mut out = basic_constraints(self.min_width, self.min_space, self.min_area);
        for row in self.space_table.iter() {
            out.push(Constraint::length("space_table.width", row.width));
            push_opt_length(&mut out, "space_table.length", row.length);
            out.push(Constraint::length("space_table.space", row.space));
        }
        out
    }
    fn pin(&self) -> Option<&ArcStr> {
        self.pin.as_ref()
    }
    fn blockage(&self) -> Option<&ArcStr> {
        self.blockage.as_ref()
    }
}

/// The two sides of a via.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[repr(u8)]
#[derive(Indexable)]
pub enum ViaLevel {
    Bottom,
    Top,
}

impl ViaLevel {
    fn field(&self) -> &'static str {
        match self {
            Self::Bottom => "bottom",
            Self::Top => "top",
        }
    }
}

/// A wire a via lands on, with the required enclosure of the via by that wire.
#[derive(Debug, Clone, PartialEq)]
pub struct ViaConnection {
    pub wire: ArcStr,
    pub enclosure: Enclosure,
}

/// A via (or contact) between wires.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(pattern = "owned", build_fn(error = "RuleError"))]
pub struct Via {
    #[builder(setter(into))]
    name: ArcStr,
    #[builder(setter(into, strip_option), default)]
    blockage: Option<ArcStr>,
    width: f64,
    min_space: f64,
    #[builder(setter(custom), default)]
    connections: ArrayMap<ViaLevel, Vec<ViaConnection>, 2>,
}

impl ViaBuilder {
    /// Adds a wire below the via.
    pub fn bottom(self, wire: impl Into<ArcStr>, enc: impl Into<Enclosure>) -> Self {
        self.connect(ViaLevel::Bottom, wire, enc)
    }

    /// Adds a wire above the via.
    pub fn top(self, wire: impl Into<ArcStr>, enc: impl Into<Enclosure>) -> Self {
        self.connect(ViaLevel::Top, wire, enc)
    }

    fn connect(
        mut self,
        level: ViaLevel,
        wire: impl Into<ArcStr>,
        enc: impl Into<Enclosure>,
    ) -> Self {
        self.connections.get_or_insert_with(ArrayMap::default)[level].push(ViaConnection {
            wire: wire.into(),
            enclosure: enc.into(),
        });
        self
    }
}

impl Via {
    #[inline]
    pub fn builder() -> ViaBuilder {
        ViaBuilder::default()
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[inline]
    pub fn min_space(&self) -> f64 {
        self.min_space
    }

    #[inline]
    pub fn connections(&self, level: ViaLevel) -> &[ViaConnection] {
        &self.connections[level]
    }

    #[inline]
    pub fn bottom(&self) -> &[ViaConnection] {
        self.connections(ViaLevel::Bottom)
    }

    #[inline]
    pub fn top(&self) -> &[ViaConnection] {
        self.connections(ViaLevel::Top)
    }

    /// Returns `true` if the via lands on `wire` at the given level.
    pub fn lands_on(&self, level: ViaLevel, wire: &str) -> bool {
        self.connections[level].iter().any(|c| c.wire == wire)
    }
}

impl PrimitiveTrait for Via {
    fn name(&self) -> &ArcStr {
        &self.name
    }
    fn references(&self) -> Vec<Reference<'_>> {
        let mut out = marker_refs(None, self.blockage.as_ref());
        for level in [ViaLevel::Bottom, ViaLevel::Top] {
            out.extend(
                self.connections[level]
                    .iter()
                    .map(|c| Reference::new(level.field(), &c.wire, WIRES)),
            );
        }
        out
    }
    fn constraints(&self) -> Vec<Constraint> {
        let mut out = vec![
            Constraint::length("width", self.width),
            Constraint::length("min_space", self.min_space),
        ];
        for c in self.bottom() {
            out.extend(Constraint::enclosure("min_bottom_enclosure", &c.enclosure));
        }
        for c in self.top() {
            out.extend(Constraint::enclosure("min_top_enclosure", &c.enclosure));
        }
        out
    }
    fn blockage(&self) -> Option<&ArcStr> {
        self.blockage.as_ref()
    }
    fn check(&self) -> RuleResult<()> {
        for level in [ViaLevel::Bottom, ViaLevel::Top] {
            if self.connections[level].is_empty() {
                return Err(RuleError::EmptyField {
                    primitive: self.name.clone(),
                    field: level.field(),
                });
            }
        }
        Ok(())
    }
}

/// An opening in the passivation above a top metal, used for bond pads.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(pattern = "owned", build_fn(error = "RuleError"))]
pub struct PadOpening {
    #[builder(setter(into))]
    name: ArcStr,
    #[builder(setter(into, strip_option), default)]
    pin: Option<ArcStr>,
    min_width: f64,
    min_space: f64,
    #[builder(setter(into))]
    bottom: ArcStr,
    #[builder(setter(into))]
    min_bottom_enclosure: Enclosure,
}

impl PadOpening {
    #[inline]
    pub fn builder() -> PadOpeningBuilder {
        PadOpeningBuilder::default()
    }

    #[inline]
    pub fn bottom(&self) -> &ArcStr {
        &self.bottom
    }
}

impl PrimitiveTrait for PadOpening {
    fn name(&self) -> &ArcStr {
        &self.name
    }
    fn references(&self) -> Vec<Reference<'_>> {
        let mut out = marker_refs(self.pin.as_ref(), None);
        out.push(Reference::new(
            "bottom",
            &self.bottom,
            &[PrimitiveKind::MetalWire],
        ));
        out
    }
    fn constraints(&self) -> Vec<Constraint> {
        let mut out = basic_constraints(self.min_width, self.min_space, None);
        out.extend(Constraint::enclosure(
            "min_bottom_enclosure",
            &self.min_bottom_enclosure,
        ));
        out
    }
    fn pin(&self) -> Option<&ArcStr> {
        self.pin.as_ref()
    }
}

/// The gate region formed by a gate wire crossing an active wire.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(pattern = "owned", build_fn(error = "RuleError"))]
pub struct MosfetGate {
    #[builder(setter(into))]
    name: ArcStr,
    #[builder(setter(into))]
    active: ArcStr,
    #[builder(setter(into))]
    poly: ArcStr,
    #[builder(setter(into, strip_option), default)]
    oxide: Option<ArcStr>,
    #[builder(setter(into, strip_option), default)]
    contact: Option<ArcStr>,
    #[builder(setter(strip_option), default)]
    min_l: Option<f64>,
    #[builder(setter(strip_option), default)]
    min_w: Option<f64>,
    #[builder(setter(strip_option), default)]
    max_w: Option<f64>,
    #[builder(setter(strip_option), default)]
    min_gate_space: Option<f64>,
    #[builder(setter(into, strip_option), default)]
    min_gateoxide_enclosure: Option<Enclosure>,
    #[builder(setter(strip_option), default)]
    min_sd_width: Option<f64>,
    #[builder(setter(strip_option), default)]
    min_polyactive_extension: Option<f64>,
    #[builder(setter(strip_option), default)]
    min_contactgate_space: Option<f64>,
}

impl MosfetGate {
    #[inline]
    pub fn builder() -> MosfetGateBuilder {
        MosfetGateBuilder::default()
    }

    #[inline]
    pub fn active(&self) -> &ArcStr {
        &self.active
    }

    #[inline]
    pub fn poly(&self) -> &ArcStr {
        &self.poly
    }

    #[inline]
    pub fn oxide(&self) -> Option<&ArcStr> {
        self.oxide.as_ref()
    }

    #[inline]
    pub fn min_l(&self) -> Option<f64> {
        self.min_l
    }

    #[inline]
    pub fn min_w(&self) -> Option<f64> {
        self.min_w
    }

    #[inline]
    pub fn max_w(&self) -> Option<f64> {
        self.max_w
    }
}

impl PrimitiveTrait for MosfetGate {
    fn name(&self) -> &ArcStr {
        &self.name
    }
    fn references(&self) -> Vec<Reference<'_>> {
        let mut out = vec![
            Reference::new("active", &self.active, &[PrimitiveKind::WaferWire]),
            Reference::new("poly", &self.poly, &[PrimitiveKind::GateWire]),
        ];
        if let Some(oxide) = &self.oxide {
            out.push(Reference::new("oxide", oxide, &[PrimitiveKind::Insulator]));
        }
        if let Some(contact) = &self.contact {
            out.push(Reference::new("contact", contact, &[PrimitiveKind::Via]));
        }
        out
    }
    fn constraints(&self) -> Vec<Constraint> {
        let mut out = Vec::new();
        push_opt_length(&mut out, "min_l", self.min_l);
        push_opt_length(&mut out, "min_w", self.min_w);
        push_opt_length(&mut out, "max_w", self.max_w);
        push_opt_length(&mut out, "min_gate_space", self.min_gate_space);
        push_opt_enclosure(
            &mut out,
            "min_gateoxide_enclosure",
            self.min_gateoxide_enclosure.as_ref(),
        );
        push_opt_length(&mut out, "min_sd_width", self.min_sd_width);
        push_opt_length(
            &mut out,
            "min_polyactive_extension",
            self.min_polyactive_extension,
        );
        push_opt_length(&mut out, "min_contactgate_space", self.min_contactgate_space);
        out
    }
    fn check(&self) -> RuleResult<()> {
        if self.min_gateoxide_enclosure.is_some() && self.oxide.is_none() {
            return Err(RuleError::EmptyField {
                primitive: self.name.clone(),
                field: "oxide",
            });
        }
        Ok(())
    }
}

/// An implant a device is doped with, and its minimum enclosure of the device.
#[derive(Debug, Clone, PartialEq)]
pub struct ImplantEnclosure {
    pub implant: ArcStr,
    pub enclosure: Option<Enclosure>,
}

fn implant_refs(implants: &[ImplantEnclosure]) -> impl Iterator<Item = Reference<'_>> {
    implants
        .iter()
        .map(|i| Reference::new("implant", &i.implant, &[PrimitiveKind::Implant]))
}

fn implant_constraints(field: &'static str, implants: &[ImplantEnclosure]) -> Vec<Constraint> {
    implants
        .iter()
        .filter_map(|i| i.enclosure.as_ref())
        .flat_map(|enc| Constraint::enclosure(field, enc))
        .collect()
}

/// A transistor built on a [`MosfetGate`].
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(pattern = "owned", build_fn(error = "RuleError"))]
pub struct Mosfet {
    #[builder(setter(into))]
    name: ArcStr,
    #[builder(setter(into))]
    gate: ArcStr,
    #[builder(setter(into, strip_option), default)]
    well: Option<ArcStr>,
    #[builder(setter(custom), default)]
    implants: Vec<ImplantEnclosure>,
}

impl MosfetBuilder {
    /// Adds an implant with the minimum enclosure of the gate by that implant.
    pub fn implant(mut self, implant: impl Into<ArcStr>, enc: impl Into<Enclosure>) -> Self {
        self.implants
            .get_or_insert_with(Vec::new)
            .push(ImplantEnclosure {
                implant: implant.into(),
                enclosure: Some(enc.into()),
            });
        self
    }
}

impl Mosfet {
    #[inline]
    pub fn builder() -> MosfetBuilder {
        MosfetBuilder::default()
    }

    #[inline]
    pub fn gate(&self) -> &ArcStr {
        &self.gate
    }

    #[inline]
    pub fn well(&self) -> Option<&ArcStr> {
        self.well.as_ref()
    }

    #[inline]
    pub fn implants(&self) -> &[ImplantEnclosure] {
        &self.implants
    }
}

impl PrimitiveTrait for Mosfet {
    fn name(&self) -> &ArcStr {
        &self.name
    }
    fn references(&self) -> Vec<Reference<'_>> {
        let mut out = vec![Reference::new(
            "gate",
            &self.gate,
            &[PrimitiveKind::MosfetGate],
        )];
        if let Some(well) = &self.well {
            out.push(Reference::new("well", well, &[PrimitiveKind::Well]));
        }
        out.extend(implant_refs(&self.implants));
        out
    }
    fn constraints(&self) -> Vec<Constraint> {
        implant_constraints("min_gateimplant_enclosure", &self.implants)
    }
}

/// A resistor drawn on a wire, recognized by an indicator layer.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(pattern = "owned", build_fn(error = "RuleError"))]
pub struct Resistor {
    #[builder(setter(into))]
    name: ArcStr,
    #[builder(setter(into))]
    wire: ArcStr,
    #[builder(setter(into))]
    indicator: ArcStr,
    min_width: f64,
    min_length: f64,
    #[builder(default)]
    min_indicator_extension: f64,
    #[builder(setter(custom), default)]
    implants: Vec<ImplantEnclosure>,
    #[builder(setter(into, strip_option), default)]
    contact: Option<ArcStr>,
    #[builder(setter(strip_option), default)]
    min_contact_space: Option<f64>,
    /// Sheet resistance in ohms per square, used for labeling.
    #[builder(setter(strip_option), default)]
    sheet_resistance: Option<f64>,
}

impl ResistorBuilder {
    /// Adds an implant with the minimum enclosure of the resistor body by that implant.
    pub fn implant(mut self, implant: impl Into<ArcStr>, enc: impl Into<Enclosure>) -> Self {
        self.implants
            .get_or_insert_with(Vec::new)
            .push(ImplantEnclosure {
                implant: implant.into(),
                enclosure: Some(enc.into()),
            });
        self
    }
}

impl Resistor {
    #[inline]
    pub fn builder() -> ResistorBuilder {
        ResistorBuilder::default()
    }

    #[inline]
    pub fn wire(&self) -> &ArcStr {
        &self.wire
    }

    #[inline]
    pub fn indicator(&self) -> &ArcStr {
        &self.indicator
    }

    #[inline]
    pub fn min_width(&self) -> f64 {
        self.min_width
    }

    #[inline]
    pub fn min_length(&self) -> f64 {
        self.min_length
    }

    #[inline]
    pub fn implants(&self) -> &[ImplantEnclosure] {
        &self.implants
    }

    #[inline]
    pub fn sheet_resistance(&self) -> Option<f64> {
        self.sheet_resistance
    }
}

impl PrimitiveTrait for Resistor {
    fn name(&self) -> &ArcStr {
        &self.name
    }
    fn references(&self) -> Vec<Reference<'_>> {
        let mut out = vec![
            Reference::new("wire", &self.wire, WIRES),
            Reference::new("indicator", &self.indicator, &[]),
        ];
        out.extend(implant_refs(&self.implants));
        if let Some(contact) = &self.contact {
            out.push(Reference::new("contact", contact, &[PrimitiveKind::Via]));
        }
        out
    }
    fn constraints(&self) -> Vec<Constraint> {
        let mut out = vec![
            Constraint::length("min_width", self.min_width),
            Constraint::length("min_length", self.min_length),
            Constraint::length("min_indicator_extension", self.min_indicator_extension),
        ];
        out.extend(implant_constraints("min_implant_enclosure", &self.implants));
        push_opt_length(&mut out, "min_contact_space", self.min_contact_space);
        if let Some(sheet) = self.sheet_resistance {
            out.push(Constraint::scalar("sheet_resistance", sheet));
        }
        out
    }
}

/// A junction diode on a wafer wire, recognized by an indicator layer.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(pattern = "owned", build_fn(error = "RuleError"))]
pub struct Diode {
    #[builder(setter(into))]
    name: ArcStr,
    type_: ImplantType,
    #[builder(setter(into))]
    wire: ArcStr,
    min_width: f64,
    #[builder(setter(into))]
    indicator: ArcStr,
    #[builder(setter(into))]
    min_indicator_enclosure: Enclosure,
    #[builder(setter(custom), default)]
    implants: Vec<ImplantEnclosure>,
    #[builder(setter(into, strip_option), default)]
    well: Option<ArcStr>,
}

impl DiodeBuilder {
    /// Adds an implant the diode is doped with.
    pub fn implant(mut self, implant: impl Into<ArcStr>) -> Self {
        self.implants
            .get_or_insert_with(Vec::new)
            .push(ImplantEnclosure {
                implant: implant.into(),
                enclosure: None,
            });
        self
    }
}

impl Diode {
    #[inline]
    pub fn builder() -> DiodeBuilder {
        DiodeBuilder::default()
    }

    #[inline]
    pub fn type_(&self) -> ImplantType {
        self.type_
    }

    #[inline]
    pub fn wire(&self) -> &ArcStr {
        &self.wire
    }

    #[inline]
    pub fn indicator(&self) -> &ArcStr {
        &self.indicator
    }

    #[inline]
    pub fn well(&self) -> Option<&ArcStr> {
        self.well.as_ref()
    }

    #[inline]
    pub fn implants(&self) -> &[ImplantEnclosure] {
        &self.implants
    }
}

impl PrimitiveTrait for Diode {
    fn name(&self) -> &ArcStr {
        &self.name
    }
    fn references(&self) -> Vec<Reference<'_>> {
        let mut out = vec![
            Reference::new("wire", &self.wire, &[PrimitiveKind::WaferWire]),
            Reference::new("indicator", &self.indicator, &[]),
        ];
        out.extend(implant_refs(&self.implants));
        if let Some(well) = &self.well {
            out.push(Reference::new("well", well, &[PrimitiveKind::Well]));
        }
        out
    }
    fn constraints(&self) -> Vec<Constraint> {
        let mut out = vec![Constraint::length("min_width", self.min_width)];
        out.extend(Constraint::enclosure(
            "min_indicator_enclosure",
            &self.min_indicator_enclosure,
        ));
        out
    }
}

/// A minimum spacing between two sets of primitives.
///
/// Without a second set, the rule is a self-spacing among the first set.
/// A [`Mosfet`] operand stands for the gate region of that transistor.
#[derive(Debug, Clone, PartialEq)]
pub struct Spacing {
    name: ArcStr,
    primitives1: Vec<ArcStr>,
    primitives2: Option<Vec<ArcStr>>,
    min_space: f64,
}

impl Spacing {
    /// Creates a spacing rule between two disjoint sets of primitives.
    pub fn new<I1, I2, S1, S2>(primitives1: I1, primitives2: I2, min_space: f64) -> Self
    where
        I1: IntoIterator<Item = S1>,
        I2: IntoIterator<Item = S2>,
        S1: Into<ArcStr>,
        S2: Into<ArcStr>,
    {
        let primitives1: Vec<ArcStr> = primitives1.into_iter().map(Into::into).collect();
        let primitives2: Vec<ArcStr> = primitives2.into_iter().map(Into::into).collect();
        let name = arcstr::format!(
            "Spacing({},{}:{})",
            primitives1.iter().join("+"),
            primitives2.iter().join("+"),
            min_space
        );
        Self {
            name,
            primitives1,
            primitives2: Some(primitives2),
            min_space,
        }
    }

    /// Creates a spacing rule among the members of one set of primitives.
    pub fn among<I, S>(primitives: I, min_space: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ArcStr>,
    {
        let primitives1: Vec<ArcStr> = primitives.into_iter().map(Into::into).collect();
        let name = arcstr::format!("Spacing({}:{})", primitives1.iter().join("+"), min_space);
        Self {
            name,
            primitives1,
            primitives2: None,
            min_space,
        }
    }

    #[inline]
    pub fn primitives1(&self) -> &[ArcStr] {
        &self.primitives1
    }

    #[inline]
    pub fn primitives2(&self) -> Option<&[ArcStr]> {
        self.primitives2.as_deref()
    }

    #[inline]
    pub fn min_space(&self) -> f64 {
        self.min_space
    }

    /// Returns `true` if `name` is an operand of this rule.
    pub fn involves(&self, name: &str) -> bool {
        self.primitives1.iter().any(|p| p == name)
            || self
                .primitives2
                .iter()
                .flatten()
                .any(|p| p == name)
    }
}

impl PrimitiveTrait for Spacing {
    fn name(&self) -> &ArcStr {
        &self.name
    }
    fn references(&self) -> Vec<Reference<'_>> {
        self.primitives1
            .iter()
            .map(|p| Reference::new("primitives1", p, &[]))
            .chain(
                self.primitives2
                    .iter()
                    .flatten()
                    .map(|p| Reference::new("primitives2", p, &[])),
            )
            .collect()
    }
    fn constraints(&self) -> Vec<Constraint> {
        vec![Constraint::length("min_space", self.min_space)]
    }
    fn check(&self) -> RuleResult<()> {
        if self.primitives1.is_empty() {
            return Err(RuleError::EmptyField {
                primitive: self.name.clone(),
                field: "primitives1",
            });
        }
        if let Some(primitives2) = &self.primitives2 {
            if primitives2.is_empty() {
                return Err(RuleError::EmptyField {
                    primitive: self.name.clone(),
                    field: "primitives2",
                });
            }
            if let Some(operand) = self.primitives1.iter().find(|p| primitives2.contains(p)) {
                return Err(RuleError::OverlappingSpacing {
                    primitive: self.name.clone(),
                    operand: operand.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spacing_names_are_generated() {
        let s = Spacing::new(["Activ"], ["pSD"], 0.18);
        assert_eq!(s.name(), "Spacing(Activ,pSD:0.18)");
        let s = Spacing::new(["SalBlock"], ["Activ", "GatPoly", "Cont"], 0.2);
        assert_eq!(s.name(), "Spacing(SalBlock,Activ+GatPoly+Cont:0.2)");
        assert!(s.involves("GatPoly"));
        assert!(!s.involves("Metal1"));
        assert_eq!(Spacing::among(["Activ"], 0.21).name(), "Spacing(Activ:0.21)");
    }

    #[test]
    fn spacing_operands_must_be_disjoint() {
        let s = Spacing::new(["Activ", "GatPoly"], ["GatPoly"], 0.07);
        assert_eq!(
            s.check(),
            Err(RuleError::OverlappingSpacing {
                primitive: s.name().clone(),
                operand: arcstr::literal!("GatPoly"),
            })
        );
        assert_eq!(Spacing::among(["Activ"], 0.21).check(), Ok(()));
    }

    #[test]
    fn via_requires_both_levels() {
        let via = Via::builder()
            .name("Via1")
            .width(0.19)
            .min_space(0.22)
            .bottom("Metal1", (0.01, 0.05))
            .build()
            .unwrap();
        assert!(matches!(
            via.check(),
            Err(RuleError::EmptyField { field: "top", .. })
        ));
    }

    #[test]
    fn builder_reports_missing_fields() {
        let err = GateWire::builder().name("GatPoly").min_width(0.13).build();
        assert!(matches!(err, Err(RuleError::Builder(_))));
    }

    #[test]
    fn metal_space_table_lookup() {
        let m1 = MetalWire::builder()
            .name("Metal1")
            .min_width(0.16)
            .min_space(0.18)
            .space_row(0.3, Some(1.0), 0.22)
            .space_row(10.0, Some(10.0), 0.6)
            .build()
            .unwrap();
        assert_eq!(m1.min_space_for(0.2, 5.0), 0.18);
        assert_eq!(m1.min_space_for(0.5, 5.0), 0.22);
        assert_eq!(m1.min_space_for(12.0, 20.0), 0.6);
    }

    #[test]
    fn wafer_wire_oxide_enclosure_fallback() {
        let activ = WaferWire::builder()
            .name("Activ")
            .min_width(0.15)
            .min_space(0.21)
            .well("NWell")
            .oxide("ThickGateOx")
            .enclosure(WireEnclosure::Well, 0.31)
            .well_enclosure_for_oxide("ThickGateOx", 0.62)
            .build()
            .unwrap();
        assert_eq!(activ.well_enclosure(None), Some(Enclosure::uniform(0.31)));
        assert_eq!(
            activ.well_enclosure(Some("ThickGateOx")),
            Some(Enclosure::uniform(0.62))
        );
        assert_eq!(activ.substrate_enclosure(None), None);
        assert_eq!(Primitive::from(activ).kind(), PrimitiveKind::WaferWire);
    }

    #[test]
    fn parse_implant_type() {
        assert_eq!("n".parse::<ImplantType>(), Ok(ImplantType::N));
        assert_eq!("p".parse::<ImplantType>(), Ok(ImplantType::P));
        assert!("x".parse::<ImplantType>().is_err());
    }
}
