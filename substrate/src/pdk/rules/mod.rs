//! The design rule primitive graph of a process.
//!
//! A [`RuleGraph`] owns every [`Primitive`] of a technology.
//! Primitives refer to each other by name; references are resolved when
//! a primitive is registered, so a primitive may only refer to primitives
//! registered before it.

use indexmap::IndexMap;
use slotmap::{new_key_type, SlotMap};

pub use self::error::{ConstraintViolation, RuleError, RuleResult};
pub use self::primitive::*;
pub use self::value::{Constraint, ConstraintUnit, Enclosure, Grid, SpaceTableRow};
use crate::deps::arcstr::ArcStr;
use crate::log::trace;

pub mod error;
pub mod primitive;
pub mod value;

new_key_type! {
    /// A unique identifier for a [`Primitive`] in a [`RuleGraph`].
    pub struct PrimitiveKey;
}

/// The primitives of a process, in registration order.
#[derive(Debug, Clone)]
pub struct RuleGraph {
    name: ArcStr,
    grid: Grid,
    primitives: SlotMap<PrimitiveKey, Primitive>,
    names: IndexMap<ArcStr, PrimitiveKey>,
}

impl RuleGraph {
    pub fn new(name: impl Into<ArcStr>, grid: Grid) -> Self {
        Self {
            name: name.into(),
            grid,
            primitives: SlotMap::with_key(),
            names: IndexMap::new(),
        }
    }

    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    #[inline]
    pub fn grid(&self) -> Grid {
        self.grid
    }

    /// Adds a primitive to the graph.
    ///
    /// Fails if the name is already taken, a reference does not resolve to a
    /// registered primitive of an allowed kind, or a rule value is invalid.
    /// The graph is left unchanged on failure.
    pub fn register(&mut self, prim: impl Into<Primitive>) -> RuleResult<PrimitiveKey> {
        let prim = prim.into();
        let name = prim.name().clone();
        if self.names.contains_key(&name) {
            return Err(RuleError::DuplicateName(name));
        }

        for r in prim.references() {
            let target = self
                .lookup(r.target)
                .ok_or_else(|| RuleError::UnresolvedReference {
                    primitive: name.clone(),
                    field: r.field,
                    target: r.target.clone(),
                })?;
            if !r.allowed.is_empty() && !r.allowed.contains(&target.kind()) {
                return Err(RuleError::WrongKind {
                    name: r.target.clone(),
                    expected: r.allowed[0],
                    found: target.kind(),
                });
            }
        }

        for c in prim.constraints() {
            c.check(self.grid)
                .map_err(|reason| RuleError::InvalidConstraint {
                    primitive: name.clone(),
                    field: c.field,
                    value: c.value,
                    reason,
                })?;
        }

        prim.check()?;

        trace!("registered {} `{}` in {}", prim.kind(), name, self.name);
        let key = self.primitives.insert(prim);
        self.names.insert(name, key);
        Ok(key)
    }

    /// Registers each primitive in order, stopping at the first failure.
    pub fn register_all<I>(&mut self, prims: I) -> RuleResult<()>
    where
        I: IntoIterator,
        I::Item: Into<Primitive>,
    {
        for prim in prims {
            self.register(prim)?;
        }
        Ok(())
    }

    #[inline]
    pub fn key(&self, name: &str) -> Option<PrimitiveKey> {
        self.names.get(name).copied()
    }

    #[inline]
    pub fn lookup(&self, name: &str) -> Option<&Primitive> {
        self.key(name).and_then(|key| self.primitives.get(key))
    }

    #[inline]
    pub fn primitive(&self, key: PrimitiveKey) -> Option<&Primitive> {
        self.primitives.get(key)
    }

    /// Looks up a primitive by name and borrows it as type `T`.
    pub fn get<T: PrimitiveVariant>(&self, name: &str) -> RuleResult<&T> {
        let prim = self
            .lookup(name)
            .ok_or_else(|| RuleError::NotFound(name.into()))?;
        prim.downcast::<T>().ok_or_else(|| RuleError::WrongKind {
            name: prim.name().clone(),
            expected: T::KIND,
            found: prim.kind(),
        })
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates over all primitives in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Primitive> {
        self.names.values().filter_map(|&key| self.primitives.get(key))
    }

    /// Iterates over the primitives of one kind in registration order.
    pub fn all_of_kind(&self, kind: PrimitiveKind) -> impl Iterator<Item = &Primitive> {
        self.iter().filter(move |p| p.kind() == kind)
    }

    /// Iterates over the primitives of type `T` in registration order.
    pub fn all<'a, T: PrimitiveVariant + 'a>(&'a self) -> impl Iterator<Item = &'a T> {
        self.iter().filter_map(|p| p.downcast::<T>())
    }

    /// The oxides a wafer wire named `wire` may be covered by.
    ///
    /// Yields nothing if `wire` is not a [`WaferWire`].
    pub fn oxides_of<'a>(&'a self, wire: &'a str) -> impl Iterator<Item = &'a Insulator> {
        self.lookup(wire)
            .and_then(|p| p.downcast::<WaferWire>())
            .into_iter()
            .flat_map(|w| w.oxides().iter())
            .filter_map(|ox| self.lookup(ox).and_then(|p| p.downcast::<Insulator>()))
    }

    /// The spacing rules naming `name` as an operand.
    pub fn spacings_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Spacing> {
        self.all::<Spacing>().filter(move |s| s.involves(name))
    }

    /// The vias that land on `wire` from either side.
    pub fn vias_on<'a>(&'a self, wire: &'a str) -> impl Iterator<Item = &'a Via> {
        self.all::<Via>().filter(move |v| {
            v.lands_on(ViaLevel::Bottom, wire) || v.lands_on(ViaLevel::Top, wire)
        })
    }

    /// The vias connecting `bottom` to `top`.
    pub fn vias_between<'a>(
        &'a self,
        bottom: &'a str,
        top: &'a str,
    ) -> impl Iterator<Item = &'a Via> {
        self.all::<Via>()
            .filter(move |v| v.lands_on(ViaLevel::Bottom, bottom) && v.lands_on(ViaLevel::Top, top))
    }

    /// The names of all primitives drawn on a mask of their own, in registration order.
    pub fn mask_names(&self) -> Vec<&ArcStr> {
        self.iter()
            .filter(|p| p.kind().is_mask_bearing())
            .map(|p| p.name())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> RuleGraph {
        let mut g = RuleGraph::new("test", Grid::from_microns(0.005).unwrap());
        g.register(Marker::new("Activ.pin")).unwrap();
        g.register(Well::new("NWell", ImplantType::N, 0.62, 0.62)).unwrap();
        g.register(
            WaferWire::builder()
                .name("Activ")
                .pin("Activ.pin")
                .min_width(0.15)
                .min_space(0.21)
                .well("NWell")
                .build()
                .unwrap(),
        )
        .unwrap();
        g
    }

    #[test]
    fn registration_order_is_preserved() {
        let g = graph();
        let names: Vec<_> = g.iter().map(|p| p.name().as_str()).collect();
        assert_eq!(names, ["Activ.pin", "NWell", "Activ"]);
        assert_eq!(g.mask_names().len(), 3);
    }

    #[test]
    fn typed_lookup() {
        let g = graph();
        assert_eq!(g.get::<WaferWire>("Activ").unwrap().min_width(), 0.15);
        assert_eq!(
            g.get::<Well>("Activ").unwrap_err(),
            RuleError::WrongKind {
                name: "Activ".into(),
                expected: PrimitiveKind::Well,
                found: PrimitiveKind::WaferWire,
            }
        );
        assert_eq!(
            g.get::<Well>("PWell").unwrap_err(),
            RuleError::NotFound("PWell".into())
        );
    }

    #[test]
    fn failed_registration_leaves_graph_unchanged() {
        let mut g = graph();
        let err = g
            .register(Spacing::new(["Activ"], ["pSD"], 0.18))
            .unwrap_err();
        assert!(matches!(err, RuleError::UnresolvedReference { .. }));
        let err = g
            .register(Insulator::new("ThickGateOx", 0.86, 0.1234))
            .unwrap_err();
        assert!(matches!(
            err,
            RuleError::InvalidConstraint {
                field: "min_space",
                ..
            }
        ));
        assert_eq!(g.len(), 3);
        assert!(!g.contains("ThickGateOx"));
    }

    #[test]
    fn reference_kinds_are_checked() {
        let mut g = graph();
        let err = g
            .register(
                GateWire::builder()
                    .name("GatPoly")
                    .pin("NWell")
                    .min_width(0.13)
                    .min_space(0.18)
                    .build()
                    .unwrap(),
            )
            .unwrap_err();
        assert_eq!(
            err,
            RuleError::WrongKind {
                name: "NWell".into(),
                expected: PrimitiveKind::Marker,
                found: PrimitiveKind::Well,
            }
        );
    }
}
