//! Types related to the creation and instantiation of [`Cell`]s.

use std::sync::Arc;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use subgeom::bbox::{Bbox, BoundBox};
use subgeom::orientation::Orientation;
use subgeom::transform::{Transform, Transformation, Translate};
use subgeom::{Point, Rect, Shape};

use super::layers::{LayerKey, LayerSpec};
use crate::deps::arcstr::ArcStr;

/// The layout view of a cell.
#[derive(Debug, Default, Clone)]
pub struct Cell {
    /// The cell's name.
    name: ArcStr,
    /// A list of instances contained in the cell.
    insts: Vec<Instance>,
    /// A list of primitive/geometric elements.
    elems: Vec<Element>,
    /// A list of text annotations.
    annotations: Vec<TextElement>,
}

/// An instance of a cell in a layout.
#[derive(Debug, Clone, Builder)]
#[builder(pattern = "owned")]
pub struct Instance {
    /// The instance name.
    #[builder(setter(into), default)]
    pub(crate) name: ArcStr,
    /// A pointer to the reference cell.
    #[builder(setter(into))]
    pub(crate) cell: Arc<Cell>,
    /// The location of the cell.
    #[builder(setter(into), default)]
    pub(crate) loc: Point,
    /// The orientation of the cell.
    #[builder(setter(into), default)]
    pub(crate) orientation: Orientation,
}

/// A primitive geometric element.
///
/// Combines a geometric [`Shape`] with a [`LayerSpec`],
/// and optional net connectivity annotation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Element {
    /// The element's net name.
    pub net: Option<ArcStr>,
    /// The layer spec where the element is located.
    pub layer: LayerSpec,
    /// The element's shape.
    pub inner: Shape,
}

impl Element {
    /// Creates a new [`Element`].
    pub fn new(layer: LayerSpec, shape: impl Into<Shape>) -> Self {
        Self {
            net: None,
            layer,
            inner: shape.into(),
        }
    }

    /// Creates a new [`Element`] with net name `net`.
    pub fn with_net_name(
        net: impl Into<ArcStr>,
        layer: LayerSpec,
        shape: impl Into<Shape>,
    ) -> Self {
        Self {
            net: Some(net.into()),
            layer,
            inner: shape.into(),
        }
    }

    /// Returns `true` if the element is on `layer` and belongs to net `net`.
    pub fn is_on_net(&self, layer: LayerSpec, net: &str) -> bool {
        self.layer == layer && self.net.as_deref() == Some(net)
    }

    pub fn into_inner(self) -> Shape {
        self.inner
    }
}

impl BoundBox for Element {
    #[inline]
    fn bbox(&self) -> Bbox {
        self.inner.bbox()
    }
}

impl Transform for Element {
    fn transform(&self, trans: Transformation) -> Self {
        Self {
            net: self.net.clone(),
            layer: self.layer,
            inner: self.inner.transform(trans),
        }
    }
}

impl Translate for Element {
    fn translate(&mut self, p: Point) {
        self.inner.translate(p);
    }
}

/// A text annotation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextElement {
    /// The string value of the annotation.
    pub string: ArcStr,
    /// The location of the annotation
    pub loc: Point,
    /// The layer on which the annotation resides.
    pub layer: LayerSpec,
}

impl TextElement {
    pub fn new(string: impl Into<ArcStr>, loc: impl Into<Point>, layer: LayerSpec) -> Self {
        Self {
            string: string.into(),
            loc: loc.into(),
            layer,
        }
    }
}

impl Translate for TextElement {
    fn translate(&mut self, p: Point) {
        self.loc.translate(p);
    }
}

impl Transform for TextElement {
    fn transform(&self, trans: Transformation) -> Self {
        let loc = self.loc.transform(trans);
        Self {
            string: self.string.clone(),
            loc,
            layer: self.layer,
        }
    }
}

impl Cell {
    /// Create a new and empty cell named `name`.
    pub fn new(name: impl Into<ArcStr>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Returns the name of the cell.
    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// Sets the name of the cell.
    #[inline]
    pub fn set_name(&mut self, name: impl Into<ArcStr>) {
        self.name = name.into();
    }

    /// Returns an iterator over the instances in the cell.
    #[inline]
    pub fn insts(&self) -> impl Iterator<Item = &Instance> {
        self.insts.iter()
    }

    /// Adds an instance to the cell.
    pub fn add_inst(&mut self, inst: impl Into<Instance>) {
        self.insts.push(inst.into());
    }

    /// Adds several instances to the cell.
    pub fn add_insts(&mut self, insts: impl IntoIterator<Item = impl Into<Instance>>) {
        for inst in insts {
            self.insts.push(inst.into());
        }
    }

    /// Returns an iterator over the elements in the cell.
    #[inline]
    pub fn elems(&self) -> impl Iterator<Item = &Element> {
        self.elems.iter()
    }

    /// Adds an element to the cell.
    pub fn add<T>(&mut self, elem: T)
    where
        T: Into<Element>,
    {
        self.elems.push(elem.into());
    }

    /// Adds all elements from the given iterator to this cell.
    pub fn add_elements(&mut self, elems: impl IntoIterator<Item = Element>) {
        self.elems.extend(elems);
    }

    /// Draws a rectangle on the given layer.
    pub fn draw_rect(&mut self, layer: LayerSpec, rect: Rect) {
        self.elems.push(Element::new(layer, rect));
    }

    /// Returns the annotations in the cell.
    #[inline]
    pub fn annotations(&self) -> impl Iterator<Item = &TextElement> {
        self.annotations.iter()
    }

    /// Adds an annotation to the cell.
    #[inline]
    pub fn add_annotation(&mut self, text_elem: impl Into<TextElement>) {
        self.annotations.push(text_elem.into());
    }

    /// Adds all annotations from the given iterator to this cell.
    pub fn add_annotations(&mut self, annotations: impl IntoIterator<Item = TextElement>) {
        self.annotations.extend(annotations);
    }

    /// Returns all elements of this cell and its instances, recursively,
    /// in this cell's coordinates.
    ///
    /// Net names are carried through unchanged.
    pub fn flat_elements(&self) -> Vec<Element> {
        let mut out = Vec::new();
        flatten_recur(self, Transformation::identity(), &mut out);
        out
    }

    /// Returns the shapes on `layer`, including those of instances.
    pub fn shapes_on(&self, layer: LayerKey) -> Box<dyn Iterator<Item = Shape> + '_> {
        let recur = self.insts().flat_map(move |inst| inst.shapes_on(layer));
        let curr = self
            .elems()
            .filter(move |&elem| elem.layer.layer() == layer)
            .map(|elem| elem.inner.clone());
        Box::new(curr.chain(recur))
    }

    /// Returns the rectangles on `layer` belonging to net `net`.
    ///
    /// Polygons are split into rectangles. Elements of the cell come first,
    /// followed by those of its instances in placement order.
    pub fn shapes_on_net(&self, layer: LayerSpec, net: &str) -> Vec<Rect> {
        self.flat_elements()
            .iter()
            .filter(|elem| elem.is_on_net(layer, net))
            .flat_map(|elem| elem.inner.split_rects())
            .collect()
    }
}

fn flatten_recur(cell: &Cell, tf: Transformation, out: &mut Vec<Element>) {
    out.extend(cell.elems.iter().map(|e| e.transform(tf)));
    for inst in cell.insts.iter() {
        let tf = Transformation::cascade(tf, inst.transformation());
        flatten_recur(&inst.cell, tf, out);
    }
}

impl Translate for Cell {
    fn translate(&mut self, p: Point) {
        for inst in self.insts.iter_mut() {
            inst.translate(p);
        }
        for elem in self.elems.iter_mut() {
            elem.translate(p);
        }
        for ann in self.annotations.iter_mut() {
            ann.translate(p);
        }
    }
}

impl BoundBox for Cell {
    fn bbox(&self) -> Bbox {
        let mut bbox = Bbox::empty();
        for elem in &self.elems {
            bbox = bbox.union(elem.bbox());
        }
        for inst in &self.insts {
            bbox = bbox.union(inst.bbox());
        }
        bbox
    }
}

impl Instance {
    /// Creates a new [`Instance`].
    pub fn new(cell: impl Into<Arc<Cell>>) -> Self {
        let cell = cell.into();
        Self {
            name: cell.name.clone(),
            cell,
            loc: Point::new(0, 0),
            orientation: Orientation::default(),
        }
    }

    pub fn with_orientation(&self, o: impl Into<Orientation>) -> Self {
        let mut res = self.clone();
        res.set_orientation(o);
        res
    }

    /// Returns the name of the instance.
    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// Sets the name of the instance.
    #[inline]
    pub fn set_name(&mut self, name: impl Into<ArcStr>) {
        self.name = name.into();
    }

    /// Returns a pointer to the instance's reference cell.
    #[inline]
    pub fn cell(&self) -> &Arc<Cell> {
        &self.cell
    }

    /// Creates a new [`InstanceBuilder`].
    #[inline]
    pub fn builder() -> InstanceBuilder {
        InstanceBuilder::default()
    }

    /// Returns the transformation associated with the instance.
    #[inline]
    pub fn transformation(&self) -> Transformation {
        Transformation::with_loc_and_orientation(self.loc, self.orientation)
    }

    /// Returns the location of the instance.
    #[inline]
    pub fn loc(&self) -> Point {
        self.loc
    }

    /// Sets the location of the instance.
    #[inline]
    pub fn set_loc(&mut self, p: impl Into<Point>) {
        self.loc = p.into();
    }

    /// Returns the orientation of the instance.
    #[inline]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Sets the orientation of the instance.
    #[inline]
    pub fn set_orientation(&mut self, o: impl Into<Orientation>) {
        self.orientation = o.into();
    }

    pub fn shapes_on(&self, layer: LayerKey) -> impl Iterator<Item = Shape> + '_ {
        let tf = self.transformation();
        self.cell().shapes_on(layer).map(move |s| s.transform(tf))
    }

    /// Returns the rectangles on `layer` belonging to net `net` of the
    /// referenced cell, placed in the parent's coordinates.
    pub fn shapes_on_net(&self, layer: LayerSpec, net: &str) -> Vec<Rect> {
        let tf = self.transformation();
        self.cell
            .shapes_on_net(layer, net)
            .into_iter()
            .map(|r| r.transform(tf))
            .collect()
    }
}

impl Translate for Instance {
    fn translate(&mut self, p: Point) {
        self.loc.translate(p);
    }
}

impl BoundBox for Instance {
    fn bbox(&self) -> Bbox {
        match self.cell.bbox().into_rect() {
            Some(rect) => rect.transform(self.transformation()).bbox(),
            None => Bbox::empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use subgeom::orientation::Named;
    use subgeom::Polygon;

    use super::*;
    use crate::layout::layers::{GdsLayerSpec, LayerInfo, Layers};

    fn metal2() -> (Layers, LayerSpec) {
        let mut layers = Layers::new();
        let key = layers.add(LayerInfo::drawing("Metal2", GdsLayerSpec(10, 0)));
        (layers, LayerSpec::drawing(key))
    }

    #[test]
    fn flatten_applies_instance_transforms() {
        let (_layers, m2) = metal2();
        let mut leaf = Cell::new("leaf");
        leaf.add(Element::with_net_name(
            "pad",
            m2,
            Rect::new(Point::new(0, 0), Point::new(100, 50)),
        ));
        let inst = Instance::builder()
            .cell(leaf)
            .loc(Point::new(1000, 0))
            .orientation(Named::R90)
            .build()
            .unwrap();
        let mut top = Cell::new("top");
        top.add_inst(inst.clone());

        let flat = top.flat_elements();
        assert_eq!(flat.len(), 1);
        assert_eq!(
            flat[0].inner,
            Shape::Rect(Rect::new(Point::new(950, 0), Point::new(1000, 100)))
        );
        assert_eq!(
            inst.shapes_on_net(m2, "pad"),
            vec![Rect::new(Point::new(950, 0), Point::new(1000, 100))]
        );
        assert!(inst.shapes_on_net(m2, "vss").is_empty());
    }

    #[test]
    fn polygons_are_split_on_net_query() {
        let (_layers, m2) = metal2();
        let mut cell = Cell::new("lshape");
        cell.add(Element::with_net_name(
            "pad",
            m2,
            Polygon::new([(0, 0), (20, 0), (20, 10), (10, 10), (10, 30), (0, 30)]),
        ));
        let rects = cell.shapes_on_net(m2, "pad");
        assert_eq!(rects.len(), 2);
        assert_eq!(rects.iter().map(|r| r.area()).sum::<i64>(), 400);
    }

    #[test]
    fn annotations_are_appended() {
        let (_layers, m2) = metal2();
        let mut cell = Cell::new("c");
        cell.add_annotation(TextElement::new("PAD", (10, 20), m2));
        cell.add_annotations([TextElement::new("sub!", Point::zero(), m2)]);
        let texts: Vec<_> = cell.annotations().map(|a| a.string.as_str()).collect();
        assert_eq!(texts, ["PAD", "sub!"]);
    }
}
