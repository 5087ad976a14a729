#![allow(dead_code)]

use std::sync::Arc;

use subgeom::orientation::Named;
use subgeom::{Point, Rect};
use substrate::layout::cell::{Cell, Element, Instance};
use substrate::layout::layers::LayerSpec;

pub fn metal2() -> LayerSpec {
    sg13g2_pdk::layers().mask_spec("Metal2").unwrap()
}

/// A clamp with a pad connection on Metal2 spanning `x0..x1`.
pub fn clamp(name: &str, x0: i64, x1: i64) -> Arc<Cell> {
    let mut cell = Cell::new(name);
    cell.add(Element::with_net_name(
        "pad",
        metal2(),
        Rect::new(Point::new(x0, 0), Point::new(x1, 20_000)),
    ));
    cell.add(Element::with_net_name(
        "iovss",
        metal2(),
        Rect::new(Point::new(-40_000, 0), Point::new(-30_000, 20_000)),
    ));
    Arc::new(cell)
}

pub fn diode(name: &str) -> Arc<Cell> {
    Arc::new(Cell::new(name))
}

pub fn place(cell: &Arc<Cell>, name: &str, loc: (i64, i64), orientation: Named) -> Instance {
    Instance::builder()
        .name(name)
        .cell(cell.clone())
        .loc(loc)
        .orientation(orientation)
        .build()
        .unwrap()
}

pub fn labels(cell: &Cell) -> Vec<(String, Point)> {
    cell.annotations()
        .map(|a| (a.string.to_string(), a.loc))
        .collect()
}
